//! Streaming construction of a minimal FST from sorted inputs.
//!
//! The builder keeps a *frontier*: one open node per depth along the most
//! recently added input. Adding an input first freezes the part of the
//! frontier that the new input no longer shares (its tail), then extends the
//! frontier along the new input and pushes output prefixes down so each arc
//! carries only what its subtree has in common. Frozen nodes go through the
//! node hash, so identical suffixes are stored once.

pub(crate) mod node;
pub(crate) mod writer;

pub use writer::BuilderStats;

use lexfst_core::{InputType, bytes_to_labels, utf16_labels, utf32_labels};
use tracing::debug;

use crate::fst::{FINAL_END_NODE, Fst};
use crate::node_hash::NodeHash;
use crate::outputs::Outputs;
use crate::{FstError, Result};

use node::{ArcTarget, UncompiledNode};
use writer::NodeCompiler;

/// Tunables fixed when the builder is created.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BuilderOptions {
    /// Drop nodes reached by fewer inputs than this. `0` keeps everything.
    pub min_suffix_count1: u64,
    /// Drop nodes whose parent is reached by fewer inputs than this. `1`
    /// keeps only the part of each input up to where it diverges.
    pub min_suffix_count2: u64,
    /// Deduplicate identical suffixes.
    pub share_suffix: bool,
    /// Also deduplicate nodes with more than one arc.
    pub share_non_singleton_nodes: bool,
    /// Only deduplicate nodes whose remaining tail is at most this long.
    pub share_max_tail_length: usize,
    /// Allow the binary-search and direct-addressing node layouts.
    pub allow_fixed_length_arcs: bool,
    /// Block size of the byte store, as a power of two.
    pub bytes_page_bits: u32,
    /// How much larger than binary search a direct-addressing node may be.
    /// Negative disables direct addressing.
    pub direct_addressing_max_oversizing_factor: f32,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            min_suffix_count1: 0,
            min_suffix_count2: 0,
            share_suffix: true,
            share_non_singleton_nodes: true,
            share_max_tail_length: usize::MAX,
            allow_fixed_length_arcs: true,
            bytes_page_bits: 15,
            direct_addressing_max_oversizing_factor: 1.0,
        }
    }
}

impl BuilderOptions {
    pub fn validate(&self) -> Result<()> {
        if !(1..=30).contains(&self.bytes_page_bits) {
            return Err(FstError::InvalidOptions(format!(
                "bytes_page_bits must be in 1..=30, got {}",
                self.bytes_page_bits
            )));
        }
        if !self.direct_addressing_max_oversizing_factor.is_finite() {
            return Err(FstError::InvalidOptions(format!(
                "direct_addressing_max_oversizing_factor must be finite, got {}",
                self.direct_addressing_max_oversizing_factor
            )));
        }
        Ok(())
    }
}

/// Builds an [`Fst`] from `(input, output)` pairs added in sorted order.
///
/// Not thread-safe; callers supply the total order. Any failed `add`
/// leaves the builder unusable.
pub struct FstBuilder<O: Outputs> {
    compiler: NodeCompiler<O>,
    dedup: Option<NodeHash>,
    frontier: Vec<UncompiledNode<O::Value>>,
    last_input: Vec<i32>,
    empty_output: Option<O::Value>,
    input_count: u64,
    poisoned: bool,
}

impl<O: Outputs> std::fmt::Debug for FstBuilder<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FstBuilder")
            .field("input_type", &self.compiler.input_type)
            .field("input_count", &self.input_count)
            .field("bytes", &self.compiler.bytes.position())
            .field("stats", &self.compiler.stats)
            .field("poisoned", &self.poisoned)
            .finish()
    }
}

impl<O: Outputs> FstBuilder<O> {
    /// Creates a builder with default options.
    pub fn new(input_type: InputType, outputs: O) -> Self {
        Self::build(input_type, outputs, BuilderOptions::default())
    }

    pub fn with_options(input_type: InputType, outputs: O, options: BuilderOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::build(input_type, outputs, options))
    }

    fn build(input_type: InputType, outputs: O, options: BuilderOptions) -> Self {
        let no_output = outputs.no_output();
        let dedup = options.share_suffix.then(NodeHash::new);
        let frontier = (0..10).map(|depth| UncompiledNode::new(depth, no_output.clone())).collect();
        Self {
            compiler: NodeCompiler::new(input_type, outputs, options),
            dedup,
            frontier,
            last_input: Vec::new(),
            empty_output: None,
            input_count: 0,
            poisoned: false,
        }
    }

    pub fn input_type(&self) -> InputType {
        self.compiler.input_type
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.compiler.options
    }

    /// Counters for the nodes frozen so far.
    pub fn stats(&self) -> BuilderStats {
        self.compiler.stats
    }

    /// Number of `add` calls accepted so far.
    pub fn input_count(&self) -> u64 {
        self.input_count
    }

    /// Adds one input. Inputs must arrive in non-decreasing order; a repeated
    /// input merges its output into the previous one.
    pub fn add(&mut self, input: &[i32], output: O::Value) -> Result<()> {
        if self.poisoned {
            return Err(FstError::BuilderPoisoned);
        }
        let result = self.add_inner(input, output);
        if result.is_err() {
            self.poisoned = true;
        }
        result
    }

    pub fn add_bytes(&mut self, input: &[u8], output: O::Value) -> Result<()> {
        self.add(&bytes_to_labels(input), output)
    }

    /// Adds text using the builder's alphabet: UTF-8 bytes, UTF-16 units or
    /// code points.
    pub fn add_str(&mut self, input: &str, output: O::Value) -> Result<()> {
        let labels = match self.compiler.input_type {
            InputType::Byte1 => bytes_to_labels(input.as_bytes()),
            InputType::Byte2 => utf16_labels(input),
            InputType::Byte4 => utf32_labels(input),
        };
        self.add(&labels, output)
    }

    fn add_inner(&mut self, input: &[i32], output: O::Value) -> Result<()> {
        let input_type = self.compiler.input_type;
        if let Some(&label) = input.iter().find(|&&l| !input_type.accepts(l)) {
            return Err(FstError::LabelOutOfRange { label, input_type });
        }
        let outputs = self.compiler.outputs.clone();
        let no_output = outputs.no_output();

        if input.is_empty() {
            if !self.last_input.is_empty() {
                return Err(FstError::EmptyInputNotFirst);
            }
            // Finality lives on incoming arcs, so the empty input is kept
            // beside the body rather than in it.
            self.frontier[0].input_count += 1;
            self.frontier[0].is_final = true;
            self.empty_output = Some(match self.empty_output.take() {
                Some(previous) => outputs.merge(&previous, &output)?,
                None => output,
            });
            self.input_count += 1;
            return Ok(());
        }
        if input < self.last_input.as_slice() {
            return Err(FstError::OutOfOrder {
                previous: self.last_input.clone(),
                current: input.to_vec(),
            });
        }

        let stop = self.last_input.len().min(input.len());
        let mut pos = 0;
        loop {
            self.frontier[pos].input_count += 1;
            if pos >= stop || self.last_input[pos] != input[pos] {
                break;
            }
            pos += 1;
        }
        let prefix_len_plus1 = pos + 1;

        while self.frontier.len() < input.len() + 1 {
            let depth = self.frontier.len();
            self.frontier.push(UncompiledNode::new(depth, no_output.clone()));
        }

        self.freeze_tail(prefix_len_plus1)?;

        for idx in prefix_len_plus1..=input.len() {
            self.frontier[idx - 1].add_arc(input[idx - 1], no_output.clone());
            self.frontier[idx].input_count += 1;
        }

        let len = input.len();
        let duplicate = self.last_input.len() == len && prefix_len_plus1 == len + 1;
        if !duplicate {
            let last = &mut self.frontier[len];
            last.is_final = true;
            last.output = no_output.clone();
        }

        // Push conflicting outputs down, only as far as the shared prefix.
        let mut output = output;
        for idx in 1..prefix_len_plus1 {
            let label = input[idx - 1];
            let last_output = self.frontier[idx - 1].last_output(label).clone();
            let common = if outputs.is_no_output(&last_output) {
                no_output.clone()
            } else {
                let common = outputs.common(&output, &last_output);
                let word_suffix = outputs.subtract(&last_output, &common);
                self.frontier[idx - 1].set_last_output(label, common.clone());
                self.frontier[idx].prepend_output(&outputs, &word_suffix);
                common
            };
            output = outputs.subtract(&output, &common);
        }

        if duplicate {
            let last = &mut self.frontier[len];
            last.output = outputs.merge(&last.output, &output)?;
        } else {
            self.frontier[prefix_len_plus1 - 1].set_last_output(input[prefix_len_plus1 - 1], output);
        }

        self.last_input.clear();
        self.last_input.extend_from_slice(input);
        self.input_count += 1;
        Ok(())
    }

    /// Freezes, keeps or prunes the frontier nodes past the shared prefix.
    fn freeze_tail(&mut self, prefix_len_plus1: usize) -> Result<()> {
        let min1 = self.compiler.options.min_suffix_count1;
        let min2 = self.compiler.options.min_suffix_count2;
        let no_output = self.compiler.outputs.no_output();
        let last_len = self.last_input.len();
        let down_to = prefix_len_plus1.max(1);

        for idx in (down_to..=last_len).rev() {
            let node_count = self.frontier[idx].input_count;
            let parent_count = self.frontier[idx - 1].input_count;
            let mut do_prune = false;
            let do_compile;
            if node_count < min1 {
                do_prune = true;
                do_compile = true;
            } else if idx > prefix_len_plus1 {
                // The parent is about to be frozen too; if it misses the cut,
                // so does this node.
                do_prune = parent_count < min2 || (min2 == 1 && parent_count == 1 && idx > 1);
                do_compile = true;
            } else {
                // Undecided until more inputs arrive, unless pruning is off.
                do_compile = min2 == 0;
            }

            if node_count < min2 || (min2 == 1 && node_count == 1 && idx > 1) {
                self.frontier[idx].arcs.clear();
            }

            let label = self.last_input[idx - 1];
            if do_prune {
                self.frontier[idx].clear(no_output.clone());
                self.frontier[idx - 1].delete_last(label);
                continue;
            }

            if min2 != 0 {
                compile_all_targets(
                    &mut self.compiler,
                    self.dedup.as_mut(),
                    &mut self.frontier[idx],
                    last_len - idx,
                )?;
            }
            let next_final_output = self.frontier[idx].output.clone();
            // Arc-less nodes are treated as final so enumeration never meets
            // a non-final dead end.
            let is_final = self.frontier[idx].is_final || self.frontier[idx].arcs.is_empty();
            if do_compile {
                let address = compile_node(
                    &mut self.compiler,
                    self.dedup.as_mut(),
                    &mut self.frontier[idx],
                    1 + last_len - idx,
                )?;
                self.frontier[idx - 1].replace_last(
                    label,
                    ArcTarget::Compiled(address),
                    next_final_output,
                    is_final,
                );
            } else {
                // Keep the node open on the parent's arc and start a fresh one here.
                let kept = std::mem::replace(&mut self.frontier[idx], UncompiledNode::new(idx, no_output.clone()));
                self.frontier[idx - 1].replace_last(
                    label,
                    ArcTarget::Pending(Box::new(kept)),
                    next_final_output,
                    is_final,
                );
            }
        }
        Ok(())
    }

    /// Freezes the remaining frontier and returns the FST, or `None` when
    /// nothing was accepted.
    pub fn finish(self) -> Result<Option<Fst<O>>> {
        self.finish_with_stats().map(|(fst, _)| fst)
    }

    /// [`finish`](Self::finish), also returning the final node statistics.
    pub fn finish_with_stats(mut self) -> Result<(Option<Fst<O>>, BuilderStats)> {
        if self.poisoned {
            return Err(FstError::BuilderPoisoned);
        }
        let min1 = self.compiler.options.min_suffix_count1;
        let min2 = self.compiler.options.min_suffix_count2;
        let last_len = self.last_input.len();

        self.freeze_tail(0)?;

        let root = &self.frontier[0];
        if root.input_count < min1 || root.input_count < min2 || root.arcs.is_empty() {
            if self.empty_output.is_none() || min1 > 0 || min2 > 0 {
                debug!(inputs = self.input_count, "fst is empty");
                return Ok((None, self.compiler.stats));
            }
        } else if min2 != 0 {
            compile_all_targets(&mut self.compiler, self.dedup.as_mut(), &mut self.frontier[0], last_len)?;
        }

        let mut start_node =
            compile_node(&mut self.compiler, self.dedup.as_mut(), &mut self.frontier[0], last_len)?;
        if start_node == FINAL_END_NODE && self.empty_output.is_some() {
            start_node = 0;
        }

        let NodeCompiler {
            mut bytes,
            outputs,
            input_type,
            stats,
            ..
        } = self.compiler;
        bytes.finish();
        debug!(
            inputs = self.input_count,
            nodes = stats.node_count,
            arcs = stats.arc_count,
            binary_search_nodes = stats.binary_search_node_count,
            direct_addressing_nodes = stats.direct_addressing_node_count,
            shared_nodes = self.dedup.as_ref().map_or(0, NodeHash::len),
            body_bytes = bytes.position(),
            "finished fst"
        );
        let fst = Fst::from_parts(input_type, self.empty_output, start_node, bytes, outputs);
        Ok((Some(fst), stats))
    }
}

/// Freezes `node` (through the node hash when sharing applies) and resets it.
fn compile_node<O: Outputs>(
    compiler: &mut NodeCompiler<O>,
    dedup: Option<&mut NodeHash>,
    node: &mut UncompiledNode<O::Value>,
    tail_length: usize,
) -> Result<i64> {
    let start = compiler.bytes.position();
    let share = (compiler.options.share_non_singleton_nodes || node.arcs.len() <= 1)
        && tail_length <= compiler.options.share_max_tail_length;
    let address = match dedup {
        Some(hash) if share && !node.arcs.is_empty() => hash.add(compiler, node)?,
        _ => compiler.add_node(node),
    };
    if compiler.bytes.position() != start {
        compiler.last_frozen_node = address;
    }
    node.clear(compiler.outputs.no_output());
    Ok(address)
}

/// Freezes every still-open target of `node`.
fn compile_all_targets<O: Outputs>(
    compiler: &mut NodeCompiler<O>,
    mut dedup: Option<&mut NodeHash>,
    node: &mut UncompiledNode<O::Value>,
    tail_length: usize,
) -> Result<()> {
    for arc in &mut node.arcs {
        if let ArcTarget::Pending(target) = &mut arc.target {
            if target.arcs.is_empty() {
                arc.is_final = true;
                target.is_final = true;
            }
            let address = compile_node(compiler, dedup.as_deref_mut(), target, tail_length.saturating_sub(1))?;
            arc.target = ArcTarget::Compiled(address);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::{ByteSequenceOutputs, NoOutputs, PositiveIntOutputs};

    fn build(keys: &[(&str, u64)]) -> Fst<PositiveIntOutputs> {
        let mut b = FstBuilder::new(InputType::Byte1, PositiveIntOutputs);
        for (k, v) in keys {
            b.add_str(k, *v).unwrap();
        }
        b.finish().unwrap().unwrap()
    }

    #[test]
    fn exact_lookups() {
        let fst = build(&[("car", 2), ("care", 3), ("cat", 1), ("dog", 4)]);
        assert_eq!(fst.get_bytes(b"car").unwrap(), Some(2));
        assert_eq!(fst.get_bytes(b"care").unwrap(), Some(3));
        assert_eq!(fst.get_bytes(b"cat").unwrap(), Some(1));
        assert_eq!(fst.get_bytes(b"dog").unwrap(), Some(4));
        assert_eq!(fst.get_bytes(b"ca").unwrap(), None);
        assert_eq!(fst.get_bytes(b"cars").unwrap(), None);
        assert_eq!(fst.get_bytes(b"").unwrap(), None);
    }

    #[test]
    fn duplicate_input_merges() {
        let mut b = FstBuilder::new(InputType::Byte1, PositiveIntOutputs);
        b.add_bytes(b"abc", 5).unwrap();
        b.add_bytes(b"abc", 7).unwrap();
        let (fst, stats) = b.finish_with_stats().unwrap();
        let fst = fst.unwrap();
        assert_eq!(fst.get_bytes(b"abc").unwrap(), Some(5));
        assert_eq!(stats.arc_count, 3);

        let mut b = FstBuilder::new(InputType::Byte1, PositiveIntOutputs);
        b.add_bytes(b"abc", 7).unwrap();
        b.add_bytes(b"abc", 5).unwrap();
        assert_eq!(b.finish().unwrap().unwrap().get_bytes(b"abc").unwrap(), Some(5));
    }

    #[test]
    fn duplicate_without_merge_fails_and_poisons() {
        let mut b = FstBuilder::new(InputType::Byte1, ByteSequenceOutputs::new());
        b.add_bytes(b"k", b"x".to_vec()).unwrap();
        assert!(matches!(b.add_bytes(b"k", b"y".to_vec()), Err(FstError::MergeUnsupported)));
        assert!(matches!(b.add_bytes(b"z", b"y".to_vec()), Err(FstError::BuilderPoisoned)));
        assert!(matches!(b.finish(), Err(FstError::BuilderPoisoned)));
    }

    #[test]
    fn contract_violations() {
        let mut b = FstBuilder::new(InputType::Byte1, PositiveIntOutputs);
        b.add_bytes(b"b", 1).unwrap();
        assert!(matches!(b.add_bytes(b"a", 1), Err(FstError::OutOfOrder { .. })));

        let mut b = FstBuilder::new(InputType::Byte1, PositiveIntOutputs);
        b.add_bytes(b"b", 1).unwrap();
        assert!(matches!(b.add_bytes(b"", 1), Err(FstError::EmptyInputNotFirst)));

        let mut b = FstBuilder::new(InputType::Byte1, PositiveIntOutputs);
        assert!(matches!(
            b.add(&[300], 1),
            Err(FstError::LabelOutOfRange { label: 300, .. })
        ));

        let bad = BuilderOptions {
            bytes_page_bits: 0,
            ..BuilderOptions::default()
        };
        assert!(matches!(
            FstBuilder::with_options(InputType::Byte1, PositiveIntOutputs, bad),
            Err(FstError::InvalidOptions(_))
        ));
        let bad = BuilderOptions {
            direct_addressing_max_oversizing_factor: f32::NAN,
            ..BuilderOptions::default()
        };
        assert!(FstBuilder::with_options(InputType::Byte1, PositiveIntOutputs, bad).is_err());
    }

    #[test]
    fn empty_builder_and_empty_input() {
        let b = FstBuilder::new(InputType::Byte1, PositiveIntOutputs);
        assert!(b.finish().unwrap().is_none());

        let mut b = FstBuilder::new(InputType::Byte1, PositiveIntOutputs);
        b.add_bytes(b"", 9).unwrap();
        let fst = b.finish().unwrap().unwrap();
        assert_eq!(fst.start_node(), 0);
        assert_eq!(fst.get(&[]).unwrap(), Some(9));
        assert_eq!(fst.get_bytes(b"a").unwrap(), None);
    }

    #[test]
    fn prefix_keys_and_outputs_on_final_states() {
        let fst = build(&[("a", 10), ("ab", 3), ("abc", 7), ("b", 0)]);
        assert_eq!(fst.get_bytes(b"a").unwrap(), Some(10));
        assert_eq!(fst.get_bytes(b"ab").unwrap(), Some(3));
        assert_eq!(fst.get_bytes(b"abc").unwrap(), Some(7));
        assert_eq!(fst.get_bytes(b"b").unwrap(), Some(0));
    }

    #[test]
    fn suffix_sharing_shrinks_the_body() {
        let words = ["bathing", "bowling", "boxing", "running", "sailing", "singing", "walking"];
        let build_with = |share_suffix| {
            let options = BuilderOptions {
                share_suffix,
                ..BuilderOptions::default()
            };
            let mut b = FstBuilder::with_options(InputType::Byte1, NoOutputs, options).unwrap();
            for w in words {
                b.add_str(w, ()).unwrap();
            }
            b.finish().unwrap().unwrap()
        };
        let shared = build_with(true);
        let unshared = build_with(false);
        assert!(shared.num_bytes() < unshared.num_bytes());
        for w in words {
            assert_eq!(shared.get_bytes(w.as_bytes()).unwrap(), Some(()));
        }
    }

    #[test]
    fn divergent_suffix_pruning() {
        let options = BuilderOptions {
            min_suffix_count2: 1,
            ..BuilderOptions::default()
        };
        let mut b = FstBuilder::with_options(InputType::Byte1, NoOutputs, options).unwrap();
        for w in ["abcdef", "abxyz", "q"] {
            b.add_str(w, ()).unwrap();
        }
        let fst = b.finish().unwrap().unwrap();
        // Each input survives only up to the edge where it diverges.
        assert_eq!(fst.get_bytes(b"abc").unwrap(), Some(()));
        assert_eq!(fst.get_bytes(b"abx").unwrap(), Some(()));
        assert_eq!(fst.get_bytes(b"q").unwrap(), Some(()));
        assert_eq!(fst.get_bytes(b"abcdef").unwrap(), None);
    }

    #[test]
    fn wide_alphabets() {
        let mut b = FstBuilder::new(InputType::Byte4, PositiveIntOutputs);
        b.add_str("h\u{e9}", 1).unwrap();
        b.add_str("h\u{1F600}", 2).unwrap();
        let fst = b.finish().unwrap().unwrap();
        assert_eq!(fst.get(&utf32_labels("h\u{1F600}")).unwrap(), Some(2));

        let mut b = FstBuilder::new(InputType::Byte2, PositiveIntOutputs);
        b.add_str("h\u{e9}", 1).unwrap();
        b.add_str("h\u{1F600}", 2).unwrap();
        let fst = b.finish().unwrap().unwrap();
        assert_eq!(fst.get(&utf16_labels("h\u{1F600}")).unwrap(), Some(2));
        assert_eq!(fst.get(&utf16_labels("h\u{e9}")).unwrap(), Some(1));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn options_from_partial_json() {
        let options: BuilderOptions =
            serde_json::from_str(r#"{"min_suffix_count2": 1, "bytes_page_bits": 4}"#).unwrap();
        assert_eq!(options.min_suffix_count2, 1);
        assert_eq!(options.bytes_page_bits, 4);
        assert!(options.share_suffix);
        let text = serde_json::to_string(&options).unwrap();
        assert_eq!(serde_json::from_str::<BuilderOptions>(&text).unwrap(), options);

        let bad = BuilderOptions { bytes_page_bits: 31, ..options };
        assert!(matches!(bad.validate(), Err(FstError::InvalidOptions(_))));
    }
}
