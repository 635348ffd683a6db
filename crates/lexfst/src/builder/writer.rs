// Serializes frontier nodes into the byte store.

use lexfst_core::{DataOutput, InputType};

use super::BuilderOptions;
use super::node::UncompiledNode;
use crate::bit_table;
use crate::bytes_store::BytesStore;
use crate::fst::{
    ARCS_FOR_BINARY_SEARCH, ARCS_FOR_DIRECT_ADDRESSING, BIT_ARC_HAS_FINAL_OUTPUT,
    BIT_ARC_HAS_OUTPUT, BIT_FINAL_ARC, BIT_LAST_ARC, BIT_STOP_NODE, BIT_TARGET_NEXT,
    FINAL_END_NODE, NON_FINAL_END_NODE,
};
use crate::outputs::Outputs;

/// Nodes up to this depth use fixed-length arcs from
/// [`FIXED_LENGTH_ARC_SHALLOW_NUM_ARCS`] arcs on.
const FIXED_LENGTH_ARC_SHALLOW_DEPTH: usize = 3;
const FIXED_LENGTH_ARC_SHALLOW_NUM_ARCS: usize = 5;
/// Deeper nodes use fixed-length arcs from this many arcs on.
const FIXED_LENGTH_ARC_DEEP_NUM_ARCS: usize = 10;

/// Upper bound on direct-addressing size, relative to the allowed size,
/// when spending accumulated credit.
const DIRECT_ADDRESSING_MAX_OVERSIZE_WITH_CREDIT_FACTOR: f32 = 1.66;

/// Longest possible fixed-length node header: tag plus two vInts.
const FIXED_LENGTH_HEADER_MAX_LEN: usize = 11;

/// Counters collected while freezing nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuilderStats {
    /// Nodes written to the body (deduplicated nodes count once).
    pub node_count: u64,
    pub arc_count: u64,
    pub binary_search_node_count: u64,
    pub direct_addressing_node_count: u64,
}

/// Owns the byte store during construction and writes one node at a time.
#[derive(Debug)]
pub(crate) struct NodeCompiler<O: Outputs> {
    pub bytes: BytesStore,
    pub outputs: O,
    pub input_type: InputType,
    pub options: BuilderOptions,
    /// Address of the node written most recently, for target-next arcs.
    pub last_frozen_node: i64,
    pub stats: BuilderStats,
    /// Bytes saved by direct addressing so far, spendable on oversized nodes.
    direct_addressing_credit: i64,
    num_bytes_per_arc: Vec<usize>,
    num_label_bytes_per_arc: Vec<usize>,
    arc_buffer: Vec<u8>,
}

impl<O: Outputs> NodeCompiler<O> {
    pub fn new(input_type: InputType, outputs: O, options: BuilderOptions) -> Self {
        let mut bytes = BytesStore::new(options.bytes_page_bits);
        // Pad byte: keeps real node addresses clear of the sentinels.
        bytes.write_byte(0);
        Self {
            bytes,
            outputs,
            input_type,
            options,
            last_frozen_node: 0,
            stats: BuilderStats::default(),
            direct_addressing_credit: 0,
            num_bytes_per_arc: Vec::new(),
            num_label_bytes_per_arc: Vec::new(),
            arc_buffer: Vec::new(),
        }
    }

    fn should_expand_with_fixed_length_arcs(&self, node: &UncompiledNode<O::Value>) -> bool {
        let n = node.arcs.len();
        self.options.allow_fixed_length_arcs
            && ((node.depth <= FIXED_LENGTH_ARC_SHALLOW_DEPTH && n >= FIXED_LENGTH_ARC_SHALLOW_NUM_ARCS)
                || n >= FIXED_LENGTH_ARC_DEEP_NUM_ARCS)
    }

    /// Compares the two fixed-length layouts and updates the credit when
    /// direct addressing wins.
    fn should_expand_with_direct_addressing(
        &mut self,
        num_arcs: usize,
        max_bytes_per_arc: usize,
        max_bytes_per_arc_without_label: usize,
        label_range: i32,
    ) -> bool {
        let factor = self.options.direct_addressing_max_oversizing_factor;
        if factor < 0.0 {
            return false;
        }
        let size_for_binary_search = (max_bytes_per_arc * num_arcs) as i64;
        let size_for_direct_addressing = bit_table::presence_bytes(label_range) as i64
            + self.num_label_bytes_per_arc[0] as i64
            + (max_bytes_per_arc_without_label * num_arcs) as i64;
        let allowed_oversize = (size_for_binary_search as f32 * factor) as i64;
        let expansion_cost = size_for_direct_addressing - allowed_oversize;
        if expansion_cost <= 0
            || (self.direct_addressing_credit >= expansion_cost
                && size_for_direct_addressing as f32
                    <= allowed_oversize as f32 * DIRECT_ADDRESSING_MAX_OVERSIZE_WITH_CREDIT_FACTOR)
        {
            self.direct_addressing_credit -= expansion_cost;
            return true;
        }
        false
    }

    /// Writes `node` and returns its address, or a sentinel for arc-less nodes.
    /// Every arc target must already be frozen.
    pub fn add_node(&mut self, node: &UncompiledNode<O::Value>) -> i64 {
        if node.arcs.is_empty() {
            return if node.is_final {
                FINAL_END_NODE
            } else {
                NON_FINAL_END_NODE
            };
        }
        let start = self.bytes.position();
        let num_arcs = node.arcs.len();
        let fixed = self.should_expand_with_fixed_length_arcs(node);
        if fixed {
            self.num_bytes_per_arc.resize(num_arcs, 0);
            self.num_label_bytes_per_arc.resize(num_arcs, 0);
        }
        self.stats.arc_count += num_arcs as u64;

        let mut last_arc_start = start;
        let mut max_bytes_per_arc = 0;
        let mut max_bytes_per_arc_without_label = 0;
        for (idx, arc) in node.arcs.iter().enumerate() {
            let target = arc.target.address();
            let target_has_arcs = target > 0;
            let mut flags = 0u8;
            if idx == num_arcs - 1 {
                flags |= BIT_LAST_ARC;
            }
            if target_has_arcs && self.last_frozen_node == target && !fixed {
                flags |= BIT_TARGET_NEXT;
            }
            if arc.is_final {
                flags |= BIT_FINAL_ARC;
                if !self.outputs.is_no_output(&arc.next_final_output) {
                    flags |= BIT_ARC_HAS_FINAL_OUTPUT;
                }
            } else {
                debug_assert!(self.outputs.is_no_output(&arc.next_final_output));
            }
            if !target_has_arcs {
                flags |= BIT_STOP_NODE;
            }
            let has_output = !self.outputs.is_no_output(&arc.output);
            if has_output {
                flags |= BIT_ARC_HAS_OUTPUT;
            }

            self.bytes.write_byte(flags);
            let label_start = self.bytes.position();
            self.input_type.write_label(&mut self.bytes, arc.label);
            let num_label_bytes = self.bytes.position() - label_start;
            if has_output {
                self.outputs.write(&arc.output, &mut self.bytes);
            }
            if flags & BIT_ARC_HAS_FINAL_OUTPUT != 0 {
                self.outputs.write_final_output(&arc.next_final_output, &mut self.bytes);
            }
            if target_has_arcs && flags & BIT_TARGET_NEXT == 0 {
                self.bytes.write_vlong(target as u64);
            }

            if fixed {
                let arc_bytes = self.bytes.position() - last_arc_start;
                self.num_bytes_per_arc[idx] = arc_bytes;
                self.num_label_bytes_per_arc[idx] = num_label_bytes;
                last_arc_start = self.bytes.position();
                max_bytes_per_arc = max_bytes_per_arc.max(arc_bytes);
                max_bytes_per_arc_without_label =
                    max_bytes_per_arc_without_label.max(arc_bytes - num_label_bytes);
            }
        }

        if fixed {
            let label_range = node.arcs[num_arcs - 1].label - node.arcs[0].label + 1;
            if self.should_expand_with_direct_addressing(
                num_arcs,
                max_bytes_per_arc,
                max_bytes_per_arc_without_label,
                label_range,
            ) {
                self.write_node_for_direct_addressing(node, start, max_bytes_per_arc_without_label, label_range);
                self.stats.direct_addressing_node_count += 1;
            } else {
                self.write_node_for_binary_search(num_arcs, start, max_bytes_per_arc);
                self.stats.binary_search_node_count += 1;
            }
        }

        let address = self.bytes.position() - 1;
        self.bytes.reverse(start, address);
        self.stats.node_count += 1;
        address as i64
    }

    /// Widens the arcs just written to a common stride, in place and back to
    /// front, then writes the header in front of them.
    fn write_node_for_binary_search(&mut self, num_arcs: usize, start: usize, max_bytes_per_arc: usize) {
        let mut header = Vec::with_capacity(FIXED_LENGTH_HEADER_MAX_LEN);
        header.write_byte(ARCS_FOR_BINARY_SEARCH);
        header.write_vint(num_arcs as u32);
        header.write_vint(max_bytes_per_arc as u32);

        let mut src = self.bytes.position();
        let mut dest = start + header.len() + num_arcs * max_bytes_per_arc;
        debug_assert!(dest >= src);
        if dest > src {
            self.bytes.skip_bytes(dest - src);
            for idx in (0..num_arcs).rev() {
                dest -= max_bytes_per_arc;
                let arc_len = self.num_bytes_per_arc[idx];
                src -= arc_len;
                if src != dest {
                    self.bytes.copy_bytes_self(src, dest, arc_len);
                }
            }
        }
        self.bytes.write_bytes_at(start, &header);
    }

    /// Rewrites the arcs just written as header, presence bits, first label
    /// and label-less fixed-stride arcs.
    fn write_node_for_direct_addressing(
        &mut self,
        node: &UncompiledNode<O::Value>,
        start: usize,
        max_bytes_per_arc_without_label: usize,
        label_range: i32,
    ) {
        let num_arcs = node.arcs.len();
        let total_arc_bytes = self.num_label_bytes_per_arc[0] + num_arcs * max_bytes_per_arc_without_label;
        let mut buffer = std::mem::take(&mut self.arc_buffer);
        buffer.clear();
        buffer.resize(total_arc_bytes, 0);

        let mut src = self.bytes.position();
        let mut offset = total_arc_bytes;
        for idx in (0..num_arcs).rev() {
            offset -= max_bytes_per_arc_without_label;
            let arc_len = self.num_bytes_per_arc[idx];
            src -= arc_len;
            let label_len = self.num_label_bytes_per_arc[idx];
            // Flag byte, then everything after the label.
            self.bytes.copy_to_slice(src, &mut buffer[offset..offset + 1]);
            let rest = arc_len - 1 - label_len;
            if rest > 0 {
                self.bytes
                    .copy_to_slice(src + 1 + label_len, &mut buffer[offset + 1..offset + 1 + rest]);
            }
            if idx == 0 {
                offset -= label_len;
                self.bytes.copy_to_slice(src + 1, &mut buffer[offset..offset + label_len]);
            }
        }
        debug_assert_eq!(offset, 0);

        let mut header = Vec::with_capacity(FIXED_LENGTH_HEADER_MAX_LEN);
        header.write_byte(ARCS_FOR_DIRECT_ADDRESSING);
        header.write_vint(label_range as u32);
        header.write_vint(max_bytes_per_arc_without_label as u32);

        self.bytes.truncate(start);
        self.bytes.write_bytes(&header);
        self.write_presence_bits(node);
        self.bytes.write_bytes(&buffer);
        self.arc_buffer = buffer;
    }

    fn write_presence_bits(&mut self, node: &UncompiledNode<O::Value>) {
        let mut presence_bits = 1u8;
        let mut presence_index = 0;
        let mut previous_label = node.arcs[0].label;
        for arc in &node.arcs[1..] {
            debug_assert!(arc.label > previous_label);
            presence_index += arc.label - previous_label;
            while presence_index >= 8 {
                self.bytes.write_byte(presence_bits);
                presence_bits = 0;
                presence_index -= 8;
            }
            presence_bits |= 1 << presence_index;
            previous_label = arc.label;
        }
        self.bytes.write_byte(presence_bits);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::node::ArcTarget;
    use crate::outputs::PositiveIntOutputs;

    fn node_with_labels(depth: usize, labels: &[i32]) -> UncompiledNode<u64> {
        let mut node = UncompiledNode::new(depth, 0);
        for &l in labels {
            node.add_arc(l, 0);
            node.replace_last(l, ArcTarget::Compiled(FINAL_END_NODE), 0, true);
            node.set_last_output(l, l as u64);
        }
        node
    }

    fn compiler(options: BuilderOptions) -> NodeCompiler<PositiveIntOutputs> {
        NodeCompiler::new(InputType::Byte1, PositiveIntOutputs, options)
    }

    #[test]
    fn sentinels_are_not_written() {
        let mut c = compiler(BuilderOptions::default());
        let mut empty = UncompiledNode::new(1, 0u64);
        assert_eq!(c.add_node(&empty), NON_FINAL_END_NODE);
        empty.is_final = true;
        assert_eq!(c.add_node(&empty), FINAL_END_NODE);
        assert_eq!(c.bytes.position(), 1);
    }

    #[test]
    fn first_node_lands_after_the_pad_byte() {
        let mut c = compiler(BuilderOptions::default());
        let address = c.add_node(&node_with_labels(4, &[b'a' as i32]));
        // Flag + label + output.
        assert_eq!(address, 3);
        assert_eq!(c.stats.node_count, 1);
        assert_eq!(c.bytes.byte_at(0), Some(0));
    }

    #[test]
    fn dense_wide_node_uses_direct_addressing() {
        let mut c = compiler(BuilderOptions::default());
        let labels: Vec<i32> = (b'a'..=b'l').map(i32::from).collect();
        let address = c.add_node(&node_with_labels(0, &labels));
        assert_eq!(c.stats.direct_addressing_node_count, 1);
        // The header tag is read first, so it ends up at the node address.
        assert_eq!(c.bytes.byte_at(address as usize), Some(ARCS_FOR_DIRECT_ADDRESSING));
    }

    #[test]
    fn sparse_wide_node_uses_binary_search() {
        let mut c = compiler(BuilderOptions::default());
        let labels: Vec<i32> = (0..12).map(|i| i * 20).collect();
        c.add_node(&node_with_labels(5, &labels));
        assert_eq!(c.stats.binary_search_node_count, 1);
        assert_eq!(c.stats.direct_addressing_node_count, 0);
    }

    #[test]
    fn fixed_length_can_be_disabled() {
        let mut c = compiler(BuilderOptions {
            allow_fixed_length_arcs: false,
            ..BuilderOptions::default()
        });
        let labels: Vec<i32> = (0..12).collect();
        c.add_node(&node_with_labels(0, &labels));
        assert_eq!(c.stats.binary_search_node_count + c.stats.direct_addressing_node_count, 0);
    }

    #[test]
    fn negative_factor_disables_direct_addressing() {
        let mut c = compiler(BuilderOptions {
            direct_addressing_max_oversizing_factor: -1.0,
            ..BuilderOptions::default()
        });
        let labels: Vec<i32> = (0..12).collect();
        c.add_node(&node_with_labels(0, &labels));
        assert_eq!(c.stats.binary_search_node_count, 1);
    }
}
