//! Ordered iteration and seeks over a frozen [`Fst`].
//!
//! [`FstEnum`] keeps one arc and one accumulated output per depth, the read
//! side mirror of the builder frontier. `arcs[0]` is the virtual start arc;
//! `arcs[i]` for `i >= 1` is the arc taken at depth `i - 1`, and
//! `output[i]` is the output accumulated through it. The current input is
//! `current[1..upto]`; `arcs[upto]` is the end pseudo-arc of a final state.
//!
//! Seeks first rewind to the prefix shared by the current input and the
//! target, so a sequence of ascending seeks only re-reads what changed.

use std::cmp::Ordering;

use crate::bit_table;
use crate::fst::{ARCS_FOR_BINARY_SEARCH, ARCS_FOR_DIRECT_ADDRESSING, END_LABEL, Fst, FstArc};
use crate::outputs::Outputs;
use crate::reader::FstBytesReader;
use crate::{FstError, Result};

/// An input and its output, borrowed from the enumerator that produced it.
#[derive(Debug, PartialEq, Eq)]
pub struct InputOutput<'e, L, T> {
    pub input: &'e [L],
    pub output: &'e T,
}

impl<L: Clone, T: Clone> InputOutput<'_, L, T> {
    pub fn cloned(&self) -> (Vec<L>, T) {
        (self.input.to_vec(), self.output.clone())
    }
}

fn missing_arc() -> FstError {
    FstError::Corrupt("direct-addressed node has no arc where one is required".into())
}

/// Cursor over the inputs of an [`Fst`] in label order.
///
/// Each enumerator owns its byte cursor, so any number of them can read one
/// FST concurrently.
pub struct FstEnum<'a, O: Outputs> {
    fst: &'a Fst<O>,
    reader: FstBytesReader<'a>,
    arcs: Vec<FstArc<O::Value>>,
    output: Vec<O::Value>,
    current: Vec<i32>,
    target: Vec<i32>,
    upto: usize,
}

impl<O: Outputs> std::fmt::Debug for FstEnum<'_, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FstEnum")
            .field("current", &self.current.get(1..self.upto))
            .field("upto", &self.upto)
            .finish()
    }
}

impl<'a, O: Outputs> FstEnum<'a, O> {
    pub fn new(fst: &'a Fst<O>) -> Self {
        let no_output = fst.outputs().no_output();
        Self {
            fst,
            reader: fst.bytes_reader(),
            arcs: vec![fst.first_arc(), FstArc::new(no_output.clone())],
            output: vec![no_output.clone(), no_output],
            current: vec![0, 0],
            target: Vec::new(),
            upto: 0,
        }
    }

    /// The input the enumerator is positioned on, if any.
    pub fn current(&self) -> Option<InputOutput<'_, i32, O::Value>> {
        (self.upto > 0).then(|| InputOutput {
            input: &self.current[1..self.upto],
            output: &self.output[self.upto],
        })
    }

    /// Advances to the next input. Returns `None` once every input has been
    /// visited; the following call starts over from the first input.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<InputOutput<'_, i32, O::Value>>> {
        self.do_next()?;
        Ok(self.current())
    }

    /// Positions on the smallest input `>= target`.
    pub fn seek_ceil(&mut self, target: &[i32]) -> Result<Option<InputOutput<'_, i32, O::Value>>> {
        self.set_target(target);
        self.do_seek_ceil()?;
        Ok(self.current())
    }

    /// Positions on the largest input `<= target`.
    pub fn seek_floor(&mut self, target: &[i32]) -> Result<Option<InputOutput<'_, i32, O::Value>>> {
        self.set_target(target);
        self.do_seek_floor()?;
        Ok(self.current())
    }

    /// Positions on `target` itself. On a miss the enumerator is reset, so
    /// a following [`next`](Self::next) yields the first input.
    pub fn seek_exact(&mut self, target: &[i32]) -> Result<Option<InputOutput<'_, i32, O::Value>>> {
        self.set_target(target);
        if self.do_seek_exact()? {
            debug_assert_eq!(self.upto, target.len() + 1);
            Ok(self.current())
        } else {
            self.upto = 0;
            Ok(None)
        }
    }

    fn set_target(&mut self, target: &[i32]) {
        self.target.clear();
        self.target.extend_from_slice(target);
    }

    // -----------------------------------------------------------------------
    // Stack helpers
    // -----------------------------------------------------------------------

    fn target_label(&self) -> i32 {
        if self.upto - 1 == self.target.len() {
            END_LABEL
        } else {
            self.target[self.upto - 1]
        }
    }

    fn incr(&mut self) {
        self.upto += 1;
        if self.arcs.len() <= self.upto {
            let no_output = self.fst.outputs().no_output();
            self.arcs.push(FstArc::new(no_output.clone()));
            self.output.push(no_output);
            self.current.push(0);
        }
    }

    /// Sets `output[upto]` from the arc at `upto`.
    fn accumulate(&mut self) {
        let sum = self
            .fst
            .outputs()
            .add(&self.output[self.upto - 1], &self.arcs[self.upto].output);
        self.output[self.upto] = sum;
    }

    /// Reads the first arc leaving `arcs[idx - 1]` into `arcs[idx]`.
    fn read_first_target(&mut self, idx: usize) -> Result<()> {
        let (before, after) = self.arcs.split_at_mut(idx);
        self.fst
            .read_first_target_arc(&before[idx - 1], &mut after[0], &mut self.reader)
    }

    fn read_last_target(&mut self, idx: usize) -> Result<()> {
        let (before, after) = self.arcs.split_at_mut(idx);
        self.fst
            .read_last_target_arc(&before[idx - 1], &mut after[0], &mut self.reader)
    }

    fn read_next(&mut self, idx: usize) -> Result<()> {
        self.fst.read_next_arc(&mut self.arcs[idx], &mut self.reader)
    }

    fn read_by_index(&mut self, idx: i32) -> Result<()> {
        self.fst
            .read_arc_by_index(&mut self.arcs[self.upto], &mut self.reader, idx)
    }

    fn read_by_direct_addressing(&mut self, range_index: i32) -> Result<()> {
        self.fst
            .read_arc_by_direct_addressing(&mut self.arcs[self.upto], &mut self.reader, range_index)
    }

    fn binary_search(&mut self, label: i32) -> Result<i32> {
        self.fst
            .arcs()
            .binary_search(&self.arcs[self.upto], label, &mut self.reader)
    }

    fn is_array_arc(&self) -> bool {
        let arc = &self.arcs[self.upto];
        arc.bytes_per_arc != 0 && arc.label != END_LABEL
    }

    /// Follows the arc at `upto`, which carries `target_label`. Returns
    /// `false` once the whole target has been matched.
    fn descend(&mut self, target_label: i32) -> Result<bool> {
        self.accumulate();
        if target_label == END_LABEL {
            return Ok(false);
        }
        self.current[self.upto] = target_label;
        self.incr();
        self.read_first_target(self.upto)?;
        Ok(true)
    }

    /// Appends the arc at `upto`, then first arcs down to a final state.
    fn push_first(&mut self) -> Result<()> {
        loop {
            self.accumulate();
            let label = self.arcs[self.upto].label;
            if label == END_LABEL {
                return Ok(());
            }
            self.current[self.upto] = label;
            self.incr();
            self.read_first_target(self.upto)?;
        }
    }

    /// Appends the arc at `upto`, then last arcs down to a final state.
    fn push_last(&mut self) -> Result<()> {
        loop {
            let label = self.arcs[self.upto].label;
            self.current[self.upto] = label;
            self.accumulate();
            if label == END_LABEL {
                return Ok(());
            }
            self.incr();
            self.read_last_target(self.upto)?;
        }
    }

    /// The target ran past the last arc: back up to the nearest depth with
    /// a next sibling and take its leftmost path.
    fn rollback_then_push_first(&mut self) -> Result<()> {
        self.upto -= 1;
        while self.upto > 0 {
            if !self.arcs[self.upto].is_last() {
                self.read_next(self.upto)?;
                return self.push_first();
            }
            self.upto -= 1;
        }
        Ok(())
    }

    /// Keeps the part of the stack shared with the target.
    fn rewind_prefix(&mut self) -> Result<()> {
        if self.upto == 0 {
            self.upto = 1;
            return self.read_first_target(1);
        }
        let current_limit = self.upto;
        self.upto = 1;
        while self.upto < current_limit && self.upto <= self.target.len() + 1 {
            match self.current[self.upto].cmp(&self.target_label()) {
                Ordering::Less => break,
                Ordering::Greater => {
                    self.read_first_target(self.upto)?;
                    break;
                }
                Ordering::Equal => self.upto += 1,
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Next
    // -----------------------------------------------------------------------

    fn do_next(&mut self) -> Result<()> {
        if self.upto == 0 {
            self.upto = 1;
            self.read_first_target(1)?;
        } else {
            while self.arcs[self.upto].is_last() {
                self.upto -= 1;
                if self.upto == 0 {
                    return Ok(());
                }
            }
            self.read_next(self.upto)?;
        }
        self.push_first()
    }

    // -----------------------------------------------------------------------
    // Seek ceil
    // -----------------------------------------------------------------------

    fn do_seek_ceil(&mut self) -> Result<()> {
        self.rewind_prefix()?;
        loop {
            let target_label = self.target_label();
            let more = if self.is_array_arc() {
                if self.arcs[self.upto].node_flags == ARCS_FOR_DIRECT_ADDRESSING {
                    self.seek_ceil_direct(target_label)?
                } else {
                    self.seek_ceil_packed(target_label)?
                }
            } else {
                self.seek_ceil_list(target_label)?
            };
            if !more {
                return Ok(());
            }
        }
    }

    fn seek_ceil_direct(&mut self, target_label: i32) -> Result<bool> {
        let arc = &self.arcs[self.upto];
        let (num_arcs, table) = (arc.num_arcs, arc.bit_table_start);
        let mut target_index = target_label - arc.first_label;
        if target_index >= num_arcs {
            self.rollback_then_push_first()?;
            return Ok(false);
        }
        if target_index < 0 {
            target_index = -1;
        } else if bit_table::is_bit_set(&mut self.reader, table, target_index)? {
            self.read_by_direct_addressing(target_index)?;
            return self.descend(target_label);
        }
        let ceil = bit_table::next_bit_set(&mut self.reader, table, num_arcs, target_index)?
            .ok_or_else(missing_arc)?;
        self.read_by_direct_addressing(ceil)?;
        self.push_first()?;
        Ok(false)
    }

    fn seek_ceil_packed(&mut self, target_label: i32) -> Result<bool> {
        let idx = self.binary_search(target_label)?;
        if idx >= 0 {
            self.read_by_index(idx)?;
            return self.descend(target_label);
        }
        let idx = -1 - idx;
        if idx == self.arcs[self.upto].num_arcs {
            self.rollback_then_push_first()?;
        } else {
            self.read_by_index(idx)?;
            self.push_first()?;
        }
        Ok(false)
    }

    fn seek_ceil_list(&mut self, target_label: i32) -> Result<bool> {
        let arc = &self.arcs[self.upto];
        match arc.label.cmp(&target_label) {
            Ordering::Equal => self.descend(target_label),
            Ordering::Greater => {
                self.push_first()?;
                Ok(false)
            }
            Ordering::Less if arc.is_last() => {
                self.rollback_then_push_first()?;
                Ok(false)
            }
            Ordering::Less => {
                self.read_next(self.upto)?;
                Ok(true)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Seek floor
    // -----------------------------------------------------------------------

    fn do_seek_floor(&mut self) -> Result<()> {
        self.rewind_prefix()?;
        loop {
            let target_label = self.target_label();
            let more = if self.is_array_arc() {
                if self.arcs[self.upto].node_flags == ARCS_FOR_DIRECT_ADDRESSING {
                    self.seek_floor_direct(target_label)?
                } else {
                    self.seek_floor_packed(target_label)?
                }
            } else {
                self.seek_floor_list(target_label)?
            };
            if !more {
                return Ok(());
            }
        }
    }

    fn seek_floor_direct(&mut self, target_label: i32) -> Result<bool> {
        let arc = &self.arcs[self.upto];
        let (num_arcs, table) = (arc.num_arcs, arc.bit_table_start);
        let target_index = target_label - arc.first_label;
        if target_index < 0 {
            return self.backtrack_to_floor_arc(target_label);
        }
        if target_index >= num_arcs {
            self.fst
                .read_last_arc_by_direct_addressing(&mut self.arcs[self.upto], &mut self.reader)?;
        } else if bit_table::is_bit_set(&mut self.reader, table, target_index)? {
            self.read_by_direct_addressing(target_index)?;
            return self.descend(target_label);
        } else {
            let floor = bit_table::previous_bit_set(&mut self.reader, table, target_index)?
                .ok_or_else(missing_arc)?;
            self.read_by_direct_addressing(floor)?;
        }
        self.push_last()?;
        Ok(false)
    }

    fn seek_floor_packed(&mut self, target_label: i32) -> Result<bool> {
        let idx = self.binary_search(target_label)?;
        if idx >= 0 {
            self.read_by_index(idx)?;
            return self.descend(target_label);
        }
        if idx == -1 {
            return self.backtrack_to_floor_arc(target_label);
        }
        // Floor is the arc before the insertion point.
        self.read_by_index(-2 - idx)?;
        self.push_last()?;
        Ok(false)
    }

    fn seek_floor_list(&mut self, target_label: i32) -> Result<bool> {
        let arc = &self.arcs[self.upto];
        match arc.label.cmp(&target_label) {
            Ordering::Equal => self.descend(target_label),
            Ordering::Greater => self.backtrack_to_floor_arc(target_label),
            Ordering::Less => {
                if !arc.is_last() {
                    let next_label = self
                        .fst
                        .read_next_arc_label(&self.arcs[self.upto], &mut self.reader)?;
                    if next_label <= target_label {
                        self.read_next(self.upto)?;
                        return Ok(true);
                    }
                }
                self.push_last()?;
                Ok(false)
            }
        }
    }

    /// Every arc at this depth is above the target. Walks up until a node
    /// has an arc below the target label at its depth, takes the closest
    /// such arc and then the rightmost path below it.
    fn backtrack_to_floor_arc(&mut self, mut target_label: i32) -> Result<bool> {
        loop {
            self.read_first_target(self.upto)?;
            let arc = &self.arcs[self.upto];
            if arc.label < target_label {
                if !arc.is_last() {
                    if self.is_array_arc() {
                        if self.arcs[self.upto].node_flags == ARCS_FOR_BINARY_SEARCH {
                            self.find_floor_arc_packed(target_label)?;
                        } else {
                            self.find_floor_arc_direct(target_label)?;
                        }
                    } else {
                        while !self.arcs[self.upto].is_last()
                            && self
                                .fst
                                .read_next_arc_label(&self.arcs[self.upto], &mut self.reader)?
                                < target_label
                        {
                            self.read_next(self.upto)?;
                        }
                    }
                }
                self.push_last()?;
                return Ok(false);
            }
            self.upto -= 1;
            if self.upto == 0 {
                return Ok(false);
            }
            target_label = self.target_label();
        }
    }

    /// From the first arc of a direct-addressed node, moves to the last arc
    /// strictly below `target_label`.
    fn find_floor_arc_direct(&mut self, target_label: i32) -> Result<()> {
        let arc = &self.arcs[self.upto];
        if arc.num_arcs <= 1 {
            return Ok(());
        }
        let target_index = target_label - arc.first_label;
        if target_index >= arc.num_arcs {
            self.fst
                .read_last_arc_by_direct_addressing(&mut self.arcs[self.upto], &mut self.reader)?;
        } else if let Some(floor) =
            bit_table::previous_bit_set(&mut self.reader, arc.bit_table_start, target_index)?
        {
            if floor > 0 {
                self.read_by_direct_addressing(floor)?;
            }
        }
        Ok(())
    }

    /// Same as [`find_floor_arc_direct`](Self::find_floor_arc_direct) for a
    /// binary-search node.
    fn find_floor_arc_packed(&mut self, target_label: i32) -> Result<()> {
        if self.arcs[self.upto].num_arcs <= 1 {
            return Ok(());
        }
        let idx = self.binary_search(target_label)?;
        if idx > 1 {
            self.read_by_index(idx - 1)?;
        } else if idx < -2 {
            self.read_by_index(-2 - idx)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Seek exact
    // -----------------------------------------------------------------------

    fn do_seek_exact(&mut self) -> Result<bool> {
        self.rewind_prefix()?;
        let mut target_label = self.target_label();
        loop {
            let found = {
                let (before, after) = self.arcs.split_at_mut(self.upto);
                self.fst.find_target_arc(
                    target_label,
                    &before[self.upto - 1],
                    &mut after[0],
                    &mut self.reader,
                )?
            };
            if !found {
                return Ok(false);
            }
            self.accumulate();
            if target_label == END_LABEL {
                return Ok(true);
            }
            self.current[self.upto] = target_label;
            self.incr();
            target_label = self.target_label();
        }
    }
}

/// [`FstEnum`] over a byte-alphabet FST, taking and yielding byte strings.
pub struct BytesFstEnum<'a, O: Outputs> {
    inner: FstEnum<'a, O>,
    target: Vec<i32>,
    current: Vec<u8>,
}

impl<O: Outputs> std::fmt::Debug for BytesFstEnum<'_, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BytesFstEnum").field("inner", &self.inner).finish()
    }
}

impl<'a, O: Outputs> BytesFstEnum<'a, O> {
    pub fn new(fst: &'a Fst<O>) -> Self {
        debug_assert_eq!(fst.input_type(), lexfst_core::InputType::Byte1);
        Self {
            inner: FstEnum::new(fst),
            target: Vec::new(),
            current: Vec::new(),
        }
    }

    fn to_bytes<'e, T>(
        found: Option<InputOutput<'e, i32, T>>,
        buf: &'e mut Vec<u8>,
    ) -> Option<InputOutput<'e, u8, T>> {
        let found = found?;
        buf.clear();
        buf.extend(found.input.iter().map(|&label| label as u8));
        let input: &'e [u8] = buf;
        Some(InputOutput {
            input,
            output: found.output,
        })
    }

    fn set_target(&mut self, target: &[u8]) {
        self.target.clear();
        self.target.extend(target.iter().map(|&b| i32::from(b)));
    }

    pub fn current(&mut self) -> Option<InputOutput<'_, u8, O::Value>> {
        Self::to_bytes(self.inner.current(), &mut self.current)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<InputOutput<'_, u8, O::Value>>> {
        let found = self.inner.next()?;
        Ok(Self::to_bytes(found, &mut self.current))
    }

    pub fn seek_ceil(&mut self, target: &[u8]) -> Result<Option<InputOutput<'_, u8, O::Value>>> {
        self.set_target(target);
        let found = self.inner.seek_ceil(&self.target)?;
        Ok(Self::to_bytes(found, &mut self.current))
    }

    pub fn seek_floor(&mut self, target: &[u8]) -> Result<Option<InputOutput<'_, u8, O::Value>>> {
        self.set_target(target);
        let found = self.inner.seek_floor(&self.target)?;
        Ok(Self::to_bytes(found, &mut self.current))
    }

    pub fn seek_exact(&mut self, target: &[u8]) -> Result<Option<InputOutput<'_, u8, O::Value>>> {
        self.set_target(target);
        let found = self.inner.seek_exact(&self.target)?;
        Ok(Self::to_bytes(found, &mut self.current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{BuilderOptions, FstBuilder};
    use crate::outputs::PositiveIntOutputs;
    use lexfst_core::InputType;

    fn build(keys: &[(&[u8], u64)], options: BuilderOptions) -> Fst<PositiveIntOutputs> {
        let mut b = FstBuilder::with_options(InputType::Byte1, PositiveIntOutputs, options).unwrap();
        for (k, v) in keys {
            b.add_bytes(k, *v).unwrap();
        }
        b.finish().unwrap().unwrap()
    }

    fn layouts() -> Vec<BuilderOptions> {
        vec![
            BuilderOptions::default(),
            BuilderOptions {
                allow_fixed_length_arcs: false,
                ..BuilderOptions::default()
            },
            BuilderOptions {
                direct_addressing_max_oversizing_factor: -1.0,
                ..BuilderOptions::default()
            },
        ]
    }

    fn owned(found: Option<InputOutput<'_, u8, u64>>) -> Option<(Vec<u8>, u64)> {
        found.map(|io| io.cloned())
    }

    const WORDS: &[(&[u8], u64)] = &[(b"car", 2), (b"care", 3), (b"cat", 1), (b"dog", 4)];

    #[test]
    fn next_walks_in_order() {
        for options in layouts() {
            let fst = build(WORDS, options);
            let mut e = BytesFstEnum::new(&fst);
            let mut seen = Vec::new();
            while let Some(io) = e.next().unwrap() {
                seen.push(io.cloned());
            }
            let expected: Vec<_> = WORDS.iter().map(|(k, v)| (k.to_vec(), *v)).collect();
            assert_eq!(seen, expected);
        }
    }

    #[test]
    fn seeks_on_small_set() {
        for options in layouts() {
            let fst = build(WORDS, options);
            let mut e = BytesFstEnum::new(&fst);
            assert_eq!(owned(e.seek_exact(b"car").unwrap()), Some((b"car".to_vec(), 2)));
            assert_eq!(owned(e.seek_ceil(b"care").unwrap()), Some((b"care".to_vec(), 3)));
            assert_eq!(owned(e.seek_floor(b"cats").unwrap()), Some((b"cat".to_vec(), 1)));
            assert_eq!(owned(e.seek_ceil(b"cb").unwrap()), Some((b"dog".to_vec(), 4)));
            assert_eq!(owned(e.seek_floor(b"cb").unwrap()), Some((b"cat".to_vec(), 1)));
            assert_eq!(owned(e.seek_floor(b"carb").unwrap()), Some((b"car".to_vec(), 2)));
            assert_eq!(owned(e.seek_ceil(b"").unwrap()), Some((b"car".to_vec(), 2)));
            assert_eq!(owned(e.seek_floor(b"a").unwrap()), None);
            assert_eq!(owned(e.seek_ceil(b"dogs").unwrap()), None);
            assert_eq!(owned(e.seek_floor(b"zzz").unwrap()), Some((b"dog".to_vec(), 4)));
        }
    }

    #[test]
    fn failed_exact_seek_resets() {
        let fst = build(WORDS, BuilderOptions::default());
        let mut e = BytesFstEnum::new(&fst);
        assert!(e.seek_exact(b"ca").unwrap().is_none());
        assert!(e.current().is_none());
        assert_eq!(owned(e.next().unwrap()), Some((b"car".to_vec(), 2)));
        assert!(e.seek_exact(b"cars").unwrap().is_none());
        assert_eq!(owned(e.seek_exact(b"dog").unwrap()), Some((b"dog".to_vec(), 4)));
    }

    #[test]
    fn next_after_seek_continues() {
        let fst = build(WORDS, BuilderOptions::default());
        let mut e = BytesFstEnum::new(&fst);
        e.seek_ceil(b"cas").unwrap();
        assert_eq!(owned(e.next().unwrap()), Some((b"dog".to_vec(), 4)));
        assert!(e.next().unwrap().is_none());
    }

    #[test]
    fn empty_input_is_first() {
        let fst = build(&[(b"", 7), (b"a", 1)], BuilderOptions::default());
        let mut e = BytesFstEnum::new(&fst);
        assert_eq!(owned(e.next().unwrap()), Some((Vec::new(), 7)));
        assert_eq!(owned(e.next().unwrap()), Some((b"a".to_vec(), 1)));
        assert!(e.next().unwrap().is_none());
        assert_eq!(owned(e.seek_floor(b"").unwrap()), Some((Vec::new(), 7)));
        assert_eq!(owned(e.seek_exact(b"").unwrap()), Some((Vec::new(), 7)));
    }

    #[test]
    fn dense_and_sparse_nodes() {
        // Wide fan-out at the root forces a fixed-length node; the dense
        // run favours direct addressing.
        let mut keys: Vec<(Vec<u8>, u64)> = (b'a'..=b'z').map(|c| (vec![c, b'x'], u64::from(c))).collect();
        keys.retain(|(k, _)| k[0] != b'm');
        for options in layouts() {
            let mut b = FstBuilder::with_options(InputType::Byte1, PositiveIntOutputs, options).unwrap();
            for (k, v) in &keys {
                b.add_bytes(k, *v).unwrap();
            }
            let fst = b.finish().unwrap().unwrap();
            let mut e = BytesFstEnum::new(&fst);
            assert_eq!(owned(e.seek_ceil(b"m").unwrap()), Some((b"nx".to_vec(), u64::from(b'n'))));
            assert_eq!(owned(e.seek_floor(b"m").unwrap()), Some((b"lx".to_vec(), u64::from(b'l'))));
            assert_eq!(owned(e.seek_floor(b"a").unwrap()), None);
            assert_eq!(owned(e.seek_floor(b"ax").unwrap()), Some((b"ax".to_vec(), u64::from(b'a'))));
            assert_eq!(owned(e.seek_ceil(b"zy").unwrap()), None);
            assert_eq!(owned(e.seek_exact(b"qx").unwrap()), Some((b"qx".to_vec(), u64::from(b'q'))));
            assert!(e.seek_exact(b"mx").unwrap().is_none());
        }
    }
}
