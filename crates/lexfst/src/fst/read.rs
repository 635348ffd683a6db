// Arc decoding and navigation over reversed node bytes.
//
// All positions here assume a reversed cursor: a node's address is its last
// byte, and reading walks towards lower addresses. Fixed-length arc arrays
// therefore sit at `pos_arcs_start - i * bytes_per_arc`.

use lexfst_core::InputType;

use super::{
    ARCS_FOR_BINARY_SEARCH, ARCS_FOR_DIRECT_ADDRESSING, BIT_ARC_HAS_FINAL_OUTPUT,
    BIT_ARC_HAS_OUTPUT, BIT_FINAL_ARC, BIT_LAST_ARC, BIT_STOP_NODE, BIT_TARGET_NEXT, END_LABEL,
    FINAL_END_NODE, FstArc, NON_FINAL_END_NODE,
};
use crate::bit_table;
use crate::outputs::Outputs;
use crate::reader::BytesReader;
use crate::{FstError, Result};

#[inline]
fn flag(flags: u8, bit: u8) -> bool {
    flags & bit != 0
}

#[inline]
fn is_fixed_length(node_flags: u8) -> bool {
    node_flags == ARCS_FOR_BINARY_SEARCH || node_flags == ARCS_FOR_DIRECT_ADDRESSING
}

/// Decodes arcs for one output algebra and alphabet width.
///
/// Shared by the frozen [`Fst`](super::Fst) and by the builder, which reads
/// back already-frozen nodes when deduplicating suffixes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ArcReader<'o, O> {
    pub outputs: &'o O,
    pub input_type: InputType,
}

impl<'o, O: Outputs> ArcReader<'o, O> {
    pub fn new(outputs: &'o O, input_type: InputType) -> Self {
        Self { outputs, input_type }
    }

    #[inline]
    fn read_label<R: BytesReader + ?Sized>(&self, r: &mut R) -> Result<i32> {
        Ok(self.input_type.read_label(r)?)
    }

    fn read_count<R: BytesReader + ?Sized>(&self, r: &mut R, what: &str) -> Result<i32> {
        let v = r.read_vint()?;
        match i32::try_from(v) {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(FstError::Corrupt(format!("invalid {what} {v} at {}", r.position()))),
        }
    }

    fn read_target<R: BytesReader + ?Sized>(&self, r: &mut R) -> Result<i64> {
        let v = r.read_vlong()?;
        // Children are frozen before their parents, so a target never lies
        // above the bytes of the node that points at it.
        match i64::try_from(v) {
            Ok(t) if t > 0 && t <= r.position() => Ok(t),
            _ => Err(FstError::Corrupt(format!("invalid target address {v} at {}", r.position()))),
        }
    }

    /// Reads the header of a fixed-length node; the cursor sits right after
    /// the node flag byte.
    fn read_fixed_header<R: BytesReader + ?Sized>(
        &self,
        node_flags: u8,
        arc: &mut FstArc<O::Value>,
        r: &mut R,
    ) -> Result<()> {
        arc.num_arcs = self.read_count(r, "arc count")?;
        arc.bytes_per_arc = self.read_count(r, "bytes per arc")?;
        if node_flags == ARCS_FOR_DIRECT_ADDRESSING {
            arc.bit_table_start = r.position();
            r.skip_bytes(bit_table::presence_bytes(arc.num_arcs) as i64);
            arc.first_label = self.read_label(r)?;
            arc.presence_index = -1;
        }
        arc.pos_arcs_start = r.position();
        Ok(())
    }

    /// Reads the first real arc of the node at `node`.
    pub fn read_first_real_target_arc<R: BytesReader + ?Sized>(
        &self,
        node: i64,
        arc: &mut FstArc<O::Value>,
        r: &mut R,
    ) -> Result<()> {
        r.set_position(node);
        let node_flags = r.read_byte()?;
        arc.node_flags = node_flags;
        if is_fixed_length(node_flags) {
            self.read_fixed_header(node_flags, arc, r)?;
            arc.arc_idx = -1;
        } else {
            arc.next_arc = node;
            arc.bytes_per_arc = 0;
        }
        self.read_next_real_arc(arc, r)
    }

    /// Follows `follow` and reads the first arc of its target. A final
    /// `follow` yields the [`END_LABEL`] pseudo-arc first.
    pub fn read_first_target_arc<R: BytesReader + ?Sized>(
        &self,
        follow: &FstArc<O::Value>,
        arc: &mut FstArc<O::Value>,
        r: &mut R,
    ) -> Result<()> {
        if follow.is_final() {
            self.end_arc(follow, arc);
            Ok(())
        } else {
            self.read_first_real_target_arc(follow.target, arc, r)
        }
    }

    fn end_arc(&self, follow: &FstArc<O::Value>, arc: &mut FstArc<O::Value>) {
        arc.label = END_LABEL;
        arc.output = follow.next_final_output.clone();
        arc.next_final_output = self.outputs.no_output();
        arc.flags = BIT_FINAL_ARC;
        if follow.target <= 0 {
            arc.flags |= BIT_LAST_ARC;
        } else {
            // Holds a node address here, not an arc position.
            arc.next_arc = follow.target;
        }
        arc.target = FINAL_END_NODE;
        arc.node_flags = arc.flags;
        arc.bytes_per_arc = 0;
    }

    /// Advances to the next sibling. The caller checks `!arc.is_last()`.
    pub fn read_next_arc<R: BytesReader + ?Sized>(
        &self,
        arc: &mut FstArc<O::Value>,
        r: &mut R,
    ) -> Result<()> {
        if arc.label == END_LABEL {
            if arc.next_arc <= 0 {
                return Err(FstError::Corrupt("read past the last arc".into()));
            }
            self.read_first_real_target_arc(arc.next_arc, arc, r)
        } else {
            self.read_next_real_arc(arc, r)
        }
    }

    pub fn read_next_real_arc<R: BytesReader + ?Sized>(
        &self,
        arc: &mut FstArc<O::Value>,
        r: &mut R,
    ) -> Result<()> {
        match arc.node_flags {
            ARCS_FOR_BINARY_SEARCH => {
                arc.arc_idx += 1;
                if arc.arc_idx >= arc.num_arcs {
                    return Err(FstError::Corrupt("read past the last arc".into()));
                }
                r.set_position(arc.pos_arcs_start - arc.arc_idx as i64 * arc.bytes_per_arc as i64);
                arc.flags = r.read_byte()?;
            }
            ARCS_FOR_DIRECT_ADDRESSING => {
                let next = bit_table::next_bit_set(r, arc.bit_table_start, arc.num_arcs, arc.arc_idx)?
                    .ok_or_else(|| FstError::Corrupt("read past the last arc".into()))?;
                return self.read_arc_by_direct_addressing(arc, r, next);
            }
            _ => {
                r.set_position(arc.next_arc);
                arc.flags = r.read_byte()?;
            }
        }
        self.read_arc(arc, r)
    }

    /// Reads arc `idx` of a binary-search node whose header is already in `arc`.
    pub fn read_arc_by_index<R: BytesReader + ?Sized>(
        &self,
        arc: &mut FstArc<O::Value>,
        r: &mut R,
        idx: i32,
    ) -> Result<()> {
        debug_assert_eq!(arc.node_flags, ARCS_FOR_BINARY_SEARCH);
        debug_assert!(idx >= 0 && idx < arc.num_arcs);
        r.set_position(arc.pos_arcs_start - idx as i64 * arc.bytes_per_arc as i64);
        arc.arc_idx = idx;
        arc.flags = r.read_byte()?;
        self.read_arc(arc, r)
    }

    /// Reads the arc at offset `range_index` of a direct-addressed node. The
    /// presence bit must be set.
    pub fn read_arc_by_direct_addressing<R: BytesReader + ?Sized>(
        &self,
        arc: &mut FstArc<O::Value>,
        r: &mut R,
        range_index: i32,
    ) -> Result<()> {
        let presence_index = bit_table::count_bits_up_to(r, arc.bit_table_start, range_index)?;
        self.read_arc_at_presence(arc, r, range_index, presence_index)
    }

    fn read_arc_at_presence<R: BytesReader + ?Sized>(
        &self,
        arc: &mut FstArc<O::Value>,
        r: &mut R,
        range_index: i32,
        presence_index: i32,
    ) -> Result<()> {
        r.set_position(arc.pos_arcs_start - presence_index as i64 * arc.bytes_per_arc as i64);
        arc.arc_idx = range_index;
        arc.presence_index = presence_index;
        arc.flags = r.read_byte()?;
        self.read_arc(arc, r)
    }

    pub fn read_last_arc_by_direct_addressing<R: BytesReader + ?Sized>(
        &self,
        arc: &mut FstArc<O::Value>,
        r: &mut R,
    ) -> Result<()> {
        let presence_index = bit_table::count_bits(r, arc.bit_table_start, arc.num_arcs)? - 1;
        self.read_arc_at_presence(arc, r, arc.num_arcs - 1, presence_index)
    }

    /// Decodes the arc body; `arc.flags` and array metadata are already set
    /// and the cursor sits after the flag byte.
    fn read_arc<R: BytesReader + ?Sized>(&self, arc: &mut FstArc<O::Value>, r: &mut R) -> Result<()> {
        arc.label = if arc.node_flags == ARCS_FOR_DIRECT_ADDRESSING {
            arc.first_label + arc.arc_idx
        } else {
            self.read_label(r)?
        };
        arc.output = if arc.flag(BIT_ARC_HAS_OUTPUT) {
            self.outputs.read(r)?
        } else {
            self.outputs.no_output()
        };
        arc.next_final_output = if arc.flag(BIT_ARC_HAS_FINAL_OUTPUT) {
            self.outputs.read_final_output(r)?
        } else {
            self.outputs.no_output()
        };
        if arc.flag(BIT_STOP_NODE) {
            arc.target = if arc.flag(BIT_FINAL_ARC) {
                FINAL_END_NODE
            } else {
                NON_FINAL_END_NODE
            };
            arc.next_arc = r.position();
        } else if arc.flag(BIT_TARGET_NEXT) {
            arc.next_arc = r.position();
            if !arc.flag(BIT_LAST_ARC) {
                if arc.bytes_per_arc == 0 {
                    self.seek_to_next_node(r)?;
                } else {
                    let num_arcs = if arc.node_flags == ARCS_FOR_DIRECT_ADDRESSING {
                        bit_table::count_bits(r, arc.bit_table_start, arc.num_arcs)?
                    } else {
                        arc.num_arcs
                    };
                    r.set_position(arc.pos_arcs_start - arc.bytes_per_arc as i64 * num_arcs as i64);
                }
            }
            arc.target = r.position();
        } else {
            arc.target = self.read_target(r)?;
            arc.next_arc = r.position();
        }
        Ok(())
    }

    /// Skips the remaining arcs of a variable-length node.
    fn seek_to_next_node<R: BytesReader + ?Sized>(&self, r: &mut R) -> Result<()> {
        loop {
            let flags = r.read_byte()?;
            self.read_label(r)?;
            if flag(flags, BIT_ARC_HAS_OUTPUT) {
                self.outputs.skip_output(r)?;
            }
            if flag(flags, BIT_ARC_HAS_FINAL_OUTPUT) {
                self.outputs.skip_final_output(r)?;
            }
            if !flag(flags, BIT_STOP_NODE) && !flag(flags, BIT_TARGET_NEXT) {
                self.read_target(r)?;
            }
            if flag(flags, BIT_LAST_ARC) {
                return Ok(());
            }
        }
    }

    /// Peeks the label of the arc after `arc` without moving `arc`. The
    /// caller checks `!arc.is_last()`.
    pub fn read_next_arc_label<R: BytesReader + ?Sized>(
        &self,
        arc: &FstArc<O::Value>,
        r: &mut R,
    ) -> Result<i32> {
        if arc.label == END_LABEL {
            r.set_position(arc.next_arc);
            let node_flags = r.read_byte()?;
            if is_fixed_length(node_flags) {
                let num_arcs = self.read_count(r, "arc count")?;
                r.read_vint()?;
                if node_flags == ARCS_FOR_BINARY_SEARCH {
                    // Arc flags of the first arc.
                    r.read_byte()?;
                } else {
                    r.skip_bytes(bit_table::presence_bytes(num_arcs) as i64);
                }
            }
        } else {
            match arc.node_flags {
                ARCS_FOR_BINARY_SEARCH => {
                    r.set_position(arc.pos_arcs_start - (arc.arc_idx as i64 + 1) * arc.bytes_per_arc as i64);
                    r.skip_bytes(1);
                }
                ARCS_FOR_DIRECT_ADDRESSING => {
                    let next =
                        bit_table::next_bit_set(r, arc.bit_table_start, arc.num_arcs, arc.arc_idx)?
                            .ok_or_else(|| FstError::Corrupt("read past the last arc".into()))?;
                    return Ok(arc.first_label + next);
                }
                _ => {
                    r.set_position(arc.next_arc);
                    r.skip_bytes(1);
                }
            }
        }
        self.read_label(r)
    }

    /// Follows `follow` and reads the last arc of its target.
    pub fn read_last_target_arc<R: BytesReader + ?Sized>(
        &self,
        follow: &FstArc<O::Value>,
        arc: &mut FstArc<O::Value>,
        r: &mut R,
    ) -> Result<()> {
        if !follow.target_has_arcs() {
            if !follow.is_final() {
                return Err(FstError::Corrupt(format!(
                    "arc with label {} leads nowhere and is not final",
                    follow.label
                )));
            }
            arc.label = END_LABEL;
            arc.target = FINAL_END_NODE;
            arc.output = follow.next_final_output.clone();
            arc.next_final_output = self.outputs.no_output();
            arc.flags = BIT_FINAL_ARC | BIT_LAST_ARC;
            arc.node_flags = arc.flags;
            arc.bytes_per_arc = 0;
            return Ok(());
        }
        r.set_position(follow.target);
        let node_flags = r.read_byte()?;
        arc.node_flags = node_flags;
        if is_fixed_length(node_flags) {
            self.read_fixed_header(node_flags, arc, r)?;
            if node_flags == ARCS_FOR_DIRECT_ADDRESSING {
                self.read_last_arc_by_direct_addressing(arc, r)
            } else {
                arc.arc_idx = arc.num_arcs - 2;
                self.read_next_real_arc(arc, r)
            }
        } else {
            arc.flags = node_flags;
            arc.bytes_per_arc = 0;
            while !arc.is_last() {
                self.read_label(r)?;
                if arc.flag(BIT_ARC_HAS_OUTPUT) {
                    self.outputs.skip_output(r)?;
                }
                if arc.flag(BIT_ARC_HAS_FINAL_OUTPUT) {
                    self.outputs.skip_final_output(r)?;
                }
                if !arc.flag(BIT_STOP_NODE) && !arc.flag(BIT_TARGET_NEXT) {
                    self.read_target(r)?;
                }
                arc.flags = r.read_byte()?;
            }
            // Step back onto the flag byte just read.
            r.skip_bytes(-1);
            arc.next_arc = r.position();
            self.read_next_real_arc(arc, r)
        }
    }

    /// Binary search for `label` in a binary-search node, from `arc.arc_idx`
    /// to the last arc. Returns the arc index, or `-1 - insertion_point`.
    pub fn binary_search<R: BytesReader + ?Sized>(
        &self,
        arc: &FstArc<O::Value>,
        label: i32,
        r: &mut R,
    ) -> Result<i32> {
        debug_assert_eq!(arc.node_flags, ARCS_FOR_BINARY_SEARCH);
        let (mut low, mut high) = (arc.arc_idx.max(0), arc.num_arcs - 1);
        while low <= high {
            let mid = (low + high) >> 1;
            r.set_position(arc.pos_arcs_start - arc.bytes_per_arc as i64 * mid as i64);
            r.skip_bytes(1);
            match self.read_label(r)?.cmp(&label) {
                std::cmp::Ordering::Less => low = mid + 1,
                std::cmp::Ordering::Greater => high = mid - 1,
                std::cmp::Ordering::Equal => return Ok(mid),
            }
        }
        Ok(-1 - low)
    }

    /// Finds the arc labelled `label` leaving `follow`'s target. Returns
    /// `false` when there is none; `arc` is then unspecified.
    pub fn find_target_arc<R: BytesReader + ?Sized>(
        &self,
        label: i32,
        follow: &FstArc<O::Value>,
        arc: &mut FstArc<O::Value>,
        r: &mut R,
    ) -> Result<bool> {
        if label == END_LABEL {
            if !follow.is_final() {
                return Ok(false);
            }
            self.end_arc(follow, arc);
            return Ok(true);
        }
        if !follow.target_has_arcs() {
            return Ok(false);
        }
        r.set_position(follow.target);
        let node_flags = r.read_byte()?;
        arc.node_flags = node_flags;
        match node_flags {
            ARCS_FOR_DIRECT_ADDRESSING => {
                self.read_fixed_header(node_flags, arc, r)?;
                let index = label - arc.first_label;
                if index < 0 || index >= arc.num_arcs {
                    return Ok(false);
                }
                if !bit_table::is_bit_set(r, arc.bit_table_start, index)? {
                    return Ok(false);
                }
                self.read_arc_by_direct_addressing(arc, r, index)?;
                Ok(true)
            }
            ARCS_FOR_BINARY_SEARCH => {
                self.read_fixed_header(node_flags, arc, r)?;
                arc.arc_idx = 0;
                let idx = self.binary_search(arc, label, r)?;
                if idx < 0 {
                    return Ok(false);
                }
                self.read_arc_by_index(arc, r, idx)?;
                Ok(true)
            }
            _ => {
                self.read_first_real_target_arc(follow.target, arc, r)?;
                loop {
                    if arc.label == label {
                        return Ok(true);
                    }
                    if arc.label > label || arc.is_last() {
                        return Ok(false);
                    }
                    self.read_next_real_arc(arc, r)?;
                }
            }
        }
    }
}
