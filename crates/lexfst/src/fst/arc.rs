// Transient view of one arc, decoded on demand from FST bytes.

use super::{
    ARCS_FOR_BINARY_SEARCH, ARCS_FOR_DIRECT_ADDRESSING, BIT_FINAL_ARC, BIT_LAST_ARC, END_LABEL,
};

/// One decoded arc plus the node metadata needed to step to its siblings.
///
/// Nothing is cached in the FST: every navigation call overwrites an arc
/// owned by the caller. For fixed-length nodes the array fields locate the
/// arc inside its node; for direct addressing `arc_idx` is the offset from
/// `first_label` and `num_arcs` is the label range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FstArc<T> {
    pub(crate) label: i32,
    pub(crate) output: T,
    pub(crate) target: i64,
    pub(crate) flags: u8,
    pub(crate) next_final_output: T,
    pub(crate) next_arc: i64,
    pub(crate) node_flags: u8,
    pub(crate) pos_arcs_start: i64,
    pub(crate) bytes_per_arc: i32,
    pub(crate) arc_idx: i32,
    pub(crate) num_arcs: i32,
    pub(crate) bit_table_start: i64,
    pub(crate) first_label: i32,
    pub(crate) presence_index: i32,
}

impl<T> FstArc<T> {
    /// A blank scratch arc; navigation calls overwrite it.
    pub fn new(no_output: T) -> Self
    where
        T: Clone,
    {
        Self {
            label: 0,
            output: no_output.clone(),
            target: 0,
            flags: 0,
            next_final_output: no_output,
            next_arc: 0,
            node_flags: 0,
            pos_arcs_start: 0,
            bytes_per_arc: 0,
            arc_idx: 0,
            num_arcs: 0,
            bit_table_start: 0,
            first_label: 0,
            presence_index: 0,
        }
    }

    #[inline]
    pub(crate) fn flag(&self, bit: u8) -> bool {
        self.flags & bit != 0
    }

    /// Label, or [`END_LABEL`] for the pseudo-arc marking a final state.
    #[inline]
    pub fn label(&self) -> i32 {
        self.label
    }

    #[inline]
    pub fn output(&self) -> &T {
        &self.output
    }

    /// Address of the target node; `0` and `-1` are the non-final and
    /// final arc-less sentinels.
    #[inline]
    pub fn target(&self) -> i64 {
        self.target
    }

    /// Output to append when the input ends right after this arc.
    #[inline]
    pub fn next_final_output(&self) -> &T {
        &self.next_final_output
    }

    #[inline]
    pub fn is_final(&self) -> bool {
        self.flag(BIT_FINAL_ARC)
    }

    #[inline]
    pub fn is_last(&self) -> bool {
        self.flag(BIT_LAST_ARC)
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.label == END_LABEL
    }

    #[inline]
    pub fn target_has_arcs(&self) -> bool {
        self.target > 0
    }

    pub fn bytes_per_arc(&self) -> i32 {
        self.bytes_per_arc
    }

    pub fn arc_idx(&self) -> i32 {
        self.arc_idx
    }

    pub fn num_arcs(&self) -> i32 {
        self.num_arcs
    }

    pub fn first_label(&self) -> i32 {
        self.first_label
    }

    pub fn node_flags(&self) -> u8 {
        self.node_flags
    }

    pub fn uses_binary_search(&self) -> bool {
        self.bytes_per_arc != 0 && self.node_flags == ARCS_FOR_BINARY_SEARCH
    }

    pub fn uses_direct_addressing(&self) -> bool {
        self.bytes_per_arc != 0 && self.node_flags == ARCS_FOR_DIRECT_ADDRESSING
    }
}
