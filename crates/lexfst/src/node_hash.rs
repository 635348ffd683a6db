// Suffix sharing: dedup of frozen nodes by structure.

use std::hash::BuildHasher;

use hashbrown::DefaultHashBuilder;
use tracing::trace;

use crate::Result;
use crate::bit_table;
use crate::builder::node::UncompiledNode;
use crate::builder::writer::NodeCompiler;
use crate::fst::{ARCS_FOR_BINARY_SEARCH, ArcReader, FstArc};
use crate::outputs::Outputs;
use crate::reader::BytesReader;

const PRIME: u64 = 31;
const INITIAL_SIZE: usize = 16;

/// Open-addressed table of frozen node addresses, keyed by node structure.
///
/// Slots hold addresses; `0` marks an empty slot, which is safe because no
/// real node lives at address 0. Probing is quadratic over a power-of-two
/// table that doubles past 2/3 occupancy. Hashes of frozen nodes are
/// recomputed from their bytes, so the table stores nothing else.
#[derive(Debug)]
pub(crate) struct NodeHash {
    table: Vec<i64>,
    count: usize,
    mask: usize,
    hasher: DefaultHashBuilder,
}

/// Sentinel targets compare by finality only.
#[inline]
fn normalized_target(target: i64, is_final: bool) -> i64 {
    if target > 0 {
        target
    } else if is_final {
        -1
    } else {
        0
    }
}

impl NodeHash {
    pub fn new() -> Self {
        Self {
            table: vec![0; INITIAL_SIZE],
            count: 0,
            mask: INITIAL_SIZE - 1,
            hasher: DefaultHashBuilder::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    fn mix<T: std::hash::Hash>(&self, h: u64, label: i32, target: i64, output: &T, next_final: &T, is_final: bool) -> u64 {
        let t = target as u64;
        let mut h = h.wrapping_mul(PRIME).wrapping_add(label as u32 as u64);
        h = h.wrapping_mul(PRIME).wrapping_add(t ^ (t >> 32));
        h = h.wrapping_mul(PRIME).wrapping_add(self.hasher.hash_one(output));
        h = h.wrapping_mul(PRIME).wrapping_add(self.hasher.hash_one(next_final));
        if is_final {
            h = h.wrapping_add(17);
        }
        h
    }

    /// Hash of a node about to be frozen. Must equal [`hash_frozen`] of the
    /// node once written.
    fn hash_node<T: std::hash::Hash>(&self, node: &UncompiledNode<T>) -> u64 {
        let mut h = 0;
        for arc in &node.arcs {
            let target = normalized_target(arc.target.address(), arc.is_final);
            h = self.mix(h, arc.label, target, &arc.output, &arc.next_final_output, arc.is_final);
        }
        h & i64::MAX as u64
    }

    fn hash_frozen<O: Outputs>(&self, compiler: &NodeCompiler<O>, address: i64) -> Result<u64> {
        let arcs = ArcReader::new(&compiler.outputs, compiler.input_type);
        let mut r = compiler.bytes.reverse_reader(true);
        let mut arc = FstArc::new(compiler.outputs.no_output());
        arcs.read_first_real_target_arc(address, &mut arc, &mut r)?;
        let mut h = 0;
        loop {
            let target = normalized_target(arc.target, arc.is_final());
            h = self.mix(h, arc.label, target, &arc.output, &arc.next_final_output, arc.is_final());
            if arc.is_last() {
                break;
            }
            arcs.read_next_real_arc(&mut arc, &mut r)?;
        }
        Ok(h & i64::MAX as u64)
    }

    fn nodes_equal<O: Outputs>(
        &self,
        compiler: &NodeCompiler<O>,
        node: &UncompiledNode<O::Value>,
        address: i64,
    ) -> Result<bool> {
        let arcs = ArcReader::new(&compiler.outputs, compiler.input_type);
        let mut r = compiler.bytes.reverse_reader(true);
        let mut arc = FstArc::new(compiler.outputs.no_output());
        arcs.read_first_real_target_arc(address, &mut arc, &mut r)?;

        let num_arcs = node.arcs.len();
        if arc.bytes_per_arc != 0 {
            if arc.node_flags == ARCS_FOR_BINARY_SEARCH {
                if num_arcs != arc.num_arcs as usize {
                    return Ok(false);
                }
            } else {
                let range = node.arcs[num_arcs - 1].label - node.arcs[0].label + 1;
                if range != arc.num_arcs
                    || num_arcs != bit_table::count_bits(&mut r, arc.bit_table_start, arc.num_arcs)? as usize
                {
                    return Ok(false);
                }
            }
        }

        for (idx, expected) in node.arcs.iter().enumerate() {
            if expected.label != arc.label
                || expected.is_final != arc.is_final()
                || normalized_target(expected.target.address(), expected.is_final) != arc.target
                || expected.output != arc.output
                || expected.next_final_output != arc.next_final_output
            {
                return Ok(false);
            }
            if arc.is_last() {
                return Ok(idx == num_arcs - 1);
            }
            arcs.read_next_real_arc(&mut arc, &mut r)?;
        }
        Ok(false)
    }

    /// Returns the address of a frozen node equal to `node`, freezing it
    /// first if none exists. `node` must have at least one arc.
    pub fn add<O: Outputs>(&mut self, compiler: &mut NodeCompiler<O>, node: &UncompiledNode<O::Value>) -> Result<i64> {
        debug_assert!(!node.arcs.is_empty());
        let h = self.hash_node(node);
        let mut pos = h as usize & self.mask;
        let mut c = 0;
        loop {
            let v = self.table[pos];
            if v == 0 {
                let address = compiler.add_node(node);
                debug_assert_eq!(self.hash_frozen(compiler, address)?, h, "frozen hash differs");
                self.count += 1;
                self.table[pos] = address;
                if self.count > 2 * self.table.len() / 3 {
                    self.rehash(compiler)?;
                }
                return Ok(address);
            }
            if self.nodes_equal(compiler, node, v)? {
                return Ok(v);
            }
            c += 1;
            pos = (pos + c) & self.mask;
        }
    }

    fn rehash<O: Outputs>(&mut self, compiler: &NodeCompiler<O>) -> Result<()> {
        let old = std::mem::take(&mut self.table);
        let size = old.len() * 2;
        self.table = vec![0; size];
        self.mask = size - 1;
        for &address in old.iter().filter(|&&a| a != 0) {
            let mut pos = self.hash_frozen(compiler, address)? as usize & self.mask;
            let mut c = 0;
            while self.table[pos] != 0 {
                c += 1;
                pos = (pos + c) & self.mask;
            }
            self.table[pos] = address;
        }
        trace!(size, count = self.count, "node hash rehashed");
        Ok(())
    }
}
