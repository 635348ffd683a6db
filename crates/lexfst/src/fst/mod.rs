//! The frozen automaton: arc navigation, lookups, save and load.
//!
//! # Body layout
//!
//! The body is a sequence of nodes. Each node is written low-to-high and
//! then reversed in place, so a node's address is its *last* byte and
//! readers walk towards lower addresses. Byte 0 is a pad byte, which keeps
//! every real node address at 1 or above; addresses `0` and `-1` are the
//! arc-less sentinels and are never serialized as nodes.
//!
//! A node is either a list of variable-length arcs (flag byte, label,
//! optional output, optional next-final output, optional target) or one of
//! two fixed-length layouts introduced by a header tag:
//!
//! - binary search: tag, arc count, bytes per arc, then arcs padded to a
//!   common stride;
//! - direct addressing: tag, label range, bytes per arc, a presence bitmap,
//!   the first label, then label-less arcs for the present labels only.

mod arc;
mod read;
mod store;

pub use arc::FstArc;
pub use store::SharedBytes;

pub(crate) use read::ArcReader;
use store::FstStore;

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use lexfst_core::{DataInput, DataOutput, InputType, ReadDataInput, SliceDataInput};
use tracing::debug;

use crate::bytes_store::BytesStore;
use crate::outputs::Outputs;
use crate::reader::{BytesReader, FstBytesReader, SliceReader};
use crate::{FstError, Result};

// ---------------------------------------------------------------------------
// Format constants
// ---------------------------------------------------------------------------

/// The input ends here.
pub const BIT_FINAL_ARC: u8 = 1 << 0;
/// Last arc of its node.
pub const BIT_LAST_ARC: u8 = 1 << 1;
/// The target node immediately precedes this arc's node in the body, so no
/// address is stored.
pub const BIT_TARGET_NEXT: u8 = 1 << 2;
/// The target has no arcs.
pub const BIT_STOP_NODE: u8 = 1 << 3;
pub const BIT_ARC_HAS_OUTPUT: u8 = 1 << 4;
pub const BIT_ARC_HAS_FINAL_OUTPUT: u8 = 1 << 5;

/// Node header tag of the binary-search layout. Never a valid arc flag
/// byte since a next-final output implies the final bit.
pub const ARCS_FOR_BINARY_SEARCH: u8 = 1 << 5;
/// Node header tag of the direct-addressing layout.
pub const ARCS_FOR_DIRECT_ADDRESSING: u8 = 1 << 6;

/// Label of the pseudo-arc that marks a final state during navigation.
pub const END_LABEL: i32 = -1;

/// Target of an arc into an arc-less final state.
pub const FINAL_END_NODE: i64 = -1;
/// Target of an arc into an arc-less non-final state.
pub const NON_FINAL_END_NODE: i64 = 0;

pub const FILE_MAGIC: u32 = 0x3fd7_6c17;
pub const CODEC_NAME: &str = "FST";
pub const VERSION_START: u32 = 1;
pub const VERSION_CURRENT: u32 = 1;

/// Largest block size used when loading a body onto the heap.
const MAX_LOAD_BLOCK_BITS: u32 = 30;

// ---------------------------------------------------------------------------
// Fst
// ---------------------------------------------------------------------------

/// A frozen, read-only FST.
///
/// Safe to share between threads; every navigation call works on a cursor
/// and arcs owned by the caller.
pub struct Fst<O: Outputs> {
    input_type: InputType,
    empty_output: Option<O::Value>,
    start_node: i64,
    store: FstStore,
    outputs: O,
}

impl<O: Outputs> fmt::Debug for Fst<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fst")
            .field("input_type", &self.input_type)
            .field("start_node", &self.start_node)
            .field("accepts_empty", &self.empty_output.is_some())
            .field("store", &self.store)
            .finish()
    }
}

struct Header<T> {
    input_type: InputType,
    empty_output: Option<T>,
    start_node: i64,
    num_bytes: u64,
}

impl<O: Outputs> Fst<O> {
    pub(crate) fn from_parts(
        input_type: InputType,
        empty_output: Option<O::Value>,
        start_node: i64,
        store: BytesStore,
        outputs: O,
    ) -> Self {
        Self {
            input_type,
            empty_output,
            start_node,
            store: FstStore::OnHeap(store),
            outputs,
        }
    }

    pub fn input_type(&self) -> InputType {
        self.input_type
    }

    pub fn outputs(&self) -> &O {
        &self.outputs
    }

    /// Output of the empty input, if it is accepted.
    pub fn empty_output(&self) -> Option<&O::Value> {
        self.empty_output.as_ref()
    }

    pub fn start_node(&self) -> i64 {
        self.start_node
    }

    /// Length of the serialized body.
    pub fn num_bytes(&self) -> usize {
        self.store.len()
    }

    /// Approximate heap footprint of this FST.
    pub fn size_in_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.store.size_in_bytes()
            + self
                .empty_output
                .as_ref()
                .map_or(0, |v| self.outputs.ram_bytes_used(v))
    }

    pub fn is_on_heap(&self) -> bool {
        self.store.is_on_heap()
    }

    /// A fresh reverse cursor over the body.
    pub fn bytes_reader(&self) -> FstBytesReader<'_> {
        self.store.reverse_reader()
    }

    pub(crate) fn arcs(&self) -> ArcReader<'_, O> {
        ArcReader::new(&self.outputs, self.input_type)
    }

    /// The virtual arc pointing at the start node. It is final when the
    /// empty input is accepted.
    pub fn first_arc(&self) -> FstArc<O::Value> {
        let mut arc = FstArc::new(self.outputs.no_output());
        match &self.empty_output {
            Some(empty) => {
                arc.flags = BIT_FINAL_ARC | BIT_LAST_ARC;
                if !self.outputs.is_no_output(empty) {
                    arc.flags |= BIT_ARC_HAS_FINAL_OUTPUT;
                }
                arc.next_final_output = empty.clone();
            }
            None => arc.flags = BIT_LAST_ARC,
        }
        arc.target = self.start_node;
        arc
    }

    // -----------------------------------------------------------------------
    // Arc navigation
    // -----------------------------------------------------------------------

    pub fn read_first_target_arc<R: BytesReader + ?Sized>(
        &self,
        follow: &FstArc<O::Value>,
        arc: &mut FstArc<O::Value>,
        r: &mut R,
    ) -> Result<()> {
        self.arcs().read_first_target_arc(follow, arc, r)
    }

    pub fn read_first_real_target_arc<R: BytesReader + ?Sized>(
        &self,
        node: i64,
        arc: &mut FstArc<O::Value>,
        r: &mut R,
    ) -> Result<()> {
        self.arcs().read_first_real_target_arc(node, arc, r)
    }

    pub fn read_next_arc<R: BytesReader + ?Sized>(
        &self,
        arc: &mut FstArc<O::Value>,
        r: &mut R,
    ) -> Result<()> {
        self.arcs().read_next_arc(arc, r)
    }

    pub fn read_next_real_arc<R: BytesReader + ?Sized>(
        &self,
        arc: &mut FstArc<O::Value>,
        r: &mut R,
    ) -> Result<()> {
        self.arcs().read_next_real_arc(arc, r)
    }

    pub fn read_next_arc_label<R: BytesReader + ?Sized>(
        &self,
        arc: &FstArc<O::Value>,
        r: &mut R,
    ) -> Result<i32> {
        self.arcs().read_next_arc_label(arc, r)
    }

    pub fn read_last_target_arc<R: BytesReader + ?Sized>(
        &self,
        follow: &FstArc<O::Value>,
        arc: &mut FstArc<O::Value>,
        r: &mut R,
    ) -> Result<()> {
        self.arcs().read_last_target_arc(follow, arc, r)
    }

    pub fn read_arc_by_index<R: BytesReader + ?Sized>(
        &self,
        arc: &mut FstArc<O::Value>,
        r: &mut R,
        idx: i32,
    ) -> Result<()> {
        self.arcs().read_arc_by_index(arc, r, idx)
    }

    pub fn read_arc_by_direct_addressing<R: BytesReader + ?Sized>(
        &self,
        arc: &mut FstArc<O::Value>,
        r: &mut R,
        range_index: i32,
    ) -> Result<()> {
        self.arcs().read_arc_by_direct_addressing(arc, r, range_index)
    }

    pub fn read_last_arc_by_direct_addressing<R: BytesReader + ?Sized>(
        &self,
        arc: &mut FstArc<O::Value>,
        r: &mut R,
    ) -> Result<()> {
        self.arcs().read_last_arc_by_direct_addressing(arc, r)
    }

    /// Finds the arc labelled `label` out of `follow`'s target, filling `arc`.
    /// Returns `false` when no such arc exists.
    pub fn find_target_arc<R: BytesReader + ?Sized>(
        &self,
        label: i32,
        follow: &FstArc<O::Value>,
        arc: &mut FstArc<O::Value>,
        r: &mut R,
    ) -> Result<bool> {
        self.arcs().find_target_arc(label, follow, arc, r)
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// Output of `input`, or `None` if it is not accepted.
    pub fn get(&self, input: &[i32]) -> Result<Option<O::Value>> {
        crate::util::get(self, input)
    }

    /// [`get`](Self::get) for byte inputs.
    pub fn get_bytes(&self, input: &[u8]) -> Result<Option<O::Value>> {
        crate::util::get(self, &lexfst_core::bytes_to_labels(input))
    }

    pub fn contains(&self, input: &[i32]) -> Result<bool> {
        Ok(self.get(input)?.is_some())
    }

    // -----------------------------------------------------------------------
    // Save / load
    // -----------------------------------------------------------------------

    /// Writes the header and body to `out`.
    pub fn save<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        let mut meta = Vec::new();
        meta.write_u32_be(FILE_MAGIC);
        meta.write_string(CODEC_NAME);
        meta.write_u32_be(VERSION_CURRENT);
        match &self.empty_output {
            Some(empty) => {
                meta.write_byte(1);
                let mut encoded = Vec::new();
                self.outputs.write_final_output(empty, &mut encoded);
                // Read back through a reverse cursor.
                encoded.reverse();
                meta.write_vint(encoded.len() as u32);
                meta.write_bytes(&encoded);
            }
            None => meta.write_byte(0),
        }
        meta.write_byte(self.input_type.tag());
        meta.write_vlong(self.start_node as u64);
        meta.write_vlong(self.store.len() as u64);
        out.write_all(&meta)?;
        self.store.write_to(out)?;
        debug!(
            input_type = ?self.input_type,
            start_node = self.start_node,
            body_bytes = self.store.len(),
            "saved fst"
        );
        Ok(())
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.save(&mut out)?;
        out.flush()?;
        Ok(())
    }

    fn read_header<I: DataInput + ?Sized>(input: &mut I, outputs: &O) -> Result<Header<O::Value>> {
        let magic = input.read_u32_be()?;
        if magic != FILE_MAGIC {
            return Err(FstError::InvalidMagic(magic));
        }
        let name_len = input.read_vint()? as usize;
        if name_len != CODEC_NAME.len() {
            return Err(FstError::CodecMismatch {
                expected: CODEC_NAME,
                found: format!("<{name_len} bytes>"),
            });
        }
        let mut name = [0u8; CODEC_NAME.len()];
        input.read_bytes(&mut name)?;
        if name != CODEC_NAME.as_bytes() {
            return Err(FstError::CodecMismatch {
                expected: CODEC_NAME,
                found: String::from_utf8_lossy(&name).into_owned(),
            });
        }
        let version = input.read_u32_be()?;
        if !(VERSION_START..=VERSION_CURRENT).contains(&version) {
            return Err(FstError::UnsupportedVersion {
                found: version,
                min: VERSION_START,
                max: VERSION_CURRENT,
            });
        }

        let empty_output = match input.read_byte()? {
            0 => None,
            1 => {
                let len = input.read_vint()? as usize;
                let encoded = input.read_byte_vec(len)?;
                let mut r = SliceReader::reverse(&encoded);
                Some(outputs.read_final_output(&mut r)?)
            }
            other => return Err(FstError::Corrupt(format!("invalid empty-output flag {other}"))),
        };

        let tag = input.read_byte()?;
        let input_type = InputType::from_tag(tag).ok_or(FstError::InvalidInputType(tag))?;
        let start_node = input.read_vlong()?;
        let num_bytes = input.read_vlong()?;
        if (num_bytes > 0 && start_node >= num_bytes) || (num_bytes == 0 && start_node != 0) {
            return Err(FstError::Corrupt(format!(
                "start node {start_node} outside body of {num_bytes} bytes"
            )));
        }
        Ok(Header {
            input_type,
            empty_output,
            start_node: start_node as i64,
            num_bytes,
        })
    }

    /// Reads an FST saved by [`save`](Self::save), copying the body onto the heap.
    pub fn load<R: Read>(input: R, outputs: O) -> Result<Self> {
        Self::load_from(&mut ReadDataInput::new(input), outputs)
    }

    fn load_from<I: DataInput + ?Sized>(input: &mut I, outputs: O) -> Result<Self> {
        let header = Self::read_header(input, &outputs)?;
        let store = BytesStore::from_data_input(input, header.num_bytes, MAX_LOAD_BLOCK_BITS)?;
        debug!(
            input_type = ?header.input_type,
            start_node = header.start_node,
            body_bytes = header.num_bytes,
            blocks = store.block_count(),
            "loaded fst onto the heap"
        );
        Ok(Self {
            input_type: header.input_type,
            empty_output: header.empty_output,
            start_node: header.start_node,
            store: FstStore::OnHeap(store),
            outputs,
        })
    }

    /// Reads an FST from a byte slice, copying the body.
    pub fn from_bytes(bytes: &[u8], outputs: O) -> Result<Self> {
        Self::load_from(&mut SliceDataInput::new(bytes), outputs)
    }

    pub fn read_from_path(path: impl AsRef<Path>, outputs: O) -> Result<Self> {
        Self::load(BufReader::new(File::open(path)?), outputs)
    }

    /// Reads an FST whose body stays inside `source`, e.g. a memory map.
    ///
    /// The header is validated up front; body bytes are bounds-checked as
    /// they are read.
    pub fn from_shared(source: SharedBytes, outputs: O) -> Result<Self> {
        let bytes: &[u8] = AsRef::<[u8]>::as_ref(&*source);
        let mut input = SliceDataInput::new(bytes);
        let header = Self::read_header(&mut input, &outputs)?;
        let offset = input.position();
        let len = usize::try_from(header.num_bytes)
            .ok()
            .filter(|&len| len <= input.remaining())
            .ok_or(FstError::Decode(lexfst_core::DecodeError::UnexpectedEof {
                consumed: bytes.len() as u64,
            }))?;
        debug!(
            input_type = ?header.input_type,
            start_node = header.start_node,
            body_bytes = len,
            offset,
            "opened fst off-heap"
        );
        Ok(Self {
            input_type: header.input_type,
            empty_output: header.empty_output,
            start_node: header.start_node,
            store: FstStore::OffHeap {
                source,
                offset,
                len,
            },
            outputs,
        })
    }

    /// Maps `path` into memory and reads the FST in place.
    #[cfg(feature = "mmap")]
    pub fn open_mmap(path: impl AsRef<Path>, outputs: O) -> Result<Self> {
        let file = File::open(path)?;
        // SAFETY: the mapping is read-only; callers must not truncate or
        // rewrite the file while the FST is alive.
        let map = unsafe { memmap2::Mmap::map(&file)? };
        Self::from_shared(std::sync::Arc::new(map), outputs)
    }
}
