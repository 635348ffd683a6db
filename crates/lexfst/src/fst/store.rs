// Where a frozen FST body lives: owned blocks or a shared external buffer.

use std::fmt;
use std::sync::Arc;

use crate::bytes_store::BytesStore;
use crate::reader::{FstBytesReader, SliceReader};

/// A shared, immutable byte source such as a memory map.
pub type SharedBytes = Arc<dyn AsRef<[u8]> + Send + Sync>;

pub(crate) enum FstStore {
    /// Body copied into (or built in) owned blocks.
    OnHeap(BytesStore),
    /// Body referenced in place inside a shared buffer.
    OffHeap {
        source: SharedBytes,
        offset: usize,
        len: usize,
    },
}

impl FstStore {
    /// Number of body bytes.
    pub fn len(&self) -> usize {
        match self {
            FstStore::OnHeap(store) => store.position(),
            FstStore::OffHeap { len, .. } => *len,
        }
    }

    pub fn is_on_heap(&self) -> bool {
        matches!(self, FstStore::OnHeap(_))
    }

    /// Heap bytes owned by this store; off-heap bodies own none.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            FstStore::OnHeap(store) => store.size_in_bytes(),
            FstStore::OffHeap { .. } => 0,
        }
    }

    fn shared_slice(source: &SharedBytes, offset: usize, len: usize) -> &[u8] {
        let all: &[u8] = AsRef::<[u8]>::as_ref(&**source);
        &all[offset..offset + len]
    }

    pub fn reverse_reader(&self) -> FstBytesReader<'_> {
        match self {
            FstStore::OnHeap(store) => store.reverse_reader(true),
            FstStore::OffHeap {
                source,
                offset,
                len,
            } => FstBytesReader::Slice(SliceReader::reverse(Self::shared_slice(source, *offset, *len))),
        }
    }

    pub fn write_to<W: std::io::Write + ?Sized>(&self, out: &mut W) -> std::io::Result<()> {
        match self {
            FstStore::OnHeap(store) => store.write_to(out),
            FstStore::OffHeap {
                source,
                offset,
                len,
            } => out.write_all(Self::shared_slice(source, *offset, *len)),
        }
    }
}

impl fmt::Debug for FstStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FstStore::OnHeap(store) => f
                .debug_struct("OnHeap")
                .field("len", &store.position())
                .field("blocks", &store.block_count())
                .finish(),
            FstStore::OffHeap { offset, len, .. } => f
                .debug_struct("OffHeap")
                .field("offset", offset)
                .field("len", len)
                .finish(),
        }
    }
}
