// Positioned cursors over FST bytes.

use lexfst_core::{DataInput, DecodeError};

use crate::bytes_store::StoreReader;

/// A positioned byte cursor.
///
/// FST nodes are written low-to-high and then reversed in place, so arc
/// navigation reads with a reversed cursor: `read_byte` returns the byte at
/// `position()` and then moves one byte towards address 0. Forward cursors
/// move the other way. Positions are signed so a reversed cursor can sit one
/// step before address 0 after consuming it.
pub trait BytesReader: DataInput {
    fn position(&self) -> i64;

    fn set_position(&mut self, pos: i64);

    /// Moves `count` bytes in reading direction without decoding them.
    fn skip_bytes(&mut self, count: i64);

    fn reversed(&self) -> bool;
}

/// Cursor over one contiguous slice, in either direction.
#[derive(Debug, Clone)]
pub struct SliceReader<'a> {
    bytes: &'a [u8],
    pos: i64,
    reversed: bool,
}

impl<'a> SliceReader<'a> {
    pub fn forward(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            reversed: false,
        }
    }

    pub fn reverse(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: bytes.len() as i64 - 1,
            reversed: true,
        }
    }
}

impl DataInput for SliceReader<'_> {
    #[inline]
    fn read_byte(&mut self) -> Result<u8, DecodeError> {
        let b = usize::try_from(self.pos)
            .ok()
            .and_then(|p| self.bytes.get(p).copied())
            .ok_or(DecodeError::OutOfBounds {
                position: self.pos,
                length: self.bytes.len() as u64,
            })?;
        if self.reversed {
            self.pos -= 1;
        } else {
            self.pos += 1;
        }
        Ok(b)
    }
}

impl BytesReader for SliceReader<'_> {
    #[inline]
    fn position(&self) -> i64 {
        self.pos
    }

    #[inline]
    fn set_position(&mut self, pos: i64) {
        self.pos = pos;
    }

    #[inline]
    fn skip_bytes(&mut self, count: i64) {
        if self.reversed {
            self.pos -= count;
        } else {
            self.pos += count;
        }
    }

    fn reversed(&self) -> bool {
        self.reversed
    }
}

/// Reader handed out by an FST: a single slice when the body is contiguous,
/// a block-aware cursor otherwise.
#[derive(Debug, Clone)]
pub enum FstBytesReader<'a> {
    Slice(SliceReader<'a>),
    Store(StoreReader<'a>),
}

impl DataInput for FstBytesReader<'_> {
    #[inline]
    fn read_byte(&mut self) -> Result<u8, DecodeError> {
        match self {
            FstBytesReader::Slice(r) => r.read_byte(),
            FstBytesReader::Store(r) => r.read_byte(),
        }
    }
}

impl BytesReader for FstBytesReader<'_> {
    #[inline]
    fn position(&self) -> i64 {
        match self {
            FstBytesReader::Slice(r) => r.position(),
            FstBytesReader::Store(r) => r.position(),
        }
    }

    #[inline]
    fn set_position(&mut self, pos: i64) {
        match self {
            FstBytesReader::Slice(r) => r.set_position(pos),
            FstBytesReader::Store(r) => r.set_position(pos),
        }
    }

    #[inline]
    fn skip_bytes(&mut self, count: i64) {
        match self {
            FstBytesReader::Slice(r) => r.skip_bytes(count),
            FstBytesReader::Store(r) => r.skip_bytes(count),
        }
    }

    fn reversed(&self) -> bool {
        match self {
            FstBytesReader::Slice(r) => r.reversed(),
            FstBytesReader::Store(r) => r.reversed(),
        }
    }
}
