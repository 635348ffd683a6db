// Append-only block storage for FST bytes.

use std::io::Write;

use lexfst_core::{DataInput, DataOutput, DecodeError};

use crate::reader::{BytesReader, FstBytesReader, SliceReader};

/// Append-only byte storage organised in fixed-size blocks.
///
/// Positions are absolute offsets from the first byte written; block
/// boundaries are invisible to callers. Besides appending, the builder needs
/// a handful of in-place edits on the already-written range: overwrites,
/// overlap-safe backward copies (to widen a node into fixed-length arcs),
/// range reversal (nodes are written low-to-high but read high-to-low) and
/// truncation. None of these can grow the store; `skip_bytes` is the only
/// way to extend it without writing data.
#[derive(Debug, Clone)]
pub struct BytesStore {
    blocks: Vec<Vec<u8>>,
    block_bits: u32,
    block_size: usize,
    block_mask: usize,
    /// Write offset inside the last block.
    next_write: usize,
    finished: bool,
}

impl BytesStore {
    /// Creates an empty store with blocks of `1 << block_bits` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `block_bits` is not in `1..=30`.
    pub fn new(block_bits: u32) -> Self {
        assert!(
            (1..=30).contains(&block_bits),
            "block bits must be in 1..=30, got {block_bits}"
        );
        let block_size = 1usize << block_bits;
        Self {
            blocks: Vec::new(),
            block_bits,
            block_size,
            block_mask: block_size - 1,
            next_write: block_size,
            finished: false,
        }
    }

    /// Reads `num_bytes` from `input` into a finished store whose block size
    /// is the smallest power of two covering the data, capped at
    /// `1 << max_block_bits`.
    pub fn from_data_input<I: DataInput + ?Sized>(
        input: &mut I,
        num_bytes: u64,
        max_block_bits: u32,
    ) -> Result<Self, DecodeError> {
        let mut block_bits = 1;
        while (1u64 << block_bits) < num_bytes && block_bits < max_block_bits {
            block_bits += 1;
        }
        let mut store = Self::new(block_bits);
        let mut left = num_bytes;
        while left > 0 {
            let chunk = left.min(store.block_size as u64) as usize;
            store.blocks.push(input.read_byte_vec(chunk)?);
            left -= chunk as u64;
        }
        store.next_write = store.blocks.last().map_or(store.block_size, Vec::len);
        store.finished = true;
        Ok(store)
    }

    pub fn block_bits(&self) -> u32 {
        self.block_bits
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn position(&self) -> usize {
        match self.blocks.len() {
            0 => 0,
            n => (n - 1) * self.block_size + self.next_write,
        }
    }

    /// Heap bytes held by the blocks.
    pub fn size_in_bytes(&self) -> usize {
        self.blocks.iter().map(Vec::capacity).sum()
    }

    #[inline]
    fn locate(&self, pos: usize) -> (usize, usize) {
        (pos >> self.block_bits, pos & self.block_mask)
    }

    /// Returns the byte at `pos`, or `None` past the written range.
    #[inline]
    pub fn byte_at(&self, pos: usize) -> Option<u8> {
        if pos >= self.position() {
            return None;
        }
        let (block, offset) = self.locate(pos);
        self.blocks.get(block).and_then(|b| b.get(offset)).copied()
    }

    fn new_block(&mut self) {
        debug_assert!(!self.finished, "write after finish");
        self.blocks.push(vec![0u8; self.block_size]);
        self.next_write = 0;
    }

    /// Overwrites one byte inside the written range.
    ///
    /// # Panics
    ///
    /// Panics if `dest` has not been written yet.
    pub fn write_byte_at(&mut self, dest: usize, b: u8) {
        assert!(
            dest < self.position(),
            "overwrite at {dest} past written range {}",
            self.position()
        );
        let (block, offset) = self.locate(dest);
        self.blocks[block][offset] = b;
    }

    /// Overwrites `bytes` starting at `dest`, inside the written range.
    ///
    /// # Panics
    ///
    /// Panics if the range extends past the written bytes.
    pub fn write_bytes_at(&mut self, dest: usize, bytes: &[u8]) {
        assert!(
            dest + bytes.len() <= self.position(),
            "overwrite of {} bytes at {dest} past written range {}",
            bytes.len(),
            self.position()
        );
        let mut pos = dest;
        let mut rest = bytes;
        while !rest.is_empty() {
            let (block, offset) = self.locate(pos);
            let chunk = rest.len().min(self.block_size - offset);
            self.blocks[block][offset..offset + chunk].copy_from_slice(&rest[..chunk]);
            rest = &rest[chunk..];
            pos += chunk;
        }
    }

    /// Copies `len` bytes from `src` to `dest` within the store, where
    /// `src < dest` and the ranges may overlap. Copies back to front so the
    /// source is never clobbered before it is read.
    ///
    /// # Panics
    ///
    /// Panics unless `src < dest` and `dest + len` is inside the written range.
    pub fn copy_bytes_self(&mut self, src: usize, dest: usize, len: usize) {
        assert!(src < dest, "copy_bytes_self requires src < dest ({src} >= {dest})");
        assert!(
            dest + len <= self.position(),
            "copy of {len} bytes to {dest} past written range {}",
            self.position()
        );
        let (src_block, src_offset) = self.locate(src);
        let (dest_block, dest_offset) = self.locate(dest);
        let same_block = src_block == dest_block
            && self.locate(dest + len.saturating_sub(1)).0 == dest_block;
        if same_block && len > 0 {
            self.blocks[src_block].copy_within(src_offset..src_offset + len, dest_offset);
            return;
        }
        for i in (0..len).rev() {
            let (sb, so) = self.locate(src + i);
            let b = self.blocks[sb][so];
            let (db, doff) = self.locate(dest + i);
            self.blocks[db][doff] = b;
        }
    }

    /// Copies bytes starting at `src` into `dest`.
    ///
    /// # Panics
    ///
    /// Panics if the source range extends past the written bytes.
    pub fn copy_to_slice(&self, src: usize, dest: &mut [u8]) {
        assert!(
            src + dest.len() <= self.position(),
            "read of {} bytes at {src} past written range {}",
            dest.len(),
            self.position()
        );
        let mut pos = src;
        let mut filled = 0;
        while filled < dest.len() {
            let (block, offset) = self.locate(pos);
            let chunk = (dest.len() - filled).min(self.block_size - offset);
            dest[filled..filled + chunk].copy_from_slice(&self.blocks[block][offset..offset + chunk]);
            filled += chunk;
            pos += chunk;
        }
    }

    /// Reverses the bytes from `src` to `dest`, both inclusive.
    ///
    /// # Panics
    ///
    /// Panics if `src > dest` or `dest` is past the written range.
    pub fn reverse(&mut self, src: usize, dest: usize) {
        assert!(src <= dest, "reverse of empty range {src}..={dest}");
        assert!(
            dest < self.position(),
            "reverse end {dest} past written range {}",
            self.position()
        );
        let (mut lo, mut hi) = (src, dest);
        while lo < hi {
            let (lb, lo_off) = self.locate(lo);
            let (hb, hi_off) = self.locate(hi);
            if lb == hb {
                self.blocks[lb][lo_off..=hi_off].reverse();
                return;
            }
            let a = self.blocks[lb][lo_off];
            let b = self.blocks[hb][hi_off];
            self.blocks[lb][lo_off] = b;
            self.blocks[hb][hi_off] = a;
            lo += 1;
            hi -= 1;
        }
    }

    /// Extends the store by `len` zero bytes.
    pub fn skip_bytes(&mut self, mut len: usize) {
        while len > 0 {
            if self.next_write == self.block_size {
                self.new_block();
            }
            let chunk = len.min(self.block_size - self.next_write);
            self.next_write += chunk;
            len -= chunk;
        }
    }

    /// Shrinks the store to `new_len` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `new_len` is past the written range.
    pub fn truncate(&mut self, new_len: usize) {
        assert!(
            new_len <= self.position(),
            "truncate to {new_len} past written range {}",
            self.position()
        );
        if new_len == 0 {
            self.blocks.clear();
            self.next_write = self.block_size;
            return;
        }
        let (mut block, mut offset) = self.locate(new_len);
        if offset == 0 {
            block -= 1;
            offset = self.block_size;
        }
        self.blocks.truncate(block + 1);
        // Bytes beyond the new end are stale; clear them so a later skip reads zeros.
        let last = &mut self.blocks[block];
        last[offset..].fill(0);
        self.next_write = offset;
    }

    /// Trims the last block to its written length. The store is read-only afterwards.
    pub fn finish(&mut self) {
        if let Some(last) = self.blocks.last_mut() {
            last.truncate(self.next_write);
            last.shrink_to_fit();
        }
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Writes every stored byte to `out`.
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> std::io::Result<()> {
        let last = self.blocks.len().saturating_sub(1);
        for (i, block) in self.blocks.iter().enumerate() {
            let len = if i == last { self.next_write.min(block.len()) } else { block.len() };
            out.write_all(&block[..len])?;
        }
        Ok(())
    }

    /// Reverse cursor; a single-block store hands out a plain slice cursor
    /// when `allow_single` is set.
    pub fn reverse_reader(&self, allow_single: bool) -> FstBytesReader<'_> {
        if allow_single && self.blocks.len() == 1 {
            let len = self.next_write.min(self.blocks[0].len());
            return FstBytesReader::Slice(SliceReader::reverse(&self.blocks[0][..len]));
        }
        FstBytesReader::Store(StoreReader {
            store: self,
            pos: self.position() as i64 - 1,
            reversed: true,
        })
    }

    pub fn forward_reader(&self) -> FstBytesReader<'_> {
        if self.blocks.len() == 1 {
            let len = self.next_write.min(self.blocks[0].len());
            return FstBytesReader::Slice(SliceReader::forward(&self.blocks[0][..len]));
        }
        FstBytesReader::Store(StoreReader {
            store: self,
            pos: 0,
            reversed: false,
        })
    }
}

impl DataOutput for BytesStore {
    #[inline]
    fn write_byte(&mut self, b: u8) {
        if self.next_write == self.block_size {
            self.new_block();
        }
        let next = self.next_write;
        if let Some(block) = self.blocks.last_mut() {
            block[next] = b;
        }
        self.next_write += 1;
    }

    fn write_bytes(&mut self, mut bytes: &[u8]) {
        while !bytes.is_empty() {
            if self.next_write == self.block_size {
                self.new_block();
            }
            let chunk = bytes.len().min(self.block_size - self.next_write);
            let start = self.next_write;
            if let Some(block) = self.blocks.last_mut() {
                block[start..start + chunk].copy_from_slice(&bytes[..chunk]);
            }
            self.next_write += chunk;
            bytes = &bytes[chunk..];
        }
    }
}

/// Block-aware cursor over a [`BytesStore`].
#[derive(Debug, Clone)]
pub struct StoreReader<'a> {
    store: &'a BytesStore,
    pos: i64,
    reversed: bool,
}

impl DataInput for StoreReader<'_> {
    #[inline]
    fn read_byte(&mut self) -> Result<u8, DecodeError> {
        let b = usize::try_from(self.pos)
            .ok()
            .and_then(|p| self.store.byte_at(p))
            .ok_or(DecodeError::OutOfBounds {
                position: self.pos,
                length: self.store.position() as u64,
            })?;
        if self.reversed {
            self.pos -= 1;
        } else {
            self.pos += 1;
        }
        Ok(b)
    }
}

impl BytesReader for StoreReader<'_> {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(store: &BytesStore) -> Vec<u8> {
        let mut out = Vec::new();
        store.write_to(&mut out).unwrap();
        out
    }

    fn filled(block_bits: u32, n: usize) -> BytesStore {
        let mut store = BytesStore::new(block_bits);
        for i in 0..n {
            store.write_byte(i as u8);
        }
        store
    }

    #[test]
    fn appends_across_blocks() {
        let mut store = BytesStore::new(2);
        store.write_bytes(&[1, 2, 3, 4, 5, 6]);
        store.write_byte(7);
        assert_eq!(store.position(), 7);
        assert_eq!(store.block_count(), 2);
        assert_eq!(contents(&store), vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(store.byte_at(5), Some(6));
        assert_eq!(store.byte_at(7), None);
    }

    #[test]
    fn absolute_overwrite_spans_blocks() {
        let mut store = filled(2, 10);
        store.write_bytes_at(3, &[90, 91, 92]);
        assert_eq!(contents(&store), vec![0, 1, 2, 90, 91, 92, 6, 7, 8, 9]);
        store.write_byte_at(9, 99);
        assert_eq!(store.byte_at(9), Some(99));
    }

    #[test]
    #[should_panic(expected = "past written range")]
    fn overwrite_cannot_grow() {
        let mut store = filled(3, 4);
        store.write_bytes_at(2, &[1, 2, 3]);
    }

    #[test]
    fn copy_self_overlapping_forward_shift() {
        let mut store = filled(2, 12);
        // Shift 0..6 up by 3, overlapping and crossing block boundaries.
        store.copy_bytes_self(0, 3, 6);
        assert_eq!(contents(&store), vec![0, 1, 2, 0, 1, 2, 3, 4, 5, 9, 10, 11]);
    }

    #[test]
    fn copy_self_within_one_block() {
        let mut store = filled(4, 8);
        store.copy_bytes_self(1, 4, 3);
        assert_eq!(contents(&store), vec![0, 1, 2, 3, 1, 2, 3, 7]);
    }

    #[test]
    #[should_panic(expected = "requires src < dest")]
    fn copy_self_rejects_backward_copy() {
        let mut store = filled(3, 8);
        store.copy_bytes_self(4, 2, 2);
    }

    #[test]
    fn reverse_inclusive_range_across_blocks() {
        let mut store = filled(2, 10);
        store.reverse(1, 8);
        assert_eq!(contents(&store), vec![0, 8, 7, 6, 5, 4, 3, 2, 1, 9]);
        store.reverse(4, 4);
        assert_eq!(store.byte_at(4), Some(5));
    }

    #[test]
    fn skip_and_truncate() {
        let mut store = filled(2, 3);
        store.skip_bytes(6);
        assert_eq!(store.position(), 9);
        assert_eq!(store.byte_at(8), Some(0));
        store.truncate(4);
        assert_eq!(store.position(), 4);
        assert_eq!(store.block_count(), 1);
        store.truncate(2);
        store.skip_bytes(2);
        assert_eq!(contents(&store), vec![0, 1, 0, 0]);
        store.truncate(0);
        assert_eq!(store.position(), 0);
        store.write_byte(5);
        assert_eq!(contents(&store), vec![5]);
    }

    #[test]
    fn finish_trims_last_block() {
        let mut store = filled(3, 11);
        store.finish();
        assert!(store.is_finished());
        assert_eq!(store.position(), 11);
        assert_eq!(contents(&store).len(), 11);
        assert!(store.size_in_bytes() <= 16);
    }

    #[test]
    fn readers_agree_across_block_layouts() {
        let multi = filled(2, 9);
        let single = filled(6, 9);

        let mut r = multi.reverse_reader(true);
        assert!(matches!(r, FstBytesReader::Store(_)));
        r.set_position(8);
        let backwards: Vec<u8> = (0..9).map(|_| r.read_byte().unwrap()).collect();
        assert_eq!(backwards, vec![8, 7, 6, 5, 4, 3, 2, 1, 0]);
        assert!(r.read_byte().is_err());

        let mut r = single.reverse_reader(true);
        assert!(matches!(r, FstBytesReader::Slice(_)));
        r.set_position(4);
        assert_eq!(r.read_byte().unwrap(), 4);
        r.skip_bytes(2);
        assert_eq!(r.read_byte().unwrap(), 1);

        let mut f = multi.forward_reader();
        f.set_position(3);
        assert_eq!(f.read_byte().unwrap(), 3);
        assert_eq!(f.read_byte().unwrap(), 4);
    }

    #[test]
    fn loads_from_data_input() {
        let data: Vec<u8> = (0..100u8).collect();
        let mut input = lexfst_core::SliceDataInput::new(&data);
        let store = BytesStore::from_data_input(&mut input, 100, 4).unwrap();
        assert_eq!(store.block_bits(), 4);
        assert_eq!(store.block_count(), 7);
        assert_eq!(store.position(), 100);
        assert_eq!(contents(&store), data);

        let mut short = lexfst_core::SliceDataInput::new(&data[..10]);
        assert!(BytesStore::from_data_input(&mut short, 20, 4).is_err());

        // A declared length far beyond the source fails on the first block.
        let mut huge = lexfst_core::ReadDataInput::new(&data[..10]);
        assert!(BytesStore::from_data_input(&mut huge, 1 << 40, 30).is_err());
    }
}
