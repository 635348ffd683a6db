// Rank and select over the presence bits of direct-addressed nodes.
//
// A direct-addressed node stores one bit per label in its label range, packed
// little-endian within each byte (bit i of byte j is label offset 8j + i).
// The table is read through the FST cursor starting at the arc's
// `bit_table_start`; the cursor direction is whatever the FST uses.

use lexfst_core::DecodeError;

use crate::reader::BytesReader;

/// Number of presence bytes for a node spanning `label_range` labels.
#[inline]
pub fn presence_bytes(label_range: i32) -> i32 {
    (label_range >> 3) + i32::from(label_range & 7 != 0)
}

#[inline]
fn byte_at<R: BytesReader + ?Sized>(
    reader: &mut R,
    table_start: i64,
    index: i32,
) -> Result<u8, DecodeError> {
    reader.set_position(table_start);
    reader.skip_bytes(index as i64);
    reader.read_byte()
}

/// Returns whether `bit_index` is set.
pub fn is_bit_set<R: BytesReader + ?Sized>(
    reader: &mut R,
    table_start: i64,
    bit_index: i32,
) -> Result<bool, DecodeError> {
    debug_assert!(bit_index >= 0);
    let b = byte_at(reader, table_start, bit_index >> 3)?;
    Ok(b & (1 << (bit_index & 7)) != 0)
}

/// Counts the set bits in the whole table, i.e. the number of real arcs.
pub fn count_bits<R: BytesReader + ?Sized>(
    reader: &mut R,
    table_start: i64,
    label_range: i32,
) -> Result<i32, DecodeError> {
    reader.set_position(table_start);
    let mut count = 0;
    for _ in 0..presence_bytes(label_range) {
        count += reader.read_byte()?.count_ones() as i32;
    }
    Ok(count)
}

/// Counts the set bits strictly before `bit_index`: the index of the arc at
/// that label among the node's real arcs.
pub fn count_bits_up_to<R: BytesReader + ?Sized>(
    reader: &mut R,
    table_start: i64,
    bit_index: i32,
) -> Result<i32, DecodeError> {
    debug_assert!(bit_index >= 0);
    reader.set_position(table_start);
    let mut count = 0;
    for _ in 0..(bit_index >> 3) {
        count += reader.read_byte()?.count_ones() as i32;
    }
    let rem = bit_index & 7;
    if rem != 0 {
        let mask = (1u8 << rem) - 1;
        count += (reader.read_byte()? & mask).count_ones() as i32;
    }
    Ok(count)
}

/// First set bit strictly after `bit_index`, if any before `label_range`.
/// Pass `-1` to find the first set bit.
pub fn next_bit_set<R: BytesReader + ?Sized>(
    reader: &mut R,
    table_start: i64,
    label_range: i32,
    bit_index: i32,
) -> Result<Option<i32>, DecodeError> {
    debug_assert!(bit_index >= -1 && bit_index < label_range);
    let from = bit_index + 1;
    if from >= label_range {
        return Ok(None);
    }
    let mut byte_index = from >> 3;
    let mut b = byte_at(reader, table_start, byte_index)? & (0xFFu8 << (from & 7));
    let last_byte = presence_bytes(label_range) - 1;
    loop {
        if b != 0 {
            let bit = (byte_index << 3) + b.trailing_zeros() as i32;
            return Ok((bit < label_range).then_some(bit));
        }
        if byte_index == last_byte {
            return Ok(None);
        }
        byte_index += 1;
        b = reader.read_byte()?;
    }
}

/// Last set bit strictly before `bit_index`, if any.
pub fn previous_bit_set<R: BytesReader + ?Sized>(
    reader: &mut R,
    table_start: i64,
    bit_index: i32,
) -> Result<Option<i32>, DecodeError> {
    debug_assert!(bit_index >= 0);
    if bit_index == 0 {
        return Ok(None);
    }
    let to = bit_index - 1;
    let mut byte_index = to >> 3;
    let keep = (to & 7) as u32;
    let mut b = byte_at(reader, table_start, byte_index)? & (0xFFu8 >> (7 - keep));
    loop {
        if b != 0 {
            return Ok(Some((byte_index << 3) + 7 - b.leading_zeros() as i32));
        }
        if byte_index == 0 {
            return Ok(None);
        }
        byte_index -= 1;
        b = byte_at(reader, table_start, byte_index)?;
    }
}
