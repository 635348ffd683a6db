// Byte-oriented output and input with variable-length integer codecs.

use std::io::Read;

use crate::DecodeError;

/// Maximum encoded length of a vInt (32 bits, 7 bits per byte).
pub const MAX_VINT_LEN: usize = 5;

/// Maximum encoded length of a vLong (64 bits, 7 bits per byte).
pub const MAX_VLONG_LEN: usize = 10;

/// Largest piece [`DataInput::read_byte_vec`] allocates before the bytes
/// backing it have been read.
const READ_PIECE: usize = 1 << 16;

/// Append-only byte sink.
///
/// Only `write_byte` is required; everything else is expressed in terms of it.
/// Writing is infallible: sinks are in-memory stores, and the callers that
/// eventually hit a file do so through `std::io::Write` in bulk.
pub trait DataOutput {
    fn write_byte(&mut self, b: u8);

    fn write_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.write_byte(b);
        }
    }

    /// Writes a `u32` in 1-5 bytes, low 7 bits first, high bit as continuation.
    fn write_vint(&mut self, mut value: u32) {
        while value & !0x7F != 0 {
            self.write_byte(((value & 0x7F) | 0x80) as u8);
            value >>= 7;
        }
        self.write_byte(value as u8);
    }

    /// Writes a `u64` in 1-10 bytes using the same scheme as [`write_vint`](Self::write_vint).
    fn write_vlong(&mut self, mut value: u64) {
        while value & !0x7F != 0 {
            self.write_byte(((value & 0x7F) | 0x80) as u8);
            value >>= 7;
        }
        self.write_byte(value as u8);
    }

    fn write_u16_le(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    fn write_u32_be(&mut self, value: u32) {
        self.write_bytes(&value.to_be_bytes());
    }

    /// Writes a vInt length prefix followed by the UTF-8 bytes.
    fn write_string(&mut self, value: &str) {
        self.write_vint(value.len() as u32);
        self.write_bytes(value.as_bytes());
    }
}

impl DataOutput for Vec<u8> {
    #[inline]
    fn write_byte(&mut self, b: u8) {
        self.push(b);
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

/// Byte source mirroring [`DataOutput`].
///
/// Implementations may read forwards or backwards; the decoders below only
/// rely on `read_byte` returning bytes in the order they were written.
pub trait DataInput {
    fn read_byte(&mut self) -> Result<u8, DecodeError>;

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), DecodeError> {
        for slot in buf.iter_mut() {
            *slot = self.read_byte()?;
        }
        Ok(())
    }

    /// Reads `len` bytes into a fresh vector.
    ///
    /// `len` usually comes from the input itself, so the buffer grows as
    /// bytes arrive instead of being allocated up front.
    fn read_byte_vec(&mut self, len: usize) -> Result<Vec<u8>, DecodeError> {
        let mut buf = Vec::with_capacity(len.min(READ_PIECE));
        while buf.len() < len {
            let start = buf.len();
            buf.resize(start + (len - start).min(READ_PIECE), 0);
            self.read_bytes(&mut buf[start..])?;
        }
        Ok(buf)
    }

    fn read_vint(&mut self) -> Result<u32, DecodeError> {
        let mut value: u32 = 0;
        for i in 0..MAX_VINT_LEN {
            let b = self.read_byte()?;
            let bits = (b & 0x7F) as u32;
            if i == MAX_VINT_LEN - 1 && bits > 0x0F {
                return Err(DecodeError::MalformedVarint);
            }
            value |= bits << (7 * i);
            if b & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(DecodeError::MalformedVarint)
    }

    fn read_vlong(&mut self) -> Result<u64, DecodeError> {
        let mut value: u64 = 0;
        for i in 0..MAX_VLONG_LEN {
            let b = self.read_byte()?;
            let bits = (b & 0x7F) as u64;
            if i == MAX_VLONG_LEN - 1 && bits > 0x01 {
                return Err(DecodeError::MalformedVarint);
            }
            value |= bits << (7 * i);
            if b & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(DecodeError::MalformedVarint)
    }

    fn read_u16_le(&mut self) -> Result<u16, DecodeError> {
        let lo = self.read_byte()?;
        let hi = self.read_byte()?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    fn read_u32_be(&mut self) -> Result<u32, DecodeError> {
        let mut buf = [0u8; 4];
        self.read_bytes(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    fn read_string(&mut self) -> Result<String, DecodeError> {
        let len = self.read_vint()? as usize;
        let buf = self.read_byte_vec(len)?;
        String::from_utf8(buf).map_err(|_| DecodeError::InvalidUtf8)
    }
}

/// Forward cursor over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct SliceDataInput<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SliceDataInput<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}

impl DataInput for SliceDataInput<'_> {
    #[inline]
    fn read_byte(&mut self) -> Result<u8, DecodeError> {
        match self.bytes.get(self.pos) {
            Some(&b) => {
                self.pos += 1;
                Ok(b)
            }
            None => Err(DecodeError::UnexpectedEof {
                consumed: self.pos as u64,
            }),
        }
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), DecodeError> {
        let end = self.pos + buf.len();
        if end > self.bytes.len() {
            return Err(DecodeError::UnexpectedEof {
                consumed: self.bytes.len() as u64,
            });
        }
        buf.copy_from_slice(&self.bytes[self.pos..end]);
        self.pos = end;
        Ok(())
    }

    fn read_byte_vec(&mut self, len: usize) -> Result<Vec<u8>, DecodeError> {
        if len > self.remaining() {
            return Err(DecodeError::UnexpectedEof {
                consumed: self.bytes.len() as u64,
            });
        }
        let buf = self.bytes[self.pos..self.pos + len].to_vec();
        self.pos += len;
        Ok(buf)
    }
}

/// Adapter reading from any `std::io::Read`.
///
/// Reads are issued one byte at a time for the header; wrap the source in a
/// `BufReader` when it is unbuffered.
#[derive(Debug)]
pub struct ReadDataInput<R> {
    inner: R,
    consumed: u64,
}

impl<R: Read> ReadDataInput<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, consumed: 0 }
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> DataInput for ReadDataInput<R> {
    fn read_byte(&mut self) -> Result<u8, DecodeError> {
        let mut buf = [0u8; 1];
        self.read_bytes(&mut buf)?;
        Ok(buf[0])
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), DecodeError> {
        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.consumed += buf.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Err(DecodeError::UnexpectedEof {
                    consumed: self.consumed,
                })
            }
            Err(e) => Err(DecodeError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vint_single_byte_values() {
        let mut out = Vec::new();
        out.write_vint(0);
        out.write_vint(127);
        assert_eq!(out, vec![0x00, 0x7F]);
    }

    #[test]
    fn vint_multi_byte_layout() {
        let mut out = Vec::new();
        out.write_vint(300);
        // 300 = 0b1_0010_1100 -> 0xAC 0x02
        assert_eq!(out, vec![0xAC, 0x02]);
    }

    #[test]
    fn vint_and_vlong_extremes_decode() {
        let mut out = Vec::new();
        out.write_vint(u32::MAX);
        out.write_vlong(u64::MAX);
        out.write_vlong(1 << 35);
        assert_eq!(out.len(), MAX_VINT_LEN + MAX_VLONG_LEN + 6);

        let mut input = SliceDataInput::new(&out);
        assert_eq!(input.read_vint().unwrap(), u32::MAX);
        assert_eq!(input.read_vlong().unwrap(), u64::MAX);
        assert_eq!(input.read_vlong().unwrap(), 1 << 35);
        assert_eq!(input.remaining(), 0);
    }

    #[test]
    fn overlong_vint_is_rejected() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01];
        let mut input = SliceDataInput::new(&data);
        assert!(matches!(input.read_vint(), Err(DecodeError::MalformedVarint)));
    }

    #[test]
    fn truncated_input_reports_eof() {
        let data = [0x80];
        let mut input = SliceDataInput::new(&data);
        let err = input.read_vint().unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedEof { consumed: 1 }));
    }

    #[test]
    fn fixed_width_and_strings() {
        let mut out = Vec::new();
        out.write_u16_le(0xBEEF);
        out.write_u32_be(0x3fd7_6c17);
        out.write_string("FST");
        assert_eq!(&out[..2], &[0xEF, 0xBE]);
        assert_eq!(&out[2..6], &[0x3f, 0xd7, 0x6c, 0x17]);

        let mut input = SliceDataInput::new(&out);
        assert_eq!(input.read_u16_le().unwrap(), 0xBEEF);
        assert_eq!(input.read_u32_be().unwrap(), 0x3fd7_6c17);
        assert_eq!(input.read_string().unwrap(), "FST");
    }

    #[test]
    fn invalid_utf8_string() {
        let data = [0x02, 0xC3, 0x28];
        let mut input = SliceDataInput::new(&data);
        assert!(matches!(input.read_string(), Err(DecodeError::InvalidUtf8)));
    }

    #[test]
    fn read_adapter_tracks_consumption() {
        let data: &[u8] = &[0x05, 1, 2, 3];
        let mut input = ReadDataInput::new(data);
        assert_eq!(input.read_vint().unwrap(), 5);
        let mut buf = [0u8; 3];
        input.read_bytes(&mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3]);
        assert_eq!(input.consumed(), 4);
        assert!(matches!(
            input.read_byte(),
            Err(DecodeError::UnexpectedEof { consumed: 4 })
        ));
    }

    #[test]
    fn byte_vec_spanning_several_pieces() {
        let data: Vec<u8> = (0..3 * READ_PIECE + 7).map(|i| (i % 251) as u8).collect();
        let mut input = ReadDataInput::new(data.as_slice());
        assert_eq!(input.read_byte_vec(data.len()).unwrap(), data);
        assert_eq!(input.consumed(), data.len() as u64);
    }

    #[test]
    fn oversized_byte_vec_length_fails_without_allocating() {
        let data = [1u8, 2, 3];
        let mut input = SliceDataInput::new(&data);
        assert!(matches!(
            input.read_byte_vec(usize::MAX),
            Err(DecodeError::UnexpectedEof { consumed: 3 })
        ));
        assert_eq!(input.read_byte_vec(2).unwrap(), vec![1, 2]);

        let mut input = ReadDataInput::new(&data[..]);
        assert!(matches!(
            input.read_byte_vec(usize::MAX / 2),
            Err(DecodeError::UnexpectedEof { .. })
        ));
    }
}
