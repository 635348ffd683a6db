// Alphabet widths and conversions between text and label sequences.

use crate::DecodeError;
use crate::io::{DataInput, DataOutput};

/// Width of the labels an FST is built over.
///
/// Every input handed to one builder uses the same width; the width is
/// persisted with the FST as a one-byte tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputType {
    /// Labels are bytes (0..=255), stored as one byte.
    Byte1,
    /// Labels are UTF-16 code units (0..=65535), stored as two bytes.
    Byte2,
    /// Labels are code points or arbitrary non-negative ints, stored as vInts.
    Byte4,
}

impl InputType {
    /// On-disk tag of this width.
    pub fn tag(self) -> u8 {
        match self {
            InputType::Byte1 => 0,
            InputType::Byte2 => 1,
            InputType::Byte4 => 2,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(InputType::Byte1),
            1 => Some(InputType::Byte2),
            2 => Some(InputType::Byte4),
            _ => None,
        }
    }

    /// Largest label representable with this width.
    pub fn max_label(self) -> i32 {
        match self {
            InputType::Byte1 => 0xFF,
            InputType::Byte2 => 0xFFFF,
            InputType::Byte4 => i32::MAX,
        }
    }

    /// Returns `true` if `label` fits this alphabet.
    #[inline]
    pub fn accepts(self, label: i32) -> bool {
        label >= 0 && label <= self.max_label()
    }

    /// Encodes one label. The caller guarantees `accepts(label)`.
    #[inline]
    pub fn write_label<O: DataOutput + ?Sized>(self, out: &mut O, label: i32) {
        debug_assert!(self.accepts(label), "label {label} outside {self:?}");
        match self {
            InputType::Byte1 => out.write_byte(label as u8),
            InputType::Byte2 => out.write_u16_le(label as u16),
            InputType::Byte4 => out.write_vint(label as u32),
        }
    }

    #[inline]
    pub fn read_label<I: DataInput + ?Sized>(self, input: &mut I) -> Result<i32, DecodeError> {
        Ok(match self {
            InputType::Byte1 => input.read_byte()? as i32,
            InputType::Byte2 => input.read_u16_le()? as i32,
            InputType::Byte4 => {
                let v = input.read_vint()?;
                if v > i32::MAX as u32 {
                    return Err(DecodeError::MalformedVarint);
                }
                v as i32
            }
        })
    }
}

/// Converts bytes to byte labels.
pub fn bytes_to_labels(bytes: &[u8]) -> Vec<i32> {
    bytes.iter().map(|&b| b as i32).collect()
}

/// Converts byte labels back to bytes. Returns `None` if a label exceeds 255.
pub fn labels_to_bytes(labels: &[i32]) -> Option<Vec<u8>> {
    labels.iter().map(|&l| u8::try_from(l).ok()).collect()
}

/// Converts text to UTF-16 code unit labels.
pub fn utf16_labels(text: &str) -> Vec<i32> {
    text.encode_utf16().map(|u| u as i32).collect()
}

/// Converts text to code point labels.
pub fn utf32_labels(text: &str) -> Vec<i32> {
    text.chars().map(|c| c as i32).collect()
}

/// Converts code point labels back to text. Returns `None` on an invalid scalar value.
pub fn labels_to_string(labels: &[i32]) -> Option<String> {
    labels
        .iter()
        .map(|&l| u32::try_from(l).ok().and_then(char::from_u32))
        .collect()
}
