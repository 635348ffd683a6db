//! Shared building blocks for the lexfst transducer engine.
//!
//! - [`io`] -- Byte-oriented output/input traits with variable-length integer codecs
//! - [`labels`] -- Alphabet widths and conversions between text and label sequences

pub mod io;
pub mod labels;

pub use io::{DataInput, DataOutput, ReadDataInput, SliceDataInput};
pub use labels::{InputType, bytes_to_labels, labels_to_bytes, labels_to_string, utf16_labels, utf32_labels};

/// Error type for decoding bytes produced by a [`DataOutput`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unexpected end of input after {consumed} bytes")]
    UnexpectedEof { consumed: u64 },
    #[error("read at position {position} outside of {length} available bytes")]
    OutOfBounds { position: i64, length: u64 },
    #[error("malformed variable-length integer")]
    MalformedVarint,
    #[error("invalid UTF-8 in encoded string")]
    InvalidUtf8,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
