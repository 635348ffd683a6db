//! Minimal acyclic finite state transducers over sorted label sequences.
//!
//! An FST maps sorted keys (bytes, UTF-16 units or code points) to outputs
//! drawn from a pluggable algebra, sharing both common prefixes and common
//! suffixes. It is built in one streaming pass over sorted input and stored
//! in a compact byte-addressable form that can be saved, reloaded, or read
//! straight out of a shared (for example memory-mapped) buffer.
//!
//! # Architecture
//!
//! - [`bytes_store`] -- Append-only block storage the builder writes into
//! - [`reader`] -- Forward and reverse cursors over stored bytes
//! - [`bit_table`] -- Rank/select over the presence bits of direct-addressed nodes
//! - [`outputs`] -- The output algebra and its concrete payload types
//! - [`node_hash`] -- Suffix-sharing dedup table over frozen nodes
//! - [`builder`] -- Streaming construction from sorted (input, output) pairs
//! - [`fst`] -- The frozen automaton, arc navigation, save and load
//! - [`enumerator`] -- Ordered iteration and floor/ceil/exact seeks
//! - [`util`] -- Lookups and diagnostics built on arc navigation
//!
//! # Example
//!
//! ```
//! use lexfst::builder::FstBuilder;
//! use lexfst::outputs::PositiveIntOutputs;
//! use lexfst::InputType;
//!
//! let mut builder = FstBuilder::new(InputType::Byte1, PositiveIntOutputs);
//! builder.add_bytes(b"car", 2).unwrap();
//! builder.add_bytes(b"cat", 1).unwrap();
//! let fst = builder.finish().unwrap().expect("non-empty");
//! assert_eq!(fst.get_bytes(b"cat").unwrap(), Some(1));
//! assert_eq!(fst.get_bytes(b"ca").unwrap(), None);
//! ```

pub mod bit_table;
pub mod builder;
pub mod bytes_store;
pub mod enumerator;
pub mod fst;
pub mod node_hash;
pub mod outputs;
pub mod reader;
pub mod util;

pub use builder::{BuilderOptions, FstBuilder};
pub use enumerator::{BytesFstEnum, FstEnum, InputOutput};
pub use fst::{Fst, FstArc};
pub use lexfst_core::{DecodeError, InputType};
pub use outputs::Outputs;

/// Error type for building, loading and reading FSTs.
#[derive(Debug, thiserror::Error)]
pub enum FstError {
    #[error("inputs must be added in sorted order: {current:?} follows {previous:?}")]
    OutOfOrder { previous: Vec<i32>, current: Vec<i32> },
    #[error("the empty input may only be added first")]
    EmptyInputNotFirst,
    #[error("label {label} is outside the {input_type:?} alphabet")]
    LabelOutOfRange { label: i32, input_type: InputType },
    #[error("this output type cannot merge outputs of a duplicated input")]
    MergeUnsupported,
    #[error("invalid builder options: {0}")]
    InvalidOptions(String),
    #[error("builder is unusable after an earlier failure")]
    BuilderPoisoned,
    #[error("invalid header magic {0:#010x}")]
    InvalidMagic(u32),
    #[error("codec mismatch: expected {expected:?}, found {found:?}")]
    CodecMismatch { expected: &'static str, found: String },
    #[error("unsupported format version {found} (supported {min}..={max})")]
    UnsupportedVersion { found: u32, min: u32, max: u32 },
    #[error("invalid input type tag {0}")]
    InvalidInputType(u8),
    #[error("corrupt FST: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FstError>;
