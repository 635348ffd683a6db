//! The output algebra.
//!
//! Every accepted input maps to one value; the value is spread along the
//! input's path as partial outputs whose `add`-composition yields the whole.
//! Siblings factor out their `common` prefix once per node, which is what
//! lets the builder share both prefixes and suffixes of payloads.
//!
//! Implementations must satisfy, for every `w` and every `p` that is a
//! `common` prefix of `w`:
//!
//! - `add(p, subtract(w, p)) == w`
//! - `common(w, w) == w`
//! - `subtract(w, no_output()) == w` and `add(no_output(), w) == w`
//!
//! A violation does not crash anything; it silently yields wrong lookups.

mod int;
mod pair;
mod sequence;

pub use int::{NoOutputs, PositiveIntOutputs};
pub use pair::PairOutputs;
pub use sequence::{ByteSequenceOutputs, CharSequenceOutputs, IntSequenceOutputs, SequenceOutputs};

use std::fmt::Debug;
use std::hash::Hash;

use lexfst_core::{DataInput, DataOutput, DecodeError};

use crate::FstError;

/// Payload algebra carried on arcs.
///
/// The identity value is [`Outputs::no_output`]; arcs and final states
/// holding it are stored without any output bytes.
pub trait Outputs: Clone + Send + Sync {
    type Value: Clone + Eq + Hash + Debug + Send + Sync;

    /// Longest shared prefix of `a` and `b`.
    fn common(&self, a: &Self::Value, b: &Self::Value) -> Self::Value;

    /// Removes the prefix `inc` from `output`.
    fn subtract(&self, output: &Self::Value, inc: &Self::Value) -> Self::Value;

    /// Appends `output` to `prefix`.
    fn add(&self, prefix: &Self::Value, output: &Self::Value) -> Self::Value;

    fn write<O: DataOutput + ?Sized>(&self, value: &Self::Value, out: &mut O);

    /// Encoding used for final outputs. Defaults to [`write`](Self::write).
    fn write_final_output<O: DataOutput + ?Sized>(&self, value: &Self::Value, out: &mut O) {
        self.write(value, out);
    }

    fn read<I: DataInput + ?Sized>(&self, input: &mut I) -> Result<Self::Value, DecodeError>;

    fn skip_output<I: DataInput + ?Sized>(&self, input: &mut I) -> Result<(), DecodeError> {
        self.read(input).map(drop)
    }

    fn read_final_output<I: DataInput + ?Sized>(
        &self,
        input: &mut I,
    ) -> Result<Self::Value, DecodeError> {
        self.read(input)
    }

    fn skip_final_output<I: DataInput + ?Sized>(&self, input: &mut I) -> Result<(), DecodeError> {
        self.skip_output(input)
    }

    /// The additive identity.
    fn no_output(&self) -> Self::Value;

    fn is_no_output(&self, value: &Self::Value) -> bool {
        *value == self.no_output()
    }

    /// Combines two outputs added for the same input.
    ///
    /// The default refuses; duplicate inputs are then a build error.
    fn merge(&self, _first: &Self::Value, _second: &Self::Value) -> Result<Self::Value, FstError> {
        Err(FstError::MergeUnsupported)
    }

    fn output_to_string(&self, value: &Self::Value) -> String {
        format!("{value:?}")
    }

    /// Approximate heap plus inline size of `value`.
    fn ram_bytes_used(&self, value: &Self::Value) -> usize {
        let _ = value;
        std::mem::size_of::<Self::Value>()
    }
}
