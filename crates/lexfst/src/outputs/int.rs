// Scalar output algebras: no payload at all, and non-negative integers.

use lexfst_core::{DataInput, DataOutput, DecodeError};

use super::Outputs;
use crate::FstError;

/// Outputs for a pure acceptor: every value is the unit value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoOutputs;

impl Outputs for NoOutputs {
    type Value = ();

    fn common(&self, _a: &(), _b: &()) {}

    fn subtract(&self, _output: &(), _inc: &()) {}

    fn add(&self, _prefix: &(), _output: &()) {}

    fn write<O: DataOutput + ?Sized>(&self, _value: &(), _out: &mut O) {}

    fn read<I: DataInput + ?Sized>(&self, _input: &mut I) -> Result<(), DecodeError> {
        Ok(())
    }

    fn no_output(&self) {}

    fn merge(&self, _first: &(), _second: &()) -> Result<(), FstError> {
        Ok(())
    }

    fn output_to_string(&self, _value: &()) -> String {
        String::new()
    }

    fn ram_bytes_used(&self, _value: &()) -> usize {
        0
    }
}

/// Non-negative integer outputs, typically ordinals or file offsets.
///
/// The common prefix of two values is their minimum, so outputs only shrink
/// along a path and lookups sum partial outputs. Duplicate inputs keep the
/// smaller value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositiveIntOutputs;

impl Outputs for PositiveIntOutputs {
    type Value = u64;

    #[inline]
    fn common(&self, a: &u64, b: &u64) -> u64 {
        (*a).min(*b)
    }

    #[inline]
    fn subtract(&self, output: &u64, inc: &u64) -> u64 {
        debug_assert!(inc <= output, "cannot subtract {inc} from {output}");
        output - inc
    }

    #[inline]
    fn add(&self, prefix: &u64, output: &u64) -> u64 {
        prefix + output
    }

    fn write<O: DataOutput + ?Sized>(&self, value: &u64, out: &mut O) {
        out.write_vlong(*value);
    }

    fn read<I: DataInput + ?Sized>(&self, input: &mut I) -> Result<u64, DecodeError> {
        input.read_vlong()
    }

    #[inline]
    fn no_output(&self) -> u64 {
        0
    }

    fn merge(&self, first: &u64, second: &u64) -> Result<u64, FstError> {
        Ok((*first).min(*second))
    }

    fn output_to_string(&self, value: &u64) -> String {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::laws;
    use quickcheck::quickcheck;

    #[test]
    fn int_algebra_basics() {
        let o = PositiveIntOutputs;
        assert_eq!(o.common(&7, &3), 3);
        assert_eq!(o.subtract(&7, &3), 4);
        assert_eq!(o.add(&3, &4), 7);
        assert!(o.is_no_output(&0));
        assert_eq!(o.merge(&5, &7).unwrap(), 5);
        assert_eq!(o.output_to_string(&42), "42");
    }

    #[test]
    fn int_encoding_is_vlong() {
        let mut out = Vec::new();
        PositiveIntOutputs.write(&300, &mut out);
        assert_eq!(out, vec![0xAC, 0x02]);
    }

    #[test]
    fn unit_outputs_take_no_bytes() {
        let mut out = Vec::new();
        NoOutputs.write(&(), &mut out);
        NoOutputs.write_final_output(&(), &mut out);
        assert!(out.is_empty());
        assert!(NoOutputs.is_no_output(&()));
        assert!(NoOutputs.merge(&(), &()).is_ok());
    }

    quickcheck! {
        fn int_laws(a: u64, b: u64) -> bool {
            laws::hold(&PositiveIntOutputs, &a, &b)
        }
    }

    #[test]
    fn unit_laws() {
        assert!(laws::hold(&NoOutputs, &(), &()));
    }
}
