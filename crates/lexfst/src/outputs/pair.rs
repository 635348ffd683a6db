// Composition of two output algebras.

use lexfst_core::{DataInput, DataOutput, DecodeError};

use super::Outputs;
use crate::FstError;

/// Pairs two algebras; every operation applies component-wise.
#[derive(Debug, Clone, Default)]
pub struct PairOutputs<A, B> {
    first: A,
    second: B,
}

impl<A: Outputs, B: Outputs> PairOutputs<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    pub fn first(&self) -> &A {
        &self.first
    }

    pub fn second(&self) -> &B {
        &self.second
    }
}

impl<A: Outputs, B: Outputs> Outputs for PairOutputs<A, B> {
    type Value = (A::Value, B::Value);

    fn common(&self, a: &Self::Value, b: &Self::Value) -> Self::Value {
        (self.first.common(&a.0, &b.0), self.second.common(&a.1, &b.1))
    }

    fn subtract(&self, output: &Self::Value, inc: &Self::Value) -> Self::Value {
        (
            self.first.subtract(&output.0, &inc.0),
            self.second.subtract(&output.1, &inc.1),
        )
    }

    fn add(&self, prefix: &Self::Value, output: &Self::Value) -> Self::Value {
        (
            self.first.add(&prefix.0, &output.0),
            self.second.add(&prefix.1, &output.1),
        )
    }

    fn write<O: DataOutput + ?Sized>(&self, value: &Self::Value, out: &mut O) {
        self.first.write(&value.0, out);
        self.second.write(&value.1, out);
    }

    fn write_final_output<O: DataOutput + ?Sized>(&self, value: &Self::Value, out: &mut O) {
        self.first.write_final_output(&value.0, out);
        self.second.write_final_output(&value.1, out);
    }

    fn read<I: DataInput + ?Sized>(&self, input: &mut I) -> Result<Self::Value, DecodeError> {
        let a = self.first.read(input)?;
        let b = self.second.read(input)?;
        Ok((a, b))
    }

    fn skip_output<I: DataInput + ?Sized>(&self, input: &mut I) -> Result<(), DecodeError> {
        self.first.skip_output(input)?;
        self.second.skip_output(input)
    }

    fn read_final_output<I: DataInput + ?Sized>(
        &self,
        input: &mut I,
    ) -> Result<Self::Value, DecodeError> {
        let a = self.first.read_final_output(input)?;
        let b = self.second.read_final_output(input)?;
        Ok((a, b))
    }

    fn skip_final_output<I: DataInput + ?Sized>(&self, input: &mut I) -> Result<(), DecodeError> {
        self.first.skip_final_output(input)?;
        self.second.skip_final_output(input)
    }

    fn no_output(&self) -> Self::Value {
        (self.first.no_output(), self.second.no_output())
    }

    fn is_no_output(&self, value: &Self::Value) -> bool {
        self.first.is_no_output(&value.0) && self.second.is_no_output(&value.1)
    }

    fn merge(&self, a: &Self::Value, b: &Self::Value) -> Result<Self::Value, FstError> {
        Ok((self.first.merge(&a.0, &b.0)?, self.second.merge(&a.1, &b.1)?))
    }

    fn output_to_string(&self, value: &Self::Value) -> String {
        format!(
            "<{},{}>",
            self.first.output_to_string(&value.0),
            self.second.output_to_string(&value.1)
        )
    }

    fn ram_bytes_used(&self, value: &Self::Value) -> usize {
        self.first.ram_bytes_used(&value.0) + self.second.ram_bytes_used(&value.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::{ByteSequenceOutputs, PositiveIntOutputs, laws};
    use quickcheck::quickcheck;

    fn pair() -> PairOutputs<PositiveIntOutputs, ByteSequenceOutputs> {
        PairOutputs::new(PositiveIntOutputs, ByteSequenceOutputs::new())
    }

    #[test]
    fn componentwise() {
        let o = pair();
        let a = (10, b"ab".to_vec());
        let b = (4, b"ax".to_vec());
        assert_eq!(o.common(&a, &b), (4, b"a".to_vec()));
        assert_eq!(o.output_to_string(&(3, vec![])), "<3,[]>");
        assert!(o.is_no_output(&(0, vec![])));
        assert!(!o.is_no_output(&(0, vec![1])));
    }

    #[test]
    fn merge_needs_both_components() {
        let o = pair();
        assert!(o.merge(&(1, vec![]), &(2, vec![])).is_err());
        let ints = PairOutputs::new(PositiveIntOutputs, PositiveIntOutputs);
        assert_eq!(ints.merge(&(5, 1), &(7, 0)).unwrap(), (5, 0));
    }

    quickcheck! {
        fn pair_laws(a: (u64, Vec<u8>), b: (u64, Vec<u8>)) -> bool {
            laws::hold(&pair(), &a, &b)
        }
    }
}
