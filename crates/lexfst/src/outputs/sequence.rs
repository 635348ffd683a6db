// Sequence output algebras: bytes, UTF-16 units, ints.

use std::fmt::{self, Debug};
use std::hash::Hash;
use std::marker::PhantomData;

use lexfst_core::{DataInput, DataOutput, DecodeError};

use super::Outputs;

/// Element of a sequence output and its on-disk encoding.
pub trait SequenceElement: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    fn write_element<O: DataOutput + ?Sized>(self, out: &mut O);

    fn read_element<I: DataInput + ?Sized>(input: &mut I) -> Result<Self, DecodeError>;
}

impl SequenceElement for u8 {
    #[inline]
    fn write_element<O: DataOutput + ?Sized>(self, out: &mut O) {
        out.write_byte(self);
    }

    #[inline]
    fn read_element<I: DataInput + ?Sized>(input: &mut I) -> Result<Self, DecodeError> {
        input.read_byte()
    }
}

impl SequenceElement for u16 {
    #[inline]
    fn write_element<O: DataOutput + ?Sized>(self, out: &mut O) {
        out.write_vint(self as u32);
    }

    #[inline]
    fn read_element<I: DataInput + ?Sized>(input: &mut I) -> Result<Self, DecodeError> {
        u16::try_from(input.read_vint()?).map_err(|_| DecodeError::MalformedVarint)
    }
}

impl SequenceElement for i32 {
    #[inline]
    fn write_element<O: DataOutput + ?Sized>(self, out: &mut O) {
        out.write_vint(self as u32);
    }

    #[inline]
    fn read_element<I: DataInput + ?Sized>(input: &mut I) -> Result<Self, DecodeError> {
        Ok(input.read_vint()? as i32)
    }
}

/// Outputs that are sequences; the common prefix is the literal shared prefix.
///
/// Encoded as a vInt length followed by the elements. Duplicate inputs are
/// rejected since there is no natural merge of two sequences.
pub struct SequenceOutputs<E>(PhantomData<fn() -> E>);

/// Byte-string outputs, e.g. serialized term metadata.
pub type ByteSequenceOutputs = SequenceOutputs<u8>;

/// UTF-16 code unit outputs, each unit stored as a vInt.
pub type CharSequenceOutputs = SequenceOutputs<u16>;

/// Int sequence outputs, each int stored as a vInt.
pub type IntSequenceOutputs = SequenceOutputs<i32>;

impl<E> SequenceOutputs<E> {
    pub const fn new() -> Self {
        SequenceOutputs(PhantomData)
    }
}

impl<E> Default for SequenceOutputs<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for SequenceOutputs<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for SequenceOutputs<E> {}

impl<E> Debug for SequenceOutputs<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SequenceOutputs<{}>", std::any::type_name::<E>())
    }
}

impl<E: SequenceElement> Outputs for SequenceOutputs<E> {
    type Value = Vec<E>;

    fn common(&self, a: &Vec<E>, b: &Vec<E>) -> Vec<E> {
        let shared = a.iter().zip(b).take_while(|(x, y)| x == y).count();
        a[..shared].to_vec()
    }

    fn subtract(&self, output: &Vec<E>, inc: &Vec<E>) -> Vec<E> {
        debug_assert!(output.starts_with(inc), "{inc:?} is not a prefix of {output:?}");
        output[inc.len()..].to_vec()
    }

    fn add(&self, prefix: &Vec<E>, output: &Vec<E>) -> Vec<E> {
        if prefix.is_empty() {
            return output.clone();
        }
        let mut joined = Vec::with_capacity(prefix.len() + output.len());
        joined.extend_from_slice(prefix);
        joined.extend_from_slice(output);
        joined
    }

    fn write<O: DataOutput + ?Sized>(&self, value: &Vec<E>, out: &mut O) {
        out.write_vint(value.len() as u32);
        for &e in value {
            e.write_element(out);
        }
    }

    fn read<I: DataInput + ?Sized>(&self, input: &mut I) -> Result<Vec<E>, DecodeError> {
        let len = input.read_vint()? as usize;
        // The length is untrusted; grow as elements actually decode.
        let mut value = Vec::with_capacity(len.min(64));
        for _ in 0..len {
            value.push(E::read_element(input)?);
        }
        Ok(value)
    }

    fn no_output(&self) -> Vec<E> {
        Vec::new()
    }

    fn is_no_output(&self, value: &Vec<E>) -> bool {
        value.is_empty()
    }

    fn ram_bytes_used(&self, value: &Vec<E>) -> usize {
        std::mem::size_of::<Vec<E>>() + value.capacity() * std::mem::size_of::<E>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FstError;
    use crate::outputs::laws;
    use quickcheck::quickcheck;

    #[test]
    fn byte_prefix_algebra() {
        let o = ByteSequenceOutputs::new();
        let a = b"abcd".to_vec();
        let b = b"abxy".to_vec();
        let p = o.common(&a, &b);
        assert_eq!(p, b"ab");
        assert_eq!(o.subtract(&a, &p), b"cd");
        assert_eq!(o.add(&p, &b"cd".to_vec()), a);
        assert!(o.common(&a, &Vec::new()).is_empty());
        assert!(matches!(o.merge(&a, &b), Err(FstError::MergeUnsupported)));
    }

    #[test]
    fn encoding_layout() {
        let mut out = Vec::new();
        ByteSequenceOutputs::new().write(&vec![7, 8], &mut out);
        assert_eq!(out, vec![2, 7, 8]);

        out.clear();
        CharSequenceOutputs::new().write(&vec![0x263A], &mut out);
        assert_eq!(out, vec![1, 0xBA, 0x4C]);
    }

    #[test]
    fn truncated_sequence_is_an_error() {
        let data = [5u8, 1, 2];
        let mut input = lexfst_core::SliceDataInput::new(&data);
        assert!(ByteSequenceOutputs::new().read(&mut input).is_err());
    }

    quickcheck! {
        fn byte_laws(a: Vec<u8>, b: Vec<u8>) -> bool {
            laws::hold(&ByteSequenceOutputs::new(), &a, &b)
        }

        fn byte_laws_shared_prefix(p: Vec<u8>, a: Vec<u8>, b: Vec<u8>) -> bool {
            let o = ByteSequenceOutputs::new();
            laws::hold(&o, &o.add(&p, &a), &o.add(&p, &b))
        }

        fn char_laws(a: Vec<u16>, b: Vec<u16>) -> bool {
            laws::hold(&CharSequenceOutputs::new(), &a, &b)
        }

        fn int_sequence_laws(a: Vec<i32>, b: Vec<i32>) -> bool {
            laws::hold(&IntSequenceOutputs::new(), &a, &b)
        }
    }
}
