//! Compile-time byte-widths of fixed-size encodings
//!
//! [`FixedLength`] associates a type with the exact, invariant number of
//! bytes its encoded form occupies in a message block. Every
//! [`Primitive`](crate::prim::Primitive) is fixed-length, as is any array of
//! fixed-length elements; typed composites expose the same figure through
//! [`Composite::SIZE`](crate::composite::Composite::SIZE).

/// Trait marking a type as having an invariant-length encoded form
pub trait FixedLength {
    /// Invariant byte-length of the encoded forms of all possible values of `Self`
    const LEN: usize;
}

macro_rules! fix_length {
    ($n:expr, $($x:ty),+) => {
        $(impl FixedLength for $x {
            const LEN : usize = $n;
        })+
    };
}

fix_length!(1, u8, i8);
fix_length!(2, u16, i16);
fix_length!(4, u32, i32, f32);
fix_length!(8, i64, u64, f64);

impl<T: FixedLength, const N: usize> FixedLength for [T; N] {
    const LEN: usize = N * T::LEN;
}

#[cfg(test)]
mod test {
    use super::FixedLength;

    #[test]
    fn array_lengths() {
        assert_eq!(<[u8; 6] as FixedLength>::LEN, 6);
        assert_eq!(<[i32; 4] as FixedLength>::LEN, 16);
        assert_eq!(<[f64; 0] as FixedLength>::LEN, 0);
    }
}
