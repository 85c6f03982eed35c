//! Primitive encoder/decoder
//!
//! This module defines the leaf level of the wire format: fixed-width
//! integers and IEEE-754 floats stored at a byte offset in a schema-specified
//! [`ByteOrder`].
//!
//! The [`Primitive`] trait is implemented for the ten Rust types that back
//! the SBE primitive types; the SBE `char` type is carried as `u8` whose null
//! value is overridden in the field descriptor. [`PrimitiveType`] is the
//! runtime tag of the same set, as found in the token IR.
//!
//! [`UintType`] and [`UintField`] cover the handful of places where the
//! schema, rather than the generated code, decides how wide an unsigned
//! value is: group dimensions, var-data length prefixes, and the message
//! header.

use crate::block::window;
use crate::error::FlyweightResult;
use crate::len::FixedLength;
use std::fmt::Debug;

#[cfg(feature = "serde_impls")]
use serde::Serialize;

/// Byte order of a multi-byte primitive on the wire
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde_impls", derive(Serialize))]
pub enum ByteOrder {
    #[default]
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    cfg_if::cfg_if! {
        if #[cfg(target_endian = "big")] {
            /// Byte order of the compilation target
            pub const NATIVE: ByteOrder = ByteOrder::BigEndian;
        } else {
            /// Byte order of the compilation target
            pub const NATIVE: ByteOrder = ByteOrder::LittleEndian;
        }
    }
}

/// Runtime tag for the primitive types of the encoding
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(Serialize))]
pub enum PrimitiveType {
    Char,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float,
    Double,
}

impl PrimitiveType {
    /// Number of bytes a single value of this type occupies
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            PrimitiveType::Char | PrimitiveType::Int8 | PrimitiveType::Uint8 => 1,
            PrimitiveType::Int16 | PrimitiveType::Uint16 => 2,
            PrimitiveType::Int32 | PrimitiveType::Uint32 | PrimitiveType::Float => 4,
            PrimitiveType::Int64 | PrimitiveType::Uint64 | PrimitiveType::Double => 8,
        }
    }

    /// Returns `true` for the single-byte types, whose encoding ignores byte order
    #[must_use]
    pub const fn is_single_byte(self) -> bool {
        self.size() == 1
    }
}

/// Fixed-width numeric types that can be read from and written to a block
/// at a given byte order.
///
/// `read` and `write` expect a slice of at least [`FixedLength::LEN`] bytes;
/// range checks against the enclosing buffer are performed by the caller
/// (see [`crate::block::Block`]), which is why neither method is fallible.
pub trait Primitive: FixedLength + Copy + PartialEq + Debug {
    /// Tag of the SBE primitive type backed by `Self`
    const PRIMITIVE_TYPE: PrimitiveType;
    /// Default representation of "no value" for this type
    const NULL: Self;
    /// Smallest non-null value
    const MIN: Self;
    /// Largest non-null value
    const MAX: Self;

    /// Decodes a value from the first `LEN` bytes of `src`
    fn read(src: &[u8], order: ByteOrder) -> Self;

    /// Encodes `self` into the first `LEN` bytes of `dst`
    fn write(self, dst: &mut [u8], order: ByteOrder);
}

macro_rules! impl_primitive {
    ( $( $t:ty => $tag:ident { null: $null:expr, min: $min:expr, max: $max:expr } ),+ $(,)? ) => {
        $(
            impl Primitive for $t {
                const PRIMITIVE_TYPE: PrimitiveType = PrimitiveType::$tag;
                const NULL: Self = $null;
                const MIN: Self = $min;
                const MAX: Self = $max;

                #[inline]
                fn read(src: &[u8], order: ByteOrder) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$t>()];
                    raw.copy_from_slice(&src[..std::mem::size_of::<$t>()]);
                    match order {
                        ByteOrder::LittleEndian => <$t>::from_le_bytes(raw),
                        ByteOrder::BigEndian => <$t>::from_be_bytes(raw),
                    }
                }

                #[inline]
                fn write(self, dst: &mut [u8], order: ByteOrder) {
                    let raw = match order {
                        ByteOrder::LittleEndian => self.to_le_bytes(),
                        ByteOrder::BigEndian => self.to_be_bytes(),
                    };
                    dst[..raw.len()].copy_from_slice(&raw);
                }
            }
        )+
    };
}

impl_primitive! {
    i8 => Int8 { null: i8::MIN, min: i8::MIN + 1, max: i8::MAX },
    i16 => Int16 { null: i16::MIN, min: i16::MIN + 1, max: i16::MAX },
    i32 => Int32 { null: i32::MIN, min: i32::MIN + 1, max: i32::MAX },
    i64 => Int64 { null: i64::MIN, min: i64::MIN + 1, max: i64::MAX },
    u8 => Uint8 { null: u8::MAX, min: 0, max: u8::MAX - 1 },
    u16 => Uint16 { null: u16::MAX, min: 0, max: u16::MAX - 1 },
    u32 => Uint32 { null: u32::MAX, min: 0, max: u32::MAX - 1 },
    u64 => Uint64 { null: u64::MAX, min: 0, max: u64::MAX - 1 },
    f32 => Float { null: f32::NAN, min: f32::MIN, max: f32::MAX },
    f64 => Double { null: f64::NAN, min: f64::MIN, max: f64::MAX },
}

/// Null value of the SBE `char` type, which shares `u8` as its carrier
pub const CHAR_NULL: u8 = 0;

/// Unsigned integer widths a schema may choose for sizes and counts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(Serialize))]
pub enum UintType {
    U8,
    U16,
    U32,
    U64,
}

impl UintType {
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            UintType::U8 => 1,
            UintType::U16 => 2,
            UintType::U32 => 4,
            UintType::U64 => 8,
        }
    }

    /// Largest value representable at this width
    #[must_use]
    pub const fn max_value(self) -> u64 {
        match self {
            UintType::U8 => u8::MAX as u64,
            UintType::U16 => u16::MAX as u64,
            UintType::U32 => u32::MAX as u64,
            UintType::U64 => u64::MAX,
        }
    }

    /// Maps an unsigned primitive type onto its width, returning `None` for
    /// signed and floating-point types.
    #[must_use]
    pub const fn from_primitive(ty: PrimitiveType) -> Option<Self> {
        match ty {
            PrimitiveType::Uint8 | PrimitiveType::Char => Some(UintType::U8),
            PrimitiveType::Uint16 => Some(UintType::U16),
            PrimitiveType::Uint32 => Some(UintType::U32),
            PrimitiveType::Uint64 => Some(UintType::U64),
            _ => None,
        }
    }

    /// Decodes an unsigned value of this width from the first bytes of `src`
    #[must_use]
    pub fn read(self, src: &[u8], order: ByteOrder) -> u64 {
        match self {
            UintType::U8 => u64::from(u8::read(src, order)),
            UintType::U16 => u64::from(u16::read(src, order)),
            UintType::U32 => u64::from(u32::read(src, order)),
            UintType::U64 => u64::read(src, order),
        }
    }

    /// Encodes `value` at this width, discarding any high-order bits that
    /// do not fit.
    pub fn write(self, dst: &mut [u8], order: ByteOrder, value: u64) {
        match self {
            UintType::U8 => (value as u8).write(dst, order),
            UintType::U16 => (value as u16).write(dst, order),
            UintType::U32 => (value as u32).write(dst, order),
            UintType::U64 => value.write(dst, order),
        }
    }
}

/// Location and encoding of an unsigned member of a schema-defined composite
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(Serialize))]
pub struct UintField {
    pub offset: usize,
    pub ty: UintType,
    pub byte_order: ByteOrder,
}

impl UintField {
    #[must_use]
    pub const fn new(offset: usize, ty: UintType, byte_order: ByteOrder) -> Self {
        Self {
            offset,
            ty,
            byte_order,
        }
    }

    /// Offset of the first byte following this member
    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset + self.ty.size()
    }

    /// Reads this member from a composite starting at `base`
    pub fn read(&self, buf: &[u8], base: usize) -> FlyweightResult<u64> {
        let src = window(buf, base + self.offset, self.ty.size())?;
        Ok(self.ty.read(src, self.byte_order))
    }

    /// Writes this member into a composite starting at `base`
    pub fn write(&self, buf: &mut [u8], base: usize, value: u64) -> FlyweightResult<()> {
        let dst = crate::block::window_mut(buf, base + self.offset, self.ty.size())?;
        self.ty.write(dst, self.byte_order, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn round_trip<T: Primitive>(v: T, order: ByteOrder) -> T {
        let mut buf = [0u8; 8];
        v.write(&mut buf, order);
        T::read(&buf, order)
    }

    #[test]
    fn known_layouts() {
        let mut buf = [0u8; 4];
        0x0102_0304u32.write(&mut buf, ByteOrder::BigEndian);
        assert_eq!(buf, [0x01, 0x02, 0x03, 0x04]);
        0x0102_0304u32.write(&mut buf, ByteOrder::LittleEndian);
        assert_eq!(buf, [0x04, 0x03, 0x02, 0x01]);
        assert_eq!(i16::read(&[0xff, 0xfe], ByteOrder::BigEndian), -2);
    }

    #[test]
    fn single_byte_ignores_order() {
        let mut le = [0u8; 1];
        let mut be = [0u8; 1];
        (-5i8).write(&mut le, ByteOrder::LittleEndian);
        (-5i8).write(&mut be, ByteOrder::BigEndian);
        assert_eq!(le, be);
        assert!(PrimitiveType::Char.is_single_byte());
    }

    #[test]
    fn null_values() {
        assert_eq!(<u8 as Primitive>::NULL, 255);
        assert_eq!(<i32 as Primitive>::NULL, i32::MIN);
        assert!(<f64 as Primitive>::NULL.is_nan());
        assert_eq!(<u64 as Primitive>::PRIMITIVE_TYPE.size(), 8);
    }

    #[test]
    fn uint_truncates_on_write() {
        let mut buf = [0u8; 2];
        UintType::U8.write(&mut buf, ByteOrder::LittleEndian, 0x1ff);
        assert_eq!(buf[0], 0xff);
        assert_eq!(UintType::U8.read(&buf, ByteOrder::BigEndian), 0xff);
        assert_eq!(UintType::from_primitive(PrimitiveType::Int32), None);
    }

    #[test]
    fn uint_field_bounds() {
        let buf = [0u8; 3];
        let field = UintField::new(2, UintType::U16, ByteOrder::LittleEndian);
        assert!(field.read(&buf, 0).is_err());
        assert_eq!(field.end(), 4);
    }

    fn order() -> impl Strategy<Value = ByteOrder> {
        prop_oneof![Just(ByteOrder::LittleEndian), Just(ByteOrder::BigEndian)]
    }

    proptest! {
        #[test]
        fn integers_round_trip(a in any::<i8>(), b in any::<u16>(), c in any::<i32>(), d in any::<u64>(), o in order()) {
            prop_assert_eq!(round_trip(a, o), a);
            prop_assert_eq!(round_trip(b, o), b);
            prop_assert_eq!(round_trip(c, o), c);
            prop_assert_eq!(round_trip(d, o), d);
        }

        #[test]
        fn signed_and_unsigned_round_trip(a in any::<u8>(), b in any::<i16>(), c in any::<u32>(), d in any::<i64>(), o in order()) {
            prop_assert_eq!(round_trip(a, o), a);
            prop_assert_eq!(round_trip(b, o), b);
            prop_assert_eq!(round_trip(c, o), c);
            prop_assert_eq!(round_trip(d, o), d);
        }

        #[test]
        fn floats_round_trip_bitwise(a in any::<f32>(), b in any::<f64>(), o in order()) {
            prop_assert_eq!(round_trip(a, o).to_bits(), a.to_bits());
            prop_assert_eq!(round_trip(b, o).to_bits(), b.to_bits());
        }
    }
}
