//! Field descriptors
//!
//! A descriptor is a small `Copy` value that records where a field lives
//! within its enclosing block and how it is encoded: offset, byte order,
//! the version in which it was introduced, and for scalars the value that
//! stands in for it when the data predates that version.
//!
//! Descriptors carry no buffer and perform no I/O on their own; they are
//! handed to the accessors of [`Block`](crate::block::Block) and
//! [`BlockMut`](crate::block::BlockMut). Generated codecs declare them as
//! `const` items, so all of their constructors are `const fn`.

use std::marker::PhantomData;

use crate::bitset::BitRepr;
use crate::enumeration::SbeEnum;
use crate::error::{BoundsError, FlyweightResult};
use crate::len::FixedLength;
use crate::prim::{ByteOrder, Primitive};

#[cfg(feature = "serde_impls")]
use serde::Serialize;

/// Returns `true` if a field introduced in `since_version` is present in
/// data encoded at `acting_version`.
#[inline]
#[must_use]
pub const fn is_present(since_version: u16, acting_version: u16) -> bool {
    acting_version >= since_version
}

/// Single primitive value at a fixed offset
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde_impls", derive(Serialize))]
pub struct Field<T: Primitive> {
    pub offset: usize,
    pub since_version: u16,
    pub byte_order: ByteOrder,
    /// Value returned when the field is absent in the acting version
    pub null: T,
}

impl<T: Primitive> Field<T> {
    #[must_use]
    pub const fn new(offset: usize, byte_order: ByteOrder) -> Self {
        Self::with_null(offset, byte_order, 0, T::NULL)
    }

    #[must_use]
    pub const fn versioned(offset: usize, byte_order: ByteOrder, since_version: u16) -> Self {
        Self::with_null(offset, byte_order, since_version, T::NULL)
    }

    /// Constructs a descriptor whose absent-value differs from the type
    /// default, as for `char` fields or a schema-declared `nullValue`.
    #[must_use]
    pub const fn with_null(
        offset: usize,
        byte_order: ByteOrder,
        since_version: u16,
        null: T,
    ) -> Self {
        Self {
            offset,
            since_version,
            byte_order,
            null,
        }
    }

    /// Offset of the first byte following this field
    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset + T::LEN
    }
}

/// Fixed-length array of `N` primitives
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde_impls", derive(Serialize))]
pub struct ArrayField<T: Primitive, const N: usize> {
    pub offset: usize,
    pub since_version: u16,
    pub byte_order: ByteOrder,
    pub null: T,
    /// Character encoding of `char` arrays, e.g. `"UTF-8"`
    pub character_encoding: Option<&'static str>,
}

impl<T: Primitive, const N: usize> ArrayField<T, N> {
    /// Number of elements
    pub const LENGTH: usize = N;

    #[must_use]
    pub const fn new(offset: usize, byte_order: ByteOrder, since_version: u16) -> Self {
        Self {
            offset,
            since_version,
            byte_order,
            null: T::NULL,
            character_encoding: None,
        }
    }

    /// Constructs a descriptor for a `char` array with the given absent-value
    /// and character encoding.
    #[must_use]
    pub const fn chars(
        offset: usize,
        since_version: u16,
        null: T,
        character_encoding: &'static str,
    ) -> Self {
        Self {
            offset,
            since_version,
            byte_order: ByteOrder::LittleEndian,
            null,
            character_encoding: Some(character_encoding),
        }
    }

    /// Total encoded width of the array in bytes
    #[must_use]
    pub const fn width(&self) -> usize {
        <[T; N] as FixedLength>::LEN
    }

    /// Byte offset of element `index`, relative to the enclosing block.
    ///
    /// # Errors
    ///
    /// Returns [`BoundsError::IndexOutOfRange`] if `index >= N`.
    pub fn element_offset(&self, index: usize) -> FlyweightResult<usize> {
        if index >= N {
            tracing::debug!(index, length = N, "array index rejected");
            return Err(BoundsError::IndexOutOfRange { index, length: N }.into());
        }
        Ok(self.offset + index * T::LEN)
    }
}

/// Field whose value is fixed by the schema and occupies no bytes
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde_impls", derive(Serialize))]
pub struct ConstField<T: Primitive> {
    value: T,
}

impl<T: Primitive> ConstField<T> {
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self { value }
    }

    #[inline]
    #[must_use]
    pub const fn get(&self) -> T {
        self.value
    }
}

/// Constant `char` array whose literal is part of the schema
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde_impls", derive(Serialize))]
pub struct ConstBytes {
    value: &'static [u8],
}

impl ConstBytes {
    #[must_use]
    pub const fn new(value: &'static [u8]) -> Self {
        Self { value }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.value.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &'static [u8] {
        self.value
    }

    /// Returns the byte at `index` of the literal.
    ///
    /// # Errors
    ///
    /// Returns [`BoundsError::IndexOutOfRange`] if `index` is not less than
    /// the literal's length.
    pub fn get_at(&self, index: usize) -> FlyweightResult<u8> {
        self.value.get(index).copied().ok_or_else(|| {
            BoundsError::IndexOutOfRange {
                index,
                length: self.value.len(),
            }
            .into()
        })
    }

    /// Copies `min(length, self.len())` bytes of the literal into `dst`
    /// starting at `offset`, returning the number of bytes copied.
    ///
    /// # Errors
    ///
    /// Returns [`BoundsError::CopyOutOfRange`] if `dst` cannot hold the copy,
    /// including when `offset` lies past the end of `dst`.
    pub fn get_bytes(&self, dst: &mut [u8], offset: usize, length: usize) -> FlyweightResult<usize> {
        let n = length.min(self.value.len());
        let end = offset
            .checked_add(n)
            .filter(|&end| offset <= dst.len() && end <= dst.len())
            .ok_or(BoundsError::CopyOutOfRange {
                requested: n,
                available: dst.len().saturating_sub(offset),
            })?;
        dst[offset..end].copy_from_slice(&self.value[..n]);
        Ok(n)
    }
}

/// Enumeration stored as its primitive representation
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde_impls", derive(Serialize), serde(bound = ""))]
pub struct EnumField<E: SbeEnum> {
    pub offset: usize,
    pub since_version: u16,
    pub byte_order: ByteOrder,
    #[cfg_attr(feature = "serde_impls", serde(skip))]
    _marker: PhantomData<E>,
}

impl<E: SbeEnum> Clone for EnumField<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: SbeEnum> Copy for EnumField<E> {}

impl<E: SbeEnum> EnumField<E> {
    #[must_use]
    pub const fn new(offset: usize, byte_order: ByteOrder, since_version: u16) -> Self {
        Self {
            offset,
            since_version,
            byte_order,
            _marker: PhantomData,
        }
    }
}

/// Bit set stored as an unsigned integer of type `R`
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde_impls", derive(Serialize), serde(bound = ""))]
pub struct BitSetField<R: BitRepr> {
    pub offset: usize,
    pub since_version: u16,
    pub byte_order: ByteOrder,
    #[cfg_attr(feature = "serde_impls", serde(skip))]
    _marker: PhantomData<R>,
}

impl<R: BitRepr> Clone for BitSetField<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: BitRepr> Copy for BitSetField<R> {}

impl<R: BitRepr> BitSetField<R> {
    #[must_use]
    pub const fn new(offset: usize, byte_order: ByteOrder, since_version: u16) -> Self {
        Self {
            offset,
            since_version,
            byte_order,
            _marker: PhantomData,
        }
    }
}

/// Composite embedded in a block
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(Serialize))]
pub struct CompositeField {
    pub offset: usize,
    pub size: usize,
    pub since_version: u16,
}

impl CompositeField {
    #[must_use]
    pub const fn new(offset: usize, size: usize, since_version: u16) -> Self {
        Self {
            offset,
            size,
            since_version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlyweightError;

    #[test]
    fn absent_value_defaults() {
        const F: Field<u32> = Field::versioned(4, ByteOrder::LittleEndian, 2);
        assert_eq!(F.null, u32::MAX);
        assert_eq!(F.end(), 8);
        const C: Field<u8> = Field::with_null(0, ByteOrder::LittleEndian, 1, 0);
        assert_eq!(C.null, 0);
        assert!(is_present(1, 1));
        assert!(!is_present(2, 1));
    }

    #[test]
    fn array_indexing() {
        const A: ArrayField<u16, 4> = ArrayField::new(2, ByteOrder::BigEndian, 0);
        assert_eq!(A.width(), 8);
        assert_eq!(A.element_offset(3).unwrap(), 8);
        assert_eq!(
            A.element_offset(4).unwrap_err(),
            FlyweightError::Bounds(BoundsError::IndexOutOfRange {
                index: 4,
                length: 4
            })
        );
        assert_eq!(ArrayField::<u16, 4>::LENGTH, 4);
    }

    #[test]
    fn const_bytes_copy_is_clamped() {
        const MAKE: ConstBytes = ConstBytes::new(b"Honda");
        let mut dst = [0u8; 8];
        assert_eq!(MAKE.get_bytes(&mut dst, 1, 3).unwrap(), 3);
        assert_eq!(&dst[..4], b"\0Hon");
        assert_eq!(MAKE.get_bytes(&mut dst, 0, 100).unwrap(), 5);
        assert!(MAKE.get_bytes(&mut dst, 5, 5).is_err());
        assert_eq!(MAKE.get_at(4).unwrap(), b'a');
        assert!(MAKE.get_at(5).is_err());
    }

    #[test]
    fn const_bytes_offset_beyond_destination() {
        const MAKE: ConstBytes = ConstBytes::new(b"Honda");
        let mut dst = [0u8; 4];
        assert_eq!(
            MAKE.get_bytes(&mut dst, 10, 0).unwrap_err(),
            FlyweightError::Bounds(BoundsError::CopyOutOfRange {
                requested: 0,
                available: 0
            })
        );
        assert!(MAKE.get_bytes(&mut dst, usize::MAX, 5).is_err());
        assert_eq!(MAKE.get_bytes(&mut dst, 4, 0).unwrap(), 0);
        assert_eq!(dst, [0u8; 4]);
    }

    #[test]
    fn constants_never_touch_buffers() {
        const VERSION: ConstField<i8> = ConstField::new(3);
        assert_eq!(VERSION.get(), 3);
    }

    #[cfg(feature = "serde_impls")]
    #[test]
    fn descriptors_are_serializable() {
        fn serializable<T: Serialize>(_: &T) {}
        serializable(&Field::<u32>::new(0, ByteOrder::LittleEndian));
        serializable(&ArrayField::<u8, 4>::chars(0, 0, 0, "ASCII"));
        serializable(&ConstBytes::new(b"Honda"));
        serializable(&BitSetField::<u8>::new(0, ByteOrder::LittleEndian, 0));
        serializable(&CompositeField::new(0, 4, 0));
    }
}
