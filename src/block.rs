//! Fixed-offset accessors over a block of a buffer
//!
//! [`Block`] is implemented by every flyweight that exposes fields at fixed
//! offsets from a base: the message root block, the current element of a
//! repeating group, and composites. All of its accessors are provided
//! methods written against three required ones, so the version-gating and
//! range-checking rules live in exactly one place.
//!
//! Reads consult the acting version first: a field introduced after the
//! acting version is never read from the buffer, and its designated absent
//! value is returned instead. Writes ([`BlockMut`]) are unconditional, since
//! an encoder always writes at the schema's own version.

use crate::bitset::BitRepr;
use crate::composite::{Composite, FixedFlyweight};
use crate::enumeration::SbeEnum;
use crate::error::{BoundsError, FlyweightResult};
use crate::field::{is_present, ArrayField, BitSetField, CompositeField, EnumField, Field};
use crate::len::FixedLength;
use crate::prim::Primitive;

fn access_error(offset: usize, width: usize, capacity: usize) -> BoundsError {
    tracing::debug!(offset, width, capacity, "access beyond capacity");
    BoundsError::AccessBeyondCapacity {
        offset,
        width,
        capacity,
    }
}

/// Returns the `width` bytes of `buf` starting at `offset`.
///
/// # Errors
///
/// Returns [`BoundsError::AccessBeyondCapacity`] if the range does not lie
/// entirely within `buf`.
#[inline]
pub fn window(buf: &[u8], offset: usize, width: usize) -> FlyweightResult<&[u8]> {
    let capacity = buf.len();
    offset
        .checked_add(width)
        .and_then(|end| buf.get(offset..end))
        .ok_or_else(|| access_error(offset, width, capacity).into())
}

/// Mutable counterpart of [`window`]
#[inline]
pub fn window_mut(buf: &mut [u8], offset: usize, width: usize) -> FlyweightResult<&mut [u8]> {
    let capacity = buf.len();
    match offset.checked_add(width) {
        Some(end) if end <= capacity => Ok(&mut buf[offset..end]),
        _ => Err(access_error(offset, width, capacity).into()),
    }
}

/// Read access to the fields of a block.
pub trait Block {
    /// Entire underlying buffer
    fn buffer(&self) -> &[u8];

    /// Absolute offset of the block within [`buffer`](Block::buffer)
    fn base(&self) -> usize;

    /// Schema version of the data being read
    fn acting_version(&self) -> u16;

    /// Reads a primitive field, or returns its absent value if the field
    /// postdates the acting version.
    fn get<T: Primitive>(&self, field: &Field<T>) -> FlyweightResult<T> {
        if !is_present(field.since_version, self.acting_version()) {
            return Ok(field.null);
        }
        let src = window(self.buffer(), self.base() + field.offset, T::LEN)?;
        Ok(T::read(src, field.byte_order))
    }

    /// Reads element `index` of an array field.
    ///
    /// The index is checked against the declared length before the acting
    /// version is consulted.
    fn get_at<T: Primitive, const N: usize>(
        &self,
        field: &ArrayField<T, N>,
        index: usize,
    ) -> FlyweightResult<T> {
        let at = field.element_offset(index)?;
        if !is_present(field.since_version, self.acting_version()) {
            return Ok(field.null);
        }
        let src = window(self.buffer(), self.base() + at, T::LEN)?;
        Ok(T::read(src, field.byte_order))
    }

    /// Copies the whole of a byte array field into the front of `dst`,
    /// returning the number of bytes copied (`0` if the field is absent).
    ///
    /// # Errors
    ///
    /// Returns [`BoundsError::CopyOutOfRange`] if `dst` is shorter than the
    /// array.
    fn get_bytes<const N: usize>(
        &self,
        field: &ArrayField<u8, N>,
        dst: &mut [u8],
    ) -> FlyweightResult<usize> {
        if dst.len() < N {
            return Err(BoundsError::CopyOutOfRange {
                requested: N,
                available: dst.len(),
            }
            .into());
        }
        if !is_present(field.since_version, self.acting_version()) {
            return Ok(0);
        }
        let src = window(self.buffer(), self.base() + field.offset, N)?;
        dst[..N].copy_from_slice(src);
        Ok(N)
    }

    /// Decodes an enumeration field; unknown raw values and absent fields
    /// both yield [`SbeEnum::NULL_VALUE`].
    fn get_enum<E: SbeEnum>(&self, field: &EnumField<E>) -> FlyweightResult<E> {
        if !is_present(field.since_version, self.acting_version()) {
            return Ok(E::NULL_VALUE);
        }
        let src = window(self.buffer(), self.base() + field.offset, E::Repr::LEN)?;
        Ok(E::from_repr(E::Repr::read(src, field.byte_order)))
    }

    /// Raw integer of a bit set, or zero if the set is absent
    fn bits<R: BitRepr>(&self, field: &BitSetField<R>) -> FlyweightResult<R> {
        if !is_present(field.since_version, self.acting_version()) {
            return Ok(R::ZERO);
        }
        let src = window(self.buffer(), self.base() + field.offset, R::LEN)?;
        Ok(R::read(src, field.byte_order))
    }

    /// Tests a single choice of a bit set. Returns `false` if either the set
    /// or the choice postdates the acting version.
    fn choice<R: BitRepr>(
        &self,
        field: &BitSetField<R>,
        choice: &crate::bitset::Choice,
    ) -> FlyweightResult<bool> {
        if !is_present(choice.since_version, self.acting_version()) {
            return Ok(false);
        }
        Ok(choice.test(self.bits(field)?))
    }

    /// Binds a fixed flyweight to a composite field, or returns `None` if
    /// the composite postdates the acting version.
    fn composite(&self, field: &CompositeField) -> FlyweightResult<Option<FixedFlyweight<&[u8]>>> {
        if !is_present(field.since_version, self.acting_version()) {
            return Ok(None);
        }
        let at = self.base() + field.offset;
        window(self.buffer(), at, field.size)?;
        Ok(Some(FixedFlyweight::wrap(
            self.buffer(),
            at,
            self.acting_version(),
        )))
    }

    /// Typed variant of [`composite`](Block::composite)
    fn composite_as<'a, C>(&'a self, field: &CompositeField) -> FlyweightResult<Option<C>>
    where
        C: Composite<&'a [u8]>,
    {
        Ok(self.composite(field)?.map(C::from_flyweight))
    }
}

/// Write access to the fields of a block.
pub trait BlockMut: Block {
    fn buffer_mut(&mut self) -> &mut [u8];

    fn put<T: Primitive>(&mut self, field: &Field<T>, value: T) -> FlyweightResult<()> {
        let at = self.base() + field.offset;
        let dst = window_mut(self.buffer_mut(), at, T::LEN)?;
        value.write(dst, field.byte_order);
        Ok(())
    }

    fn put_at<T: Primitive, const N: usize>(
        &mut self,
        field: &ArrayField<T, N>,
        index: usize,
        value: T,
    ) -> FlyweightResult<()> {
        let at = self.base() + field.element_offset(index)?;
        let dst = window_mut(self.buffer_mut(), at, T::LEN)?;
        value.write(dst, field.byte_order);
        Ok(())
    }

    /// Copies the first `N` bytes of `src` into a byte array field.
    ///
    /// # Errors
    ///
    /// Returns [`BoundsError::CopyOutOfRange`] if `src` is shorter than the
    /// array.
    fn put_bytes<const N: usize>(
        &mut self,
        field: &ArrayField<u8, N>,
        src: &[u8],
    ) -> FlyweightResult<()> {
        if src.len() < N {
            return Err(BoundsError::CopyOutOfRange {
                requested: N,
                available: src.len(),
            }
            .into());
        }
        let at = self.base() + field.offset;
        window_mut(self.buffer_mut(), at, N)?.copy_from_slice(&src[..N]);
        Ok(())
    }

    fn put_enum<E: SbeEnum>(&mut self, field: &EnumField<E>, value: E) -> FlyweightResult<()> {
        let at = self.base() + field.offset;
        let dst = window_mut(self.buffer_mut(), at, E::Repr::LEN)?;
        value.to_repr().write(dst, field.byte_order);
        Ok(())
    }

    fn set_bits<R: BitRepr>(&mut self, field: &BitSetField<R>, raw: R) -> FlyweightResult<()> {
        let at = self.base() + field.offset;
        let dst = window_mut(self.buffer_mut(), at, R::LEN)?;
        raw.write(dst, field.byte_order);
        Ok(())
    }

    /// Sets or clears a single choice, leaving every other bit of the set
    /// unchanged.
    fn set_choice<R: BitRepr>(
        &mut self,
        field: &BitSetField<R>,
        choice: &crate::bitset::Choice,
        value: bool,
    ) -> FlyweightResult<()> {
        let at = self.base() + field.offset;
        let dst = window_mut(self.buffer_mut(), at, R::LEN)?;
        let raw = R::read(dst, field.byte_order);
        choice.apply(raw, value).write(dst, field.byte_order);
        Ok(())
    }

    /// Binds a mutable fixed flyweight to a composite field.
    fn composite_mut(&mut self, field: &CompositeField) -> FlyweightResult<FixedFlyweight<&mut [u8]>> {
        let at = self.base() + field.offset;
        let version = self.acting_version();
        let buf = self.buffer_mut();
        window(buf, at, field.size)?;
        Ok(FixedFlyweight::wrap(buf, at, version))
    }

    /// Typed variant of [`composite_mut`](BlockMut::composite_mut)
    fn composite_as_mut<'a, C>(&'a mut self, field: &CompositeField) -> FlyweightResult<C>
    where
        C: Composite<&'a mut [u8]>,
    {
        Ok(C::from_flyweight(self.composite_mut(field)?))
    }
}
