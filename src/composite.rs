//! Fixed flyweights for composites
//!
//! A composite is a fixed-size group of members at fixed offsets, embedded
//! either in a message block, in a group element, or directly in a buffer
//! (as the message header and group dimensions are). [`FixedFlyweight`] is
//! bound once to a buffer, an offset and an acting version, and each member
//! accessor reuses that binding.

use crate::block::{Block, BlockMut};

/// Flyweight over a composite of fixed size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedFlyweight<B> {
    buffer: B,
    offset: usize,
    acting_version: u16,
}

impl<B: AsRef<[u8]>> FixedFlyweight<B> {
    /// Binds a flyweight to the composite starting at `offset` in `buffer`.
    ///
    /// No range check is performed here; member accessors check that they
    /// lie within the buffer.
    #[must_use]
    pub fn wrap(buffer: B, offset: usize, acting_version: u16) -> Self {
        Self {
            buffer,
            offset,
            acting_version,
        }
    }

    /// Moves the flyweight to another composite of the same buffer
    pub fn rewrap(&mut self, offset: usize, acting_version: u16) {
        self.offset = offset;
        self.acting_version = acting_version;
    }

    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Releases the underlying buffer handle
    pub fn into_inner(self) -> B {
        self.buffer
    }
}

impl<B: AsRef<[u8]>> Block for FixedFlyweight<B> {
    fn buffer(&self) -> &[u8] {
        self.buffer.as_ref()
    }

    fn base(&self) -> usize {
        self.offset
    }

    fn acting_version(&self) -> u16 {
        self.acting_version
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> BlockMut for FixedFlyweight<B> {
    fn buffer_mut(&mut self) -> &mut [u8] {
        self.buffer.as_mut()
    }
}

/// Typed view over a [`FixedFlyweight`], as declared by a generated codec
/// for each composite of a schema.
pub trait Composite<B>: Sized {
    /// Encoded width of the composite in bytes
    const SIZE: usize;

    fn from_flyweight(flyweight: FixedFlyweight<B>) -> Self;
}
