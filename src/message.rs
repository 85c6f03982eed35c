//! Message flyweight
//!
//! [`MessageFlyweight`] is the root of every encode or decode pass. It binds
//! a buffer handle to a [`Template`], and owns the single position cursor
//! that repeating groups and variable-length data advance as they are
//! visited. Root-block fields are addressed relative to the message offset
//! and never move the cursor.
//!
//! # Examples
//!
//! ```
//! use flyweight::block::{Block, BlockMut};
//! use flyweight::field::Field;
//! use flyweight::message::{MessageFlyweight, Template};
//! use flyweight::prim::ByteOrder;
//!
//! const TEMPLATE: Template = Template::new(1, 7, 0, 8);
//! const A: Field<u32> = Field::new(0, ByteOrder::LittleEndian);
//!
//! let mut buf = [0u8; 16];
//! let mut msg = MessageFlyweight::new(TEMPLATE, &mut buf[..]);
//! msg.wrap_for_encode(0)?.put(&A, 42)?;
//! assert_eq!(msg.size(), 8);
//!
//! let mut msg = MessageFlyweight::new(TEMPLATE, &buf[..]);
//! msg.wrap_for_decode(0, 8, 0)?;
//! assert_eq!(msg.get(&A)?, 42);
//! # Ok::<(), flyweight::error::FlyweightError>(())
//! ```

use crate::block::{Block, BlockMut};
use crate::error::FlyweightResult;
use crate::internal::cursor::Cursor;

#[cfg(feature = "serde_impls")]
use serde::Serialize;

/// Identity and shape of a message type as fixed by its schema
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde_impls", derive(Serialize))]
pub struct Template {
    pub template_id: u16,
    pub schema_id: u16,
    pub version: u16,
    pub block_length: u16,
}

impl Template {
    #[must_use]
    pub const fn new(template_id: u16, schema_id: u16, version: u16, block_length: u16) -> Self {
        Self {
            template_id,
            schema_id,
            version,
            block_length,
        }
    }
}

/// Flyweight over a single message in a buffer.
#[derive(Debug)]
pub struct MessageFlyweight<B> {
    buffer: B,
    template: Template,
    offset: usize,
    cursor: Cursor,
    acting_block_length: usize,
    acting_version: u16,
}

impl<B: AsRef<[u8]>> MessageFlyweight<B> {
    /// Creates a flyweight bound to `buffer`, positioned as if freshly
    /// wrapped for encoding at offset `0`, but without validating that the
    /// root block fits.
    pub fn new(template: Template, buffer: B) -> Self {
        let cursor = Cursor::with_limit(buffer.as_ref().len());
        Self {
            buffer,
            template,
            offset: 0,
            cursor,
            acting_block_length: usize::from(template.block_length),
            acting_version: template.version,
        }
    }

    /// Swaps in a new buffer, returning the previous one.
    ///
    /// The flyweight must be wrapped again before it is used.
    pub fn rebind(&mut self, buffer: B) -> B {
        self.cursor = Cursor::with_limit(buffer.as_ref().len());
        self.offset = 0;
        std::mem::replace(&mut self.buffer, buffer)
    }

    pub fn into_inner(self) -> B {
        self.buffer
    }

    fn wrap(
        &mut self,
        offset: usize,
        acting_block_length: usize,
        acting_version: u16,
    ) -> FlyweightResult<&mut Self> {
        self.offset = offset;
        self.acting_block_length = acting_block_length;
        self.acting_version = acting_version;
        self.cursor.set(offset.saturating_add(acting_block_length))?;
        Ok(self)
    }

    /// Binds the flyweight for writing a message at `offset`, at the
    /// template's own version and block length.
    ///
    /// # Errors
    ///
    /// Fails if the root block does not fit within the buffer.
    pub fn wrap_for_encode(&mut self, offset: usize) -> FlyweightResult<&mut Self> {
        tracing::trace!(
            template_id = self.template.template_id,
            offset,
            "wrap message for encode"
        );
        let Template {
            block_length,
            version,
            ..
        } = self.template;
        self.wrap(offset, usize::from(block_length), version)
    }

    /// Binds the flyweight for reading a message at `offset` that was
    /// encoded with the given root block length and schema version.
    ///
    /// # Errors
    ///
    /// Fails if the acting root block does not fit within the buffer.
    pub fn wrap_for_decode(
        &mut self,
        offset: usize,
        acting_block_length: usize,
        acting_version: u16,
    ) -> FlyweightResult<&mut Self> {
        tracing::trace!(
            template_id = self.template.template_id,
            offset,
            acting_block_length,
            acting_version,
            "wrap message for decode"
        );
        self.wrap(offset, acting_block_length, acting_version)
    }

    #[must_use]
    pub fn template(&self) -> &Template {
        &self.template
    }

    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub fn acting_block_length(&self) -> usize {
        self.acting_block_length
    }

    #[must_use]
    pub fn acting_version(&self) -> u16 {
        self.acting_version
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cursor.limit()
    }

    /// Absolute offset of the next group or var-data section
    #[must_use]
    pub fn position(&self) -> usize {
        self.cursor.index()
    }

    /// # Errors
    ///
    /// Returns a bounds error if `position` exceeds the buffer capacity.
    pub fn set_position(&mut self, position: usize) -> FlyweightResult<()> {
        self.cursor.set(position)
    }

    /// Number of bytes between the message offset and the current position
    #[must_use]
    pub fn size(&self) -> usize {
        self.position().saturating_sub(self.offset)
    }

    pub(crate) fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }
}

impl<B: AsRef<[u8]>> Block for MessageFlyweight<B> {
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

impl<B: AsRef<[u8]> + AsMut<[u8]>> BlockMut for MessageFlyweight<B> {
    fn buffer_mut(&mut self) -> &mut [u8] {
        self.buffer.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BoundsError, FlyweightError};
    use crate::field::Field;
    use crate::prim::ByteOrder;

    const TEMPLATE: Template = Template::new(2, 1, 3, 12);
    const SERIAL: Field<u64> = Field::new(0, ByteOrder::LittleEndian);
    const YEAR: Field<u16> = Field::new(8, ByteOrder::LittleEndian);
    const CODE: Field<i16> = Field::versioned(10, ByteOrder::BigEndian, 3);

    #[test]
    fn encode_sets_position_past_root_block() {
        let mut buf = vec![0u8; 64];
        let mut msg = MessageFlyweight::new(TEMPLATE, &mut buf[..]);
        msg.wrap_for_encode(16).unwrap();
        assert_eq!(msg.position(), 28);
        assert_eq!(msg.size(), 12);
        assert_eq!(msg.acting_version(), 3);
        msg.put(&SERIAL, 1234).unwrap();
        msg.put(&YEAR, 2013).unwrap();
        msg.put(&CODE, -2).unwrap();
        assert_eq!(msg.position(), 28);
        assert_eq!(&buf[26..28], &[0xff, 0xfe]);
    }

    #[test]
    fn decode_older_version_yields_null() {
        let mut buf = [0u8; 12];
        buf[10] = 0x12;
        let mut msg = MessageFlyweight::new(TEMPLATE, &buf[..]);
        msg.wrap_for_decode(0, 10, 2).unwrap();
        assert_eq!(msg.position(), 10);
        assert_eq!(msg.get(&CODE).unwrap(), i16::MIN);
        msg.wrap_for_decode(0, 12, 3).unwrap();
        assert_eq!(msg.get(&CODE).unwrap(), 0x1200);
    }

    #[test]
    fn position_beyond_capacity() {
        let buf = [0u8; 64];
        let mut msg = MessageFlyweight::new(TEMPLATE, &buf[..]);
        msg.wrap_for_decode(0, 12, 3).unwrap();
        assert_eq!(
            msg.set_position(70).unwrap_err(),
            FlyweightError::Bounds(BoundsError::PositionBeyondCapacity {
                position: 70,
                capacity: 64
            })
        );
        assert!(msg.set_position(64).is_ok());
        assert!(msg.wrap_for_decode(60, 12, 3).is_err());
    }

    #[test]
    fn rebind_returns_previous_buffer() {
        let mut msg = MessageFlyweight::new(TEMPLATE, vec![0u8; 12]);
        msg.wrap_for_encode(0).unwrap().put(&YEAR, 7).unwrap();
        let old = msg.rebind(vec![0u8; 32]);
        assert_eq!(old[8], 7);
        assert_eq!(msg.capacity(), 32);
        msg.wrap_for_decode(0, 12, 3).unwrap();
        assert_eq!(msg.get(&YEAR).unwrap(), 0);
        assert_eq!(msg.into_inner().len(), 32);
    }
}
