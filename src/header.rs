//! Message header
//!
//! Every message on the wire is preceded by a header composite giving the
//! root block length, template id, schema id and schema version that the
//! message was encoded with. A decoder reads the header first and wraps the
//! message body with the values it finds there.

use crate::block::{Block, BlockMut};
use crate::composite::{Composite, FixedFlyweight};
use crate::error::{BoundsError, FlyweightResult, LayoutResult};
use crate::ir::split_composite;
use crate::ir::{uint_member, Token};
use crate::message::{MessageFlyweight, Template};
use crate::prim::{ByteOrder, UintField, UintType};

#[cfg(feature = "serde_impls")]
use serde::Serialize;

/// Layout of a message header composite
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(Serialize))]
pub struct HeaderLayout {
    pub block_length: UintField,
    pub template_id: UintField,
    pub schema_id: UintField,
    pub version: UintField,
    pub size: usize,
}

impl HeaderLayout {
    /// Four little-endian `uint16` members
    pub const STANDARD: Self = Self {
        block_length: UintField::new(0, UintType::U16, ByteOrder::LittleEndian),
        template_id: UintField::new(2, UintType::U16, ByteOrder::LittleEndian),
        schema_id: UintField::new(4, UintType::U16, ByteOrder::LittleEndian),
        version: UintField::new(6, UintType::U16, ByteOrder::LittleEndian),
        size: 8,
    };

    pub fn from_tokens(tokens: &[Token]) -> LayoutResult<Self> {
        let (begin, members) = split_composite(tokens)?;
        Ok(Self {
            block_length: uint_member(begin, members, "blockLength")?,
            template_id: uint_member(begin, members, "templateId")?,
            schema_id: uint_member(begin, members, "schemaId")?,
            version: uint_member(begin, members, "version")?,
            size: begin.size,
        })
    }
}

impl Default for HeaderLayout {
    fn default() -> Self {
        Self::STANDARD
    }
}

fn narrow(value: u64) -> FlyweightResult<u16> {
    u16::try_from(value).map_err(|_| {
        BoundsError::ValueOutOfRange {
            value,
            max: u64::from(u16::MAX),
        }
        .into()
    })
}

/// Flyweight over a message header
#[derive(Debug)]
pub struct MessageHeader<B> {
    flyweight: FixedFlyweight<B>,
    layout: HeaderLayout,
}

impl<B: AsRef<[u8]>> MessageHeader<B> {
    #[must_use]
    pub fn wrap(buffer: B, offset: usize, layout: HeaderLayout) -> Self {
        Self {
            flyweight: FixedFlyweight::wrap(buffer, offset, 0),
            layout,
        }
    }

    fn member(&self, field: &UintField) -> FlyweightResult<u16> {
        narrow(field.read(self.flyweight.buffer(), self.flyweight.offset())?)
    }

    pub fn block_length(&self) -> FlyweightResult<u16> {
        self.member(&self.layout.block_length)
    }

    pub fn template_id(&self) -> FlyweightResult<u16> {
        self.member(&self.layout.template_id)
    }

    pub fn schema_id(&self) -> FlyweightResult<u16> {
        self.member(&self.layout.schema_id)
    }

    pub fn version(&self) -> FlyweightResult<u16> {
        self.member(&self.layout.version)
    }

    /// Reads all four members as a [`Template`]
    pub fn template(&self) -> FlyweightResult<Template> {
        Ok(Template::new(
            self.template_id()?,
            self.schema_id()?,
            self.version()?,
            self.block_length()?,
        ))
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.layout.size
    }

    pub fn into_inner(self) -> B {
        self.flyweight.into_inner()
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> MessageHeader<B> {
    pub fn write_template(&mut self, template: &Template) -> FlyweightResult<()> {
        let base = self.flyweight.offset();
        let layout = self.layout;
        let buf = self.flyweight.buffer_mut();
        layout
            .block_length
            .write(buf, base, u64::from(template.block_length))?;
        layout
            .template_id
            .write(buf, base, u64::from(template.template_id))?;
        layout
            .schema_id
            .write(buf, base, u64::from(template.schema_id))?;
        layout.version.write(buf, base, u64::from(template.version))
    }
}

impl<B: AsRef<[u8]>> Composite<B> for MessageHeader<B> {
    const SIZE: usize = HeaderLayout::STANDARD.size;

    fn from_flyweight(flyweight: FixedFlyweight<B>) -> Self {
        Self {
            flyweight,
            layout: HeaderLayout::STANDARD,
        }
    }
}

impl<B: AsRef<[u8]>> MessageFlyweight<B> {
    /// Reads the header at `offset` and wraps the message body that follows
    /// it for decoding, returning the header's contents.
    ///
    /// The template id found in the header is not checked against this
    /// flyweight's template.
    pub fn wrap_header_for_decode(
        &mut self,
        offset: usize,
        layout: &HeaderLayout,
    ) -> FlyweightResult<Template> {
        let header = MessageHeader::wrap(self.buffer(), offset, *layout).template()?;
        self.wrap_for_decode(
            offset + layout.size,
            usize::from(header.block_length),
            header.version,
        )?;
        Ok(header)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> MessageFlyweight<B> {
    /// Writes this flyweight's template as a header at `offset` and wraps
    /// the message body that follows it for encoding.
    pub fn wrap_header_for_encode(
        &mut self,
        offset: usize,
        layout: &HeaderLayout,
    ) -> FlyweightResult<&mut Self> {
        let template = *self.template();
        MessageHeader::wrap(self.buffer_mut(), offset, *layout).write_template(&template)?;
        self.wrap_for_encode(offset + layout.size)
    }
}
