//! Repeating groups
//!
//! A repeating group is encoded at the message's current position as a
//! dimensions composite (element block length and element count) followed
//! by the element blocks. [`GroupFlyweight`] walks those elements one at a
//! time, advancing the message cursor past each block as it is entered.
//!
//! The group holds the message by exclusive borrow for as long as it is
//! alive. A nested group borrows the enclosing group in turn, so the borrow
//! checker rules out visiting two sibling groups, or a group and the
//! var-data that follows it, out of schema order.

use crate::block::{Block, BlockMut};
use crate::error::{BoundsError, FlyweightResult, IterationError, LayoutError, LayoutResult};
use crate::field::is_present;
use crate::ir::{Signal, Token};
use crate::message::MessageFlyweight;
use crate::prim::{ByteOrder, UintField, UintType};

#[cfg(feature = "serde_impls")]
use serde::Serialize;

/// Layout of the dimensions composite that precedes a group's elements
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(Serialize))]
pub struct Dimensions {
    pub block_length: UintField,
    pub num_in_group: UintField,
    /// Encoded width of the whole composite
    pub size: usize,
}

impl Dimensions {
    /// `groupSizeEncoding`: `uint16` block length then `uint16` count, little-endian
    pub const STANDARD: Self = Self {
        block_length: UintField::new(0, UintType::U16, ByteOrder::LittleEndian),
        num_in_group: UintField::new(2, UintType::U16, ByteOrder::LittleEndian),
        size: 4,
    };

    /// Builds a dimensions layout from a composite token list of the shape
    /// `BeginComposite, Encoding(blockLength), Encoding(numInGroup), ..., EndComposite`.
    pub fn from_tokens(tokens: &[Token]) -> LayoutResult<Self> {
        let (begin, members) = crate::ir::split_composite(tokens)?;
        Ok(Self {
            block_length: crate::ir::uint_member(begin, members, "blockLength")?,
            num_in_group: crate::ir::uint_member(begin, members, "numInGroup")?,
            size: begin.size,
        })
    }
}

/// Shape of a repeating group as fixed by its schema
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(Serialize))]
pub struct GroupLayout {
    /// Block length of each element, as written when encoding
    pub block_length: usize,
    pub since_version: u16,
    pub dimensions: Dimensions,
}

impl GroupLayout {
    #[must_use]
    pub const fn new(block_length: usize, since_version: u16) -> Self {
        Self {
            block_length,
            since_version,
            dimensions: Dimensions::STANDARD,
        }
    }

    #[must_use]
    pub const fn with_dimensions(
        block_length: usize,
        since_version: u16,
        dimensions: Dimensions,
    ) -> Self {
        Self {
            block_length,
            since_version,
            dimensions,
        }
    }

    /// Reads the layout of a group from its `BeginGroup` token and the
    /// dimensions composite that immediately follows it.
    pub fn from_tokens(tokens: &[Token]) -> LayoutResult<Self> {
        let begin = tokens.first().ok_or(LayoutError::UnexpectedEnd {
            expected: Signal::BeginGroup,
        })?;
        crate::ir::expect_signal(begin, 0, Signal::BeginGroup)?;
        let dims_end = crate::ir::find_end(tokens, 1, Signal::BeginComposite, Signal::EndComposite)?;
        Ok(Self {
            block_length: begin.size,
            since_version: begin.version,
            dimensions: Dimensions::from_tokens(&tokens[1..=dims_end])?,
        })
    }
}

fn to_usize(value: u64) -> FlyweightResult<usize> {
    usize::try_from(value).map_err(|_| {
        BoundsError::ValueOutOfRange {
            value,
            max: usize::MAX as u64,
        }
        .into()
    })
}

/// Widens `value` for writing into a dimensions member of type `ty`.
fn fits(value: usize, ty: UintType) -> FlyweightResult<u64> {
    let value = value as u64;
    if value > ty.max_value() {
        tracing::debug!(value, max = ty.max_value(), "group dimension overflow");
        return Err(BoundsError::ValueOutOfRange {
            value,
            max: ty.max_value(),
        }
        .into());
    }
    Ok(value)
}

/// Flyweight over the elements of a repeating group.
#[derive(Debug)]
pub struct GroupFlyweight<'m, B> {
    message: &'m mut MessageFlyweight<B>,
    block_length: usize,
    count: usize,
    visited: usize,
    element_offset: usize,
}

impl<'m, B: AsRef<[u8]>> GroupFlyweight<'m, B> {
    /// Reads the dimensions at the message's current position and moves the
    /// position past them. A group that postdates the acting version is
    /// empty, and neither reads nor moves anything.
    pub fn wrap_for_decode(
        message: &'m mut MessageFlyweight<B>,
        layout: &GroupLayout,
    ) -> FlyweightResult<Self> {
        let header_pos = message.position();
        if !is_present(layout.since_version, message.acting_version()) {
            tracing::trace!(
                since_version = layout.since_version,
                acting_version = message.acting_version(),
                "group absent in acting version"
            );
            return Ok(Self {
                message,
                block_length: layout.block_length,
                count: 0,
                visited: 0,
                element_offset: header_pos,
            });
        }
        message.cursor_mut().advance(layout.dimensions.size)?;
        let block_length = to_usize(layout.dimensions.block_length.read(message.buffer(), header_pos)?)?;
        let count = to_usize(layout.dimensions.num_in_group.read(message.buffer(), header_pos)?)?;
        tracing::trace!(header_pos, block_length, count, "wrap group for decode");
        Ok(Self {
            message,
            block_length,
            count,
            visited: 0,
            element_offset: header_pos,
        })
    }

    /// Returns `true` if another element remains to be visited
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.visited < self.count
    }

    /// Enters the next element, moving the message position past its block.
    ///
    /// # Errors
    ///
    /// Returns [`IterationError::Exhausted`] if every element has already
    /// been visited, or a bounds error if the element block does not fit.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> FlyweightResult<&mut Self> {
        if !self.has_next() {
            tracing::debug!(count = self.count, "group exhausted");
            return Err(IterationError::Exhausted { count: self.count }.into());
        }
        self.element_offset = self.message.cursor_mut().advance(self.block_length)?;
        self.visited += 1;
        tracing::trace!(
            index = self.visited - 1,
            offset = self.element_offset,
            "next group element"
        );
        Ok(self)
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Index of the current element, or `None` before the first call to
    /// [`next`](GroupFlyweight::next)
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.visited.checked_sub(1)
    }

    /// Block length used to step between elements: the encoded value when
    /// decoding, the schema value when encoding
    #[must_use]
    pub fn acting_block_length(&self) -> usize {
        self.block_length
    }

    /// Absolute offset of the current element
    #[must_use]
    pub fn element_offset(&self) -> usize {
        self.element_offset
    }

    pub(crate) fn message_ref(&self) -> &MessageFlyweight<B> {
        &*self.message
    }

    pub(crate) fn message_mut_ref(&mut self) -> &mut MessageFlyweight<B> {
        &mut *self.message
    }
}

impl<'m, B: AsRef<[u8]> + AsMut<[u8]>> GroupFlyweight<'m, B> {
    /// Writes dimensions for `count` elements of the schema block length at
    /// the message's current position and moves the position past them.
    ///
    /// # Errors
    ///
    /// Returns [`BoundsError::ValueOutOfRange`] without moving the position
    /// if `count` or the block length does not fit its dimensions member.
    pub fn wrap_for_encode(
        message: &'m mut MessageFlyweight<B>,
        layout: &GroupLayout,
        count: usize,
    ) -> FlyweightResult<Self> {
        let dims = &layout.dimensions;
        let num_in_group = fits(count, dims.num_in_group.ty)?;
        let block_length = fits(layout.block_length, dims.block_length.ty)?;
        let header_pos = message.position();
        message.cursor_mut().advance(dims.size)?;
        dims.num_in_group
            .write(message.buffer_mut(), header_pos, num_in_group)?;
        dims.block_length
            .write(message.buffer_mut(), header_pos, block_length)?;
        tracing::trace!(header_pos, count, "wrap group for encode");
        Ok(Self {
            message,
            block_length: layout.block_length,
            count,
            visited: 0,
            element_offset: header_pos,
        })
    }
}

impl<'m, B: AsRef<[u8]>> Block for GroupFlyweight<'m, B> {
    fn buffer(&self) -> &[u8] {
        self.message.buffer()
    }

    fn base(&self) -> usize {
        self.element_offset
    }

    fn acting_version(&self) -> u16 {
        self.message.acting_version()
    }
}

impl<'m, B: AsRef<[u8]> + AsMut<[u8]>> BlockMut for GroupFlyweight<'m, B> {
    fn buffer_mut(&mut self) -> &mut [u8] {
        self.message.buffer_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlyweightError;
    use crate::field::Field;
    use crate::message::Template;

    const TEMPLATE: Template = Template::new(1, 1, 1, 0);
    const LAYOUT: GroupLayout = GroupLayout::new(4, 0);
    const VALUE: Field<u32> = Field::new(0, ByteOrder::LittleEndian);

    #[test]
    fn encode_then_walk() {
        let mut buf = [0u8; 32];
        let mut msg = MessageFlyweight::new(TEMPLATE, &mut buf[..]);
        msg.wrap_for_encode(0).unwrap();
        let mut g = GroupFlyweight::wrap_for_encode(&mut msg, &LAYOUT, 3).unwrap();
        assert_eq!(g.index(), None);
        for v in [10u32, 20, 30] {
            g.next().unwrap().put(&VALUE, v).unwrap();
        }
        assert!(!g.has_next());
        assert_eq!(g.index(), Some(2));
        assert_eq!(msg.position(), 16);
        assert_eq!(&buf[..4], &[4, 0, 3, 0]);

        let mut msg = MessageFlyweight::new(TEMPLATE, &buf[..]);
        msg.wrap_for_decode(0, 0, 1).unwrap();
        let mut g = GroupFlyweight::wrap_for_decode(&mut msg, &LAYOUT).unwrap();
        assert_eq!(g.count(), 3);
        let mut seen = Vec::new();
        while g.has_next() {
            seen.push(g.next().unwrap().get(&VALUE).unwrap());
        }
        assert_eq!(seen, vec![10, 20, 30]);
        assert_eq!(
            g.next().unwrap_err(),
            FlyweightError::Iteration(IterationError::Exhausted { count: 3 })
        );
    }

    #[test]
    fn decode_uses_encoded_block_length() {
        let mut buf = [0u8; 32];
        buf[..4].copy_from_slice(&[6, 0, 2, 0]);
        buf[4] = 1;
        buf[10] = 2;
        let mut msg = MessageFlyweight::new(TEMPLATE, &buf[..]);
        msg.wrap_for_decode(0, 0, 1).unwrap();
        let mut g = GroupFlyweight::wrap_for_decode(&mut msg, &LAYOUT).unwrap();
        assert_eq!(g.acting_block_length(), 6);
        assert_eq!(g.next().unwrap().get(&VALUE).unwrap(), 1);
        assert_eq!(g.next().unwrap().element_offset(), 10);
        assert_eq!(g.get(&VALUE).unwrap(), 2);
        assert_eq!(msg.position(), 16);
    }

    #[test]
    fn absent_group_is_empty() {
        let buf = [0xffu8; 8];
        let mut msg = MessageFlyweight::new(TEMPLATE, &buf[..]);
        msg.wrap_for_decode(0, 0, 1).unwrap();
        let g = GroupFlyweight::wrap_for_decode(&mut msg, &GroupLayout::new(4, 2)).unwrap();
        assert_eq!(g.count(), 0);
        assert!(!g.has_next());
        assert_eq!(msg.position(), 0);
    }

    #[test]
    fn truncated_elements_are_rejected() {
        let mut buf = [0u8; 8];
        buf[..4].copy_from_slice(&[4, 0, 2, 0]);
        let mut msg = MessageFlyweight::new(TEMPLATE, &buf[..]);
        msg.wrap_for_decode(0, 0, 1).unwrap();
        let mut g = GroupFlyweight::wrap_for_decode(&mut msg, &LAYOUT).unwrap();
        assert!(g.next().is_ok());
        assert!(matches!(g.next(), Err(FlyweightError::Bounds(_))));
    }

    #[test]
    fn count_must_fit_dimensions() {
        let mut buf = [0u8; 32];
        let mut msg = MessageFlyweight::new(TEMPLATE, &mut buf[..]);
        msg.wrap_for_encode(0).unwrap();
        let err = GroupFlyweight::wrap_for_encode(&mut msg, &LAYOUT, 65_536).unwrap_err();
        assert_eq!(
            err,
            FlyweightError::Bounds(BoundsError::ValueOutOfRange {
                value: 65_536,
                max: 65_535
            })
        );
        assert_eq!(msg.position(), 0);

        let wide = GroupLayout::new(70_000, 0);
        assert!(matches!(
            GroupFlyweight::wrap_for_encode(&mut msg, &wide, 1),
            Err(FlyweightError::Bounds(BoundsError::ValueOutOfRange { value: 70_000, .. }))
        ));
        assert_eq!(msg.position(), 0);
        assert_eq!(&buf[..4], &[0, 0, 0, 0]);
    }

    #[test]
    fn wide_dimensions() {
        let dims = Dimensions {
            block_length: UintField::new(0, UintType::U32, ByteOrder::BigEndian),
            num_in_group: UintField::new(4, UintType::U8, ByteOrder::BigEndian),
            size: 5,
        };
        let layout = GroupLayout::with_dimensions(2, 0, dims);
        let mut buf = [0u8; 16];
        let mut msg = MessageFlyweight::new(TEMPLATE, &mut buf[..]);
        msg.wrap_for_encode(0).unwrap();
        let g = GroupFlyweight::wrap_for_encode(&mut msg, &layout, 1).unwrap();
        assert_eq!(g.count(), 1);
        assert_eq!(msg.position(), 5);
        assert_eq!(&buf[..5], &[0, 0, 0, 2, 1]);
    }
}
