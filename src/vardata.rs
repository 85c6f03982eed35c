//! Variable-length data
//!
//! Each var-data section is a length prefix followed by that many bytes.
//! Sections sit at the message's current position, after all groups, and
//! are visited strictly in schema order. Reading a section always advances
//! the position past the full encoded data, however much of it the caller
//! asked to copy.

use crate::block::{window, window_mut, Block, BlockMut};
use crate::error::{BoundsError, FlyweightResult};
use crate::field::is_present;
use crate::message::MessageFlyweight;
use crate::prim::{ByteOrder, UintType};

#[cfg(feature = "serde_impls")]
use serde::Serialize;

/// Encoding of a var-data section
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(Serialize))]
pub struct VarDataField {
    pub length: UintType,
    pub byte_order: ByteOrder,
    pub since_version: u16,
    /// Set only on descriptors declared in code. Descriptors derived from
    /// tokens leave it `None` and report the encoding through
    /// [`VarDataLayout::character_encoding`](crate::layout::VarDataLayout::character_encoding).
    pub character_encoding: Option<&'static str>,
}

impl VarDataField {
    /// `uint32` little-endian length prefix over UTF-8 data
    pub const STANDARD: Self = Self::new(UintType::U32, ByteOrder::LittleEndian, 0, Some("UTF-8"));

    #[must_use]
    pub const fn new(
        length: UintType,
        byte_order: ByteOrder,
        since_version: u16,
        character_encoding: Option<&'static str>,
    ) -> Self {
        Self {
            length,
            byte_order,
            since_version,
            character_encoding,
        }
    }

    #[must_use]
    pub const fn since(self, since_version: u16) -> Self {
        Self::new(
            self.length,
            self.byte_order,
            since_version,
            self.character_encoding,
        )
    }

    #[must_use]
    pub const fn encoded_as(self, character_encoding: &'static str) -> Self {
        Self::new(
            self.length,
            self.byte_order,
            self.since_version,
            Some(character_encoding),
        )
    }

    /// Width of the length prefix in bytes
    #[must_use]
    pub const fn length_size(&self) -> usize {
        self.length.size()
    }
}

impl<B: AsRef<[u8]>> MessageFlyweight<B> {
    /// Consumes the section at the current position, returning the absolute
    /// offset and length of its data, or `None` if the section is absent in
    /// the acting version.
    fn take_var_data(&mut self, field: &VarDataField) -> FlyweightResult<Option<(usize, usize)>> {
        if !is_present(field.since_version, self.acting_version()) {
            return Ok(None);
        }
        let length_pos = self.position();
        let raw = field.length.read(
            window(self.buffer(), length_pos, field.length_size())?,
            field.byte_order,
        );
        let length = usize::try_from(raw).map_err(|_| BoundsError::ValueOutOfRange {
            value: raw,
            max: usize::MAX as u64,
        })?;
        self.cursor_mut().advance(field.length_size())?;
        let data_pos = self.cursor_mut().advance(length)?;
        Ok(Some((data_pos, length)))
    }

    /// Copies up to `dst.len()` bytes of the section at the current position
    /// into `dst`, returning the number copied. The position always moves
    /// past the whole section.
    pub fn get_var_data(&mut self, field: &VarDataField, dst: &mut [u8]) -> FlyweightResult<usize> {
        match self.take_var_data(field)? {
            None => Ok(0),
            Some((at, length)) => {
                let n = length.min(dst.len());
                dst[..n].copy_from_slice(&self.buffer()[at..at + n]);
                Ok(n)
            }
        }
    }

    /// Borrows the data of the section at the current position without
    /// copying, and moves past it. Absent sections yield an empty slice.
    pub fn var_data(&mut self, field: &VarDataField) -> FlyweightResult<&[u8]> {
        match self.take_var_data(field)? {
            None => Ok(&[]),
            Some((at, length)) => Ok(&self.buffer()[at..at + length]),
        }
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> MessageFlyweight<B> {
    /// Writes `src` as a section at the current position, returning its
    /// length.
    ///
    /// # Errors
    ///
    /// Returns [`BoundsError::ValueOutOfRange`] if the length of `src` does
    /// not fit the length prefix, or a bounds error if the section does not
    /// fit the buffer. Nothing is written and the position does not move in
    /// either case.
    pub fn put_var_data(&mut self, field: &VarDataField, src: &[u8]) -> FlyweightResult<usize> {
        let length = src.len();
        let max = field.length.max_value();
        if length as u64 > max {
            tracing::debug!(length, max, "var-data length overflow");
            return Err(BoundsError::ValueOutOfRange {
                value: length as u64,
                max,
            }
            .into());
        }
        let length_pos = self.cursor_mut().advance(field.length_size() + length)?;
        let data_pos = length_pos + field.length_size();
        let prefix = window_mut(self.buffer_mut(), length_pos, field.length_size())?;
        field.length.write(prefix, field.byte_order, length as u64);
        window_mut(self.buffer_mut(), data_pos, length)?.copy_from_slice(src);
        Ok(length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Template;

    const TEMPLATE: Template = Template::new(1, 1, 1, 4);
    const NOTE: VarDataField = VarDataField::STANDARD;
    const TAG: VarDataField = VarDataField::new(UintType::U8, ByteOrder::LittleEndian, 0, None);
    const LATE: VarDataField = VarDataField::STANDARD.since(2);

    #[test]
    fn short_destination_still_skips_section() {
        let mut buf = [0u8; 64];
        let mut msg = MessageFlyweight::new(TEMPLATE, &mut buf[..]);
        msg.wrap_for_encode(0).unwrap();
        assert_eq!(msg.put_var_data(&NOTE, b"hello world").unwrap(), 11);
        assert_eq!(msg.put_var_data(&TAG, b"xy").unwrap(), 2);
        assert_eq!(msg.size(), 4 + 4 + 11 + 1 + 2);

        let mut msg = MessageFlyweight::new(TEMPLATE, &buf[..]);
        msg.wrap_for_decode(0, 4, 1).unwrap();
        let mut dst = [0u8; 5];
        assert_eq!(msg.get_var_data(&NOTE, &mut dst).unwrap(), 5);
        assert_eq!(&dst, b"hello");
        assert_eq!(msg.position(), 19);
        assert_eq!(msg.var_data(&TAG).unwrap(), b"xy");
        assert_eq!(msg.size(), 22);
    }

    #[test]
    fn absent_section_is_not_read() {
        let buf = [0xffu8; 16];
        let mut msg = MessageFlyweight::new(TEMPLATE, &buf[..]);
        msg.wrap_for_decode(0, 4, 1).unwrap();
        let mut dst = [0u8; 4];
        assert_eq!(msg.get_var_data(&LATE, &mut dst).unwrap(), 0);
        assert!(msg.var_data(&LATE).unwrap().is_empty());
        assert_eq!(msg.position(), 4);
    }

    #[test]
    fn length_beyond_capacity_is_rejected() {
        let mut buf = [0u8; 12];
        buf[4] = 100;
        let mut msg = MessageFlyweight::new(TEMPLATE, &buf[..]);
        msg.wrap_for_decode(0, 4, 1).unwrap();
        assert!(msg.var_data(&NOTE).is_err());
    }

    #[test]
    fn oversized_section_is_rejected() {
        let mut buf = [0u8; 300];
        let mut msg = MessageFlyweight::new(TEMPLATE, &mut buf[..]);
        msg.wrap_for_encode(0).unwrap();
        assert_eq!(
            msg.put_var_data(&TAG, &[7u8; 256]).unwrap_err(),
            crate::error::FlyweightError::Bounds(BoundsError::ValueOutOfRange {
                value: 256,
                max: 255
            })
        );
        assert!(msg.put_var_data(&NOTE, &[7u8; 300]).is_err());
        assert_eq!(msg.position(), 4);
        assert_eq!(msg.put_var_data(&TAG, &[7u8; 255]).unwrap(), 255);
        assert_eq!(msg.position(), 260);
        assert_eq!(buf[4], 255);
    }

    #[test]
    fn builders() {
        assert_eq!(NOTE.length_size(), 4);
        assert_eq!(LATE.since_version, 2);
        assert_eq!(TAG.encoded_as("ASCII").character_encoding, Some("ASCII"));
    }
}
