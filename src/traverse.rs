//! Traversal over the shared position cursor
//!
//! Groups and var-data sections are not at fixed offsets: each one starts
//! wherever the previous one ended. [`Traverse`] is implemented by the
//! message flyweight and by group flyweights, and gives both the same way to
//! reach the next variable-position section through the one cursor owned by
//! the message.

use crate::block::Block;
use crate::error::FlyweightResult;
use crate::group::{GroupFlyweight, GroupLayout};
use crate::message::MessageFlyweight;
use crate::vardata::VarDataField;

pub trait Traverse: Block {
    type Buffer: AsRef<[u8]>;

    fn message(&self) -> &MessageFlyweight<Self::Buffer>;

    fn message_mut(&mut self) -> &mut MessageFlyweight<Self::Buffer>;

    /// Current position of the message cursor
    fn position(&self) -> usize {
        self.message().position()
    }

    fn set_position(&mut self, position: usize) -> FlyweightResult<()> {
        self.message_mut().set_position(position)
    }

    /// Wraps the repeating group at the current position for decoding.
    fn group(&mut self, layout: &GroupLayout) -> FlyweightResult<GroupFlyweight<'_, Self::Buffer>> {
        GroupFlyweight::wrap_for_decode(self.message_mut(), layout)
    }

    /// Wraps a repeating group of `count` elements at the current position
    /// for encoding.
    fn group_for_encode(
        &mut self,
        layout: &GroupLayout,
        count: usize,
    ) -> FlyweightResult<GroupFlyweight<'_, Self::Buffer>>
    where
        Self::Buffer: AsMut<[u8]>,
    {
        GroupFlyweight::wrap_for_encode(self.message_mut(), layout, count)
    }

    /// See [`MessageFlyweight::get_var_data`]
    fn get_var_data(&mut self, field: &VarDataField, dst: &mut [u8]) -> FlyweightResult<usize> {
        self.message_mut().get_var_data(field, dst)
    }

    /// See [`MessageFlyweight::var_data`]
    fn var_data(&mut self, field: &VarDataField) -> FlyweightResult<&[u8]> {
        self.message_mut().var_data(field)
    }

    /// See [`MessageFlyweight::put_var_data`]
    fn put_var_data(&mut self, field: &VarDataField, src: &[u8]) -> FlyweightResult<usize>
    where
        Self::Buffer: AsMut<[u8]>,
    {
        self.message_mut().put_var_data(field, src)
    }
}

impl<B: AsRef<[u8]>> Traverse for MessageFlyweight<B> {
    type Buffer = B;

    fn message(&self) -> &MessageFlyweight<B> {
        self
    }

    fn message_mut(&mut self) -> &mut MessageFlyweight<B> {
        self
    }
}

impl<'m, B: AsRef<[u8]>> Traverse for GroupFlyweight<'m, B> {
    type Buffer = B;

    fn message(&self) -> &MessageFlyweight<B> {
        self.message_ref()
    }

    fn message_mut(&mut self) -> &mut MessageFlyweight<B> {
        self.message_mut_ref()
    }
}
