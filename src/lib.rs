//! Flyweight runtime for Simple Binary Encoding message codecs
//!
//! # Overview
//!
//! This library is the runtime half of an SBE code generator. A generated
//! codec for a message type consists of little more than `const` field
//! descriptors and thin accessor methods; the rules for reading and writing
//! conforming messages in place live here.
//!
//! All access happens through *flyweights*: zero-allocation views bound to a
//! caller-owned buffer, an offset and the schema version of the data being
//! read (the *acting version*). Nothing is copied out of the buffer unless
//! the caller asks for it, and nothing is allocated per message or per field.
//!
//! A message on the wire is laid out as a fixed root block, followed by zero
//! or more repeating groups, followed by zero or more variable-length data
//! sections:
//!
//! ```text
//! [header][root block][dims|elem|elem|...][dims|elem|...][len|data][len|data]
//! ```
//!
//! Root-block fields sit at fixed offsets. Groups and var-data do not: each
//! starts wherever the previous section ended, so they are reached through a
//! single position cursor owned by the [`MessageFlyweight`] and advanced as
//! each section is visited, strictly in schema order.
//!
//! # Structure
//!
//!   * [`prim`], [`len`]: primitive encodings, byte order and fixed widths
//!   * [`field`]: descriptors for every kind of fixed-offset field
//!   * [`block`]: the [`Block`] and [`BlockMut`] accessor traits, which
//!     implement version gating and range checks for every flyweight
//!   * [`composite`], [`enumeration`], [`bitset`]: composite, enum and set
//!     types
//!   * [`message`], [`group`], [`vardata`], [`traverse`]: the message root,
//!     repeating groups, var-data, and the shared cursor over them
//!   * [`header`]: the message header composite
//!   * [`ir`], [`layout`]: the token IR and the derivation of runtime
//!     descriptors from it
//!
//! # Features
//!
//!   * `serde_impls`: implements `serde::Serialize` for the IR and for all
//!     descriptor types

pub mod bitset;
pub mod block;
pub mod composite;
pub mod enumeration;
pub mod error;
pub mod field;
pub mod group;
pub mod header;
mod internal;
pub mod ir;
pub mod layout;
pub mod len;
pub mod message;
pub mod prim;
pub mod traverse;
pub mod vardata;

pub use crate::block::{Block, BlockMut};
pub use crate::error::{FlyweightError, FlyweightResult};
pub use crate::group::{GroupFlyweight, GroupLayout};
pub use crate::message::{MessageFlyweight, Template};
pub use crate::prim::ByteOrder;
pub use crate::traverse::Traverse;
