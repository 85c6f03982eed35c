//! Error types
//!
//! Every operation in this crate is a synchronous, in-memory transformation
//! over a caller-supplied buffer, so failures are immediate and local. Two
//! classes of failure exist at runtime:
//!
//!   * [`BoundsError`]: an access or cursor movement that would leave the
//!     buffer, the declared length of an array field, or the range of a
//!     narrower integer encoding.
//!   * [`IterationError`]: advancing a repeating group past its last element,
//!     which always indicates a programming error on the caller side.
//!
//! Both are folded into [`FlyweightError`], the error type of
//! [`FlyweightResult<T>`], which is returned by nearly every accessor.
//!
//! A third family, [`LayoutError`], is only produced when deriving runtime
//! descriptors from a token list (see [`crate::layout`]).
//!
//! Neither an unrecognized enumeration value nor a field that is absent in
//! the acting version of a message is an error: both decode to a defined
//! fallback value.
//!
//! After any `FlyweightError` the bytes already written or read are left
//! intact, but the position cursor of the message is unspecified, and the
//! flyweight should be wrapped again before further use.

use std::error::Error;
use std::fmt::{Display, Formatter, Result};

use crate::ir::Signal;
use crate::prim::PrimitiveType;

/// Enumerated error type for accesses that fall outside of a permitted range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsError {
    /// Attempt to move the position cursor past the capacity of the buffer
    PositionBeyondCapacity { position: usize, capacity: usize },
    /// Attempt to read or write `width` bytes at `offset` when the buffer
    /// only holds `capacity` bytes
    AccessBeyondCapacity {
        offset: usize,
        width: usize,
        capacity: usize,
    },
    /// Element index outside of the declared length of an array field
    IndexOutOfRange { index: usize, length: usize },
    /// Copy into or out of a caller-supplied slice that is too short
    CopyOutOfRange { requested: usize, available: usize },
    /// Decoded integer does not fit the type it is exposed as
    ValueOutOfRange { value: u64, max: u64 },
}

impl Display for BoundsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match *self {
            BoundsError::PositionBeyondCapacity { position, capacity } => {
                write!(f, "position={position} is beyond capacity={capacity}")
            }
            BoundsError::AccessBeyondCapacity {
                offset,
                width,
                capacity,
            } => {
                write!(
                    f,
                    "cannot access {width} bytes at offset {offset} of a {capacity}-byte buffer"
                )
            }
            BoundsError::IndexOutOfRange { index, length } => {
                write!(f, "index out of range: index={index} (length {length})")
            }
            BoundsError::CopyOutOfRange {
                requested,
                available,
            } => {
                write!(
                    f,
                    "cannot copy {requested} bytes: slice has only {available} bytes available"
                )
            }
            BoundsError::ValueOutOfRange { value, max } => {
                write!(f, "decoded value {value} exceeds maximum of {max}")
            }
        }
    }
}

impl Error for BoundsError {}

/// Error raised when a repeating group is advanced past its final element.
///
/// Callers are expected to consult `has_next()` before calling `next()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationError {
    Exhausted { count: usize },
}

impl Display for IterationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match *self {
            IterationError::Exhausted { count } => {
                write!(f, "group of {count} elements has no next element")
            }
        }
    }
}

impl Error for IterationError {}

/// Umbrella error type for all runtime flyweight operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlyweightError {
    Bounds(BoundsError),
    Iteration(IterationError),
}

impl From<BoundsError> for FlyweightError {
    fn from(err: BoundsError) -> Self {
        Self::Bounds(err)
    }
}

impl From<IterationError> for FlyweightError {
    fn from(err: IterationError) -> Self {
        Self::Iteration(err)
    }
}

impl From<std::convert::Infallible> for FlyweightError {
    fn from(void: std::convert::Infallible) -> Self {
        match void {}
    }
}

impl Display for FlyweightError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            FlyweightError::Bounds(err) => Display::fmt(err, f),
            FlyweightError::Iteration(err) => Display::fmt(err, f),
        }
    }
}

impl Error for FlyweightError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FlyweightError::Bounds(err) => Some(err),
            FlyweightError::Iteration(err) => Some(err),
        }
    }
}

/// Type alias for `Result` with an error type of [`FlyweightError`]
pub type FlyweightResult<T> = std::result::Result<T, FlyweightError>;

/// Errors encountered while deriving runtime descriptors from a token list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// Token at `index` carried a different signal than the construct being
    /// walked requires
    UnexpectedSignal {
        index: usize,
        expected: Signal,
        found: Signal,
    },
    /// Token list ended in the middle of a construct
    UnexpectedEnd { expected: Signal },
    /// Encoding token of the named element carried no primitive type
    MissingPrimitiveType { name: String },
    /// Named element uses a primitive type that cannot encode an unsigned
    /// size or count
    UnsupportedWidth { name: String, ty: PrimitiveType },
    /// Named member of a standard composite was not found
    MissingMember { composite: String, member: &'static str },
    /// Constant encoding of the named element carried no value
    MissingConstValue { name: String },
    /// Block length of the named message does not fit its header field
    OversizedBlock { name: String, size: usize },
    /// Named choice selects a bit the set's encoding type does not have
    ChoiceOutOfRange { name: String, bit: u64, bits: usize },
}

impl Display for LayoutError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            LayoutError::UnexpectedSignal {
                index,
                expected,
                found,
            } => {
                write!(f, "token {index}: expected {expected:?}, found {found:?}")
            }
            LayoutError::UnexpectedEnd { expected } => {
                write!(f, "token list ended while expecting {expected:?}")
            }
            LayoutError::MissingPrimitiveType { name } => {
                write!(f, "encoding of `{name}` has no primitive type")
            }
            LayoutError::UnsupportedWidth { name, ty } => {
                write!(
                    f,
                    "`{name}` is encoded as {ty:?}, which cannot hold an unsigned size"
                )
            }
            LayoutError::MissingMember { composite, member } => {
                write!(f, "composite `{composite}` has no member `{member}`")
            }
            LayoutError::MissingConstValue { name } => {
                write!(f, "constant `{name}` has no value")
            }
            LayoutError::OversizedBlock { name, size } => {
                write!(f, "block of `{name}` is {size} bytes long")
            }
            LayoutError::ChoiceOutOfRange { name, bit, bits } => {
                write!(f, "choice `{name}` selects bit {bit} of a set with {bits} bits")
            }
        }
    }
}

impl Error for LayoutError {}

/// Type alias for `Result` with an error type of [`LayoutError`]
pub type LayoutResult<T> = std::result::Result<T, LayoutError>;

#[cfg(test)]
mod test {
    use super::*;

    fn dummy<T: Send + Sync>() {}

    #[test]
    fn errors_threadsafe() {
        dummy::<FlyweightError>();
        dummy::<LayoutError>();
    }

    #[test]
    fn bounds_message() {
        let err: FlyweightError = BoundsError::PositionBeyondCapacity {
            position: 70,
            capacity: 64,
        }
        .into();
        assert_eq!(err.to_string(), "position=70 is beyond capacity=64");
        assert!(err.source().is_some());
    }
}
