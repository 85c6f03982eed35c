//! Forward-moving position cursor shared by a message and its groups
//!
//! A [`Cursor`] pairs an [`Index`] with the invariant capacity of the buffer
//! it points into. The index is allowed to reach, but never to exceed, that
//! capacity; every movement that would do so is rejected before the index is
//! modified.

use crate::error::{BoundsError, FlyweightResult};

/// Wrapper around [`usize`] that represents monotonically increasing indices
/// into a buffer.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
#[repr(transparent)]
pub struct Index(usize);

impl Index {
    /// Constructs a new `Index` object initialized to `0`
    #[inline(always)]
    #[must_use]
    pub fn new() -> Self {
        Self(0usize)
    }

    /// Advances the held value by `n` unless this would cause it to exceed
    /// `lim`.
    ///
    /// Returns the original value (before incrementation), along with a boolean
    /// value that is equal to `true` if and only if the increment occurred.
    #[inline]
    pub fn increment_checked(&mut self, n: usize, lim: usize) -> (usize, bool) {
        let ret = self.0;
        let is_valid = matches!(self.0.checked_add(n), Some(tgt) if tgt <= lim);
        if is_valid {
            self.0 += n;
        }
        (ret, is_valid)
    }

    #[must_use]
    #[inline(always)]
    pub fn to_usize(self) -> usize {
        self.0
    }
}

impl From<usize> for Index {
    #[inline]
    fn from(ix: usize) -> Self {
        Self(ix)
    }
}

/// Position cursor bounded by the capacity of a buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Cursor {
    cur: Index,
    cap: usize,
}

impl Cursor {
    /// Creates a cursor at position `0` over a buffer of `cap` bytes
    #[must_use]
    pub fn with_limit(cap: usize) -> Self {
        Self {
            cur: Index::new(),
            cap,
        }
    }

    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.cur.to_usize()
    }

    #[inline(always)]
    #[must_use]
    pub fn limit(&self) -> usize {
        self.cap
    }

    /// Moves the cursor to an absolute position.
    ///
    /// # Errors
    ///
    /// Returns [`BoundsError::PositionBeyondCapacity`] if `pos` exceeds the
    /// capacity, leaving the cursor unchanged.
    pub fn set(&mut self, pos: usize) -> FlyweightResult<()> {
        if pos > self.cap {
            tracing::debug!(position = pos, capacity = self.cap, "position rejected");
            return Err(BoundsError::PositionBeyondCapacity {
                position: pos,
                capacity: self.cap,
            }
            .into());
        }
        self.cur = Index::from(pos);
        Ok(())
    }

    /// Advances the cursor by `n` bytes, returning the position it held
    /// beforehand.
    ///
    /// # Errors
    ///
    /// Returns [`BoundsError::PositionBeyondCapacity`] if the advance would
    /// move past the capacity, leaving the cursor unchanged.
    pub fn advance(&mut self, n: usize) -> FlyweightResult<usize> {
        match self.cur.increment_checked(n, self.cap) {
            (old, true) => Ok(old),
            (old, false) => {
                let position = old.saturating_add(n);
                tracing::debug!(position, capacity = self.cap, "advance rejected");
                Err(BoundsError::PositionBeyondCapacity {
                    position,
                    capacity: self.cap,
                }
                .into())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::FlyweightError;

    #[test]
    fn advance_to_limit() {
        let mut c = Cursor::with_limit(10);
        assert_eq!(c.advance(4).unwrap(), 0);
        assert_eq!(c.advance(6).unwrap(), 4);
        assert_eq!(c.index(), 10);
        assert_eq!(c.advance(0).unwrap(), 10);
    }

    #[test]
    fn advance_past_limit_is_rejected() {
        let mut c = Cursor::with_limit(8);
        c.set(5).unwrap();
        let err = c.advance(4).unwrap_err();
        assert_eq!(
            err,
            FlyweightError::Bounds(BoundsError::PositionBeyondCapacity {
                position: 9,
                capacity: 8
            })
        );
        assert_eq!(c.index(), 5);
        assert!(c.advance(usize::MAX).is_err());
    }

    #[test]
    fn set_checks_capacity() {
        let mut c = Cursor::with_limit(64);
        assert!(c.set(64).is_ok());
        assert!(c.set(70).is_err());
        assert_eq!(c.index(), 64);
    }
}
