//! Enumerations backed by a primitive representation
//!
//! Generated codecs declare each schema enumeration with [`sbe_enum!`],
//! which produces a plain Rust `enum` with one variant per valid value plus
//! a trailing `NullValue` variant. Decoding never fails: any raw value that
//! does not match a declared variant maps to `NullValue`.

use std::fmt::Debug;

use crate::prim::Primitive;

/// Schema enumeration with a fixed primitive representation
pub trait SbeEnum: Copy + Eq + Debug {
    type Repr: Primitive;

    /// Variant standing for "no value", also returned for unknown raw values
    const NULL_VALUE: Self;

    /// Raw value written for [`NULL_VALUE`](SbeEnum::NULL_VALUE): the
    /// schema-declared null if any, otherwise the null of `Repr`
    const NULL_REPR: Self::Repr;

    fn from_repr(raw: Self::Repr) -> Self;

    fn to_repr(self) -> Self::Repr;
}

/// Declares an enumeration and its [`SbeEnum`] implementation.
///
/// ```
/// flyweight::sbe_enum!(BooleanType, u8, { F = 0, T = 1 });
/// flyweight::sbe_enum!(Model, u8, null = 0, { A = b'A', B = b'B', C = b'C' });
///
/// use flyweight::enumeration::SbeEnum;
/// assert_eq!(BooleanType::from_repr(1), BooleanType::T);
/// assert_eq!(BooleanType::from_repr(7), BooleanType::NullValue);
/// assert_eq!(Model::NullValue.to_repr(), 0);
/// ```
#[macro_export]
macro_rules! sbe_enum {
    ( $name:ident, $backer:ty, { $( $vname:ident = $vdisc:expr ),+ $(,)? } ) => {
        $crate::sbe_enum!($name, $backer, null = <$backer as $crate::prim::Primitive>::NULL, { $( $vname = $vdisc ),+ });
    };
    ( $name:ident, $backer:ty, null = $null:expr, { $( $vname:ident = $vdisc:expr ),+ $(,)? } ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $vname ),+ ,
            NullValue,
        }

        impl $crate::enumeration::SbeEnum for $name {
            type Repr = $backer;

            const NULL_VALUE: Self = $name::NullValue;
            const NULL_REPR: $backer = $null;

            #[allow(clippy::unnecessary_cast)]
            fn from_repr(raw: $backer) -> Self {
                $(
                    if raw == ($vdisc as $backer) {
                        return $name::$vname;
                    }
                )+
                $name::NullValue
            }

            #[allow(clippy::unnecessary_cast)]
            fn to_repr(self) -> $backer {
                match self {
                    $( $name::$vname => $vdisc as $backer, )+
                    $name::NullValue => $null,
                }
            }
        }

        impl $crate::len::FixedLength for $name {
            const LEN: usize = <$backer as $crate::len::FixedLength>::LEN;
        }
    };
}

/// Returns `true` if `value` is a declared variant rather than the null
/// sentinel.
#[must_use]
pub fn is_defined<E: SbeEnum>(value: E) -> bool {
    value != E::NULL_VALUE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::len::FixedLength;

    crate::sbe_enum!(Signal, i16, { Stop = -1, Go = 1, Yield = 2 });
    crate::sbe_enum!(Grade, u8, null = 0, { A = b'A', B = b'B' });

    #[test]
    fn unknown_values_decode_to_null() {
        assert_eq!(Signal::from_repr(2), Signal::Yield);
        assert_eq!(Signal::from_repr(-1), Signal::Stop);
        assert_eq!(Signal::from_repr(0), Signal::NullValue);
        assert!(!is_defined(Signal::from_repr(3)));
        assert_eq!(Signal::NULL_REPR, i16::MIN);
        assert_eq!(Signal::NullValue.to_repr(), i16::MIN);
        assert_eq!(<Signal as FixedLength>::LEN, 2);
    }

    #[test]
    fn declared_null_overrides_default() {
        assert_eq!(Grade::NullValue.to_repr(), 0);
        assert_eq!(Grade::from_repr(0), Grade::NullValue);
        assert_eq!(Grade::from_repr(b'B'), Grade::B);
        assert_eq!(Grade::B.to_repr(), 66);
    }
}
