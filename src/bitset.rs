//! Bit sets
//!
//! A bit set is stored as a single unsigned integer in which each schema
//! choice owns one bit position. Setting a choice is a read-modify-write of
//! the whole integer, so the other choices are always preserved; setting a
//! choice to `false` clears its bit.

use crate::prim::Primitive;

#[cfg(feature = "serde_impls")]
use serde::Serialize;

/// Unsigned integer types able to hold a bit set
pub trait BitRepr: Primitive + Eq {
    const ZERO: Self;
    /// Number of bit positions
    const BITS: u8;

    /// Reads the bit at `position`; positions at or past `BITS` read as
    /// unset.
    fn bit(self, position: u8) -> bool;

    /// Positions at or past `BITS` leave the value unchanged.
    #[must_use]
    fn with_bit(self, position: u8, value: bool) -> Self;
}

macro_rules! impl_bit_repr {
    ( $( $t:ty ),+ ) => {
        $(
            impl BitRepr for $t {
                const ZERO: Self = 0;
                const BITS: u8 = <$t>::BITS as u8;

                #[inline]
                fn bit(self, position: u8) -> bool {
                    self.checked_shr(u32::from(position))
                        .map_or(false, |v| v & 1 == 1)
                }

                #[inline]
                fn with_bit(self, position: u8, value: bool) -> Self {
                    let Some(mask) = (1 as $t).checked_shl(u32::from(position)) else {
                        return self;
                    };
                    if value {
                        self | mask
                    } else {
                        self & !mask
                    }
                }
            }
        )+
    };
}

impl_bit_repr!(u8, u16, u32, u64);

/// Single choice of a bit set
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(Serialize))]
pub struct Choice {
    pub bit: u8,
    pub since_version: u16,
}

impl Choice {
    #[must_use]
    pub const fn new(bit: u8) -> Self {
        Self {
            bit,
            since_version: 0,
        }
    }

    #[must_use]
    pub const fn versioned(bit: u8, since_version: u16) -> Self {
        Self { bit, since_version }
    }

    /// Returns `true` if this choice is set in `raw`
    #[inline]
    #[must_use]
    pub fn test<R: BitRepr>(&self, raw: R) -> bool {
        raw.bit(self.bit)
    }

    /// Returns `raw` with this choice set to `value`
    #[inline]
    #[must_use]
    pub fn apply<R: BitRepr>(&self, raw: R, value: bool) -> R {
        raw.with_bit(self.bit, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, BlockMut};
    use crate::composite::FixedFlyweight;
    use crate::field::BitSetField;
    use crate::prim::ByteOrder;
    use proptest::prelude::*;

    const EXTRAS: BitSetField<u8> = BitSetField::new(0, ByteOrder::LittleEndian, 0);
    const SUN_ROOF: Choice = Choice::new(0);
    const SPORTS_PACK: Choice = Choice::new(1);
    const CRUISE_CONTROL: Choice = Choice::versioned(2, 1);

    #[test]
    fn set_false_clears() {
        let mut buf = [0u8; 1];
        let mut fw = FixedFlyweight::wrap(&mut buf[..], 0, 1);
        fw.set_choice(&EXTRAS, &SUN_ROOF, true).unwrap();
        fw.set_choice(&EXTRAS, &CRUISE_CONTROL, true).unwrap();
        assert_eq!(fw.bits(&EXTRAS).unwrap(), 0b101);
        fw.set_choice(&EXTRAS, &SUN_ROOF, false).unwrap();
        assert_eq!(fw.bits(&EXTRAS).unwrap(), 0b100);
        assert!(!fw.choice(&EXTRAS, &SPORTS_PACK).unwrap());
        assert!(fw.choice(&EXTRAS, &CRUISE_CONTROL).unwrap());
    }

    #[test]
    fn absent_choice_reads_false() {
        let buf = [0xffu8];
        let fw = FixedFlyweight::wrap(&buf[..], 0, 0);
        assert!(fw.choice(&EXTRAS, &SUN_ROOF).unwrap());
        assert!(!fw.choice(&EXTRAS, &CRUISE_CONTROL).unwrap());
        let absent: BitSetField<u8> = BitSetField::new(0, ByteOrder::LittleEndian, 3);
        assert_eq!(fw.bits(&absent).unwrap(), 0);
        assert!(!fw.choice(&absent, &SUN_ROOF).unwrap());
    }

    #[test]
    fn bit_past_width_is_inert() {
        let wide = Choice::new(8);
        assert!(!wide.test(0xffu8));
        assert_eq!(wide.apply(0x5au8, true), 0x5a);
        assert_eq!(Choice::new(255).apply(0u64, true), 0);
        assert!(Choice::new(63).test(u64::MAX));
    }

    proptest! {
        #[test]
        fn other_bits_preserved(raw in any::<u32>(), bit in 0u8..32, value in any::<bool>()) {
            let choice = Choice::new(bit);
            let out = choice.apply(raw, value);
            prop_assert_eq!(choice.test(out), value);
            let mask = !(1u32 << bit);
            prop_assert_eq!(out & mask, raw & mask);
        }

        #[test]
        fn big_endian_sets_round_trip(raw in any::<u16>(), bit in 0u8..16) {
            let field: BitSetField<u16> = BitSetField::new(1, ByteOrder::BigEndian, 0);
            let choice = Choice::new(bit);
            let mut buf = [0u8; 3];
            let mut fw = FixedFlyweight::wrap(&mut buf[..], 0, 0);
            fw.set_bits(&field, raw).unwrap();
            fw.set_choice(&field, &choice, true).unwrap();
            prop_assert_eq!(fw.bits(&field).unwrap(), raw | (1 << bit));
            fw.set_choice(&field, &choice, false).unwrap();
            prop_assert_eq!(fw.bits(&field).unwrap(), raw & !(1 << bit));
        }
    }
}
