//! Property tests checking the byte-array arithmetic against native
//! integer arithmetic at word sizes a machine type can mirror.

use proptest::prelude::*;

use hex16_core::{ArithMode, BigNum};

fn u16_num(v: u16) -> BigNum {
    BigNum::from_i64(v as i64, 16, ArithMode::Unsigned)
}

fn i16_num(v: i16) -> BigNum {
    BigNum::from_i64(v as i64, 16, ArithMode::TwosComplement)
}

proptest! {
    #[test]
    fn add_matches_wrapping_u16(a: u16, b: u16) {
        let sum = u16_num(a).add(&u16_num(b), 0);
        let (expect, carried) = a.overflowing_add(b);
        prop_assert_eq!(sum.to_i64().0, expect as i64);
        prop_assert_eq!(sum.carry(), carried);
        prop_assert_eq!(sum.overflow(), carried);
    }

    #[test]
    fn subtract_matches_wrapping_u16(a: u16, b: u16) {
        let diff = u16_num(a).subtract(&u16_num(b), 0);
        let (expect, borrowed) = a.overflowing_sub(b);
        prop_assert_eq!(diff.to_i64().0, expect as i64);
        prop_assert_eq!(diff.carry(), borrowed);
    }

    #[test]
    fn multiply_low_bits_match_u16(a: u16, b: u16) {
        let prod = u16_num(a).multiply(&u16_num(b), 0);
        prop_assert_eq!(prod.to_i64().0, a.wrapping_mul(b) as i64);
        prop_assert_eq!(prod.overflow(), a.checked_mul(b).is_none());
    }

    #[test]
    fn divide_matches_u16(a: u16, b in 1u16..) {
        let quot = u16_num(a).divide(&u16_num(b), 0);
        prop_assert_eq!(quot.to_i64().0, (a / b) as i64);
        prop_assert_eq!(quot.carry(), a % b != 0);
    }

    #[test]
    fn remainder_matches_u16(a: u16, b in 1u16..) {
        let rem = u16_num(a).remainder(&u16_num(b), 0);
        prop_assert_eq!(rem.to_i64().0, (a % b) as i64);
    }

    #[test]
    fn signed_divide_matches_i16(a: i16, b in prop::num::i16::ANY.prop_filter("non-zero", |v| *v != 0)) {
        // i16::MIN has no magnitude in 16 bits
        prop_assume!(a != i16::MIN && b != i16::MIN);
        let quot = i16_num(a).divide(&i16_num(b), 0);
        prop_assert_eq!(quot.to_i64().0, (a / b) as i64);
    }

    #[test]
    fn signed_remainder_matches_i16(a: i16, b in prop::num::i16::ANY.prop_filter("non-zero", |v| *v != 0)) {
        prop_assume!(a != i16::MIN && b != i16::MIN);
        let rem = i16_num(a).remainder(&i16_num(b), 0);
        prop_assert_eq!(rem.to_i64().0, (a % b) as i64);
    }

    #[test]
    fn compare_matches_i16_ordering(a: i16, b: i16) {
        prop_assert_eq!(i16_num(a).compare(&i16_num(b)), a.cmp(&b));
    }

    #[test]
    fn widening_preserves_signed_value(a: i16) {
        let mut x = i16_num(a);
        x.set_word_size(64);
        prop_assert_eq!(x.to_i64().0, a as i64);
    }

    #[test]
    fn shift_left_doubles_mod_word(a: u16) {
        let mut x = u16_num(a);
        x.shift_left(1, 0);
        prop_assert_eq!(x.to_i64().0, a.wrapping_shl(1) as i64);
        prop_assert_eq!(x.carry(), a & 0x8000 != 0);
    }

    #[test]
    fn shift_right_halves(a: u16) {
        let mut x = u16_num(a);
        x.shift_right(1, false, 0);
        prop_assert_eq!(x.to_i64().0, (a >> 1) as i64);
        prop_assert_eq!(x.carry(), a & 1 != 0);
    }

    #[test]
    fn hex_string_matches_format(a: u16) {
        prop_assert_eq!(u16_num(a).to_hex_string(), format!("{a:04x}"));
    }

    #[test]
    fn dec_string_matches_format(a: u16) {
        let s = u16_num(a).to_dec_string();
        let expected = format!("{a}");
        prop_assert_eq!(s.trim_start_matches('0'), expected.trim_start_matches('0'));
    }

    #[test]
    fn parse_round_trips_hex(a: u16) {
        let text = format!("&h{a:x}");
        let x = BigNum::parse(&text, 16, ArithMode::Unsigned);
        prop_assert_eq!(x.to_i64().0, a as i64);
    }
}
