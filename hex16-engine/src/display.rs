//! Display formatting.
//!
//! The display is 39 columns wide: up to 37 characters of value,
//! right-justified, with a base marker (` h`, ` d`, ` o`, ` b`) in the
//! last two. Binary values longer than 35 bits scroll through a
//! window, with dots marking the hidden sides.

use hex16_core::OpMode;

use crate::state::{CalculatorState, Flag};

/// Format the X register for the display in the given mode, with the
/// given binary window position.
pub fn format_display(cs: &CalculatorState, op: OpMode, position: usize) -> String {
    match op {
        OpMode::Float => {
            let x = cs.stack().x().float_val();
            let text = match cs.float_precision() {
                // scientific notation has a fixed precision
                None => sci13(x),
                Some(p) => format!("{:.*}", p as usize, x),
            };
            // fall back to scientific notation when the fixed form
            // overflows the display or rounds a nonzero value to zero
            let zeros = match cs.float_precision() {
                Some(p) => format!("0.{}", "0".repeat(p as usize)),
                None => String::new(),
            };
            if text.chars().count() > 37 || (!zeros.is_empty() && text == zeros && x != 0.0) {
                sci13(x)
            } else {
                text
            }
        }
        OpMode::Hex => {
            let mut text = cs.stack().x().int_val().to_hex_string().to_uppercase();
            if !cs.flag(Flag::LeadingZero) {
                text = trim_zeros(&text);
            }
            format!("{:>39}", format!("{} h", text))
        }
        OpMode::Dec => {
            // leading zeros are never shown in decimal
            let text = trim_zeros(&cs.stack().x().int_val().to_dec_string());
            format!("{:>39}", format!("{} d", text))
        }
        OpMode::Oct => {
            let mut text = cs.stack().x().int_val().to_oct_string();
            if !cs.flag(Flag::LeadingZero) {
                text = trim_zeros(&text);
            }
            format!("{:>39}", format!("{} o", text))
        }
        OpMode::Bin => {
            let mut text = cs.stack().x().int_val().to_bin_string(true);
            if text.len() > 35 {
                if position == 0 {
                    // rightmost window, leading zero flag ignored
                    format!("{:>39}", format!("{} .b", string_right(&text, 35)))
                } else if position == 36 {
                    text.truncate(text.len() - 36);
                    if !cs.flag(Flag::LeadingZero) {
                        text = trim_zeros(&text);
                    }
                    format!("{:>39}", format!("{} b.", text))
                } else {
                    // scrolled somewhere in the middle
                    let start = text.len() - 35 - position;
                    format!("{:>39}", format!("{} .b.", &text[start..start + 35]))
                }
            } else {
                if !cs.flag(Flag::LeadingZero) {
                    text = trim_zeros(&text);
                }
                format!("{:>39}", format!("{} b", text))
            }
        }
    }
}

/// Scientific notation with 13 digits of precision and a signed
/// two-digit exponent, like `1.2345678901235e+02`.
pub fn sci13(value: f64) -> String {
    let text = format!("{:.13e}", value);
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(rest) => ('-', rest),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        // infinities have no exponent
        None => text,
    }
}

/// Strip leading zeros (and the filler spaces of a padded binary
/// string), preserving a leading minus sign and at least one digit.
pub fn trim_zeros(text: &str) -> String {
    let (sign, body) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    let chars: Vec<char> = body.chars().collect();
    let mut start = 0;
    while start + 1 < chars.len() && (chars[start] == '0' || chars[start] == ' ') {
        start += 1;
    }
    let kept: String = chars[start..].iter().collect();
    format!("{}{}", sign, kept)
}

/// The rightmost `len` characters of `text`.
pub fn string_right(text: &str, len: usize) -> String {
    let count = text.chars().count();
    if count <= len {
        text.to_string()
    } else {
        text.chars().skip(count - len).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex16_core::{ArithMode, BigNum};

    fn state_with_x(value: i64, word_size: u32) -> CalculatorState {
        let mut cs = CalculatorState::new();
        cs.set_word_size(word_size);
        cs.stack_mut().x_mut().set_int_val(BigNum::from_i64(
            value,
            word_size,
            ArithMode::TwosComplement,
        ));
        cs
    }

    #[test]
    fn float_uses_fixed_precision() {
        let mut cs = CalculatorState::new();
        cs.stack_mut().x_mut().set_float_val(8.0);
        assert_eq!(format_display(&cs, OpMode::Float, 0), "8.000");

        cs.set_float_precision(Some(1));
        assert_eq!(format_display(&cs, OpMode::Float, 0), "8.0");
    }

    #[test]
    fn tiny_float_switches_to_scientific() {
        let mut cs = CalculatorState::new();
        cs.stack_mut().x_mut().set_float_val(0.00001);
        let text = format_display(&cs, OpMode::Float, 0);
        assert!(text.contains('e'), "{text:?}");
        assert!(text.starts_with("1.0000000000000e-05"), "{text:?}");
    }

    #[test]
    fn scientific_precision_sentinel() {
        let mut cs = CalculatorState::new();
        cs.set_float_precision(None);
        cs.stack_mut().x_mut().set_float_val(123.45);
        assert_eq!(format_display(&cs, OpMode::Float, 0), "1.2345000000000e+02");
    }

    #[test]
    fn hex_is_upper_case_and_right_justified() {
        let cs = state_with_x(0xBEEF, 16);
        let text = format_display(&cs, OpMode::Hex, 0);
        assert_eq!(text.len(), 39);
        assert!(text.ends_with("BEEF h"));
    }

    #[test]
    fn leading_zero_flag_pads_hex() {
        let mut cs = state_with_x(0x2A, 16);
        assert!(format_display(&cs, OpMode::Hex, 0).ends_with("002A h"));
        cs.set_flag(Flag::LeadingZero, false);
        assert!(format_display(&cs, OpMode::Hex, 0).ends_with(" 2A h"));
    }

    #[test]
    fn decimal_respects_the_complement_mode() {
        let cs = state_with_x(-2, 16);
        assert!(format_display(&cs, OpMode::Dec, 0).ends_with("-2 d"));
    }

    #[test]
    fn short_binary_fits_without_windows() {
        let cs = state_with_x(0b101010, 8);
        let text = format_display(&cs, OpMode::Bin, 0);
        assert!(text.ends_with("00101010 b"), "{text:?}");
    }

    #[test]
    fn wide_binary_windows() {
        let cs = state_with_x(-1, 64);
        let w0 = format_display(&cs, OpMode::Bin, 0);
        assert!(w0.ends_with(" .b"), "{w0:?}");
        let w1 = format_display(&cs, OpMode::Bin, 36);
        assert!(w1.ends_with(" b."), "{w1:?}");
        let mid = format_display(&cs, OpMode::Bin, 10);
        assert!(mid.ends_with(" .b."), "{mid:?}");
    }

    #[test]
    fn trim_zeros_keeps_sign_and_last_digit() {
        assert_eq!(trim_zeros("0000"), "0");
        assert_eq!(trim_zeros("-0002"), "-2");
        assert_eq!(trim_zeros("00000000 00101010"), "101010");
    }

    #[test]
    fn string_right_truncates_from_the_left() {
        assert_eq!(string_right("abcdef", 3), "def");
        assert_eq!(string_right("ab", 5), "ab");
    }
}
