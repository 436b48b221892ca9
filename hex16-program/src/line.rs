//! Fixed-column program line codec
//!
//! Every line is eight columns of hexadecimal key codes followed by an
//! optional `    'comment` tail. The number of leading spaces tells the
//! shapes apart:
//!
//! - six spaces: one key, columns 6-7
//! - three spaces: two keys, columns 3-4 and 6-7
//! - otherwise: three comma-separated keys, columns 0-1, 3-4, 6-7
//!
//! Register addresses 16-31 print as `.0` through `.F` in the second
//! field (`STO . 7` style); the decoder expands those into the decimal
//! point keystroke followed by the digit.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("improper program line: {0:?}")]
    Malformed(String),
}

/// The decimal point key code, inserted when a `.d` register field is
/// expanded back into keystrokes.
const KEY_DECIMAL: u16 = 0x48;

/// Encode a single-key line, right-justified in the eight columns.
pub fn encode_one(key: u16, comment: Option<&str>) -> String {
    match comment {
        Some(c) => format!("{key:8X}    '{c}"),
        None => format!("{key:8X}"),
    }
}

/// Encode a two-key line (a staged command and its operand).
pub fn encode_two(key1: u16, key2: u16, comment: &str) -> String {
    format!("{key1:5X}{key2:3X}    '{comment}")
}

/// Encode a staged command addressing a register above 15, `.d` style.
pub fn encode_dot_register(key1: u16, digit: u16, comment: &str) -> String {
    format!("{key1:5X} .{digit:1X}    '{comment}")
}

/// Encode a three-key line (shift prefix, staged command, operand).
pub fn encode_three(key1: u16, key2: u16, key3: u16, comment: &str) -> String {
    format!("{key1:2X},{key2:2X},{key3:2X}    '{comment}")
}

/// Decode a line back into the key codes to replay, in press order.
pub fn decode(line: &str) -> Result<Vec<u16>, CodecError> {
    let malformed = || CodecError::Malformed(line.to_string());
    let code = line.get(..8).ok_or_else(malformed)?;
    if !code.is_ascii() {
        return Err(malformed());
    }

    if let Some(rest) = code.strip_prefix("      ") {
        let key = hex_field(rest).ok_or_else(malformed)?;
        return Ok(vec![key]);
    }

    if code.starts_with("   ") {
        let key1 = hex_field(&code[3..5]).ok_or_else(malformed)?;
        let second = &code[5..8];
        // a `.d` field is the decimal point plus a digit
        if let Some(digit) = second.trim_start().strip_prefix('.') {
            let digit = hex_field(digit).ok_or_else(malformed)?;
            return Ok(vec![key1, KEY_DECIMAL, digit]);
        }
        let key2 = hex_field(second).ok_or_else(malformed)?;
        return Ok(vec![key1, key2]);
    }

    if &code[2..3] != "," || &code[5..6] != "," {
        return Err(malformed());
    }
    let key1 = hex_field(&code[..2]).ok_or_else(malformed)?;
    let key2 = hex_field(&code[3..5]).ok_or_else(malformed)?;
    let key3 = hex_field(&code[6..8]).ok_or_else(malformed)?;
    Ok(vec![key1, key2, key3])
}

fn hex_field(s: &str) -> Option<u16> {
    u16::from_str_radix(s.trim(), 16).ok()
}
