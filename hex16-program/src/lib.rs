//! # hex16 program memory
//!
//! Program lines are stored as fixed-column text, one keystroke sequence
//! per line, the way the printed HP-16C program listings look. A line
//! holds one, two, or three key codes in hexadecimal, padded into an
//! eight-column field, optionally followed by a human-readable comment:
//!
//! ```text
//!       36    'ENTER
//!    44  7    'STO 7
//! 43,22, B    'g LBL B
//! ```
//!
//! [`line`] encodes and decodes these lines; [`label`] finds the line
//! carrying a given `LBL` instruction, with wraparound.

pub mod label;
pub mod line;

pub use label::find_label;
pub use line::{decode, encode_dot_register, encode_one, encode_three, encode_two, CodecError};
