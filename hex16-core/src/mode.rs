//! Arithmetic and display modes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Signed-integer representation used by [`crate::BigNum`] arithmetic.
///
/// The index values are stable: they appear in the STATUS display and in
/// persisted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithMode {
    Unsigned,
    OnesComplement,
    TwosComplement,
}

impl ArithMode {
    pub fn index(&self) -> u8 {
        match self {
            ArithMode::Unsigned => 0,
            ArithMode::OnesComplement => 1,
            ArithMode::TwosComplement => 2,
        }
    }

    pub fn from_index(index: u8) -> Option<ArithMode> {
        match index {
            0 => Some(ArithMode::Unsigned),
            1 => Some(ArithMode::OnesComplement),
            2 => Some(ArithMode::TwosComplement),
            _ => None,
        }
    }

    /// True for both complement modes.
    #[inline]
    pub fn is_signed(&self) -> bool {
        !matches!(self, ArithMode::Unsigned)
    }
}

impl fmt::Display for ArithMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArithMode::Unsigned => "unsigned",
            ArithMode::OnesComplement => "1's complement",
            ArithMode::TwosComplement => "2's complement",
        };
        write!(f, "{}", name)
    }
}

/// Display/operating mode of the calculator.
///
/// The ordering matters: digit keys are rejected when the current mode's
/// index is above the largest mode that can display that digit (e.g. the
/// `8` key is dead in octal and binary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpMode {
    Float,
    Hex,
    Dec,
    Oct,
    Bin,
}

impl OpMode {
    pub fn index(&self) -> u8 {
        match self {
            OpMode::Float => 0,
            OpMode::Hex => 1,
            OpMode::Dec => 2,
            OpMode::Oct => 3,
            OpMode::Bin => 4,
        }
    }

    pub fn from_index(index: u8) -> Option<OpMode> {
        match index {
            0 => Some(OpMode::Float),
            1 => Some(OpMode::Hex),
            2 => Some(OpMode::Dec),
            3 => Some(OpMode::Oct),
            4 => Some(OpMode::Bin),
            _ => None,
        }
    }

    #[inline]
    pub fn is_integer(&self) -> bool {
        !matches!(self, OpMode::Float)
    }
}

impl fmt::Display for OpMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpMode::Float => "FLOAT",
            OpMode::Hex => "HEX",
            OpMode::Dec => "DEC",
            OpMode::Oct => "OCT",
            OpMode::Bin => "BIN",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arith_mode_indices_round_trip() {
        for i in 0..3 {
            let mode = ArithMode::from_index(i).unwrap();
            assert_eq!(mode.index(), i);
        }
        assert!(ArithMode::from_index(3).is_none());
    }

    #[test]
    fn op_mode_ordering_gates_digits() {
        // octal and binary sit above decimal, so the 8/9 keys are dead there
        assert!(OpMode::Oct.index() > OpMode::Dec.index());
        assert!(OpMode::Bin.index() > OpMode::Oct.index());
        assert!(OpMode::Hex.index() <= OpMode::Dec.index());
    }

    #[test]
    fn signedness() {
        assert!(!ArithMode::Unsigned.is_signed());
        assert!(ArithMode::OnesComplement.is_signed());
        assert!(ArithMode::TwosComplement.is_signed());
    }
}
