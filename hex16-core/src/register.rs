//! Dual-representation storage registers
//!
//! A register holds both a float and a fixed-width integer, with a tag
//! naming which one was written last. In float mode the calculator works
//! on the float side, in the integer bases on the [`BigNum`] side, and
//! the mode switches convert one into the other.

use serde::{Deserialize, Serialize};

use crate::bignum::BigNum;
use crate::mode::ArithMode;

/// Which side of a register holds the live value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Repr {
    Float,
    Integer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Register {
    float_val: f64,
    int_val: BigNum,
    repr: Repr,
}

impl Register {
    pub fn new(word_size: u32, mode: ArithMode) -> Register {
        Register {
            float_val: 0.0,
            int_val: BigNum::new(word_size, mode),
            repr: Repr::Float,
        }
    }

    #[inline]
    pub fn repr(&self) -> Repr {
        self.repr
    }

    #[inline]
    pub fn float_val(&self) -> f64 {
        self.float_val
    }

    /// Store a float and make it the live side.
    pub fn set_float_val(&mut self, value: f64) {
        self.float_val = value;
        self.repr = Repr::Float;
    }

    #[inline]
    pub fn int_val(&self) -> &BigNum {
        &self.int_val
    }

    /// Store an integer and make it the live side.
    pub fn set_int_val(&mut self, value: BigNum) {
        self.int_val = value;
        self.repr = Repr::Integer;
    }

    /// Refresh the float side from the integer side without moving the
    /// tag, or the other way around. Used when both sides are kept in
    /// step after every operation.
    pub fn sync_float_from_int(&mut self) {
        self.float_val = self.int_val.to_f64();
    }

    pub fn sync_int_from_float(&mut self, word_size: u32, mode: ArithMode) {
        self.int_val = BigNum::from_f64(self.float_val, word_size, mode);
    }

    pub fn set_word_size(&mut self, size: u32) {
        self.int_val.set_word_size(size);
    }

    pub fn set_mode(&mut self, mode: ArithMode) {
        self.int_val.set_mode(mode);
    }

    /// Direct access to the integer side for in-place bit operations.
    pub fn int_val_mut(&mut self) -> &mut BigNum {
        &mut self.int_val
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_move_the_tag() {
        let mut r = Register::new(16, ArithMode::TwosComplement);
        assert_eq!(r.repr(), Repr::Float);

        r.set_int_val(BigNum::from_i64(42, 16, ArithMode::TwosComplement));
        assert_eq!(r.repr(), Repr::Integer);
        assert_eq!(r.int_val().to_i64().0, 42);

        r.set_float_val(2.5);
        assert_eq!(r.repr(), Repr::Float);
        assert_eq!(r.float_val(), 2.5);
        // the stale integer side is untouched
        assert_eq!(r.int_val().to_i64().0, 42);
    }

    #[test]
    fn syncing_does_not_move_the_tag() {
        let mut r = Register::new(16, ArithMode::TwosComplement);
        r.set_float_val(-7.9);
        r.sync_int_from_float(16, ArithMode::TwosComplement);
        assert_eq!(r.repr(), Repr::Float);
        assert_eq!(r.int_val().to_i64().0, -7);

        r.set_int_val(BigNum::from_i64(12, 16, ArithMode::TwosComplement));
        r.sync_float_from_int();
        assert_eq!(r.float_val(), 12.0);
        assert_eq!(r.repr(), Repr::Integer);
    }
}
