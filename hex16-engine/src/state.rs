//! The persistent calculator state.
//!
//! Everything that survives switching the calculator off lives here:
//! modes, flags, the storage registers, the four-level stack, and the
//! stored program. The whole struct round-trips through JSON so a
//! front end can save it on exit and restore it on launch.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use hex16_core::{ArithMode, BigNum, OpMode, Register, Stack, INDEX_WORD_SIZE};

/// Number of storage registers, 0-F and .0-.F.
pub const NUM_REGISTERS: usize = 32;

/// Capacity of program memory, in lines.
pub const PRGM_MEMORY_LINES: usize = 302;

const NUM_FLAGS: usize = 6;

/// The six user and system flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    User0,
    User1,
    User2,
    LeadingZero,
    Carry,
    Overflow,
}

impl Flag {
    pub fn index(&self) -> usize {
        match self {
            Flag::User0 => 0,
            Flag::User1 => 1,
            Flag::User2 => 2,
            Flag::LeadingZero => 3,
            Flag::Carry => 4,
            Flag::Overflow => 5,
        }
    }

    pub fn from_index(index: usize) -> Option<Flag> {
        match index {
            0 => Some(Flag::User0),
            1 => Some(Flag::User1),
            2 => Some(Flag::User2),
            3 => Some(Flag::LeadingZero),
            4 => Some(Flag::Carry),
            5 => Some(Flag::Overflow),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum StateError {
    #[error("State serialization failed: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("State deserialization failed: {0}")]
    Deserialize(#[source] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatorState {
    word_size: u32,
    op_mode: OpMode,
    arith_mode: ArithMode,
    /// `None` shows floats in scientific notation.
    float_precision: Option<u8>,
    flags: [bool; NUM_FLAGS],
    regs: Vec<Register>,
    reg_index: Register,
    stack: Stack,
    last_x: Register,
    prgm_position: usize,
    prgm_memory: Vec<String>,
    prgm_ret_stack: Vec<usize>,
    prgm_running: bool,
    /// Keep the float and integer sides of every register in step when
    /// switching between float and integer modes. When false the word
    /// size and stack follow the hardware conversion rules instead.
    #[serde(default = "default_sync_conversions")]
    sync_conversions: bool,
}

fn default_sync_conversions() -> bool {
    true
}

impl Default for CalculatorState {
    fn default() -> CalculatorState {
        CalculatorState::new()
    }
}

impl CalculatorState {
    pub fn new() -> CalculatorState {
        let word_size = hex16_core::DEFAULT_WORD_SIZE;
        let mode = ArithMode::TwosComplement;
        let mut flags = [false; NUM_FLAGS];
        flags[Flag::LeadingZero.index()] = true;
        CalculatorState {
            word_size,
            op_mode: OpMode::Float,
            arith_mode: mode,
            float_precision: Some(3),
            flags,
            regs: vec![Register::new(word_size, mode); NUM_REGISTERS],
            reg_index: Register::new(INDEX_WORD_SIZE, mode),
            stack: Stack::new(word_size, mode),
            last_x: Register::new(word_size, mode),
            prgm_position: 0,
            prgm_memory: Vec::new(),
            prgm_ret_stack: Vec::new(),
            prgm_running: false,
            sync_conversions: true,
        }
    }

    #[inline]
    pub fn word_size(&self) -> u32 {
        self.word_size
    }

    /// Change the word size, resizing every integer value that follows
    /// the word size.
    pub fn set_word_size(&mut self, size: u32) {
        if self.word_size != size {
            self.resize_all(size);
        }
        self.word_size = size;
    }

    #[inline]
    pub fn op_mode(&self) -> OpMode {
        self.op_mode
    }

    pub fn set_op_mode(&mut self, mode: OpMode) {
        self.op_mode = mode;
    }

    #[inline]
    pub fn arith_mode(&self) -> ArithMode {
        self.arith_mode
    }

    /// Change the complement mode of every integer value at once.
    pub fn set_arith_mode(&mut self, mode: ArithMode) {
        if self.arith_mode != mode {
            self.re_arith_all(mode);
        }
        self.arith_mode = mode;
    }

    #[inline]
    pub fn float_precision(&self) -> Option<u8> {
        self.float_precision
    }

    pub fn set_float_precision(&mut self, precision: Option<u8>) {
        self.float_precision = precision;
    }

    #[inline]
    pub fn flag(&self, flag: Flag) -> bool {
        self.flags[flag.index()]
    }

    pub fn set_flag(&mut self, flag: Flag, value: bool) {
        self.flags[flag.index()] = value;
    }

    #[inline]
    pub fn sync_conversions(&self) -> bool {
        self.sync_conversions
    }

    pub fn set_sync_conversions(&mut self, sync: bool) {
        self.sync_conversions = sync;
    }

    pub fn reg(&self, index: usize) -> &Register {
        &self.regs[index]
    }

    pub fn set_reg(&mut self, index: usize, reg: Register) {
        self.regs[index] = reg;
    }

    pub fn regs_mut(&mut self) -> &mut [Register] {
        &mut self.regs
    }

    #[inline]
    pub fn reg_index(&self) -> &Register {
        &self.reg_index
    }

    pub fn reg_index_mut(&mut self) -> &mut Register {
        &mut self.reg_index
    }

    pub fn set_reg_index(&mut self, reg: Register) {
        self.reg_index = reg;
    }

    #[inline]
    pub fn last_x(&self) -> &Register {
        &self.last_x
    }

    pub fn set_last_x(&mut self, reg: Register) {
        self.last_x = reg;
    }

    #[inline]
    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut Stack {
        &mut self.stack
    }

    #[inline]
    pub fn prgm_position(&self) -> usize {
        self.prgm_position
    }

    pub fn set_prgm_position(&mut self, position: usize) {
        self.prgm_position = position;
    }

    #[inline]
    pub fn prgm_memory(&self) -> &[String] {
        &self.prgm_memory
    }

    pub fn prgm_memory_mut(&mut self) -> &mut Vec<String> {
        &mut self.prgm_memory
    }

    pub fn ret_stack_push(&mut self, position: usize) {
        self.prgm_ret_stack.push(position);
    }

    pub fn ret_stack_pop(&mut self) -> Option<usize> {
        self.prgm_ret_stack.pop()
    }

    pub fn ret_stack_clear(&mut self) {
        self.prgm_ret_stack.clear();
    }

    #[inline]
    pub fn prgm_running(&self) -> bool {
        self.prgm_running
    }

    pub fn set_prgm_running(&mut self, running: bool) {
        self.prgm_running = running;
    }

    /// Bring the idle side of every register in step with the live
    /// side, in the direction given by the current operating mode.
    pub fn sync_values(&mut self) {
        if self.sync_conversions {
            if self.op_mode == OpMode::Float {
                let (size, mode) = (self.word_size, self.arith_mode);
                for reg in &mut self.regs {
                    reg.sync_int_from_float(size, mode);
                }
                self.last_x.sync_int_from_float(size, mode);
                for reg in self.stack.regs_mut() {
                    reg.sync_int_from_float(size, mode);
                }
                self.reg_index.sync_int_from_float(INDEX_WORD_SIZE, mode);
            } else {
                for reg in &mut self.regs {
                    reg.sync_float_from_int();
                }
                self.last_x.sync_float_from_int();
                for reg in self.stack.regs_mut() {
                    reg.sync_float_from_int();
                }
                self.reg_index.sync_float_from_int();
            }
        } else if self.op_mode == OpMode::Float {
            // Hardware rule: floats convert through a 56-bit word with
            // the exponent in X and the mantissa in Y.
            self.word_size = 56;

            let mut exponent: i64 = 0;
            let mut mantissa: i64 = 0;
            let x = self.stack.x().float_val();
            if x != 0.0 {
                let magnitude = x.abs();
                exponent = (magnitude / 2f64.powi(32)).log2() as i64;
                mantissa = (magnitude / 2f64.powi(exponent as i32)) as i64;
                if x < 0.0 {
                    mantissa = -mantissa;
                }
            }
            let mode = self.arith_mode;
            self.stack
                .x_mut()
                .set_int_val(BigNum::from_i64(exponent, 56, mode));
            self.stack
                .y_mut()
                .set_int_val(BigNum::from_i64(mantissa, 56, mode));
        } else {
            // Hardware rule: x becomes y * 2^x and the rest of the
            // float stack is zeroed.
            self.stack.y_mut().set_float_val(0.0);
            self.stack.z_mut().set_float_val(0.0);
            self.stack.t_mut().set_float_val(0.0);
            self.last_x.set_float_val(0.0);

            let exponent = self.stack.x().int_val().to_i64().0;
            let mantissa = self.stack.y().int_val().to_i64().0;
            self.stack
                .x_mut()
                .set_float_val(mantissa as f64 * 2f64.powi(exponent as i32));
        }
    }

    /// Serialize to pretty JSON for persistence.
    pub fn to_json(&self) -> Result<String, StateError> {
        serde_json::to_string_pretty(self).map_err(StateError::Serialize)
    }

    pub fn from_json(text: &str) -> Result<CalculatorState, StateError> {
        serde_json::from_str(text).map_err(StateError::Deserialize)
    }

    fn resize_all(&mut self, size: u32) {
        if self.sync_conversions {
            for reg in &mut self.regs {
                reg.set_word_size(size);
            }
            self.last_x.set_word_size(size);
            for reg in self.stack.regs_mut() {
                reg.set_word_size(size);
            }
        } else {
            // Hardware rule: storage registers keep their size, and the
            // stack does not sign-extend on widening.
            let mode = self.arith_mode;
            self.last_x.set_mode(ArithMode::Unsigned);
            for reg in self.stack.regs_mut() {
                reg.set_mode(ArithMode::Unsigned);
            }

            self.last_x.set_word_size(size);
            for reg in self.stack.regs_mut() {
                reg.set_word_size(size);
            }

            self.last_x.set_mode(mode);
            for reg in self.stack.regs_mut() {
                reg.set_mode(mode);
            }
        }
    }

    fn re_arith_all(&mut self, mode: ArithMode) {
        for reg in &mut self.regs {
            reg.set_mode(mode);
        }
        self.last_x.set_mode(mode);
        self.reg_index.set_mode(mode);
        for reg in self.stack.regs_mut() {
            reg.set_mode(mode);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cs = CalculatorState::new();
        assert_eq!(cs.word_size(), 16);
        assert_eq!(cs.op_mode(), OpMode::Float);
        assert_eq!(cs.arith_mode(), ArithMode::TwosComplement);
        assert_eq!(cs.float_precision(), Some(3));
        assert!(cs.flag(Flag::LeadingZero));
        assert!(!cs.flag(Flag::Carry));
        assert_eq!(cs.reg_index().int_val().word_size(), 64);
        assert!(cs.prgm_memory().is_empty());
        assert!(!cs.prgm_running());
    }

    #[test]
    fn word_size_change_resizes_the_stack_and_last_x() {
        let mut cs = CalculatorState::new();
        cs.stack_mut()
            .x_mut()
            .set_int_val(BigNum::from_i64(0x1234, 16, ArithMode::TwosComplement));
        cs.set_word_size(8);
        assert_eq!(cs.stack().x().int_val().word_size(), 8);
        assert_eq!(cs.stack().x().int_val().to_i64().0, 0x34);
        assert_eq!(cs.last_x().int_val().word_size(), 8);
        // the index register keeps its fixed size
        assert_eq!(cs.reg_index().int_val().word_size(), 64);
    }

    #[test]
    fn arith_mode_change_touches_every_register() {
        let mut cs = CalculatorState::new();
        cs.set_arith_mode(ArithMode::Unsigned);
        assert_eq!(cs.reg(7).int_val().mode(), ArithMode::Unsigned);
        assert_eq!(cs.stack().t().int_val().mode(), ArithMode::Unsigned);
        assert_eq!(cs.reg_index().int_val().mode(), ArithMode::Unsigned);
    }

    #[test]
    fn sync_values_from_float_truncates() {
        let mut cs = CalculatorState::new();
        cs.stack_mut().x_mut().set_float_val(-7.9);
        cs.sync_values();
        assert_eq!(cs.stack().x().int_val().to_i64().0, -7);
    }

    #[test]
    fn sync_values_from_integer_copies_to_float() {
        let mut cs = CalculatorState::new();
        cs.set_op_mode(OpMode::Hex);
        cs.stack_mut()
            .x_mut()
            .set_int_val(BigNum::from_i64(0x2A, 16, ArithMode::TwosComplement));
        cs.sync_values();
        assert_eq!(cs.stack().x().float_val(), 42.0);
    }

    #[test]
    fn json_round_trip() {
        let mut cs = CalculatorState::new();
        cs.set_op_mode(OpMode::Hex);
        cs.set_word_size(8);
        cs.set_flag(Flag::User1, true);
        cs.stack_mut()
            .x_mut()
            .set_int_val(BigNum::from_i64(0x5A, 8, ArithMode::TwosComplement));
        cs.prgm_memory_mut().push("      36    'ENTER".to_string());
        cs.set_prgm_position(1);

        let text = cs.to_json().unwrap();
        let back = CalculatorState::from_json(&text).unwrap();
        assert_eq!(back.op_mode(), OpMode::Hex);
        assert_eq!(back.word_size(), 8);
        assert!(back.flag(Flag::User1));
        assert_eq!(back.stack().x().int_val().to_i64().0, 0x5A);
        assert_eq!(back.prgm_memory().len(), 1);
        assert_eq!(back.prgm_position(), 1);
    }

    #[test]
    fn missing_sync_field_defaults_to_true() {
        // states saved before the field existed must still load
        let text = CalculatorState::new().to_json().unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&text).unwrap();
        value.as_object_mut().unwrap().remove("sync_conversions");
        let back = CalculatorState::from_json(&value.to_string()).unwrap();
        assert!(back.sync_conversions());
    }
}
