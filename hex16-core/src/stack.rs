//! The four-level RPN stack
//!
//! X, Y, Z, and T behave the classic way: pushing lifts the stack and
//! drops T off the top, popping pulls the stack down and T duplicates
//! into Z. The roll and swap operations permute the four registers
//! without losing anything.

use serde::{Deserialize, Serialize};

use crate::mode::ArithMode;
use crate::register::Register;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stack {
    x: Register,
    y: Register,
    z: Register,
    t: Register,
}

impl Stack {
    pub fn new(word_size: u32, mode: ArithMode) -> Stack {
        let reg = Register::new(word_size, mode);
        Stack {
            x: reg.clone(),
            y: reg.clone(),
            z: reg.clone(),
            t: reg,
        }
    }

    /// Lift the stack and place `value` in X. T falls off the top.
    pub fn push(&mut self, value: Register) {
        self.t = self.z.clone();
        self.z = self.y.clone();
        self.y = self.x.clone();
        self.x = value;
    }

    /// Pull X off the stack. T duplicates into Z, so popping repeatedly
    /// keeps yielding T's value.
    pub fn pop(&mut self) -> Register {
        let ans = self.x.clone();
        self.x = self.y.clone();
        self.y = self.z.clone();
        self.z = self.t.clone();
        ans
    }

    /// R-down: X to T, everything else down one.
    pub fn roll_down(&mut self) {
        let temp = self.x.clone();
        self.x = self.y.clone();
        self.y = self.z.clone();
        self.z = self.t.clone();
        self.t = temp;
    }

    /// R-up: T to X, everything else up one.
    pub fn roll_up(&mut self) {
        let temp = self.t.clone();
        self.t = self.z.clone();
        self.z = self.y.clone();
        self.y = self.x.clone();
        self.x = temp;
    }

    pub fn swap_xy(&mut self) {
        std::mem::swap(&mut self.x, &mut self.y);
    }

    pub fn x(&self) -> &Register {
        &self.x
    }

    pub fn x_mut(&mut self) -> &mut Register {
        &mut self.x
    }

    pub fn set_x(&mut self, value: Register) {
        self.x = value;
    }

    pub fn y(&self) -> &Register {
        &self.y
    }

    pub fn y_mut(&mut self) -> &mut Register {
        &mut self.y
    }

    pub fn set_y(&mut self, value: Register) {
        self.y = value;
    }

    pub fn z(&self) -> &Register {
        &self.z
    }

    pub fn z_mut(&mut self) -> &mut Register {
        &mut self.z
    }

    pub fn set_z(&mut self, value: Register) {
        self.z = value;
    }

    pub fn t(&self) -> &Register {
        &self.t
    }

    pub fn t_mut(&mut self) -> &mut Register {
        &mut self.t
    }

    pub fn set_t(&mut self, value: Register) {
        self.t = value;
    }

    /// All four registers, X first, for whole-stack maintenance.
    pub fn regs_mut(&mut self) -> [&mut Register; 4] {
        [&mut self.x, &mut self.y, &mut self.z, &mut self.t]
    }
}
