//! # hex16 core
//!
//! Data model for a programmable RPN calculator in the style of the
//! HP-16C "Computer Scientist": fixed-width integer arithmetic in
//! unsigned, one's-complement, and two's-complement representations,
//! dual float/integer registers, and the classic four-level stack.
//!
//! ## Features
//!
//! - **`BigNum`**: arbitrary word sizes from 1 to 64 bits, with
//!   carry/overflow/loss-of-precision flags updated per operation
//! - **Three arithmetic modes**: unsigned, one's complement, two's
//!   complement, selectable at runtime
//! - **`Register`**: holds both a float and an integer value with an
//!   explicit tag naming the active representation
//! - **`Stack`**: X/Y/Z/T with T duplication on pop
//!
//! ## Example
//!
//! ```rust
//! use hex16_core::{ArithMode, BigNum};
//!
//! let x = BigNum::from_i64(0xFF, 8, ArithMode::Unsigned);
//! let y = BigNum::from_i64(1, 8, ArithMode::Unsigned);
//! let sum = x.add(&y, 0);
//! assert!(sum.carry());
//! assert!(sum.is_zero());
//! ```

pub mod bignum;
pub mod error;
pub mod mode;
pub mod register;
pub mod stack;

pub use bignum::BigNum;
pub use error::CoreError;
pub use mode::{ArithMode, OpMode};
pub use register::{Register, Repr};
pub use stack::Stack;

/// Largest selectable word size, in bits
pub const MAX_WORD_SIZE: u32 = 64;

/// Word size of a freshly powered-on calculator
pub const DEFAULT_WORD_SIZE: u32 = 16;

/// The index register is always this wide
pub const INDEX_WORD_SIZE: u32 = 64;
