//! # hex16 engine
//!
//! The keystroke-driven calculator engine: an HP-16C style programmable
//! RPN machine. [`Engine::press`] consumes one key code at a time and
//! returns a [`DisplayUpdate`] telling the front end what to show,
//! which annunciators to light, and whether a stored program should
//! start running.
//!
//! ## Example
//!
//! ```rust
//! use hex16_engine::{keys, Engine};
//!
//! let mut engine = Engine::new();
//! engine.press(i32::from(keys::KEY_DEC));
//! engine.press(i32::from(keys::KEY_7));
//! engine.press(i32::from(keys::KEY_ENTER));
//! engine.press(i32::from(keys::KEY_5));
//! let out = engine.press(i32::from(keys::KEY_ADD));
//! assert!(out.display_text.ends_with("12 d"));
//! ```
//!
//! The complete calculator state lives in [`CalculatorState`] and
//! round-trips through JSON, so a session can be saved and restored.

pub mod display;
pub mod engine;
pub mod error;
pub mod keys;
pub mod output;
pub mod state;

pub use engine::{Engine, SLEEP_DELAY_MS};
pub use error::CalcError;
pub use output::{DisplayUpdate, Start};
pub use state::{CalculatorState, Flag, StateError, NUM_REGISTERS, PRGM_MEMORY_LINES};
