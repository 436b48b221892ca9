//! Error types for the core data model

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("Word size {0} cannot be split into halves")]
    OddSplit(u32),

    #[error("Operand word sizes differ: {left} vs {right}")]
    SizeMismatch { left: u32, right: u32 },

    #[error("Word size {0} out of range (valid range: 1-64)")]
    InvalidWordSize(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        assert_eq!(
            CoreError::OddSplit(9).to_string(),
            "Word size 9 cannot be split into halves"
        );
        assert_eq!(
            CoreError::SizeMismatch { left: 8, right: 16 }.to_string(),
            "Operand word sizes differ: 8 vs 16"
        );
    }
}
