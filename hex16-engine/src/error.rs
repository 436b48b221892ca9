//! The calculator error taxonomy.
//!
//! Errors are shown on the display as short numbered messages rather
//! than propagated to the caller, so the `Display` text here is the
//! exact string that ends up on screen.

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CalcError {
    #[error("Error 0 - Improper Math Operation")]
    ImproperMathOperation,

    #[error("Error 1 - Improper Flag Number")]
    ImproperFlagNumber,

    #[error("Error 1 - Improper Windows Number")]
    ImproperWindowNumber,

    #[error("Error 1 - Improper Float Number")]
    ImproperFloatNumber,

    #[error("Error 1 - Improper GTO. Number")]
    ImproperGtoNumber,

    #[error("Error 2 - Improper Bit Number")]
    ImproperBitNumber,

    #[error("Error 3 - Improper Register Number")]
    ImproperRegisterNumber,

    #[error("Error 4 - Improper Label")]
    ImproperLabel,

    #[error("Error 4 - Improper Line Number")]
    ImproperLineNumber,

    #[error("Error 6 - Improper Program Line")]
    ImproperProgramLine,
}
