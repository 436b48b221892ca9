//! What a keystroke asks the front end to do.
//!
//! The engine never draws anything itself. Each keystroke returns a
//! [`DisplayUpdate`] describing the new display text, the annunciator
//! states, and whether the front end should start running the stored
//! program.

/// Deferred work the front end must kick off after showing the update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Start {
    /// Run the stored program from the current position.
    RunProgram,
    /// Single-step one program line.
    RunLine,
}

/// The result of one keystroke.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayUpdate {
    /// Main display contents.
    pub display_text: String,
    /// Transient message shown instead of the main display, such as an
    /// error or the STATUS readout. Empty when unused.
    pub alternate_text: String,
    pub f_annunciator: bool,
    pub g_annunciator: bool,
    pub carry_annunciator: bool,
    pub overflow_annunciator: bool,
    pub prgm_annunciator: bool,
    /// Reject the keystroke audibly.
    pub beep: bool,
    /// The keystroke changed which operations are legal, so any on-screen
    /// key menu should be rebuilt.
    pub menu_refresh: bool,
    /// How long to keep `alternate_text` up before reverting, in
    /// milliseconds. Zero means no delay.
    pub delay_ms: u64,
    pub start: Option<Start>,
}
