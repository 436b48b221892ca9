//! The keystroke state machine.
//!
//! [`Engine::press`] takes one key code and returns a [`DisplayUpdate`]
//! describing what the front end should show. All calculator behavior
//! runs through here: prefix keys, staged multi-key commands, digit
//! entry, program recording, and program execution.
//!
//! Three kinds of keys arrive:
//!
//! 1. plain keys, dispatched directly;
//! 2. shifted functions, reached by adding the pending `f`/`g` prefix
//!    to the next code;
//! 3. staged commands such as `STO`, which buffer keystrokes until the
//!    operand is complete and then re-dispatch themselves.

use hex16_core::{ArithMode, BigNum, OpMode, Register, INDEX_WORD_SIZE};
use hex16_program::{decode, encode_dot_register, encode_one, encode_three, encode_two, find_label};

use crate::display::{self, format_display};
use crate::error::CalcError;
use crate::keys::*;
use crate::output::{DisplayUpdate, Start};
use crate::state::{CalculatorState, Flag, NUM_REGISTERS, PRGM_MEMORY_LINES};

/// How long transient messages stay up, in milliseconds.
pub const SLEEP_DELAY_MS: u64 = 1500;

/// What the dispatcher wants done after an arm ran.
enum Flow {
    /// Run the shared cleanup and display logic.
    Tail,
    /// Return the packet as-is, skipping the cleanup.
    Done,
    /// A staged command collected another keystroke; process the
    /// command at the front of the stage buffer.
    Redispatch(u16),
}

pub struct Engine {
    state: CalculatorState,
    /// Pending shift value, 0 when no prefix is armed.
    prefix: u16,
    /// Keystrokes collected so far for a staged command. The command
    /// key sits at index 0.
    stage: Vec<u16>,
    /// True while keystrokes record program lines instead of running.
    prgm_entry: bool,
    /// Digits typed since entry was last terminated.
    raw_display: String,
    /// The raw display was seeded with "0." so a length of two still
    /// counts as a fresh entry.
    pad_decimal: bool,
    /// Suppress the stack lift for the next digit entry.
    stack_disabled: bool,
    /// Binary display window offset.
    win_pos: usize,
    /// A program line failed to decode; reported on the next refresh.
    line_fault: Option<CalcError>,
}

impl Default for Engine {
    fn default() -> Engine {
        Engine::new()
    }
}

impl Engine {
    pub fn new() -> Engine {
        Engine::with_state(CalculatorState::new())
    }

    pub fn with_state(state: CalculatorState) -> Engine {
        Engine {
            state,
            prefix: 0,
            stage: Vec::new(),
            prgm_entry: false,
            raw_display: String::new(),
            pad_decimal: false,
            stack_disabled: false,
            win_pos: 0,
            line_fault: None,
        }
    }

    #[inline]
    pub fn state(&self) -> &CalculatorState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut CalculatorState {
        &mut self.state
    }

    pub fn into_state(self) -> CalculatorState {
        self.state
    }

    #[inline]
    pub fn prgm_entry(&self) -> bool {
        self.prgm_entry
    }

    /// Process one keystroke. Pass the plain key code; a pending
    /// prefix is applied here. `-1` refreshes the display without
    /// doing anything else.
    pub fn press(&mut self, code: i32) -> DisplayUpdate {
        let key: u16 = if code == i32::from(KEY_F_SHIFT) || code == i32::from(KEY_G_SHIFT) {
            // a double shift just replaces the prefix
            code as u16
        } else if code < 0 {
            REFRESH
        } else {
            (code as u16).wrapping_add(self.prefix)
        };

        let mut out = DisplayUpdate {
            prgm_annunciator: self.prgm_entry,
            ..DisplayUpdate::default()
        };

        match self.dispatch(key, &mut out) {
            Flow::Done => return out,
            Flow::Redispatch(next) => return self.press(i32::from(next)),
            Flow::Tail => {}
        }

        // Keys that are neither operands nor staged commands silently
        // abandon an incomplete stage.
        if !self.stage.is_empty()
            && self.stage[0] != key
            && key != REFRESH
            && key > 15
            && key != KEY_DP
            && key != F_I
            && key != F_INDEX
        {
            out.beep = true;
            self.stage.clear();
        }

        self.prefix = 0;

        if !DO_NOT_RESET_WIN_POS.contains(&key) {
            self.win_pos = 0;
        }

        if self.prgm_entry {
            if self.state.prgm_memory().len() == PRGM_MEMORY_LINES {
                out.alternate_text = CalcError::ImproperLineNumber.to_string();
                self.state.prgm_memory_mut().pop();
                self.state.set_prgm_position(PRGM_MEMORY_LINES - 1);
                return out;
            }

            let pos = self.state.prgm_position();
            out.display_text = if pos > 0 {
                let line = &self.state.prgm_memory()[pos - 1];
                format!("{:03}- {}", pos, line.get(..8).unwrap_or(line.as_str()))
            } else {
                "000-".to_string()
            };
        } else {
            // almost every key terminates digit entry (the exceptions
            // edit the entry instead)
            if key != REFRESH && key > 15 && !TERMINATE_INPUT.contains(&key) {
                self.raw_display.clear();
            }

            if !self.raw_display.is_empty() {
                // a fresh entry lifts the old X deeper onto the stack;
                // a bare refresh re-renders the entry without lifting
                if (self.raw_display.len() == 1 || self.pad_decimal)
                    && !self.stack_disabled
                    && key != REFRESH
                {
                    let x = self.state.stack().x().clone();
                    self.state.stack_mut().push(x);
                }
                self.stack_disabled = false;
                self.pad_decimal = false;

                let raw = self.raw_display.clone();
                self.convert_input(&raw);

                // reject the digit that no longer fits the word size
                if self.state.stack().x().int_val().loss_of_precision()
                    || self.state.stack().x().float_val().is_infinite()
                {
                    self.raw_display.pop();
                    out.beep = true;
                    let raw = self.raw_display.clone();
                    self.convert_input(&raw);
                }

                if !self.state.prgm_running() {
                    let shown = display::string_right(&self.raw_display, 37);
                    out.display_text = match self.state.op_mode() {
                        OpMode::Float => shown,
                        OpMode::Hex => format!("{:>39}", format!("{} h", shown)),
                        OpMode::Dec => format!("{:>39}", format!("{} d", shown)),
                        OpMode::Oct => format!("{:>39}", format!("{} o", shown)),
                        OpMode::Bin => format!("{:>39}", format!("{} b", shown)),
                    };
                }
            } else if !self.state.prgm_running() {
                out.display_text = format_display(&self.state, self.state.op_mode(), self.win_pos);
            }
        }

        if out.alternate_text.is_empty() {
            if let Some(fault) = self.line_fault.take() {
                out.alternate_text = fault.to_string();
                out.delay_ms = SLEEP_DELAY_MS;
            }
        }

        out.carry_annunciator = self.state.flag(Flag::Carry);
        out.overflow_annunciator = self.state.flag(Flag::Overflow);
        out
    }

    /// Execute the program line at the current position by replaying
    /// its keystrokes, then advance past it. Returns true when the run
    /// must stop.
    pub fn run_line(&mut self) -> bool {
        let pos = self.state.prgm_position();
        if pos >= self.state.prgm_memory().len() {
            return true;
        }

        let line = self.state.prgm_memory()[pos].clone();
        let keys = match decode(&line) {
            Ok(keys) => keys,
            Err(err) => {
                // a hand-edited state file can hold lines the codec never
                // wrote; the line executes as a no-op and the run stops
                tracing::warn!(line = %line, %err, "unreadable program line");
                self.line_fault = Some(CalcError::ImproperProgramLine);
                self.state.set_prgm_running(false);
                return true;
            }
        };

        for key in keys {
            let update = self.press(i32::from(key));
            if update.alternate_text.starts_with("Error") {
                tracing::debug!(line = %line, message = %update.alternate_text, "program stopped");
                self.state.set_prgm_running(false);
                return true;
            }
        }

        // jumps and skips already moved the position; the uniform
        // advance still applies, landing just past a label or skipping
        // the line after a false conditional
        self.state.set_prgm_position(self.state.prgm_position() + 1);
        false
    }

    /// Run the stored program from the current position until it
    /// stops, then refresh the display.
    pub fn run_program(&mut self) -> DisplayUpdate {
        while self.state.prgm_position() < self.state.prgm_memory().len() {
            if self.run_line() {
                break;
            }
            if !self.state.prgm_running() {
                break;
            }
        }
        self.state.set_prgm_running(false);
        self.press(-1)
    }

    fn dispatch(&mut self, key: u16, out: &mut DisplayUpdate) -> Flow {
        match key {
            digit @ KEY_0..=KEY_F => self.press_digit(digit, out),

            KEY_DIV | KEY_MUL | KEY_SUB | KEY_ADD => self.arithmetic(key, out),

            KEY_GSB => {
                if self.stage.is_empty() {
                    self.stage.push(KEY_GSB);
                    return Flow::Tail;
                }
                let val = self.stage.pop().unwrap_or(KEY_GSB);
                self.stage.clear();

                if self.prgm_entry {
                    self.record(encode_two(KEY_GSB, val, &format!("GSB {:X}", val)));
                    return Flow::Tail;
                }

                self.stack_disabled = false;
                if self.state.prgm_memory().is_empty() {
                    return self.raise(out, CalcError::ImproperLabel);
                }
                let start = match self.find_label(self.state.prgm_position(), val) {
                    Some(line) => line,
                    None => return self.raise(out, CalcError::ImproperLabel),
                };
                self.state.ret_stack_push(self.state.prgm_position());
                self.state.set_prgm_position(start);
                if !self.state.prgm_running() {
                    self.state.set_prgm_running(true);
                    self.state.ret_stack_clear();
                    out.alternate_text = "Running".to_string();
                    out.start = Some(Start::RunProgram);
                }
                Flow::Tail
            }

            KEY_GTO => {
                if self.stage.is_empty() {
                    self.stage.push(KEY_GTO);
                    return Flow::Tail;
                }

                // the editing form is GTO . d d d, a jump to a line
                // number rather than a label
                if self.stage.len() >= 2 && self.stage[1] == KEY_DP {
                    if self.stage.len() < 5 {
                        return Flow::Tail;
                    }
                    let d3 = self.stage.pop().unwrap_or(0);
                    let d2 = self.stage.pop().unwrap_or(0);
                    let d1 = self.stage.pop().unwrap_or(0);
                    self.stage.clear();
                    if d1 > 9 || d2 > 9 || d3 > 9 {
                        return self.raise(out, CalcError::ImproperGtoNumber);
                    }
                    let line = (d1 as usize) * 100 + (d2 as usize) * 10 + d3 as usize;
                    if line > self.state.prgm_memory().len() {
                        return self.raise(out, CalcError::ImproperLineNumber);
                    }
                    self.state.set_prgm_position(line);
                    return Flow::Tail;
                }

                let val = self.stage.pop().unwrap_or(KEY_GTO);
                self.stage.clear();

                if self.prgm_entry {
                    self.record(encode_two(KEY_GTO, val, &format!("GTO {:X}", val)));
                    return Flow::Tail;
                }
                match self.find_label(self.state.prgm_position(), val) {
                    Some(line) => self.state.set_prgm_position(line),
                    None => {
                        self.state.set_prgm_running(false);
                        return self.raise_prefix(out, CalcError::ImproperLabel);
                    }
                }
                Flow::Tail
            }

            KEY_HEX | KEY_DEC | KEY_OCT | KEY_BIN => {
                if self.prgm_entry {
                    let comment = match key {
                        KEY_HEX => "HEX",
                        KEY_DEC => "DEC",
                        KEY_OCT => "OCT",
                        _ => "BIN",
                    };
                    self.record(encode_one(key, Some(comment)));
                }
                // even while recording, the mode switch itself happens
                if self.state.op_mode() == OpMode::Float {
                    self.state.sync_values();
                }
                let mode = match key {
                    KEY_HEX => OpMode::Hex,
                    KEY_DEC => OpMode::Dec,
                    KEY_OCT => OpMode::Oct,
                    _ => OpMode::Bin,
                };
                self.state.set_op_mode(mode);
                out.menu_refresh = true;
                Flow::Tail
            }

            KEY_RS => {
                // operand shortcut: STO R/S acts like STO f (i)
                if self.stage.len() == 1 && SHORTCUT_ALLOWED.contains(&self.stage[0]) {
                    self.stage.push(F_INDEX);
                    return Flow::Redispatch(self.stage[0]);
                }
                if self.prgm_entry {
                    self.record(encode_one(KEY_RS, Some("R/S")));
                } else if !self.state.prgm_memory().is_empty() {
                    if self.state.prgm_running() {
                        self.state.set_prgm_running(false);
                    } else {
                        self.state.set_prgm_running(true);
                        out.alternate_text = "Running".to_string();
                        out.start = Some(Start::RunProgram);
                    }
                }
                Flow::Tail
            }

            KEY_SST => {
                // operand shortcut: STO SST acts like STO f I
                if self.stage.len() == 1 && SHORTCUT_ALLOWED.contains(&self.stage[0]) {
                    self.stage.push(F_I);
                    return Flow::Redispatch(self.stage[0]);
                }
                if self.prgm_entry {
                    let pos = self.state.prgm_position() + 1;
                    self.state.set_prgm_position(
                        if pos > self.state.prgm_memory().len() { 0 } else { pos },
                    );
                } else if !self.state.prgm_memory().is_empty() {
                    if self.state.prgm_position() >= self.state.prgm_memory().len() {
                        self.state.set_prgm_position(0);
                    }
                    let pos = self.state.prgm_position();
                    let line = &self.state.prgm_memory()[pos];
                    out.alternate_text =
                        format!("{:03}- {}", pos + 1, line.get(..8).unwrap_or(line.as_str()));
                    out.delay_ms = SLEEP_DELAY_MS / 2;
                    out.start = Some(Start::RunLine);
                }
                Flow::Tail
            }

            KEY_ROLL => {
                if self.prgm_entry {
                    self.record(encode_one(KEY_ROLL, Some("Rv")));
                } else {
                    self.state.stack_mut().roll_down();
                    self.stack_disabled = false;
                }
                Flow::Tail
            }

            KEY_XY => {
                if self.prgm_entry {
                    self.record(encode_one(KEY_XY, Some("X:Y")));
                } else {
                    self.state.stack_mut().swap_xy();
                    self.stack_disabled = false;
                }
                Flow::Tail
            }

            KEY_BSP => {
                if self.prgm_entry {
                    if self.state.prgm_position() > 0 {
                        let pos = self.state.prgm_position();
                        self.state.prgm_memory_mut().remove(pos - 1);
                        self.state.set_prgm_position(pos - 1);
                    }
                } else if self.raw_display.is_empty() {
                    // entry already terminated, act like CLx
                    let reg = self.new_register();
                    self.state.stack_mut().set_x(reg);
                    self.stack_disabled = true;
                } else {
                    self.raw_display.pop();
                    if self.raw_display.is_empty() {
                        let reg = self.new_register();
                        self.state.stack_mut().set_x(reg);
                    }

                    // never leave an unparseable scientific-notation tail
                    let temp = self.raw_display.clone();
                    if temp.ends_with('e') {
                        self.raw_display.pop();
                    } else if temp.ends_with("e-") {
                        let len = self.raw_display.len();
                        self.raw_display.truncate(len - 2);
                    }
                    if temp == "-" {
                        self.raw_display.clear();
                        let reg = self.new_register();
                        self.state.stack_mut().set_x(reg);
                    }

                    // a single remaining digit is not a new entry
                    if self.raw_display.len() == 1 {
                        self.stack_disabled = true;
                    }
                }
                Flow::Tail
            }

            KEY_ENTER => {
                if self.prgm_entry {
                    self.record(encode_one(KEY_ENTER, Some("Enter")));
                } else {
                    let x = self.state.stack().x().clone();
                    self.state.stack_mut().push(x);
                    self.stack_disabled = true;
                }
                Flow::Tail
            }

            KEY_ON => Flow::Tail,

            KEY_F_SHIFT => {
                self.prefix = PREFIX_F;
                out.f_annunciator = true;
                Flow::Done
            }

            KEY_G_SHIFT => {
                self.prefix = PREFIX_G;
                out.g_annunciator = true;
                Flow::Done
            }

            KEY_STO | KEY_RCL => self.store_recall(key, out),

            KEY_DP => {
                if !self.stage.is_empty() {
                    if DP_NOT_ALLOWED.contains(&self.stage[0]) {
                        // silently drop the stage and treat the key as
                        // an ordinary decimal point
                        self.stage.clear();
                    } else {
                        self.stage.push(KEY_DP);
                        return Flow::Redispatch(self.stage[0]);
                    }
                }
                if self.state.op_mode() != OpMode::Float {
                    out.beep = true;
                    return Flow::Tail;
                }
                if self.prgm_entry {
                    self.record(encode_one(KEY_DP, Some(".")));
                } else if self.raw_display.is_empty() {
                    self.raw_display.push_str("0.");
                    self.pad_decimal = true;
                } else if !self.raw_display.contains('.') {
                    self.raw_display.push('.');
                }
                Flow::Tail
            }

            KEY_CHS => {
                if self.prgm_entry {
                    self.record(encode_one(KEY_CHS, Some("CHS")));
                    return Flow::Tail;
                }
                // integer digit entry restarts on CHS
                if !self.raw_display.is_empty() && self.state.op_mode() != OpMode::Float {
                    self.raw_display.clear();
                }
                if !self.raw_display.is_empty() {
                    let t = std::mem::take(&mut self.raw_display);
                    if t.contains('e') {
                        // with an exponent showing, only its sign flips
                        if t.contains("e-") {
                            self.raw_display = t.replace("e-", "e");
                        } else {
                            self.raw_display = t.replace('e', "e-");
                        }
                    } else if let Some(rest) = t.strip_prefix('-') {
                        self.raw_display = rest.to_string();
                    } else {
                        self.raw_display = format!("-{}", t);
                    }
                } else {
                    if self.state.op_mode() == OpMode::Float {
                        let x = self.state.stack().x().float_val();
                        self.state.stack_mut().x_mut().set_float_val(-x);
                    } else {
                        self.save_last_x();
                        self.state.stack_mut().x_mut().int_val_mut().change_sign();
                        let overflow = self.state.stack().x().int_val().overflow();
                        self.state.set_flag(Flag::Overflow, overflow);
                    }
                    self.stack_disabled = false;
                }
                Flow::Tail
            }

            F_SL | F_SR | F_RL | F_RR | G_ASR | G_RLC | G_RRC => self.shift_one(key, out),

            F_RLN | F_RRN | G_RLCN | G_RRCN => self.rotate_n(key, out),

            F_MASKL | F_MASKR => {
                if self.state.op_mode() == OpMode::Float {
                    out.beep = true;
                    return Flow::Tail;
                }
                let comment = if key == F_MASKL { "f MASKL" } else { "f MASKR" };
                if self.prgm_entry {
                    self.record(encode_two(KEY_F_SHIFT, key - PREFIX_F, comment));
                    return Flow::Tail;
                }
                self.save_last_x();
                self.stack_disabled = false;
                let mut temp = self.new_register();
                let val = self.pop_bit_count();
                if val > self.state.word_size() {
                    return self.raise_prefix(out, CalcError::ImproperBitNumber);
                }
                let size = self.state.word_size();
                temp.set_int_val(BigNum::create_mask(val, key == F_MASKL, size));
                self.state.stack_mut().push(temp);
                Flow::Tail
            }

            F_RMD => {
                if self.state.op_mode() == OpMode::Float {
                    out.beep = true;
                    return Flow::Tail;
                }
                if self.prgm_entry {
                    self.record(encode_two(KEY_F_SHIFT, key - PREFIX_F, "f RMD"));
                    return Flow::Tail;
                }
                self.save_last_x();
                self.stack_disabled = false;
                if self.state.stack().x().int_val().is_zero() {
                    return self.raise_prefix(out, CalcError::ImproperMathOperation);
                }
                let size = self.state.word_size();
                let y = self.state.stack_mut().pop();
                let x = self.state.stack_mut().pop();
                let mut temp = self.new_register();
                temp.set_int_val(x.int_val().remainder(y.int_val(), size));
                self.state.stack_mut().push(temp);
                Flow::Tail
            }

            F_XOR | F_AND | F_OR => {
                if self.state.op_mode() == OpMode::Float {
                    out.beep = true;
                    return Flow::Tail;
                }
                let comment = match key {
                    F_XOR => "f XOR",
                    F_AND => "f AND",
                    _ => "f OR",
                };
                if self.prgm_entry {
                    self.record(encode_two(KEY_F_SHIFT, key - PREFIX_F, comment));
                    return Flow::Tail;
                }
                self.save_last_x();
                self.stack_disabled = false;
                let size = self.state.word_size();
                let y = self.state.stack_mut().pop();
                let x = self.state.stack_mut().pop();
                let mut temp = self.new_register();
                let value = match key {
                    F_XOR => x.int_val().bit_xor(y.int_val(), size),
                    F_AND => x.int_val().bit_and(y.int_val(), size),
                    _ => x.int_val().bit_or(y.int_val(), size),
                };
                temp.set_int_val(value);
                self.state.stack_mut().push(temp);
                Flow::Tail
            }

            F_X_INDIRECT => {
                if self.prgm_entry {
                    self.record(encode_two(KEY_F_SHIFT, key - PREFIX_F, "f X:(i)"));
                    return Flow::Tail;
                }
                let val = self.index_register_value();
                self.stack_disabled = false;
                if val >= NUM_REGISTERS {
                    return self.raise_prefix(out, CalcError::ImproperRegisterNumber);
                }
                let temp = self.state.reg(val).clone();
                let x = self.state.stack().x().clone();
                self.state.set_reg(val, x);
                self.state.stack_mut().set_x(temp);
                Flow::Tail
            }

            F_X_I => {
                if self.prgm_entry {
                    self.record(encode_two(KEY_F_SHIFT, key - PREFIX_F, "f X:I"));
                    return Flow::Tail;
                }
                let mut temp = self.state.reg_index().clone();
                temp.set_word_size(self.state.word_size());
                let mut x = self.state.stack().x().clone();
                x.set_word_size(INDEX_WORD_SIZE);
                self.state.set_reg_index(x);
                self.state.stack_mut().set_x(temp);
                self.stack_disabled = false;
                Flow::Tail
            }

            F_SHOW_HEX | F_SHOW_DEC | F_SHOW_OCT | F_SHOW_BIN => {
                if self.state.sync_conversions() {
                    if self.state.op_mode() == OpMode::Float {
                        self.state.sync_values();
                    }
                } else if self.state.op_mode() == OpMode::Float {
                    out.beep = true;
                    return Flow::Tail;
                }
                let (target, comment) = match key {
                    F_SHOW_HEX => (OpMode::Hex, "f ShowHEX"),
                    F_SHOW_DEC => (OpMode::Dec, "f ShowDEC"),
                    F_SHOW_OCT => (OpMode::Oct, "f ShowOCT"),
                    _ => (OpMode::Bin, "f ShowBIN"),
                };
                if self.prgm_entry {
                    self.record(encode_two(KEY_F_SHIFT, key - PREFIX_F, comment));
                    return Flow::Tail;
                }
                self.prefix = 0;
                out.alternate_text = format_display(&self.state, target, 0);
                out.delay_ms = SLEEP_DELAY_MS;
                Flow::Done
            }

            F_SB | F_CB | F_B_TEST => {
                if self.state.op_mode() == OpMode::Float {
                    out.beep = true;
                    return Flow::Tail;
                }
                let comment = match key {
                    F_SB => "f SB",
                    F_CB => "f CB",
                    _ => "f B?",
                };
                if self.prgm_entry {
                    self.record(encode_two(KEY_F_SHIFT, key - PREFIX_F, comment));
                    return Flow::Tail;
                }
                self.save_last_x();
                self.stack_disabled = false;
                let val = self.pop_bit_count();
                if val >= self.state.word_size() {
                    return self.raise_prefix(out, CalcError::ImproperBitNumber);
                }
                match key {
                    F_SB => self.state.stack_mut().x_mut().int_val_mut().bit_set(val),
                    F_CB => self.state.stack_mut().x_mut().int_val_mut().bit_clear(val),
                    _ => {
                        if !self.state.stack().x().int_val().bit_test(val) {
                            self.skip_line();
                        }
                    }
                }
                Flow::Tail
            }

            F_INDEX | F_I => {
                // a bare I or (i) acts as if RCL had been staged
                if self.stage.is_empty() {
                    self.stage.push(KEY_RCL);
                }
                self.stage.push(key);
                self.prefix = 0;
                Flow::Redispatch(self.stage[0])
            }

            F_CLEAR_PRGM => {
                if self.prgm_entry {
                    self.state.prgm_memory_mut().clear();
                    self.state.ret_stack_clear();
                }
                self.stack_disabled = false;
                self.state.set_prgm_position(0);
                Flow::Tail
            }

            F_CLEAR_REG => {
                if self.prgm_entry {
                    self.record(encode_two(KEY_F_SHIFT, key - PREFIX_F, "f ClearREG"));
                } else {
                    let reg = self.new_register();
                    for i in 0..NUM_REGISTERS {
                        self.state.set_reg(i, reg.clone());
                    }
                    self.state
                        .set_reg_index(Register::new(INDEX_WORD_SIZE, self.state.arith_mode()));
                }
                Flow::Tail
            }

            F_CLEAR_PREFIX => {
                self.prefix = 0;
                self.stage.clear();
                Flow::Tail
            }

            F_WINDOW => {
                let mut val = match self.staged_operand(F_WINDOW) {
                    Some(val) => val,
                    None => return Flow::Tail,
                };
                if val > 7 {
                    self.stage.clear();
                    return self.raise_prefix(out, CalcError::ImproperWindowNumber);
                }
                self.stage.clear();
                // the display fits 35 bits, so only two windows exist
                if val > 1 {
                    val = 1;
                }
                if self.prgm_entry {
                    self.record(encode_three(
                        KEY_F_SHIFT,
                        KEY_ENTER,
                        val,
                        &format!("f WINDOW {}", val),
                    ));
                }
                if self.state.op_mode() == OpMode::Bin && self.state.word_size() > 32 {
                    self.win_pos = val as usize * 36;
                }
                Flow::Tail
            }

            F_SET_1S | F_SET_2S | F_SET_UNSGN => {
                let (mode, comment) = match key {
                    F_SET_1S => (ArithMode::OnesComplement, "f Set1's"),
                    F_SET_2S => (ArithMode::TwosComplement, "f Set2's"),
                    _ => (ArithMode::Unsigned, "f SetUNSGN"),
                };
                if self.prgm_entry {
                    self.record(encode_two(KEY_F_SHIFT, key - PREFIX_F, comment));
                } else {
                    self.state.set_arith_mode(mode);
                }
                Flow::Tail
            }

            F_NOT => {
                if self.state.op_mode() == OpMode::Float {
                    out.beep = true;
                    return Flow::Tail;
                }
                if self.prgm_entry {
                    self.record(encode_two(KEY_F_SHIFT, key - PREFIX_F, "f NOT"));
                } else {
                    self.save_last_x();
                    self.stack_disabled = false;
                    let size = self.state.word_size();
                    self.state.stack_mut().x_mut().int_val_mut().complement(size);
                }
                Flow::Tail
            }

            F_WSIZE => {
                if self.state.op_mode() == OpMode::Float {
                    out.beep = true;
                    return Flow::Tail;
                }
                if self.prgm_entry {
                    self.record(encode_two(KEY_F_SHIFT, key - PREFIX_F, "f WSIZE"));
                    return Flow::Tail;
                }
                self.save_last_x();
                self.stack_disabled = false;
                let mut val = self.pop_bit_count();
                // zero selects the full 64 bits, the escape hatch when
                // the current size can not express the new one
                if val == 0 {
                    val = 64;
                }
                if val > 64 {
                    return self.raise_prefix(out, CalcError::ImproperBitNumber);
                }
                self.state.set_word_size(val);
                Flow::Tail
            }

            F_FLOAT => {
                let val = match self.staged_operand(F_FLOAT) {
                    Some(val) => val,
                    None => return Flow::Tail,
                };
                if val != KEY_DP && val > 9 {
                    self.stage.clear();
                    return self.raise_prefix(out, CalcError::ImproperFloatNumber);
                }
                self.stage.clear();
                if self.prgm_entry {
                    self.record(encode_three(
                        KEY_F_SHIFT,
                        KEY_RCL,
                        val,
                        &format!("f FLOAT {}", val),
                    ));
                    return Flow::Tail;
                }
                if self.state.op_mode() != OpMode::Float {
                    // switching into float clears LastX and both flags
                    self.state.set_last_x(self.new_register());
                    self.state.sync_values();
                    self.state.set_flag(Flag::Carry, false);
                    self.state.set_flag(Flag::Overflow, false);
                    out.menu_refresh = true;
                } else {
                    self.stack_disabled = false;
                }
                self.state.set_op_mode(OpMode::Float);
                self.state.set_float_precision(if val == KEY_DP {
                    None
                } else {
                    Some(val as u8)
                });
                Flow::Tail
            }

            F_MEM => {
                out.alternate_text = format!("P-{:03} R-{:03}", PRGM_MEMORY_LINES, NUM_REGISTERS);
                out.delay_ms = SLEEP_DELAY_MS;
                self.prefix = 0;
                Flow::Done
            }

            F_STATUS => {
                let mut flag_val: u32 = 0;
                for i in 0..=3 {
                    if let Some(flag) = Flag::from_index(i) {
                        if self.state.flag(flag) {
                            flag_val += 10u32.pow(i as u32);
                        }
                    }
                }
                out.alternate_text = format!(
                    "{}-{:02}-{:04}",
                    self.state.arith_mode().index(),
                    self.state.word_size(),
                    flag_val
                );
                out.delay_ms = SLEEP_DELAY_MS;
                self.prefix = 0;
                Flow::Done
            }

            F_EEX => {
                if self.state.op_mode() != OpMode::Float {
                    out.beep = true;
                    return Flow::Tail;
                }
                if self.prgm_entry {
                    self.record(encode_two(KEY_F_SHIFT, key - PREFIX_F, "f EEX"));
                } else {
                    // an exponent with no mantissa means 1
                    if self.raw_display.is_empty() {
                        self.raw_display.push('1');
                    }
                    self.raw_display.push('e');
                }
                Flow::Tail
            }

            G_LJ => {
                if self.state.op_mode() == OpMode::Float {
                    out.beep = true;
                    return Flow::Tail;
                }
                if self.prgm_entry {
                    self.record(encode_two(KEY_G_SHIFT, key - PREFIX_G, "g LJ"));
                    return Flow::Tail;
                }
                self.save_last_x();
                self.stack_disabled = false;
                let popped = self.state.stack_mut().pop();
                let (justified, distance) = popped.int_val().left_justify();
                let mut x = self.new_register();
                let mut y = self.new_register();
                x.set_int_val(justified);
                y.set_int_val(distance);
                self.state.stack_mut().push(x);
                self.state.stack_mut().push(y);
                Flow::Tail
            }

            G_NUM_B => {
                if self.state.op_mode() == OpMode::Float {
                    out.beep = true;
                    return Flow::Tail;
                }
                if self.prgm_entry {
                    self.record(encode_two(KEY_G_SHIFT, key - PREFIX_G, "g #B"));
                } else {
                    self.save_last_x();
                    self.stack_disabled = false;
                    self.state.stack_mut().x_mut().int_val_mut().sum_bits();
                }
                Flow::Tail
            }

            G_ABS => {
                if self.prgm_entry {
                    self.record(encode_two(KEY_G_SHIFT, key - PREFIX_G, "g ABS"));
                } else {
                    self.save_last_x();
                    self.stack_disabled = false;
                    if self.state.op_mode() == OpMode::Float {
                        let x = self.state.stack().x().float_val();
                        self.state.stack_mut().x_mut().set_float_val(x.abs());
                    } else {
                        self.state
                            .stack_mut()
                            .x_mut()
                            .int_val_mut()
                            .absolute_value();
                        let carry = self.state.stack().x().int_val().carry();
                        self.state.set_flag(Flag::Carry, carry);
                    }
                }
                Flow::Tail
            }

            G_DBLR => {
                if self.state.op_mode() == OpMode::Float {
                    out.beep = true;
                    return Flow::Tail;
                }
                if self.prgm_entry {
                    self.record(encode_two(KEY_G_SHIFT, key - PREFIX_G, "g DBLR"));
                    return Flow::Tail;
                }
                self.save_last_x();
                self.stack_disabled = false;
                if self.state.stack().x().int_val().is_zero() {
                    return self.raise_prefix(out, CalcError::ImproperMathOperation);
                }
                let size = self.state.word_size();
                let x = self.state.stack_mut().pop();
                let y = self.state.stack_mut().pop();
                let z = self.state.stack_mut().pop();
                let combined = BigNum::combine(y.int_val(), z.int_val())
                    .unwrap_or_else(|_| BigNum::new(size * 2, self.state.arith_mode()));
                let mut rem = combined.remainder(x.int_val(), size * 2);
                if rem.overflow() {
                    return self.raise_prefix(out, CalcError::ImproperMathOperation);
                }
                rem.set_word_size(size);
                let mut temp = self.new_register();
                temp.set_int_val(rem);
                self.state.stack_mut().push(temp);
                Flow::Tail
            }

            G_DBL_DIV => {
                if self.state.op_mode() == OpMode::Float {
                    out.beep = true;
                    return Flow::Tail;
                }
                if self.prgm_entry {
                    self.record(encode_two(KEY_G_SHIFT, key - PREFIX_G, "g DBL/"));
                    return Flow::Tail;
                }
                self.save_last_x();
                self.stack_disabled = false;
                if self.state.stack().x().int_val().is_zero() {
                    return self.raise_prefix(out, CalcError::ImproperMathOperation);
                }
                let size = self.state.word_size();
                let x = self.state.stack_mut().pop();
                let y = self.state.stack_mut().pop();
                let z = self.state.stack_mut().pop();
                let combined = BigNum::combine(y.int_val(), z.int_val())
                    .unwrap_or_else(|_| BigNum::new(size * 2, self.state.arith_mode()));
                let quotient = combined.divide(x.int_val(), size * 2);

                // the quotient must fit a single word
                let mut narrowed = quotient.clone();
                narrowed.set_word_size(size);
                let mut widened = narrowed.clone();
                widened.set_word_size(size * 2);
                if widened != quotient {
                    return self.raise_prefix(out, CalcError::ImproperMathOperation);
                }

                let mut temp = self.new_register();
                temp.set_int_val(narrowed);
                self.state.stack_mut().push(temp);
                self.state.set_flag(Flag::Carry, quotient.carry());
                // double division never overflows a double-wide word
                self.state.set_flag(Flag::Overflow, false);
                Flow::Tail
            }

            G_DBL_MUL => {
                if self.state.op_mode() == OpMode::Float {
                    out.beep = true;
                    return Flow::Tail;
                }
                if self.prgm_entry {
                    self.record(encode_two(KEY_G_SHIFT, key - PREFIX_G, "g DBL*"));
                    return Flow::Tail;
                }
                self.save_last_x();
                self.stack_disabled = false;
                let size = self.state.word_size();
                let mut wide = self.state.stack_mut().pop().int_val().clone();
                wide.set_word_size(size * 2);
                let other = self.state.stack_mut().pop();
                let product = wide.multiply(other.int_val(), size * 2);
                match product.split() {
                    Ok((low, high)) => {
                        let mut x = self.new_register();
                        let mut y = self.new_register();
                        x.set_int_val(low);
                        y.set_int_val(high);
                        self.state.stack_mut().push(x);
                        self.state.stack_mut().push(y);
                    }
                    Err(err) => {
                        tracing::debug!(%err, "double-width product did not split");
                    }
                }
                self.state.set_flag(Flag::Overflow, false);
                Flow::Tail
            }

            G_RTN => {
                if self.prgm_entry {
                    self.record(encode_two(KEY_G_SHIFT, key - PREFIX_G, "g RTN"));
                } else {
                    match self.state.ret_stack_pop() {
                        // an empty return also means stop
                        None => self.state.set_prgm_running(false),
                        Some(pos) => self.state.set_prgm_position(pos),
                    }
                }
                Flow::Tail
            }

            G_LBL => {
                let val = match self.staged_operand(G_LBL) {
                    Some(val) => val,
                    None => return Flow::Tail,
                };
                self.stage.clear();
                if self.prgm_entry {
                    self.record(encode_three(
                        KEY_G_SHIFT,
                        KEY_GTO,
                        val,
                        &format!("g LBL {:X}", val),
                    ));
                }
                Flow::Tail
            }

            G_DSZ | G_ISZ => {
                let comment = if key == G_DSZ { "g DSZ" } else { "g ISZ" };
                if self.prgm_entry {
                    self.record(encode_two(KEY_G_SHIFT, key - PREFIX_G, comment));
                    return Flow::Tail;
                }
                if self.state.op_mode() == OpMode::Float {
                    let step = if key == G_DSZ { -1.0 } else { 1.0 };
                    let value = self.state.reg_index().float_val() + step;
                    self.state.reg_index_mut().set_float_val(value);
                    if value == 0.0 {
                        self.skip_line();
                    }
                } else {
                    let size = self.state.word_size();
                    let one = BigNum::one(size);
                    let value = if key == G_DSZ {
                        self.state.reg_index().int_val().subtract(&one, size)
                    } else {
                        self.state.reg_index().int_val().add(&one, size)
                    };
                    let zero = value.is_zero();
                    self.state.reg_index_mut().set_int_val(value);
                    if zero {
                        self.skip_line();
                    }
                }
                Flow::Tail
            }

            G_SQRT => {
                if self.prgm_entry {
                    self.record(encode_two(KEY_G_SHIFT, key - PREFIX_G, "g Sqrt"));
                    return Flow::Tail;
                }
                self.save_last_x();
                self.stack_disabled = false;
                if self.state.op_mode() == OpMode::Float {
                    let x = self.state.stack().x().float_val();
                    if x <= 0.0 {
                        return self.raise_prefix(out, CalcError::ImproperMathOperation);
                    }
                    self.state.stack_mut().x_mut().set_float_val(x.sqrt());
                } else {
                    let size = self.state.word_size();
                    let zero = BigNum::new(size, self.state.arith_mode());
                    if self.state.stack().x().int_val().compare(&zero) != std::cmp::Ordering::Greater
                    {
                        return self.raise_prefix(out, CalcError::ImproperMathOperation);
                    }
                    let root = self.state.stack().x().int_val().square_root(size);
                    self.state.set_flag(Flag::Carry, root.carry());
                    self.state.stack_mut().x_mut().set_int_val(root);
                }
                Flow::Tail
            }

            G_INV => {
                if self.state.op_mode() != OpMode::Float {
                    out.beep = true;
                    return Flow::Tail;
                }
                if self.prgm_entry {
                    self.record(encode_two(KEY_G_SHIFT, key - PREFIX_G, "g 1/x"));
                    return Flow::Tail;
                }
                self.save_last_x();
                self.stack_disabled = false;
                let x = self.state.stack().x().float_val();
                if x == 0.0 {
                    return self.raise_prefix(out, CalcError::ImproperMathOperation);
                }
                self.state.stack_mut().x_mut().set_float_val(1.0 / x);
                Flow::Tail
            }

            G_SF | G_CF => {
                if self.stage.is_empty() {
                    self.stage.push(key);
                    return Flow::Tail;
                }
                if self.stage[0] != key {
                    self.stage.clear();
                    self.stage.push(key);
                    return Flow::Tail;
                }
                self.stack_disabled = false;
                let val = self.stage.pop().unwrap_or(key);
                if val > 5 {
                    self.stage.clear();
                    return self.raise_prefix(out, CalcError::ImproperFlagNumber);
                }
                self.stage.clear();
                let set = key == G_SF;
                let comment = if set { "g SF" } else { "g CF" };
                if self.prgm_entry {
                    self.record(encode_three(
                        KEY_G_SHIFT,
                        key - PREFIX_G,
                        val,
                        &format!("{} {}", comment, val),
                    ));
                } else if let Some(flag) = Flag::from_index(val as usize) {
                    self.state.set_flag(flag, set);
                }
                Flow::Tail
            }

            G_F_TEST => {
                let val = match self.staged_operand(G_F_TEST) {
                    Some(val) => val,
                    None => return Flow::Tail,
                };
                if val > 5 {
                    self.stage.clear();
                    return self.raise_prefix(out, CalcError::ImproperFlagNumber);
                }
                self.stage.clear();
                if self.prgm_entry {
                    self.record(encode_three(
                        KEY_G_SHIFT,
                        key - PREFIX_G,
                        val,
                        &format!("g F? {}", val),
                    ));
                } else if let Some(flag) = Flag::from_index(val as usize) {
                    if !self.state.flag(flag) {
                        self.skip_line();
                    }
                }
                Flow::Tail
            }

            G_PR => {
                self.prgm_entry = !self.prgm_entry;
                out.prgm_annunciator = self.prgm_entry;
                out.menu_refresh = true;
                Flow::Tail
            }

            G_BST => {
                if self.state.prgm_position() > 0 {
                    self.state.set_prgm_position(self.state.prgm_position() - 1);
                } else {
                    self.state.set_prgm_position(self.state.prgm_memory().len());
                }
                Flow::Tail
            }

            G_ROLL_UP => {
                if self.prgm_entry {
                    self.record(encode_two(KEY_G_SHIFT, key - PREFIX_G, "g R^"));
                } else {
                    self.state.stack_mut().roll_up();
                    self.stack_disabled = false;
                }
                Flow::Tail
            }

            G_PSE => {
                if self.prgm_entry {
                    self.record(encode_two(KEY_G_SHIFT, key - PREFIX_G, "g PSE"));
                } else {
                    out.display_text = format_display(&self.state, self.state.op_mode(), 0);
                    out.delay_ms = SLEEP_DELAY_MS;
                }
                Flow::Tail
            }

            G_CLX => {
                if self.prgm_entry {
                    self.record(encode_two(KEY_G_SHIFT, key - PREFIX_G, "g CLx"));
                } else {
                    let reg = self.new_register();
                    self.state.stack_mut().set_x(reg);
                    self.stack_disabled = true;
                }
                Flow::Tail
            }

            G_LSTX => {
                if self.prgm_entry {
                    self.record(encode_two(KEY_G_SHIFT, key - PREFIX_G, "g LSTx"));
                } else {
                    let last = self.state.last_x().clone();
                    self.state.stack_mut().set_x(last);
                    self.stack_disabled = false;
                }
                Flow::Tail
            }

            G_X_LE_Y | G_X_LT_0 | G_X_GT_Y | G_X_GT_0 | G_X_NE_Y | G_X_NE_0 | G_X_EQ_Y
            | G_X_EQ_0 => self.conditional(key),

            G_WIN_LEFT | G_WIN_RIGHT => {
                if self.state.op_mode() == OpMode::Float {
                    out.beep = true;
                    return Flow::Tail;
                }
                let comment = if key == G_WIN_LEFT { "g <" } else { "g >" };
                if self.prgm_entry {
                    self.record(encode_two(KEY_G_SHIFT, key - PREFIX_G, comment));
                } else if self.state.op_mode() == OpMode::Bin && self.state.word_size() > 32 {
                    if key == G_WIN_LEFT {
                        self.win_pos = self.win_pos.saturating_sub(1);
                    } else {
                        let len = self.state.stack().x().int_val().to_bin_string(true).len();
                        self.win_pos += 1;
                        if self.win_pos > len - 35 {
                            self.win_pos = len - 35;
                        }
                    }
                }
                Flow::Tail
            }

            _ => Flow::Tail,
        }
    }

    fn press_digit(&mut self, digit: u16, out: &mut DisplayUpdate) -> Flow {
        if !self.stage.is_empty() {
            self.stage.push(digit);
            return Flow::Redispatch(self.stage[0]);
        }

        // digits above the current base are dead keys
        let op = self.state.op_mode();
        let rejected = match digit {
            KEY_A..=KEY_F => op != OpMode::Hex,
            KEY_2..=KEY_7 => op.index() > OpMode::Oct.index(),
            KEY_8 | KEY_9 => op.index() > OpMode::Dec.index(),
            _ => false,
        };
        if rejected {
            out.beep = true;
            return Flow::Tail;
        }

        if self.prgm_entry {
            self.record(encode_one(digit, None));
        } else {
            self.raw_display.push(char::from(b"0123456789ABCDEF"[digit as usize]));
        }
        Flow::Tail
    }

    fn arithmetic(&mut self, key: u16, out: &mut DisplayUpdate) -> Flow {
        if self.prgm_entry {
            let comment = match key {
                KEY_ADD => "+",
                KEY_SUB => "-",
                KEY_MUL => "*",
                _ => "/",
            };
            self.record(encode_one(key, Some(comment)));
            return Flow::Tail;
        }

        let mut temp = self.new_register();
        self.save_last_x();
        self.stack_disabled = false;

        if self.state.op_mode() == OpMode::Float {
            if key == KEY_DIV && self.state.stack().x().float_val() == 0.0 {
                return self.raise(out, CalcError::ImproperMathOperation);
            }
            let y = self.state.stack_mut().pop().float_val();
            let x = self.state.stack_mut().pop().float_val();
            let value = match key {
                KEY_ADD => x + y,
                KEY_SUB => x - y,
                KEY_MUL => x * y,
                _ => x / y,
            };
            temp.set_float_val(value);
            self.state.set_flag(Flag::Overflow, value.is_infinite());
        } else {
            if key == KEY_DIV && self.state.stack().x().int_val().is_zero() {
                return self.raise(out, CalcError::ImproperMathOperation);
            }
            let size = self.state.word_size();
            let y = self.state.stack_mut().pop();
            let x = self.state.stack_mut().pop();
            let value = match key {
                KEY_ADD => x.int_val().add(y.int_val(), size),
                KEY_SUB => x.int_val().subtract(y.int_val(), size),
                KEY_MUL => x.int_val().multiply(y.int_val(), size),
                _ => x.int_val().divide(y.int_val(), size),
            };
            if key != KEY_MUL {
                self.state.set_flag(Flag::Carry, value.carry());
            }
            self.state.set_flag(Flag::Overflow, value.overflow());
            temp.set_int_val(value);
        }
        self.state.stack_mut().push(temp);
        Flow::Tail
    }

    /// The single-step shift and rotate family.
    fn shift_one(&mut self, key: u16, out: &mut DisplayUpdate) -> Flow {
        if self.state.op_mode() == OpMode::Float {
            out.beep = true;
            return Flow::Tail;
        }
        if self.prgm_entry {
            let (shift, base, comment) = match key {
                F_SL => (KEY_F_SHIFT, key - PREFIX_F, "f SL"),
                F_SR => (KEY_F_SHIFT, key - PREFIX_F, "f SR"),
                F_RL => (KEY_F_SHIFT, key - PREFIX_F, "f RL"),
                F_RR => (KEY_F_SHIFT, key - PREFIX_F, "f RR"),
                G_ASR => (KEY_G_SHIFT, key - PREFIX_G, "g ASR"),
                G_RLC => (KEY_G_SHIFT, key - PREFIX_G, "g RLC"),
                _ => (KEY_G_SHIFT, key - PREFIX_G, "g RRC"),
            };
            self.record(encode_two(shift, base, comment));
            return Flow::Tail;
        }

        self.save_last_x();
        self.stack_disabled = false;
        let size = self.state.word_size();
        let carry_in = self.state.flag(Flag::Carry);
        let x = self.state.stack_mut().x_mut().int_val_mut();
        match key {
            F_SL => x.shift_left(1, size),
            F_SR => x.shift_right(1, false, size),
            F_RL => x.rotate_left(1, false, false, size),
            F_RR => x.rotate_right(1, false, false, size),
            G_ASR => x.shift_right(1, true, size),
            G_RLC => x.rotate_left(1, true, carry_in, size),
            _ => x.rotate_right(1, true, carry_in, size),
        }
        let carry = self.state.stack().x().int_val().carry();
        self.state.set_flag(Flag::Carry, carry);
        Flow::Tail
    }

    /// The counted rotate family, taking the count from X.
    fn rotate_n(&mut self, key: u16, out: &mut DisplayUpdate) -> Flow {
        if self.state.op_mode() == OpMode::Float {
            out.beep = true;
            return Flow::Tail;
        }
        if self.prgm_entry {
            let (shift, base, comment) = match key {
                F_RLN => (KEY_F_SHIFT, key - PREFIX_F, "f RLn"),
                F_RRN => (KEY_F_SHIFT, key - PREFIX_F, "f RRn"),
                G_RLCN => (KEY_G_SHIFT, key - PREFIX_G, "g RLCn"),
                _ => (KEY_G_SHIFT, key - PREFIX_G, "g RRCn"),
            };
            self.record(encode_two(shift, base, comment));
            return Flow::Tail;
        }

        self.save_last_x();
        self.stack_disabled = false;
        let val = self.pop_bit_count();
        if val > self.state.word_size() {
            return self.raise_prefix(out, CalcError::ImproperBitNumber);
        }
        let size = self.state.word_size();
        let carry_in = self.state.flag(Flag::Carry);
        let x = self.state.stack_mut().x_mut().int_val_mut();
        match key {
            F_RLN => x.rotate_left(val, false, false, size),
            F_RRN => x.rotate_right(val, false, false, size),
            G_RLCN => x.rotate_left(val, true, carry_in, size),
            _ => x.rotate_right(val, true, carry_in, size),
        }
        let carry = self.state.stack().x().int_val().carry();
        self.state.set_flag(Flag::Carry, carry);
        Flow::Tail
    }

    fn store_recall(&mut self, key: u16, out: &mut DisplayUpdate) -> Flow {
        if self.stage.is_empty() {
            self.stage.push(key);
            return Flow::Tail;
        }
        if self.stage[0] != key {
            self.stage.clear();
            self.stage.push(key);
            return Flow::Tail;
        }
        // a trailing decimal point means a dot register, keep staging
        // until its digit arrives
        if self.stage.last() == Some(&KEY_DP) {
            return Flow::Tail;
        }

        let mut val = match self.stage.pop() {
            Some(val) => val,
            None => return Flow::Tail,
        };
        if val as usize >= NUM_REGISTERS && val != F_I && val != F_INDEX {
            self.stage.clear();
            return self.raise(out, CalcError::ImproperRegisterNumber);
        }
        if self.stage.pop() == Some(KEY_DP) {
            val += 16;
        }
        self.stage.clear();

        let name = if key == KEY_STO { "STO" } else { "RCL" };
        if self.prgm_entry {
            if val == F_I {
                self.record(encode_two(key, KEY_SST, &format!("{} I", name)));
            } else if val == F_INDEX {
                self.record(encode_two(key, KEY_RS, &format!("{} (i)", name)));
            } else if val >= 16 {
                self.record(encode_dot_register(
                    key,
                    val - 16,
                    &format!("{} .{:X}", name, val - 16),
                ));
            } else {
                self.record(encode_two(key, val, &format!("{} {:X}", name, val)));
            }
            return Flow::Tail;
        }

        if key == KEY_STO {
            self.stack_disabled = false;
            if val == F_I {
                let mut x = self.state.stack().x().clone();
                x.set_word_size(INDEX_WORD_SIZE);
                self.state.set_reg_index(x);
            } else if val == F_INDEX {
                let i = self.index_register_value();
                if i >= NUM_REGISTERS {
                    return self.raise(out, CalcError::ImproperRegisterNumber);
                }
                let x = self.state.stack().x().clone();
                self.state.set_reg(i, x);
            } else {
                let x = self.state.stack().x().clone();
                self.state.set_reg(val as usize, x);
            }
        } else {
            let temp = if val == F_I {
                self.state.reg_index().clone()
            } else if val == F_INDEX {
                let i = self.index_register_value();
                if i >= NUM_REGISTERS {
                    return self.raise(out, CalcError::ImproperRegisterNumber);
                }
                self.state.reg(i).clone()
            } else {
                self.state.reg(val as usize).clone()
            };
            if self.stack_disabled {
                self.state.stack_mut().set_x(temp);
                self.stack_disabled = false;
            } else {
                self.state.stack_mut().push(temp);
            }
        }
        Flow::Tail
    }

    fn conditional(&mut self, key: u16) -> Flow {
        let (base, comment) = match key {
            G_X_LE_Y => (KEY_1, "g X<Y"),
            G_X_LT_0 => (KEY_2, "g X<0"),
            G_X_GT_Y => (KEY_3, "g X>Y"),
            G_X_GT_0 => (KEY_SUB, "g X>0"),
            G_X_NE_Y => (KEY_0, "g X<>Y"),
            G_X_NE_0 => (KEY_DP, "g X<>0"),
            G_X_EQ_Y => (KEY_CHS, "g X=Y"),
            _ => (KEY_ADD, "g X=0"),
        };
        if self.prgm_entry {
            self.record(encode_two(KEY_G_SHIFT, base, comment));
            return Flow::Tail;
        }

        // a false test skips the next program line
        let skip = if self.state.op_mode() == OpMode::Float {
            let x = self.state.stack().x().float_val();
            let y = self.state.stack().y().float_val();
            match key {
                G_X_LE_Y => x > y,
                G_X_LT_0 => x >= 0.0,
                G_X_GT_Y => x <= y,
                G_X_GT_0 => x <= 0.0,
                G_X_NE_Y => x == y,
                G_X_NE_0 => x == 0.0,
                G_X_EQ_Y => x != y,
                _ => x != 0.0,
            }
        } else {
            use std::cmp::Ordering;
            let x = self.state.stack().x().int_val();
            let y = self.state.stack().y().int_val();
            match key {
                G_X_LE_Y => x.compare(y) == Ordering::Greater,
                G_X_LT_0 => x.to_i64().0 >= 0,
                G_X_GT_Y => x.compare(y) != Ordering::Greater,
                G_X_GT_0 => x.to_i64().0 <= 0,
                G_X_NE_Y => x == y,
                G_X_NE_0 => x.is_zero(),
                G_X_EQ_Y => x != y,
                _ => !x.is_zero(),
            }
        };
        if skip {
            self.skip_line();
        }
        Flow::Tail
    }

    /// Head of the single-operand staged commands. Returns the operand
    /// once it has arrived; the caller validates and clears the stage.
    fn staged_operand(&mut self, key: u16) -> Option<u16> {
        if self.stage.is_empty() {
            self.stage.push(key);
            return None;
        }
        if self.stage[0] != key {
            self.stage.clear();
            self.stage.push(key);
            return None;
        }
        self.stage.pop()
    }

    fn record(&mut self, line: String) {
        let pos = self.state.prgm_position();
        self.state.prgm_memory_mut().insert(pos, line);
        self.state.set_prgm_position(pos + 1);
    }

    fn raise(&mut self, out: &mut DisplayUpdate, err: CalcError) -> Flow {
        tracing::debug!(%err, "keystroke rejected");
        out.alternate_text = err.to_string();
        Flow::Done
    }

    fn raise_prefix(&mut self, out: &mut DisplayUpdate, err: CalcError) -> Flow {
        self.prefix = 0;
        self.raise(out, err)
    }

    fn new_register(&self) -> Register {
        Register::new(self.state.word_size(), self.state.arith_mode())
    }

    fn save_last_x(&mut self) {
        let x = self.state.stack().x().clone();
        self.state.set_last_x(x);
    }

    fn skip_line(&mut self) {
        self.state.set_prgm_position(self.state.prgm_position() + 1);
    }

    /// Pop X and take its magnitude as a bit count.
    fn pop_bit_count(&mut self) -> u32 {
        let popped = self.state.stack_mut().pop();
        popped.int_val().to_i32().0.unsigned_abs()
    }

    /// The register number held in I, as a magnitude.
    fn index_register_value(&self) -> usize {
        if self.state.op_mode() == OpMode::Float {
            self.state.reg_index().float_val().abs() as usize
        } else {
            self.state.reg_index().int_val().to_i32().0.unsigned_abs() as usize
        }
    }

    fn find_label(&self, start: usize, label: u16) -> Option<usize> {
        find_label(self.state.prgm_memory(), label, start)
    }

    /// Parse the raw input into X according to the current mode.
    fn convert_input(&mut self, text: &str) {
        let mut temp = self.new_register();
        let size = self.state.word_size();
        let mode = self.state.arith_mode();
        match self.state.op_mode() {
            OpMode::Float => {
                // complete a dangling exponent so it parses
                let padded = if text.ends_with('e') || text.ends_with("e-") {
                    format!("{}0", text)
                } else {
                    text.to_string()
                };
                match padded.parse::<f64>() {
                    Ok(value) => temp.set_float_val(value),
                    // the infinity marks the input as unusable
                    Err(_) => temp.set_float_val(f64::INFINITY),
                }
            }
            OpMode::Hex => temp.set_int_val(BigNum::parse(&format!("&h{}", text), size, mode)),
            OpMode::Dec => temp.set_int_val(BigNum::parse(text, size, mode)),
            OpMode::Oct => temp.set_int_val(BigNum::parse(&format!("&o{}", text), size, mode)),
            OpMode::Bin => temp.set_int_val(BigNum::parse(&format!("&b{}", text), size, mode)),
        }
        self.state.stack_mut().set_x(temp);
    }
}
