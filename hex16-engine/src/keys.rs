//! Key codes for the calculator keyboard.
//!
//! Every key has a stable numeric code. The plain keys occupy the low
//! byte, laid out row by row on the physical keyboard. Pressing the
//! yellow `f` key or the blue `g` key arms a prefix that is added to
//! the next code, which is how one physical key carries up to three
//! functions. The shifted codes are listed here as constants of their
//! own so the dispatch can match on them directly.

/// Added to the next key code after the `f` key.
pub const PREFIX_F: u16 = 128;

/// Added to the next key code after the `g` key.
pub const PREFIX_G: u16 = 256;

/// Pseudo-key used to refresh the display without any other action.
/// Fed to [`crate::Engine::press`] as `-1`.
pub const REFRESH: u16 = 0xFFFF;

// The plain keys. The hex digit keys 0-F are their own codes.
pub const KEY_0: u16 = 0x00;
pub const KEY_1: u16 = 0x01;
pub const KEY_2: u16 = 0x02;
pub const KEY_3: u16 = 0x03;
pub const KEY_4: u16 = 0x04;
pub const KEY_5: u16 = 0x05;
pub const KEY_6: u16 = 0x06;
pub const KEY_7: u16 = 0x07;
pub const KEY_8: u16 = 0x08;
pub const KEY_9: u16 = 0x09;
pub const KEY_A: u16 = 0x0A;
pub const KEY_B: u16 = 0x0B;
pub const KEY_C: u16 = 0x0C;
pub const KEY_D: u16 = 0x0D;
pub const KEY_E: u16 = 0x0E;
pub const KEY_F: u16 = 0x0F;

pub const KEY_DIV: u16 = 0x10;
pub const KEY_MUL: u16 = 0x20;
pub const KEY_GSB: u16 = 0x21;
pub const KEY_GTO: u16 = 0x22;
pub const KEY_HEX: u16 = 0x23;
pub const KEY_DEC: u16 = 0x24;
pub const KEY_OCT: u16 = 0x25;
pub const KEY_BIN: u16 = 0x26;
pub const KEY_SUB: u16 = 0x30;
pub const KEY_RS: u16 = 0x31;
pub const KEY_SST: u16 = 0x32;
pub const KEY_ROLL: u16 = 0x33;
pub const KEY_XY: u16 = 0x34;
pub const KEY_BSP: u16 = 0x35;
pub const KEY_ENTER: u16 = 0x36;
pub const KEY_ADD: u16 = 0x40;
pub const KEY_ON: u16 = 0x41;
pub const KEY_F_SHIFT: u16 = 0x42;
pub const KEY_G_SHIFT: u16 = 0x43;
pub const KEY_STO: u16 = 0x44;
pub const KEY_RCL: u16 = 0x45;
pub const KEY_DP: u16 = 0x48;
pub const KEY_CHS: u16 = 0x49;

// f-shifted functions (yellow).
pub const F_MEM: u16 = PREFIX_F + KEY_0;
pub const F_SET_1S: u16 = PREFIX_F + KEY_1;
pub const F_SET_2S: u16 = PREFIX_F + KEY_2;
pub const F_SET_UNSGN: u16 = PREFIX_F + KEY_3;
pub const F_SB: u16 = PREFIX_F + KEY_4;
pub const F_CB: u16 = PREFIX_F + KEY_5;
pub const F_B_TEST: u16 = PREFIX_F + KEY_6;
pub const F_MASKL: u16 = PREFIX_F + KEY_7;
pub const F_MASKR: u16 = PREFIX_F + KEY_8;
pub const F_RMD: u16 = PREFIX_F + KEY_9;
pub const F_SL: u16 = PREFIX_F + KEY_A;
pub const F_SR: u16 = PREFIX_F + KEY_B;
pub const F_RL: u16 = PREFIX_F + KEY_C;
pub const F_RR: u16 = PREFIX_F + KEY_D;
pub const F_RLN: u16 = PREFIX_F + KEY_E;
pub const F_RRN: u16 = PREFIX_F + KEY_F;
pub const F_XOR: u16 = PREFIX_F + KEY_DIV;
pub const F_AND: u16 = PREFIX_F + KEY_MUL;
pub const F_X_INDIRECT: u16 = PREFIX_F + KEY_GSB;
pub const F_X_I: u16 = PREFIX_F + KEY_GTO;
pub const F_SHOW_HEX: u16 = PREFIX_F + KEY_HEX;
pub const F_SHOW_DEC: u16 = PREFIX_F + KEY_DEC;
pub const F_SHOW_OCT: u16 = PREFIX_F + KEY_OCT;
pub const F_SHOW_BIN: u16 = PREFIX_F + KEY_BIN;
pub const F_NOT: u16 = PREFIX_F + KEY_SUB;
pub const F_INDEX: u16 = PREFIX_F + KEY_RS;
pub const F_I: u16 = PREFIX_F + KEY_SST;
pub const F_CLEAR_PRGM: u16 = PREFIX_F + KEY_ROLL;
pub const F_CLEAR_REG: u16 = PREFIX_F + KEY_XY;
pub const F_CLEAR_PREFIX: u16 = PREFIX_F + KEY_BSP;
pub const F_WINDOW: u16 = PREFIX_F + KEY_ENTER;
pub const F_OR: u16 = PREFIX_F + KEY_ADD;
pub const F_WSIZE: u16 = PREFIX_F + KEY_STO;
pub const F_FLOAT: u16 = PREFIX_F + KEY_RCL;
pub const F_STATUS: u16 = PREFIX_F + KEY_DP;
pub const F_EEX: u16 = PREFIX_F + KEY_CHS;

// g-shifted functions (blue).
pub const G_X_NE_Y: u16 = PREFIX_G + KEY_0;
pub const G_X_LE_Y: u16 = PREFIX_G + KEY_1;
pub const G_X_LT_0: u16 = PREFIX_G + KEY_2;
pub const G_X_GT_Y: u16 = PREFIX_G + KEY_3;
pub const G_SF: u16 = PREFIX_G + KEY_4;
pub const G_CF: u16 = PREFIX_G + KEY_5;
pub const G_F_TEST: u16 = PREFIX_G + KEY_6;
pub const G_NUM_B: u16 = PREFIX_G + KEY_7;
pub const G_ABS: u16 = PREFIX_G + KEY_8;
pub const G_DBLR: u16 = PREFIX_G + KEY_9;
pub const G_LJ: u16 = PREFIX_G + KEY_A;
pub const G_ASR: u16 = PREFIX_G + KEY_B;
pub const G_RLC: u16 = PREFIX_G + KEY_C;
pub const G_RRC: u16 = PREFIX_G + KEY_D;
pub const G_RLCN: u16 = PREFIX_G + KEY_E;
pub const G_RRCN: u16 = PREFIX_G + KEY_F;
pub const G_DBL_DIV: u16 = PREFIX_G + KEY_DIV;
pub const G_DBL_MUL: u16 = PREFIX_G + KEY_MUL;
pub const G_RTN: u16 = PREFIX_G + KEY_GSB;
pub const G_LBL: u16 = PREFIX_G + KEY_GTO;
pub const G_DSZ: u16 = PREFIX_G + KEY_HEX;
pub const G_ISZ: u16 = PREFIX_G + KEY_DEC;
pub const G_SQRT: u16 = PREFIX_G + KEY_OCT;
pub const G_INV: u16 = PREFIX_G + KEY_BIN;
pub const G_X_GT_0: u16 = PREFIX_G + KEY_SUB;
pub const G_PR: u16 = PREFIX_G + KEY_RS;
pub const G_BST: u16 = PREFIX_G + KEY_SST;
pub const G_ROLL_UP: u16 = PREFIX_G + KEY_ROLL;
pub const G_PSE: u16 = PREFIX_G + KEY_XY;
pub const G_CLX: u16 = PREFIX_G + KEY_BSP;
pub const G_LSTX: u16 = PREFIX_G + KEY_ENTER;
pub const G_X_EQ_0: u16 = PREFIX_G + KEY_ADD;
pub const G_WIN_LEFT: u16 = PREFIX_G + KEY_STO;
pub const G_WIN_RIGHT: u16 = PREFIX_G + KEY_RCL;
pub const G_X_NE_0: u16 = PREFIX_G + KEY_DP;
pub const G_X_EQ_Y: u16 = PREFIX_G + KEY_CHS;

/// Keys that may be abbreviated: `STO +` style shortcuts jump straight
/// to the register addressed by the I register.
pub const SHORTCUT_ALLOWED: [u16; 4] = [KEY_STO, KEY_RCL, KEY_GSB, KEY_GTO];

/// Staged commands whose operand can not be a decimal point.
pub const DP_NOT_ALLOWED: [u16; 6] = [F_WINDOW, G_SF, G_CF, G_F_TEST, G_LBL, KEY_GSB];

/// The few keys that do not terminate digit entry.
pub const TERMINATE_INPUT: [u16; 4] = [KEY_BSP, KEY_DP, KEY_CHS, F_EEX];

/// Keys that leave the binary display window where it is.
pub const DO_NOT_RESET_WIN_POS: [u16; 32] = [
    G_WIN_LEFT,
    G_WIN_RIGHT,
    KEY_STO,
    F_MEM,
    F_STATUS,
    G_PR,
    G_LBL,
    G_RTN,
    G_SF,
    G_CF,
    G_F_TEST,
    G_PSE,
    KEY_RS,
    KEY_GSB,
    KEY_GTO,
    KEY_SST,
    G_ABS,
    G_DSZ,
    G_ISZ,
    F_SHOW_BIN,
    F_CLEAR_PRGM,
    F_CLEAR_REG,
    F_CLEAR_PREFIX,
    G_X_EQ_0,
    G_X_EQ_Y,
    G_X_GT_0,
    G_X_GT_Y,
    G_X_LT_0,
    G_X_LE_Y,
    G_X_NE_0,
    G_X_NE_Y,
    F_WINDOW,
];

/// The digit keys double as staged operands, so they are the only
/// codes below 16.
#[inline]
pub fn is_digit(key: u16) -> bool {
    key <= KEY_F
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shifted_codes_do_not_collide_with_plain_codes() {
        assert!(F_MEM > KEY_CHS);
        assert!(G_X_NE_Y > F_EEX);
        assert_eq!(F_SL, 128 + 0x0A);
        assert_eq!(G_LBL, 256 + 0x22);
    }

    #[test]
    fn digit_classification() {
        assert!(is_digit(KEY_0));
        assert!(is_digit(KEY_F));
        assert!(!is_digit(KEY_DIV));
        assert!(!is_digit(F_SB));
    }
}
