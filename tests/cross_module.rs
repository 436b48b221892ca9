//! Cross-module interaction tests
//!
//! Tests the seams between the number core, the program-line codec, and
//! the keystroke engine.

use hex16_core::{ArithMode, BigNum, OpMode, Register};
use hex16_engine::keys::*;
use hex16_engine::{CalculatorState, Engine};
use hex16_program::{decode, find_label};

fn press_all(engine: &mut Engine, codes: &[u16]) {
    for &code in codes {
        engine.press(i32::from(code));
    }
}

// ============================================================================
// Engine -> Codec Tests
// ============================================================================

#[test]
fn recorded_lines_decode_back_to_keystrokes() {
    let mut engine = Engine::new();
    engine.press(i32::from(KEY_HEX));
    press_all(&mut engine, &[KEY_G_SHIFT, KEY_RS]);
    press_all(&mut engine, &[KEY_STO, KEY_DP, KEY_7]);
    press_all(&mut engine, &[KEY_F_SHIFT, KEY_A]);
    press_all(&mut engine, &[KEY_B]);

    let memory = engine.state().prgm_memory();
    assert_eq!(decode(&memory[0]).unwrap(), vec![KEY_STO, KEY_DP, 0x7]);
    assert_eq!(decode(&memory[1]).unwrap(), vec![KEY_F_SHIFT, KEY_A]);
    assert_eq!(decode(&memory[2]).unwrap(), vec![KEY_B]);
}

#[test]
fn label_search_finds_engine_recorded_labels() {
    let mut engine = Engine::new();
    press_all(&mut engine, &[KEY_G_SHIFT, KEY_RS]);
    press_all(&mut engine, &[KEY_ENTER]);
    press_all(&mut engine, &[KEY_G_SHIFT, KEY_GTO, KEY_A]);
    press_all(&mut engine, &[KEY_ENTER]);

    let memory = engine.state().prgm_memory();
    assert_eq!(find_label(memory, 0xA, 0), Some(1));
    // the search wraps around the end
    assert_eq!(find_label(memory, 0xA, 2), Some(1));
    assert_eq!(find_label(memory, 0x5, 0), None);
}

#[test]
fn replayed_dot_register_line_addresses_register_23() {
    let mut engine = Engine::new();
    engine.press(i32::from(KEY_DEC));
    press_all(&mut engine, &[KEY_G_SHIFT, KEY_RS]);
    press_all(&mut engine, &[KEY_STO, KEY_DP, KEY_7]);
    press_all(&mut engine, &[KEY_G_SHIFT, KEY_GSB]);
    press_all(&mut engine, &[KEY_G_SHIFT, KEY_RS]);

    press_all(&mut engine, &[KEY_9, KEY_GTO, KEY_DP, KEY_0, KEY_0, KEY_0]);
    press_all(&mut engine, &[KEY_RS]);
    engine.run_program();
    assert_eq!(engine.state().reg(23).int_val().to_i64().0, 9);
}

// ============================================================================
// Engine -> Core Tests
// ============================================================================

#[test]
fn mode_switch_converts_between_representations() {
    let mut engine = Engine::new();
    press_all(&mut engine, &[KEY_2, KEY_DP, KEY_7, KEY_5, KEY_ENTER]);
    assert_eq!(engine.state().stack().x().float_val(), 2.75);

    engine.press(i32::from(KEY_HEX));
    // the fraction is dropped on the integer side
    assert_eq!(engine.state().stack().x().int_val().to_i64().0, 2);
}

#[test]
fn arith_mode_switch_reinterprets_registers() {
    let mut engine = Engine::new();
    engine.press(i32::from(KEY_HEX));
    press_all(&mut engine, &[KEY_F, KEY_F, KEY_F, KEY_F, KEY_ENTER]);
    assert_eq!(engine.state().stack().x().int_val().to_i64().0, -1);

    press_all(&mut engine, &[KEY_F_SHIFT, KEY_3]);
    assert_eq!(engine.state().arith_mode(), ArithMode::Unsigned);
    assert_eq!(engine.state().stack().x().int_val().to_i64().0, 0xFFFF);
}

#[test]
fn index_register_keeps_full_width() {
    let mut engine = Engine::new();
    engine.press(i32::from(KEY_DEC));
    press_all(&mut engine, &[KEY_5, KEY_STO, KEY_SST]);
    assert_eq!(engine.state().reg_index().int_val().word_size(), 64);

    // shrinking the word leaves I at 64 bits
    press_all(&mut engine, &[KEY_8, KEY_F_SHIFT, KEY_STO]);
    assert_eq!(engine.state().reg_index().int_val().word_size(), 64);
}

// ============================================================================
// Core -> Persistence Tests
// ============================================================================

#[test]
fn serialized_state_preserves_exact_bit_patterns() {
    let mut cs = CalculatorState::new();
    cs.set_op_mode(OpMode::Hex);
    let mut reg = Register::new(16, ArithMode::TwosComplement);
    reg.set_int_val(BigNum::from_i64(-12345, 16, ArithMode::TwosComplement));
    cs.set_reg(3, reg);

    let json = cs.to_json().unwrap();
    let restored = CalculatorState::from_json(&json).unwrap();
    assert_eq!(
        restored.reg(3).int_val().to_hex_string(),
        cs.reg(3).int_val().to_hex_string()
    );
    assert_eq!(restored.reg(3).int_val().to_i64().0, -12345);
}

#[test]
fn serialized_program_memory_is_plain_text() {
    let mut engine = Engine::new();
    press_all(&mut engine, &[KEY_G_SHIFT, KEY_RS]);
    press_all(&mut engine, &[KEY_G_SHIFT, KEY_GTO, KEY_1]);
    press_all(&mut engine, &[KEY_G_SHIFT, KEY_RS]);

    let json = engine.state().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let lines = value["prgm_memory"].as_array().unwrap();
    assert_eq!(lines[0].as_str().unwrap(), "43,22, 1    'g LBL 1");
}

#[test]
fn hand_edited_program_line_stops_the_run_without_a_panic() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let mut engine = Engine::new();
    press_all(&mut engine, &[KEY_G_SHIFT, KEY_RS]);
    press_all(&mut engine, &[KEY_G_SHIFT, KEY_GTO, KEY_1]);
    press_all(&mut engine, &[KEY_7, KEY_ENTER]);
    press_all(&mut engine, &[KEY_G_SHIFT, KEY_RS]);

    // simulate a corrupt save file by mangling the middle line
    let json = engine
        .state()
        .to_json()
        .unwrap()
        .replace("      36    'Enter", "?!");
    let mut engine = Engine::with_state(CalculatorState::from_json(&json).unwrap());

    engine.state_mut().set_prgm_position(0);
    engine.state_mut().set_prgm_running(true);
    let out = engine.run_program();

    assert_eq!(out.alternate_text, "Error 6 - Improper Program Line");
    assert!(!engine.state().prgm_running());
    // the lines before the damage still executed
    assert_eq!(engine.state().stack().x().float_val(), 7.0);
}
