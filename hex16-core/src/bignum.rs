//! Fixed-width big integer arithmetic
//!
//! `BigNum` models the calculator's integer word: a little-endian byte
//! array masked to a word size of 1-64 bits, with an arithmetic mode
//! (unsigned, 1's complement, 2's complement) that governs sign handling.
//! Every operation updates the carry, overflow, and loss-of-precision
//! flags the way the HP-16C does, which is the interesting part: carry is
//! the bit shifted/carried out of the word, overflow is mode-dependent,
//! and intermediate work is done with a byte of extra "wiggle room" so
//! both can be detected after masking.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::mode::ArithMode;

/// A fixed-width integer value with status flags.
///
/// The byte vector is little-endian and always exactly
/// `(bit_size - 1) / 8 + 1` bytes long; bits above `bit_size` in the top
/// byte are kept zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BigNum {
    bytes: Vec<u8>,
    bit_size: u32,
    mode: ArithMode,
    carry: bool,
    overflow: bool,
    loss_of_precision: bool,
}

impl BigNum {
    /// A zero value of the given word size.
    pub fn new(size: u32, mode: ArithMode) -> BigNum {
        let size = size.max(1);
        BigNum {
            bytes: vec![0; ((size - 1) / 8 + 1) as usize],
            bit_size: size,
            mode,
            carry: false,
            overflow: false,
            loss_of_precision: false,
        }
    }

    /// The number 1 at the given word size.
    pub fn one(size: u32) -> BigNum {
        let mut ans = BigNum::new(size, ArithMode::TwosComplement);
        ans.bytes[0] = 1;
        ans
    }

    /// Build a value from a native integer, truncating to `size` bits.
    pub fn from_i64(value: i64, size: u32, mode: ArithMode) -> BigNum {
        let mut ans = BigNum::new(size, mode);
        ans.import(&value.to_le_bytes(), size, value < 0);
        ans
    }

    /// Build a value from a float by way of its integer part.
    ///
    /// Values outside the `i64` range come back as zero with the
    /// loss-of-precision flag set.
    pub fn from_f64(value: f64, size: u32, mode: ArithMode) -> BigNum {
        let mut ans = BigNum::new(size, mode);
        if value >= i64::MAX as f64 || value <= i64::MIN as f64 {
            ans.loss_of_precision = true;
            return ans;
        }
        let temp = value as i64;
        ans.import(&temp.to_le_bytes(), size, value < 0.0);
        ans
    }

    /// Parse a number from display text.
    ///
    /// A `&h`/`&o`/`&b` prefix selects hexadecimal, octal, or binary;
    /// anything else is decimal. The scan runs right to left and stops at
    /// the first character that is not a digit of the radix, so `"123.45"`
    /// parses as 45 and `"-12"` as 12 (negated afterwards, two's
    /// complement rules). Digits that do not fit in `size` bits set the
    /// loss-of-precision flag.
    pub fn parse(text: &str, size: u32, mode: ArithMode) -> BigNum {
        let mut out = BigNum::new(32, mode);
        if text.is_empty() {
            out.set_size(size);
            return out;
        }

        let chars: Vec<char> = text.chars().collect();
        if chars.len() > 2 && chars[0] == '&' {
            let number: Vec<char> = chars[2..]
                .iter()
                .collect::<String>()
                .to_lowercase()
                .trim()
                .chars()
                .collect();
            match chars[1].to_ascii_lowercase() {
                'h' => out.parse_radix(&number, 16, 4),
                'o' => out.parse_radix(&number, 8, 3),
                'b' => out.parse_radix(&number, 2, 1),
                _ => {}
            }
        } else {
            out.parse_decimal(&chars);
        }

        // The requested size may drop digits; compare against the
        // wiggle-room copy to find out. Sign rules would confuse the
        // comparison, so it is done unsigned.
        let tmode = out.mode;
        out.mode = ArithMode::Unsigned;
        let z = out.clone();
        out.set_size(size);
        if out.compare(&z) != Ordering::Equal {
            out.loss_of_precision = true;
        }
        out.mode = tmode;
        out
    }

    fn parse_radix(&mut self, number: &[char], radix: u32, bits_per_digit: u32) {
        // right-to-left scan, stopping at the first foreign character
        let mut finish = 0usize;
        for i in (0..number.len()).rev() {
            if number[i].to_digit(radix).is_none() {
                finish = i + 1;
                break;
            }
        }
        let temp = (number.len() - finish) as i64 * bits_per_digit as i64;
        let n_bit = (((temp - 1) / 8) + 1) * 8;
        self.set_size(n_bit as u32);
        let mut z = BigNum::new(n_bit as u32, self.mode);

        // more digits than the word holds: ignore the extra on the left
        if temp > self.bit_size as i64 {
            finish += ((temp - self.bit_size as i64) / bits_per_digit as i64) as usize;
        }

        let mut bits = 0u32;
        for i in (finish..number.len()).rev() {
            if let Some(digit) = number[i].to_digit(radix) {
                if digit != 0 {
                    z.clear();
                    z.put_at(digit, bits);
                    self.raw_add_local(&z);
                }
            }
            bits += bits_per_digit;
        }
    }

    fn parse_decimal(&mut self, chars: &[char]) {
        let mut finish = 0usize;
        for i in (0..chars.len()).rev() {
            if !chars[i].is_ascii_digit() {
                finish = i + 1;
                break;
            }
        }
        // not doing bit manipulation here, so the size estimate is loose
        let temp = ((chars.len() - finish) as f64 * 3.5) as i64;
        let n_bit = ((((temp - 1) / 8) + 1) * 8) as u32;
        self.set_size(n_bit);

        let mut z = BigNum::new(n_bit, self.mode);
        let mut mult = BigNum::new(n_bit, self.mode);
        let mut ten = BigNum::new(n_bit, self.mode);
        mult.bytes[0] = 1;
        ten.bytes[0] = 10;

        for i in (finish..chars.len()).rev() {
            if let Some(digit) = chars[i].to_digit(10) {
                if digit != 0 {
                    z.clear();
                    z.bytes[0] = digit as u8;
                    z = z.multiply(&mult, n_bit);
                    self.raw_add_local(&z);
                }
            }
            mult = mult.multiply(&ten, n_bit);
            if mult.overflow {
                self.loss_of_precision = true;
                break;
            }
        }
        // a leading minus negates, two's complement rules
        if chars.first() == Some(&'-') {
            self.complement(self.bit_size);
            let one = BigNum::one(self.bit_size);
            self.raw_add_local(&one);
        }
    }

    /* ------------------------------ accessors ------------------------------ */

    #[inline]
    pub fn word_size(&self) -> u32 {
        self.bit_size
    }

    /// Resize to `size` bits. Widening sign-extends negative values in the
    /// complement modes; narrowing truncates silently.
    pub fn set_word_size(&mut self, size: u32) {
        self.set_size(size);
    }

    #[inline]
    pub fn mode(&self) -> ArithMode {
        self.mode
    }

    #[inline]
    pub fn set_mode(&mut self, mode: ArithMode) {
        self.mode = mode;
    }

    #[inline]
    pub fn carry(&self) -> bool {
        self.carry
    }

    #[inline]
    pub fn overflow(&self) -> bool {
        self.overflow
    }

    #[inline]
    pub fn loss_of_precision(&self) -> bool {
        self.loss_of_precision
    }

    pub fn is_zero(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }

    /// The top bit of the word. In the complement modes this is the sign.
    pub fn sign_bit(&self) -> bool {
        let mask = 1u8 << ((self.bit_size - 1) % 8);
        self.bytes[self.last_byte()] & mask != 0
    }

    /// Index of the most significant set bit, or 0 for a zero value.
    pub fn max_bit(&self) -> u32 {
        for i in (0..self.bytes.len()).rev() {
            if self.bytes[i] != 0 {
                return i as u32 * 8 + (7 - self.bytes[i].leading_zeros());
            }
        }
        0
    }

    /* ----------------------------- comparison ----------------------------- */

    /// Three-way compare. Both values are widened to the larger word size
    /// first; in the complement modes any negative value orders below any
    /// positive one, after which the magnitudes compare byte-wise.
    pub fn compare(&self, y: &BigNum) -> Ordering {
        let mut temp_x = self.clone();
        let mut temp_y = y.clone();
        if temp_x.bit_size > temp_y.bit_size {
            temp_y.set_size(temp_x.bit_size);
        }
        if temp_y.bit_size > temp_x.bit_size {
            temp_x.set_size(temp_y.bit_size);
        }

        if self.mode != ArithMode::Unsigned {
            let sign_x = temp_x.sign_bit();
            let sign_y = temp_y.sign_bit();
            if sign_x != sign_y {
                return if sign_y {
                    Ordering::Greater
                } else {
                    Ordering::Less
                };
            }
        }
        for i in (0..temp_x.bytes.len()).rev() {
            match temp_x.bytes[i].cmp(&temp_y.bytes[i]) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }

    /* ----------------------------- arithmetic ----------------------------- */

    /// Add, at `size` bits (0 infers the wider operand's size).
    pub fn add(&self, y: &BigNum, size: u32) -> BigNum {
        let real_bitsize = self.real_size(y, size);
        let mut out = self.clone();
        let mut temp_y = y.clone();
        out.set_size(real_bitsize);
        temp_y.set_size(real_bitsize);

        let sign_x = out.sign_bit();
        let sign_y = temp_y.sign_bit();

        // extra wiggle room, without sign extension, so the carry out of
        // the word lands in the padding
        out.add_padding(Self::round_up(real_bitsize));
        temp_y.add_padding(out.bit_size);

        out.raw_add_local(&temp_y);
        out.carry = out.max_bit() >= real_bitsize;
        match out.mode {
            ArithMode::Unsigned => {
                out.overflow = out.carry;
            }
            ArithMode::OnesComplement => {
                // the end-around carry rule
                if out.carry {
                    let one = BigNum::one(out.bit_size);
                    out.raw_add_local(&one);
                }
                out.overflow = Self::add_overflow(&out, sign_x, sign_y, real_bitsize);
            }
            ArithMode::TwosComplement => {
                out.overflow = Self::add_overflow(&out, sign_x, sign_y, real_bitsize);
            }
        }
        out.set_size(real_bitsize);
        out
    }

    fn add_overflow(v: &BigNum, sign_x: bool, sign_y: bool, real_bitsize: u32) -> bool {
        if sign_x {
            sign_y && !v.bit_test(real_bitsize - 1) && v.carry
        } else {
            !sign_y && v.bit_test(real_bitsize - 1) && !v.carry
        }
    }

    /// Subtract `y`, at `size` bits (0 infers the wider operand's size).
    pub fn subtract(&self, y: &BigNum, size: u32) -> BigNum {
        let real_bitsize = self.real_size(y, size);
        let mut out = self.clone();
        let mut temp_y = y.clone();
        out.set_size(real_bitsize);
        temp_y.set_size(real_bitsize);

        let sign_x = out.sign_bit();
        let sign_y = temp_y.sign_bit();

        out.add_padding(Self::round_up(real_bitsize));
        temp_y.add_padding(out.bit_size);

        out.raw_sub_local(&temp_y);
        // a borrow propagates through the padding bytes
        out.carry = out.max_bit() >= real_bitsize;
        match out.mode {
            ArithMode::Unsigned => {
                out.overflow = out.carry;
            }
            ArithMode::OnesComplement => {
                if out.carry {
                    let one = BigNum::one(out.bit_size);
                    out.raw_sub_local(&one);
                }
                out.overflow = Self::sub_overflow(&out, sign_x, sign_y, real_bitsize);
            }
            ArithMode::TwosComplement => {
                out.overflow = Self::sub_overflow(&out, sign_x, sign_y, real_bitsize);
            }
        }
        out.set_size(real_bitsize);
        out
    }

    fn sub_overflow(v: &BigNum, sign_x: bool, sign_y: bool, real_bitsize: u32) -> bool {
        if sign_x {
            !sign_y && !v.bit_test(real_bitsize - 1) && !v.carry
        } else {
            sign_y && v.bit_test(real_bitsize - 1) && v.carry
        }
    }

    /// Multiply, schoolbook style on bytes. Overflow is set when any
    /// partial product lands beyond the word.
    pub fn multiply(&self, y: &BigNum, size: u32) -> BigNum {
        let real_bitsize = self.real_size(y, size);
        let mut out = self.clone();
        let mut temp_x = self.clone();
        let mut temp_y = y.clone();
        out.set_size(Self::round_up(real_bitsize));
        temp_x.set_size(out.bit_size);
        temp_y.set_size(out.bit_size);
        let mut z = BigNum::new(out.bit_size, out.mode);
        out.clear();

        if temp_x.is_zero() || temp_y.is_zero() {
            out.set_size(real_bitsize);
            return out;
        }

        for i in 0..=temp_x.max_byte() {
            for j in 0..=temp_y.max_byte() {
                let temp = temp_x.bytes[i] as u32 * temp_y.bytes[j] as u32;
                if temp != 0 {
                    if i + j <= out.last_byte() {
                        z.clear();
                        z.put_at(temp, ((i + j) * 8) as u32);
                        out.raw_add_local(&z);
                    } else {
                        out.overflow = true;
                    }
                }
            }
        }
        if !out.overflow {
            out.overflow = out.max_bit() >= real_bitsize;
        }
        out.set_size(real_bitsize);
        out
    }

    /// Integer division. Division by zero yields zero with the overflow
    /// flag set; a non-zero remainder sets carry. In the complement modes
    /// the operands are divided as magnitudes and the quotient takes the
    /// algebraic sign.
    pub fn divide(&self, y: &BigNum, size: u32) -> BigNum {
        let real_bitsize = self.real_size(y, size);
        let mut out = self.clone();
        let mut temp_x = self.clone();
        let mut temp_y = y.clone();
        out.set_size(Self::round_up(real_bitsize));
        temp_x.set_size(out.bit_size);
        temp_y.set_size(out.bit_size);
        let mut neg = false;

        if temp_y.is_zero() {
            out.set_size(real_bitsize);
            out.clear();
            out.overflow = true;
            return out;
        }

        // figure out the sign of the answer, then work on magnitudes
        if out.mode != ArithMode::Unsigned {
            if temp_x.sign_bit() != temp_y.sign_bit() {
                neg = true;
            }
            temp_x.mode = ArithMode::TwosComplement;
            temp_x.absolute_value();
            temp_x.mode = ArithMode::Unsigned;
            temp_y.mode = ArithMode::TwosComplement;
            temp_y.absolute_value();
            temp_y.mode = ArithMode::Unsigned;
        }

        if temp_x.compare(&temp_y) == Ordering::Less {
            let carry = !temp_x.is_zero();
            out.set_size(real_bitsize);
            out.clear();
            out.carry = carry;
            return out;
        }

        out.clear();
        Self::long_divide(&mut out, &mut temp_x, &temp_y, true);

        out.carry = !temp_x.is_zero();
        out.overflow = out.max_bit() >= real_bitsize;
        out.set_size(real_bitsize);
        if neg {
            out.change_sign();
            if out.mode == ArithMode::OnesComplement {
                let one = BigNum::one(out.bit_size);
                out.raw_add_local(&one);
            }
        }
        out
    }

    /// Division remainder. The result takes the sign of the dividend
    /// (two's complement rules). Division by zero yields zero with the
    /// overflow flag set.
    pub fn remainder(&self, y: &BigNum, size: u32) -> BigNum {
        let real_bitsize = self.real_size(y, size);
        let mut temp_x = self.clone();
        let mut temp_y = y.clone();
        let padded = Self::round_up(real_bitsize);
        temp_x.set_size(padded);
        temp_y.set_size(padded);
        let mut neg = false;

        if temp_y.is_zero() {
            let mut ans = BigNum::new(real_bitsize, self.mode);
            ans.overflow = true;
            return ans;
        }

        if self.mode != ArithMode::Unsigned {
            if self.sign_bit() {
                neg = true;
            }
            temp_x.mode = ArithMode::TwosComplement;
            temp_x.absolute_value();
            temp_x.mode = ArithMode::Unsigned;
            temp_y.mode = ArithMode::TwosComplement;
            temp_y.absolute_value();
            temp_y.mode = ArithMode::Unsigned;
        }

        // if |x| < |y| the remainder is x itself
        if temp_x.compare(&temp_y) == Ordering::Less {
            temp_x.set_size(real_bitsize);
            if neg {
                temp_x.mode = ArithMode::TwosComplement;
                temp_x.change_sign();
            }
            temp_x.mode = self.mode;
            temp_x.carry = false;
            temp_x.overflow = false;
            temp_x.loss_of_precision = false;
            return temp_x;
        }

        let mut ans = temp_x.clone();
        let mut scratch = BigNum::new(padded, ArithMode::Unsigned);
        Self::long_divide(&mut scratch, &mut ans, &temp_y, false);

        ans.set_size(real_bitsize);
        if neg {
            // matching the sign of x always uses two's complement rules
            ans.mode = ArithMode::TwosComplement;
            ans.change_sign();
        }
        ans.mode = self.mode;
        ans.carry = false;
        ans.overflow = false;
        ans.loss_of_precision = false;
        ans
    }

    /// Schoolbook long division on bytes. Guesses each answer byte with a
    /// binary search, accumulating the quotient into `quotient` and
    /// reducing `dividend` in place to the remainder. All three values
    /// must share the same (padded) size, with non-negative magnitudes.
    fn long_divide(quotient: &mut BigNum, dividend: &mut BigNum, divisor: &BigNum, collect: bool) {
        let ny = divisor.max_byte();
        let mut chunk = BigNum::new(dividend.bit_size, ArithMode::Unsigned);
        let mut guess = BigNum::new(dividend.bit_size, ArithMode::Unsigned);
        loop {
            if dividend.compare(divisor) == Ordering::Less {
                break;
            }
            let nx = dividend.max_byte();

            // build a chunk with as many digits as the divisor, or one
            // more if that comes up short
            chunk.clear();
            for i in 0..=ny {
                chunk.bytes[i] = dividend.bytes[i + nx - ny];
            }
            let mut nc = ny;
            if chunk.compare(divisor) == Ordering::Less {
                for i in 0..=(ny + 1) {
                    chunk.bytes[i] = dividend.bytes[i + nx - ny - 1];
                }
                nc = ny + 1;
            }

            // binary search for the answer digit instead of trying all 255
            let mut ans_digit: i32 = 128;
            guess.clear();
            for i in (0..=6).rev() {
                guess.bytes[0] = ans_digit as u8;
                let z = divisor.multiply(&guess, 0);
                if z.compare(&chunk) == Ordering::Greater {
                    ans_digit -= 1 << i;
                } else {
                    ans_digit += 1 << i;
                }
            }
            guess.bytes[0] = ans_digit as u8;
            let z = divisor.multiply(&guess, 0);
            if z.compare(&chunk) == Ordering::Greater {
                ans_digit -= 1;
            }

            if collect {
                let mut digit = BigNum::new(quotient.bit_size, ArithMode::Unsigned);
                digit.put_at(ans_digit as u32, ((nx - nc) * 8) as u32);
                quotient.raw_add_local(&digit);
            }

            // shift the final guess into place and subtract it off
            guess.clear();
            guess.bytes[nx - nc] = ans_digit as u8;
            let z = divisor.multiply(&guess, 0);
            dividend.raw_sub_local(&z);

            if nx - nc == 0 {
                break;
            }
        }
    }

    /// Raise to the power `y` by repeated multiplication. Negative or
    /// out-of-range cases yield zero.
    pub fn power(&self, y: &BigNum, size: u32) -> BigNum {
        let real_bitsize = self.real_size(y, size);
        let mut out = self.clone();
        let mut temp_x = self.clone();
        let mut temp_y = y.clone();
        out.set_size(Self::round_up(real_bitsize));
        temp_x.set_size(out.bit_size);
        temp_y.set_size(out.bit_size);
        let one = BigNum::one(out.bit_size);
        let mut over = false;

        if temp_y.is_zero() {
            out.clear();
            out.bytes[0] = 1;
            out.set_size(real_bitsize);
            return out;
        }
        if temp_y.compare(&one) == Ordering::Equal || temp_x.compare(&one) == Ordering::Equal {
            out.set_size(real_bitsize);
            return out;
        }
        if out.is_zero() || (temp_y.sign_bit() && out.mode != ArithMode::Unsigned) {
            out.set_size(real_bitsize);
            out.clear();
            return out;
        }

        temp_y.raw_sub_local(&one);
        while !temp_y.is_zero() {
            out = out.multiply(&temp_x, out.bit_size);
            if out.overflow {
                over = true;
            }
            temp_y.raw_sub_local(&one);
        }
        out.overflow = over || out.max_bit() >= real_bitsize;
        out.set_size(real_bitsize);
        out
    }

    /// Integer square root by Newton's method. Zero and negative inputs
    /// yield zero with the overflow flag set; a non-perfect square sets
    /// carry on the remainder.
    pub fn square_root(&self, size: u32) -> BigNum {
        let sign = self.sign_bit();
        let real_bitsize = if size > 0 { size } else { self.bit_size };
        let mut out = self.clone();
        out.set_size(Self::round_up(real_bitsize));

        if out.is_zero() || (out.mode != ArithMode::Unsigned && sign) {
            out.set_size(real_bitsize);
            out.clear();
            out.overflow = true;
            return out;
        }

        let temp_x = out.clone();
        let mut r = BigNum::new(out.bit_size, out.mode);
        r.bytes[0] = 1;
        while out.compare(&r) == Ordering::Greater {
            r = temp_x.divide(&out, 0);
            out.raw_add_local(&r);
            // right shift instead of dividing by 2
            out.shift_right(1, false, 0);
        }

        let mut rem = out.multiply(&out, 0);
        rem.raw_sub_local(&temp_x);
        out.carry = !rem.is_zero();
        out.overflow = false;
        out.set_size(real_bitsize);
        out
    }

    /* ------------------------------ bitwise ------------------------------ */

    pub fn bit_and(&self, y: &BigNum, size: u32) -> BigNum {
        let mut out = self.clone();
        let mut temp_y = y.clone();
        out.set_size(self.real_size(y, size));
        temp_y.set_size(out.bit_size);
        for i in 0..out.bytes.len() {
            out.bytes[i] &= temp_y.bytes[i];
        }
        out
    }

    pub fn bit_or(&self, y: &BigNum, size: u32) -> BigNum {
        let mut out = self.clone();
        let mut temp_y = y.clone();
        out.set_size(self.real_size(y, size));
        temp_y.set_size(out.bit_size);
        for i in 0..out.bytes.len() {
            out.bytes[i] |= temp_y.bytes[i];
        }
        out
    }

    pub fn bit_xor(&self, y: &BigNum, size: u32) -> BigNum {
        let mut out = self.clone();
        let mut temp_y = y.clone();
        out.set_size(self.real_size(y, size));
        temp_y.set_size(out.bit_size);
        for i in 0..out.bytes.len() {
            out.bytes[i] ^= temp_y.bytes[i];
        }
        out
    }

    /// Bitwise NOT, in place.
    pub fn complement(&mut self, size: u32) {
        if size > 0 {
            self.set_size(size);
        }
        for b in self.bytes.iter_mut() {
            *b = 255 - *b;
        }
        self.mask();
    }

    /// Shift left, in place. Carry takes the last bit shifted out.
    pub fn shift_left(&mut self, distance: u32, size: u32) {
        if size > 0 {
            self.set_size(size);
        }
        for _ in 0..distance {
            self.carry = self.sign_bit();
            let mut carry = 0u32;
            for i in 0..self.bytes.len() {
                let temp = self.bytes[i] as u32 * 2 + carry;
                self.bytes[i] = temp as u8;
                carry = temp / 256;
            }
        }
        self.mask();
    }

    /// Shift right, in place. With `save_sign`, the sign bit is
    /// re-inserted each step (arithmetic shift) in the complement modes.
    pub fn shift_right(&mut self, distance: u32, save_sign: bool, size: u32) {
        if size > 0 {
            self.set_size(size);
        }
        for _ in 0..distance {
            self.carry = self.bytes[0] & 1 != 0;
            let sign_bit = self.sign_bit();
            let last = self.last_byte();
            for i in (0..=last).rev() {
                let pulled = if i < last && self.bytes[i + 1] & 1 != 0 {
                    128
                } else {
                    0
                };
                self.bytes[i] = (self.bytes[i] / 2) | pulled;
            }
            if save_sign && sign_bit && self.mode != ArithMode::Unsigned {
                self.bit_set(self.bit_size - 1);
            }
        }
    }

    /// Rotate right, in place. `with_carry` rotates through the carry
    /// flag, seeded from `starting_carry`.
    pub fn rotate_right(&mut self, distance: u32, with_carry: bool, starting_carry: bool, size: u32) {
        if size > 0 {
            self.set_size(size);
        }
        let mut starting_carry = starting_carry;
        for _ in 0..distance {
            let low_bit = self.bytes[0] & 1 != 0;
            self.carry = low_bit;
            let last = self.last_byte();
            for i in (0..=last).rev() {
                let pulled = if i < last && self.bytes[i + 1] & 1 != 0 {
                    128
                } else {
                    0
                };
                self.bytes[i] = (self.bytes[i] / 2) | pulled;
            }
            if with_carry {
                if starting_carry {
                    self.bit_set(self.bit_size - 1);
                }
            } else if low_bit {
                self.bit_set(self.bit_size - 1);
            }
            starting_carry = self.carry;
        }
    }

    /// Rotate left, in place.
    pub fn rotate_left(&mut self, distance: u32, with_carry: bool, starting_carry: bool, size: u32) {
        if size > 0 {
            self.set_size(size);
        }
        let mut starting_carry = starting_carry;
        for _ in 0..distance {
            self.carry = self.sign_bit();
            let mut carry = 0u32;
            for i in 0..self.bytes.len() {
                let temp = self.bytes[i] as u32 * 2 + carry;
                self.bytes[i] = temp as u8;
                carry = temp / 256;
            }
            if with_carry {
                if starting_carry {
                    self.bit_set(0);
                }
            } else if self.carry {
                self.bit_set(0);
            }
            starting_carry = self.carry;
        }
        self.mask();
    }

    pub fn bit_set(&mut self, location: u32) {
        let n_byte = (location / 8) as usize;
        if n_byte <= self.last_byte() {
            self.bytes[n_byte] |= 1 << (location % 8);
        }
    }

    pub fn bit_clear(&mut self, location: u32) {
        let n_byte = (location / 8) as usize;
        if n_byte <= self.last_byte() {
            self.bytes[n_byte] &= !(1 << (location % 8));
        }
    }

    pub fn bit_test(&self, location: u32) -> bool {
        let n_byte = (location / 8) as usize;
        n_byte <= self.last_byte() && self.bytes[n_byte] & (1 << (location % 8)) != 0
    }

    /// Replace the value with its population count.
    pub fn sum_bits(&mut self) {
        let count: u32 = self.bytes.iter().map(|b| b.count_ones()).sum();
        let one = BigNum::one(self.bit_size);
        self.clear();
        for _ in 0..count {
            self.raw_add_local(&one);
        }
    }

    /* ------------------------------- signs ------------------------------- */

    /// Convert to the magnitude. In two's complement the most negative
    /// value has no positive counterpart; it is left alone with the
    /// overflow flag set.
    pub fn absolute_value(&mut self) {
        if !self.sign_bit() {
            return;
        }
        match self.mode {
            ArithMode::Unsigned => {}
            ArithMode::OnesComplement => {
                // two's complement methodology, oddly enough
                let one = BigNum::one(self.bit_size);
                self.raw_sub_local(&one);
                self.complement(0);
            }
            ArithMode::TwosComplement => {
                let sign = BigNum::create_mask(1, true, self.bit_size);
                if self.compare(&sign) == Ordering::Equal {
                    self.overflow = true;
                } else {
                    let one = BigNum::one(self.bit_size);
                    self.raw_sub_local(&one);
                    self.complement(0);
                }
            }
        }
    }

    /// Negate in place. In unsigned mode this wraps and flags overflow.
    pub fn change_sign(&mut self) {
        let one = BigNum::one(self.bit_size);
        if self.sign_bit() {
            match self.mode {
                ArithMode::Unsigned => {
                    self.raw_sub_local(&one);
                    self.complement(0);
                    self.overflow = true;
                }
                ArithMode::OnesComplement => self.complement(0),
                ArithMode::TwosComplement => {
                    self.raw_sub_local(&one);
                    self.complement(0);
                }
            }
        } else {
            match self.mode {
                ArithMode::Unsigned => {
                    self.complement(0);
                    self.raw_add_local(&one);
                    self.overflow = true;
                }
                ArithMode::OnesComplement => self.complement(0),
                ArithMode::TwosComplement => {
                    self.complement(0);
                    self.raw_add_local(&one);
                }
            }
        }
    }

    /* ----------------------------- structure ----------------------------- */

    /// Split into equal-size halves `(low, high)`. Odd word sizes cannot
    /// be split.
    pub fn split(&self) -> Result<(BigNum, BigNum), CoreError> {
        if self.bit_size % 2 != 0 {
            return Err(CoreError::OddSplit(self.bit_size));
        }
        let half = self.bit_size / 2;
        let half_maxbyte = ((half - 1) / 8) as usize;

        let mut right = BigNum::new(half, self.mode);
        for i in 0..=half_maxbyte {
            right.bytes[i] = self.bytes[i];
        }
        right.mask();

        let mut temp_x = self.clone();
        temp_x.shift_right(half, false, 0);
        let mut left = BigNum::new(half, self.mode);
        for i in 0..=half_maxbyte {
            left.bytes[i] = temp_x.bytes[i];
        }
        left.mask();

        Ok((right, left))
    }

    /// Join two halves into a double-width value, `left` on top.
    pub fn combine(left: &BigNum, right: &BigNum) -> Result<BigNum, CoreError> {
        if left.bit_size != right.bit_size {
            return Err(CoreError::SizeMismatch {
                left: left.bit_size,
                right: right.bit_size,
            });
        }
        let mut out = BigNum::new(left.bit_size * 2, left.mode);
        for i in 0..right.bytes.len() {
            out.bytes[i] = right.bytes[i];
        }
        let mut temp = left.clone();
        temp.set_size(left.bit_size * 2);
        temp.shift_left(left.bit_size, 0);
        for i in 0..out.bytes.len() {
            out.bytes[i] |= temp.bytes[i];
        }
        out.carry = false;
        out.overflow = false;
        Ok(out)
    }

    /// A run of `bits` set bits, justified left or right in a `size`-bit
    /// unsigned word.
    pub fn create_mask(bits: u32, left_justify: bool, size: u32) -> BigNum {
        let mut ans = BigNum::new(size, ArithMode::Unsigned);
        let bits = bits.min(size);
        if left_justify {
            for i in (size - bits)..size {
                ans.bit_set(i);
            }
        } else {
            for i in 0..bits {
                ans.bit_set(i);
            }
        }
        ans
    }

    /// Shift the value so its top set bit lands in the sign position.
    /// Returns the justified value and the shift distance.
    pub fn left_justify(&self) -> (BigNum, BigNum) {
        let d = self.bit_size - self.max_bit() - 1;
        let mut justified = self.clone();
        justified.shift_left(d, 0);
        let distance = BigNum::from_i64(d as i64, self.bit_size, self.mode);
        (justified, distance)
    }

    /* ---------------------------- conversions ---------------------------- */

    /// The value reinterpreted as an `i32` (two's complement rules), and
    /// whether the narrowing lost bits.
    pub fn to_i32(&self) -> (i32, bool) {
        let mut x = self.clone();
        x.set_size(32);
        let mut b = [0u8; 4];
        b.copy_from_slice(&x.bytes);
        let loss = self.compare(&x) != Ordering::Equal;
        (i32::from_le_bytes(b), loss)
    }

    /// The value reinterpreted as an `i64` (two's complement rules), and
    /// whether the narrowing lost bits.
    pub fn to_i64(&self) -> (i64, bool) {
        let mut x = self.clone();
        x.set_size(64);
        let mut b = [0u8; 8];
        b.copy_from_slice(&x.bytes);
        let loss = self.compare(&x) != Ordering::Equal;
        (i64::from_le_bytes(b), loss)
    }

    pub fn to_f64(&self) -> f64 {
        self.to_i64().0 as f64
    }

    /// Hex digits, lowercase, one per 4 bits of the word.
    pub fn to_hex_string(&self) -> String {
        let ending = (self.bit_size - 1) / 4;
        let mut s = String::new();
        for i in 0..=ending {
            let j = self.get_at(i * 4, 4);
            let c = char::from_digit(j, 16).unwrap_or('0');
            s.insert(0, c);
        }
        s
    }

    /// Octal digits, one per 3 bits of the word.
    pub fn to_oct_string(&self) -> String {
        let ending = (self.bit_size - 1) / 3;
        let mut s = String::new();
        for i in 0..=ending {
            let j = self.get_at(i * 3, 3);
            let c = char::from_digit(j, 8).unwrap_or('0');
            s.insert(0, c);
        }
        s
    }

    /// Binary digits, MSB first, optionally with a space between bytes.
    pub fn to_bin_string(&self, pad: bool) -> String {
        let mut s = String::new();
        let mut spaces = 0u32;
        for i in (0..self.bytes.len()).rev() {
            for j in (0..8).rev() {
                s.push(if self.bytes[i] & (1 << j) != 0 { '1' } else { '0' });
            }
            if i != 0 && pad {
                s.push(' ');
                spaces += 1;
            }
        }
        // trim to the word length, keeping the inter-byte spaces
        let keep = if pad {
            (self.bit_size + spaces) as usize
        } else {
            self.bit_size as usize
        };
        s.split_off(s.len() - keep)
    }

    /// Decimal digits, with a leading minus in the complement modes.
    pub fn to_dec_string(&self) -> String {
        let mut temp_x = self.clone();
        temp_x.set_size(Self::round_up(self.bit_size));
        let mut is_neg = false;
        match self.mode {
            ArithMode::Unsigned => {}
            ArithMode::OnesComplement => {
                if self.sign_bit() {
                    is_neg = true;
                    temp_x.complement(0);
                }
            }
            ArithMode::TwosComplement => {
                if self.sign_bit() {
                    is_neg = true;
                    temp_x.complement(0);
                    let one = BigNum::one(temp_x.bit_size);
                    temp_x.raw_add_local(&one);
                }
            }
        }

        let ending = (self.bit_size as f64 / 3.33333333).floor() as u32 + 1;
        let mut ten = BigNum::new(temp_x.bit_size, self.mode);
        ten.bytes[0] = 10;
        let mut s = String::new();
        for _ in 0..ending {
            let z = temp_x.remainder(&ten, 0);
            s.insert(0, char::from(b'0' + z.bytes[0]));
            temp_x = temp_x.divide(&ten, 0);
        }
        if is_neg {
            s.insert(0, '-');
        }
        s
    }

    /* ------------------------------ internals ------------------------------ */

    #[inline]
    fn last_byte(&self) -> usize {
        ((self.bit_size - 1) / 8) as usize
    }

    fn max_byte(&self) -> usize {
        for i in (0..self.bytes.len()).rev() {
            if self.bytes[i] != 0 {
                return i;
            }
        }
        0
    }

    fn real_size(&self, y: &BigNum, size: u32) -> u32 {
        if size > 0 {
            size
        } else {
            self.bit_size.max(y.bit_size)
        }
    }

    // round up to the next byte, plus one more byte of wiggle room
    fn round_up(bit_size: u32) -> u32 {
        ((bit_size - 1) / 8 + 2) * 8
    }

    fn mask(&mut self) {
        let last = self.last_byte();
        if self.bit_size == (last as u32 + 1) * 8 {
            return;
        }
        let mask_value = ((1u16 << ((self.bit_size - 1) % 8 + 1)) - 1) as u8;
        self.bytes[last] &= mask_value;
    }

    /// Resize, sign-extending negative values in the complement modes
    /// when widening.
    fn set_size(&mut self, size: u32) {
        let size = size.max(1);
        if size == self.bit_size {
            return;
        }
        let extend = size > self.bit_size && self.sign_bit() && self.mode != ArithMode::Unsigned;
        let mask = if extend {
            Some(BigNum::create_mask(size - self.bit_size, true, size))
        } else {
            None
        };
        self.bytes.resize(((size - 1) / 8 + 1) as usize, 0);
        self.bit_size = size;
        self.mask();
        if let Some(mask) = mask {
            for i in 0..self.bytes.len() {
                self.bytes[i] |= mask.bytes[i];
            }
        }
    }

    // widen without sign extension
    fn add_padding(&mut self, size: u32) {
        self.bytes.resize(((size - 1) / 8 + 1) as usize, 0);
        self.bit_size = size;
        self.mask();
    }

    /// Zero the value and reset all three flags.
    pub fn clear(&mut self) {
        for b in self.bytes.iter_mut() {
            *b = 0;
        }
        self.carry = false;
        self.overflow = false;
        self.loss_of_precision = false;
    }

    // byte-wise add with carry propagation; flags untouched
    fn raw_add_local(&mut self, y: &BigNum) {
        let mut carry = 0u32;
        for i in 0..self.bytes.len() {
            let temp = self.bytes[i] as u32 + y.bytes.get(i).copied().unwrap_or(0) as u32 + carry;
            self.bytes[i] = temp as u8;
            carry = temp / 256;
        }
        self.mask();
    }

    // byte-wise subtract with borrow propagation; flags untouched
    fn raw_sub_local(&mut self, y: &BigNum) {
        let mut borrow = 0i32;
        for i in 0..self.bytes.len() {
            let mut temp =
                self.bytes[i] as i32 - y.bytes.get(i).copied().unwrap_or(0) as i32 - borrow;
            if temp < 0 {
                temp += 256;
                borrow = 1;
            } else {
                borrow = 0;
            }
            self.bytes[i] = temp as u8;
        }
        self.mask();
    }

    // write a small value at a bit offset (byte-aligned spill into the
    // next byte; off the end sets overflow)
    fn put_at(&mut self, value: u32, location: u32) {
        let n_byte = (location / 8) as usize;
        let n_bit = location % 8;
        let temp = (value as u64) << n_bit;
        self.bytes[n_byte] = temp as u8;
        if temp > 255 {
            if n_byte < self.last_byte() {
                self.bytes[n_byte + 1] = (temp / 256) as u8;
            } else {
                self.overflow = true;
            }
        }
    }

    // read `length` bits starting at a bit offset
    fn get_at(&self, location: u32, length: u32) -> u32 {
        let n_byte = (location / 8) as usize;
        let n_bit = location % 8;
        let temp = if n_byte < self.last_byte() {
            self.bytes[n_byte] as u32 + self.bytes[n_byte + 1] as u32 * 256
        } else {
            self.bytes[n_byte] as u32
        };
        (temp >> n_bit) % (1 << length)
    }

    // copy in a little-endian byte array, flagging dropped bytes or bits
    // and filling the sign extension for negative values
    fn import(&mut self, bytes: &[u8], size: u32, negative: bool) {
        self.set_size(size);
        let last = self.last_byte().min(bytes.len() - 1);
        for i in 0..=last {
            self.bytes[i] = bytes[i];
        }

        self.loss_of_precision = false;
        if last < bytes.len() - 1 {
            self.loss_of_precision = bytes[last + 1..].iter().any(|&b| b != 0);
        }
        if !self.loss_of_precision {
            self.loss_of_precision = self.max_bit() > self.bit_size;
        }

        if bytes.len() - 1 < self.last_byte() && negative {
            for i in bytes.len()..=self.last_byte() {
                self.bytes[i] = 255;
            }
        }
        self.mask();
    }
}

impl PartialEq for BigNum {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unsigned(v: i64, size: u32) -> BigNum {
        BigNum::from_i64(v, size, ArithMode::Unsigned)
    }

    fn twos(v: i64, size: u32) -> BigNum {
        BigNum::from_i64(v, size, ArithMode::TwosComplement)
    }

    fn ones(v: i64, size: u32) -> BigNum {
        BigNum::from_i64(v, size, ArithMode::OnesComplement)
    }

    #[test]
    fn add_wraps_with_carry_unsigned() {
        let x = unsigned(0xFF, 8);
        let y = unsigned(1, 8);
        let sum = x.add(&y, 0);
        assert!(sum.is_zero());
        assert!(sum.carry());
        assert!(sum.overflow());
    }

    #[test]
    fn add_overflow_twos_complement() {
        let x = twos(127, 8);
        let y = twos(1, 8);
        let sum = x.add(&y, 0);
        assert_eq!(sum.to_i64().0, -128);
        assert!(sum.overflow());
        assert!(!sum.carry());
    }

    #[test]
    fn ones_complement_end_around_carry() {
        // 5 + (-3) in 8-bit 1's complement: 0x05 + 0xFC wraps and the
        // carry comes back around
        let x = ones(5, 8);
        let mut y = ones(3, 8);
        y.change_sign();
        assert_eq!(y.to_hex_string(), "fc");
        let sum = x.add(&y, 0);
        assert_eq!(sum.to_i64().0, 2);
        assert!(sum.carry());
        assert!(!sum.overflow());
    }

    #[test]
    fn subtract_sets_borrow_as_carry() {
        let x = unsigned(3, 16);
        let y = unsigned(5, 16);
        let diff = x.subtract(&y, 0);
        assert!(diff.carry());
        assert_eq!(diff.to_hex_string(), "fffe");
    }

    #[test]
    fn subtract_twos_no_flags_when_clean() {
        let x = twos(100, 16);
        let y = twos(42, 16);
        let diff = x.subtract(&y, 0);
        assert_eq!(diff.to_i64().0, 58);
        assert!(!diff.carry());
        assert!(!diff.overflow());
    }

    #[test]
    fn multiply_flags_overflow() {
        let x = unsigned(0x100, 16);
        let y = unsigned(0x100, 16);
        let prod = x.multiply(&y, 0);
        assert!(prod.is_zero());
        assert!(prod.overflow());

        let small = unsigned(12, 16).multiply(&unsigned(12, 16), 0);
        assert_eq!(small.to_i64().0, 144);
        assert!(!small.overflow());
    }

    #[test]
    fn multiply_signed_low_bits() {
        let x = twos(-3, 16);
        let y = twos(5, 16);
        let prod = x.multiply(&y, 0);
        assert_eq!(prod.to_i64().0, -15);
    }

    #[test]
    fn divide_basic_and_remainder_carry() {
        let x = unsigned(100, 16);
        let y = unsigned(7, 16);
        let q = x.divide(&y, 0);
        assert_eq!(q.to_i64().0, 14);
        assert!(q.carry(), "non-zero remainder sets carry");

        let exact = unsigned(100, 16).divide(&unsigned(4, 16), 0);
        assert_eq!(exact.to_i64().0, 25);
        assert!(!exact.carry());
    }

    #[test]
    fn divide_by_zero_flags_overflow() {
        let x = unsigned(5, 16);
        let q = x.divide(&unsigned(0, 16), 0);
        assert!(q.is_zero());
        assert!(q.overflow());
    }

    #[test]
    fn divide_signed_quotient() {
        let q = twos(-100, 16).divide(&twos(7, 16), 0);
        assert_eq!(q.to_i64().0, -14);
        let q2 = twos(-100, 16).divide(&twos(-7, 16), 0);
        assert_eq!(q2.to_i64().0, 14);
    }

    #[test]
    fn divide_small_by_large() {
        let q = unsigned(3, 16).divide(&unsigned(10, 16), 0);
        assert!(q.is_zero());
        assert!(q.carry());
    }

    #[test]
    fn remainder_takes_dividend_sign() {
        let r = twos(-100, 16).remainder(&twos(7, 16), 0);
        assert_eq!(r.to_i64().0, -2);
        let r2 = twos(100, 16).remainder(&twos(-7, 16), 0);
        assert_eq!(r2.to_i64().0, 2);
    }

    #[test]
    fn remainder_by_zero_flags_overflow() {
        let r = unsigned(5, 16).remainder(&unsigned(0, 16), 0);
        assert!(r.is_zero());
        assert!(r.overflow());
    }

    #[test]
    fn remainder_multibyte() {
        let r = unsigned(100_000, 32).remainder(&unsigned(30_000, 32), 0);
        assert_eq!(r.to_i64().0, 10_000);
    }

    #[test]
    fn power_cases() {
        assert_eq!(unsigned(2, 16).power(&unsigned(10, 16), 0).to_i64().0, 1024);
        assert_eq!(unsigned(7, 16).power(&unsigned(0, 16), 0).to_i64().0, 1);
        assert_eq!(unsigned(7, 16).power(&unsigned(1, 16), 0).to_i64().0, 7);
        let over = unsigned(2, 8).power(&unsigned(9, 8), 0);
        assert!(over.overflow());
    }

    #[test]
    fn square_root_perfect_and_rounded() {
        let r = unsigned(144, 16).square_root(16);
        assert_eq!(r.to_i64().0, 12);
        assert!(!r.carry());

        let r2 = unsigned(150, 16).square_root(16);
        assert_eq!(r2.to_i64().0, 12);
        assert!(r2.carry(), "non-perfect square sets carry");
    }

    #[test]
    fn square_root_rejects_negative() {
        let r = twos(-4, 16).square_root(16);
        assert!(r.is_zero());
        assert!(r.overflow());
    }

    #[test]
    fn bitwise_ops() {
        let x = unsigned(0b1100, 8);
        let y = unsigned(0b1010, 8);
        assert_eq!(x.bit_and(&y, 0).to_i64().0, 0b1000);
        assert_eq!(x.bit_or(&y, 0).to_i64().0, 0b1110);
        assert_eq!(x.bit_xor(&y, 0).to_i64().0, 0b0110);

        let mut n = unsigned(0b1100, 8);
        n.complement(8);
        assert_eq!(n.to_i64().0, 0xF3);
    }

    #[test]
    fn shifts_track_carry() {
        let mut x = unsigned(0x81, 8);
        x.shift_left(1, 8);
        assert_eq!(x.to_i64().0, 0x02);
        assert!(x.carry());

        let mut y = unsigned(0x81, 8);
        y.shift_right(1, false, 8);
        assert_eq!(y.to_i64().0, 0x40);
        assert!(y.carry());
    }

    #[test]
    fn arithmetic_shift_right_keeps_sign() {
        let mut x = twos(-8, 8);
        x.shift_right(1, true, 8);
        assert_eq!(x.to_i64().0, -4);
    }

    #[test]
    fn rotate_right_wraps_low_bit() {
        let mut x = unsigned(0x01, 8);
        x.rotate_right(1, false, false, 8);
        assert_eq!(x.to_i64().0, 0x80);
        assert!(x.carry());
    }

    #[test]
    fn rotate_left_through_carry() {
        // RLC pulls the starting carry into bit 0 and pushes the top bit
        // into carry
        let mut x = unsigned(0x80, 8);
        x.rotate_left(1, true, true, 8);
        assert_eq!(x.to_i64().0, 0x01);
        assert!(x.carry());
    }

    #[test]
    fn full_rotation_identity() {
        let mut x = unsigned(0xA5, 8);
        x.rotate_left(8, false, false, 8);
        assert_eq!(x.to_i64().0, 0xA5);
        let mut y = unsigned(0xA5, 8);
        y.rotate_right(8, false, false, 8);
        assert_eq!(y.to_i64().0, 0xA5);
    }

    #[test]
    fn bit_set_clear_test() {
        let mut x = unsigned(0, 16);
        x.bit_set(10);
        assert!(x.bit_test(10));
        assert_eq!(x.to_i64().0, 1 << 10);
        x.bit_clear(10);
        assert!(x.is_zero());
        // out-of-word locations are ignored
        x.bit_set(300);
        assert!(x.is_zero());
    }

    #[test]
    fn sum_bits_counts() {
        let mut x = unsigned(0xF0F0, 16);
        x.sum_bits();
        assert_eq!(x.to_i64().0, 8);
        assert_eq!(x.word_size(), 16);
    }

    #[test]
    fn change_sign_modes() {
        let mut u = unsigned(1, 8);
        u.change_sign();
        assert_eq!(u.to_hex_string(), "ff");
        assert!(u.overflow());

        let mut t = twos(5, 8);
        t.change_sign();
        assert_eq!(t.to_i64().0, -5);

        let mut o = ones(5, 8);
        o.change_sign();
        assert_eq!(o.to_hex_string(), "fa");
    }

    #[test]
    fn absolute_value_most_negative() {
        let mut x = twos(-128, 8);
        x.absolute_value();
        assert!(x.overflow());
        assert_eq!(x.to_i64().0, -128);

        let mut y = twos(-5, 8);
        y.absolute_value();
        assert_eq!(y.to_i64().0, 5);
        assert!(!y.overflow());
    }

    #[test]
    fn split_and_combine_round_trip() {
        let x = unsigned(0xDEAD_BEEF, 32);
        let (low, high) = x.split().unwrap();
        assert_eq!(low.to_hex_string(), "beef");
        assert_eq!(high.to_hex_string(), "dead");
        let back = BigNum::combine(&high, &low).unwrap();
        assert_eq!(back.to_hex_string(), "deadbeef");
    }

    #[test]
    fn split_rejects_odd_size() {
        let x = unsigned(1, 15);
        assert_eq!(x.split(), Err(CoreError::OddSplit(15)));
    }

    #[test]
    fn combine_rejects_mismatched_sizes() {
        let a = unsigned(1, 8);
        let b = unsigned(1, 16);
        assert!(BigNum::combine(&a, &b).is_err());
    }

    #[test]
    fn masks_and_justification() {
        assert_eq!(BigNum::create_mask(4, false, 8).to_hex_string(), "0f");
        assert_eq!(BigNum::create_mask(4, true, 8).to_hex_string(), "f0");

        let (justified, distance) = unsigned(0x01, 8).left_justify();
        assert_eq!(justified.to_hex_string(), "80");
        assert_eq!(distance.to_i64().0, 7);
    }

    #[test]
    fn widening_sign_extends() {
        let mut x = twos(-2, 8);
        x.set_word_size(16);
        assert_eq!(x.to_i64().0, -2);
        assert_eq!(x.to_hex_string(), "fffe");

        let mut u = unsigned(0xFE, 8);
        u.set_word_size(16);
        assert_eq!(u.to_i64().0, 0xFE);
    }

    #[test]
    fn narrowing_truncates() {
        let mut x = unsigned(0x1234, 16);
        x.set_word_size(8);
        assert_eq!(x.to_i64().0, 0x34);
    }

    #[test]
    fn compare_signed_and_unsigned() {
        assert_eq!(twos(-1, 8).compare(&twos(1, 8)), Ordering::Less);
        assert_eq!(unsigned(0xFF, 8).compare(&unsigned(1, 8)), Ordering::Greater);
        assert_eq!(twos(-3, 8).compare(&twos(-5, 8)), Ordering::Greater);
        // different sizes widen before comparing
        assert_eq!(twos(-1, 8).compare(&twos(-1, 16)), Ordering::Equal);
    }

    #[test]
    fn parse_radix_strings() {
        let h = BigNum::parse("&hff", 16, ArithMode::Unsigned);
        assert_eq!(h.to_i64().0, 0xFF);
        assert!(!h.loss_of_precision());

        let o = BigNum::parse("&o17", 16, ArithMode::Unsigned);
        assert_eq!(o.to_i64().0, 0o17);

        let b = BigNum::parse("&b1010", 16, ArithMode::Unsigned);
        assert_eq!(b.to_i64().0, 10);
    }

    #[test]
    fn parse_decimal_and_negative() {
        let d = BigNum::parse("1234", 16, ArithMode::Unsigned);
        assert_eq!(d.to_i64().0, 1234);

        let n = BigNum::parse("-12", 16, ArithMode::TwosComplement);
        assert_eq!(n.to_i64().0, -12);
    }

    #[test]
    fn parse_stops_at_foreign_character() {
        // scans right to left, so the fraction wins
        let d = BigNum::parse("123.45", 16, ArithMode::Unsigned);
        assert_eq!(d.to_i64().0, 45);
    }

    #[test]
    fn parse_flags_loss_of_precision() {
        let h = BigNum::parse("&h1ff", 8, ArithMode::Unsigned);
        assert_eq!(h.to_i64().0, 0xFF);
        assert!(h.loss_of_precision());

        let fit = BigNum::parse("&hff", 8, ArithMode::Unsigned);
        assert!(!fit.loss_of_precision());
    }

    #[test]
    fn radix_strings_round_trip() {
        let x = unsigned(0xBEEF, 16);
        assert_eq!(x.to_hex_string(), "beef");
        assert_eq!(x.to_bin_string(false).len(), 16);
        assert_eq!(x.to_bin_string(true), "10111110 11101111");
        assert_eq!(unsigned(0o777, 9).to_oct_string(), "777");
    }

    #[test]
    fn dec_string_negative() {
        let x = twos(-2, 16);
        assert_eq!(x.to_dec_string().trim_start_matches(['-', '0']), "2");
        assert!(x.to_dec_string().starts_with('-'));
        let u = unsigned(65534, 16);
        assert!(u.to_dec_string().ends_with("65534"));
    }

    #[test]
    fn odd_word_sizes_mask() {
        let x = unsigned(0xFFFF, 12);
        assert_eq!(x.to_i64().0, 0xFFF);
        assert_eq!(x.to_hex_string(), "fff");
        assert_eq!(x.to_bin_string(false).len(), 12);
    }

    #[test]
    fn from_f64_out_of_range() {
        let x = BigNum::from_f64(1e300, 64, ArithMode::TwosComplement);
        assert!(x.is_zero());
        assert!(x.loss_of_precision());

        let y = BigNum::from_f64(-42.7, 16, ArithMode::TwosComplement);
        assert_eq!(y.to_i64().0, -42);
    }
}
