//! Date segment obfuscation.
//!
//! A `ddmm` date code is mapped digit by digit through `d -> (13d + 3i) mod 36`
//! into [`ALPHABET`], where `i` is the digit's position. The inverse rounds
//! `(index - 3i) / 13` back to a digit and never undoes the modulo, so some
//! encodings cannot be decoded: a `5` in the last position encodes to `C`
//! (index 2), which back-solves to `-1`.
//!
//! Both formulas are fixed by keys already in the field.

/// The 36 symbols a key is written in: `A-Z` followed by `0-9`.
pub const ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of every key segment.
pub const SEGMENT_LEN: usize = 4;

const DIGIT_STEP: i32 = 13;
const POSITION_STEP: i32 = 3;

/// Encodes a four-digit `ddmm` date code into a four-character segment.
///
/// Returns `None` unless `date_code` is exactly four ASCII digits.
#[must_use]
pub fn encode_date_segment(date_code: &str) -> Option<String> {
    let bytes = date_code.as_bytes();
    if bytes.len() != SEGMENT_LEN || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }

    let mut digits = [0u8; SEGMENT_LEN];
    for (digit, byte) in digits.iter_mut().zip(bytes) {
        *digit = byte - b'0';
    }
    Some(encode_digits(digits))
}

pub(crate) fn encode_digits(digits: [u8; SEGMENT_LEN]) -> String {
    digits
        .iter()
        .enumerate()
        .map(|(i, &d)| {
            let index = (i32::from(d) * DIGIT_STEP + position(i) * POSITION_STEP)
                .rem_euclid(ALPHABET.len() as i32);
            char::from(ALPHABET[index as usize])
        })
        .collect()
}

/// Decodes a segment back into a four-digit `ddmm` string.
///
/// Returns `None` when any position back-solves to something outside `0..=9`.
/// Characters outside the alphabet, and positions missing from a short
/// segment, count as index `-1`. Only the first four characters are read.
#[must_use]
pub fn decode_date_segment(segment: &str) -> Option<String> {
    let mut chars = segment.chars();
    let mut decoded = String::with_capacity(SEGMENT_LEN);

    for i in 0..SEGMENT_LEN {
        let index = chars.next().map_or(-1, alphabet_index);
        let digit = round_half_up(index - position(i) * POSITION_STEP, DIGIT_STEP);
        if !(0..=9).contains(&digit) {
            return None;
        }
        decoded.push(char::from(b'0' + digit as u8));
    }

    Some(decoded)
}

/// Position of `c` in [`ALPHABET`], or `-1`.
pub(crate) fn alphabet_index(c: char) -> i32 {
    ALPHABET
        .iter()
        .position(|&symbol| char::from(symbol) == c)
        .map_or(-1, |p| p as i32)
}

/// `round(n / d)` with halves going toward positive infinity. `d` must be positive.
fn round_half_up(n: i32, d: i32) -> i32 {
    (2 * n + d).div_euclid(2 * d)
}

fn position(i: usize) -> i32 {
    i as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_matches_half_up() {
        assert_eq!(round_half_up(0, 13), 0);
        assert_eq!(round_half_up(6, 13), 0);
        assert_eq!(round_half_up(7, 13), 1);
        assert_eq!(round_half_up(-1, 13), 0);
        assert_eq!(round_half_up(-6, 13), 0);
        assert_eq!(round_half_up(-7, 13), -1);
        assert_eq!(round_half_up(21, 13), 2);
    }

    #[test]
    fn alphabet_lookup() {
        assert_eq!(alphabet_index('A'), 0);
        assert_eq!(alphabet_index('Z'), 25);
        assert_eq!(alphabet_index('0'), 26);
        assert_eq!(alphabet_index('9'), 35);
        assert_eq!(alphabet_index('a'), -1);
        assert_eq!(alphabet_index('-'), -1);
    }
}
