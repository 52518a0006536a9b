//! Deterministic filler segments.
//!
//! Filler segments look random but are pure arithmetic over the seed's
//! UTF-16 code units, so the same seed and index always produce the same
//! four characters.

use crate::date_codec::{ALPHABET, SEGMENT_LEN};

const INDEX_STEP: u64 = 17;
const POSITION_STEP: u64 = 11;

/// Generates the filler segment at `index` for `seed`.
///
/// Returns `None` for an empty seed.
#[must_use]
pub fn generate_segment(seed: &str, index: usize) -> Option<String> {
    let units: Vec<u16> = seed.encode_utf16().collect();
    if units.is_empty() {
        return None;
    }
    Some(segment_from_units(&units, index))
}

/// `units` must not be empty.
pub(crate) fn segment_from_units(units: &[u16], index: usize) -> String {
    (0..SEGMENT_LEN)
        .map(|j| {
            let code = u64::from(units[(j + index) % units.len()]);
            let value = code + index as u64 * INDEX_STEP + j as u64 * POSITION_STEP;
            char::from(ALPHABET[(value % ALPHABET.len() as u64) as usize])
        })
        .collect()
}

/// Sum of the seed's UTF-16 code units, wrapping at 32 bits.
#[must_use]
pub fn hash_seed(seed: &str) -> u32 {
    seed.encode_utf16()
        .fold(0u32, |acc, unit| acc.wrapping_add(u32::from(unit)))
}
