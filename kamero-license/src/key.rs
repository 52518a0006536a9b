//! Canonical product keys.
//!
//! A key is four hyphen-joined segments over [`ALPHABET`](crate::ALPHABET):
//!
//! ```text
//! MY8O-4EU2-K08H-AQGC
//! ```
//!
//! Exactly one segment carries the obfuscated `ddmm` issue date. Which one is
//! chosen by `hash_seed(ddmmyyyy) % 4`; the other three are filler derived
//! from the same seed. The year is part of the seed but is never encoded, so
//! reading a date back always assumes the current year.
//!
//! Extraction scans all four segments and takes the first one that decodes to
//! a plausible day and month. A filler segment can win that race, and the
//! real date segment may not decode at all, so an extracted date is a hint
//! for display rather than a verified issue date.

use crate::date_codec::{decode_date_segment, encode_digits, SEGMENT_LEN};
use crate::segment::{hash_seed, segment_from_units};
use chrono::{Datelike, Days, Local, NaiveDate};

/// Number of segments in a key.
pub const KEY_SEGMENTS: usize = 4;

/// Length of a canonical key including separators.
pub const KEY_LEN: usize = KEY_SEGMENTS * SEGMENT_LEN + KEY_SEGMENTS - 1;

/// Separator between key segments.
pub const SEGMENT_SEPARATOR: char = '-';

/// Derives the canonical key for a calendar date.
///
/// The result depends only on the day, month and year.
#[must_use]
pub fn generate_canonical_key_from_date(date: NaiveDate) -> String {
    let (day, month) = (date.day(), date.month());
    let seed = format!("{day:02}{month:02}{}", date.year());
    let units: Vec<u16> = seed.encode_utf16().collect();
    let date_segment_index = (hash_seed(&seed) % KEY_SEGMENTS as u32) as usize;

    let segments: Vec<String> = (0..KEY_SEGMENTS)
        .map(|i| {
            if i == date_segment_index {
                encode_digits(date_digits(day, month))
            } else {
                segment_from_units(&units, i)
            }
        })
        .collect();

    segments.join(&SEGMENT_SEPARATOR.to_string())
}

/// Reads the issue date back out of a key, assuming the current local year.
///
/// Returns `None` when the key does not have exactly four segments or when no
/// segment decodes to a day in `1..=31` and a month in `1..=12`. A key issued
/// moments ago can legitimately return `None`.
#[must_use]
pub fn extract_date_from_key(key: &str) -> Option<NaiveDate> {
    extract_date_from_key_in_year(key, Local::now().year())
}

/// Like [`extract_date_from_key`] with an explicit year.
///
/// A day past the end of the month rolls into the next month (31/02 becomes
/// 3 March in a common year).
#[must_use]
pub fn extract_date_from_key_in_year(key: &str, year: i32) -> Option<NaiveDate> {
    let parts: Vec<&str> = key.split(SEGMENT_SEPARATOR).collect();
    if parts.len() != KEY_SEGMENTS {
        return None;
    }

    parts.iter().find_map(|part| {
        let decoded = decode_date_segment(part)?;
        let day: u32 = decoded[..2].parse().ok()?;
        let month: u32 = decoded[2..].parse().ok()?;
        if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month, 1)?.checked_add_days(Days::new(u64::from(day - 1)))
    })
}

fn date_digits(day: u32, month: u32) -> [u8; SEGMENT_LEN] {
    [day / 10, day % 10, month / 10, month % 10].map(|d| d as u8)
}
