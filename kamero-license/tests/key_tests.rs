mod common;

use chrono::NaiveDate;
use common::{FIXTURE_KEY, NEW_YEAR_KEY, UNREADABLE_KEY};
use kamero_license::{
    extract_date_from_key, extract_date_from_key_in_year, generate_canonical_key_from_date,
    ALPHABET, KEY_LEN,
};
use pretty_assertions::assert_eq;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

// ── Generation ───────────────────────────────────────────────────

#[test]
fn fixture_key() {
    // seed 01052025 hashes to 399, so the date sits in the last segment
    assert_eq!(generate_canonical_key_from_date(date(2025, 5, 1)), FIXTURE_KEY);
}

#[test]
fn known_keys() {
    assert_eq!(generate_canonical_key_from_date(date(2026, 1, 1)), NEW_YEAR_KEY);
    assert_eq!(
        generate_canonical_key_from_date(date(2025, 1, 2)),
        "A3GW-5EQ2-KW8H-2EN0"
    );
    assert_eq!(
        generate_canonical_key_from_date(date(2025, 5, 9)),
        UNREADABLE_KEY
    );
}

#[test]
fn generation_is_deterministic() {
    let d = date(2026, 10, 19);
    let first = generate_canonical_key_from_date(d);
    for _ in 0..10 {
        assert_eq!(generate_canonical_key_from_date(d), first);
    }
}

#[test]
fn key_shape() {
    let mut d = date(2025, 1, 1);
    while d < date(2027, 1, 1) {
        let key = generate_canonical_key_from_date(d);
        assert_eq!(key.len(), KEY_LEN, "{key}");
        for (i, c) in key.chars().enumerate() {
            if i % 5 == 4 {
                assert_eq!(c, '-', "{key}");
            } else {
                assert!(ALPHABET.contains(&(c as u8)), "{key}");
            }
        }
        d = d.succ_opt().unwrap();
    }
}

#[test]
fn year_changes_the_key() {
    assert_ne!(
        generate_canonical_key_from_date(date(2025, 3, 14)),
        generate_canonical_key_from_date(date(2026, 3, 14))
    );
}

#[test]
fn consecutive_days_differ() {
    assert_ne!(
        generate_canonical_key_from_date(date(2026, 1, 1)),
        generate_canonical_key_from_date(date(2026, 1, 2))
    );
}

// ── Extraction ───────────────────────────────────────────────────

#[test]
fn extracts_issue_date_in_given_year() {
    assert_eq!(
        extract_date_from_key_in_year(NEW_YEAR_KEY, 2026),
        Some(date(2026, 1, 1))
    );
    assert_eq!(
        extract_date_from_key_in_year("A3GW-5EQ2-KW8H-2EN0", 2025),
        Some(date(2025, 1, 2))
    );
}

#[test]
fn year_comes_from_caller_not_key() {
    assert_eq!(
        extract_date_from_key_in_year(NEW_YEAR_KEY, 2031),
        Some(date(2031, 1, 1))
    );
}

#[test]
fn fixture_key_reads_a_filler_segment() {
    // AQGC does not decode, but the filler 4EU2 reads as 20/11.
    assert_eq!(
        extract_date_from_key_in_year(FIXTURE_KEY, 2025),
        Some(date(2025, 11, 20))
    );
}

#[test]
fn freshly_issued_key_may_not_decode() {
    assert_eq!(
        generate_canonical_key_from_date(date(2025, 5, 9)),
        UNREADABLE_KEY
    );
    assert_eq!(extract_date_from_key_in_year(UNREADABLE_KEY, 2025), None);
}

#[test]
fn day_past_month_end_rolls_over() {
    // 7QG9 decodes to 3102
    assert_eq!(
        extract_date_from_key_in_year("7QG9-9999-9999-9999", 2025),
        Some(date(2025, 3, 3))
    );
    assert_eq!(
        extract_date_from_key_in_year("7QG9-9999-9999-9999", 2024),
        Some(date(2024, 3, 2))
    );
}

#[test]
fn rejects_wrong_segment_count() {
    assert_eq!(extract_date_from_key_in_year("AQGW-4EQ2-KW8H", 2026), None);
    assert_eq!(extract_date_from_key_in_year("AQGW-4EQ2-KW8H-2EN0-AAAA", 2026), None);
    assert_eq!(extract_date_from_key_in_year("AQGW4EQ2KW8H2EN0", 2026), None);
    assert_eq!(extract_date_from_key_in_year("", 2026), None);
}

#[test]
fn rejects_keys_without_a_date() {
    assert_eq!(extract_date_from_key_in_year("9999-9999-9999-9999", 2026), None);
}

#[test]
fn skips_segments_with_impossible_month() {
    // MY8O reads as 12/20, which is skipped; 4EU2 then reads as 20/11.
    assert_eq!(
        extract_date_from_key_in_year("MY8O-4EU2-9999-9999", 2026),
        Some(date(2026, 11, 20))
    );
}

#[test]
fn current_year_variant_agrees() {
    use chrono::{Datelike, Local};
    let year = Local::now().year();
    assert_eq!(
        extract_date_from_key(NEW_YEAR_KEY),
        extract_date_from_key_in_year(NEW_YEAR_KEY, year)
    );
}
