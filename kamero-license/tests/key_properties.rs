//! Property-based tests for key generation and formatting.

use chrono::NaiveDate;
use kamero_license::{
    extract_date_from_key_in_year, format_key, generate_canonical_key_from_date, ALPHABET,
    KEY_LEN,
};
use proptest::prelude::*;

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (1970i32..2100, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

proptest! {
    /// The same date always yields the same key.
    #[test]
    fn key_is_deterministic(date in date_strategy()) {
        prop_assert_eq!(
            generate_canonical_key_from_date(date),
            generate_canonical_key_from_date(date)
        );
    }

    /// Keys are four groups of four alphabet characters.
    #[test]
    fn key_has_canonical_shape(date in date_strategy()) {
        let key = generate_canonical_key_from_date(date);
        prop_assert_eq!(key.len(), KEY_LEN);
        let groups: Vec<&str> = key.split('-').collect();
        prop_assert_eq!(groups.len(), 4);
        for group in groups {
            prop_assert_eq!(group.len(), 4);
            prop_assert!(group.bytes().all(|b| ALPHABET.contains(&b)));
        }
    }

    /// Canonical keys pass through format_key unchanged.
    #[test]
    fn canonical_key_is_already_formatted(date in date_strategy()) {
        let key = generate_canonical_key_from_date(date);
        prop_assert_eq!(format_key(&key), key);
    }

    /// Whatever is extracted is a real date in the requested year.
    #[test]
    fn extracted_date_uses_requested_year(date in date_strategy(), year in 1970i32..2100) {
        let key = generate_canonical_key_from_date(date);
        if let Some(extracted) = extract_date_from_key_in_year(&key, year) {
            use chrono::Datelike;
            // rollover past 31 December is impossible: day <= 31, month <= 12
            prop_assert!(extracted.year() == year);
        }
    }

    /// format_key output is uppercase alphanumeric groups of at most four,
    /// with no leading, trailing or doubled hyphens.
    #[test]
    fn format_key_invariants(raw in "[ -~]{0,64}") {
        let formatted = format_key(&raw);
        if formatted.is_empty() {
            prop_assert!(raw.chars().all(|c| !c.is_ascii_alphanumeric()));
        } else {
            prop_assert!(!formatted.starts_with('-'));
            prop_assert!(!formatted.ends_with('-'));
            let groups: Vec<&str> = formatted.split('-').collect();
            let last = groups.len() - 1;
            for (i, group) in groups.iter().enumerate() {
                prop_assert!(!group.is_empty() && group.len() <= 4);
                if i < last {
                    prop_assert_eq!(group.len(), 4);
                }
                prop_assert!(group
                    .chars()
                    .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
            }
        }
    }

    /// format_key keeps every alphanumeric character in order.
    #[test]
    fn format_key_preserves_content(raw in "[ -~]{0,64}") {
        let expected: String = raw
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_uppercase())
            .collect();
        prop_assert_eq!(format_key(&raw).replace('-', ""), expected);
    }
}
