use kamero_license::{
    format_key, DeviceFingerprint, FingerprintSource, HostFingerprint, LicenseError,
    FINGERPRINT_LEN,
};

fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

// ── Fingerprint ──────────────────────────────────────────────────

#[test]
fn fingerprint_generation() {
    let fp = DeviceFingerprint::generate();
    assert_eq!(fp.id().len(), FINGERPRINT_LEN);
    assert!(is_lower_hex(fp.id()));
    assert!(fp.matches_current());
}

#[test]
fn fingerprint_stability() {
    let fp1 = DeviceFingerprint::generate();
    let fp2 = DeviceFingerprint::generate();
    assert_eq!(fp1.id(), fp2.id());
}

#[test]
fn fingerprint_from_known_machine_id() {
    // sha256(sha256_hex("abc123"))[..8]
    assert_eq!(DeviceFingerprint::from_machine_id("abc123").id(), "2339de14");
}

#[test]
fn machine_id_is_normalized() {
    let plain = DeviceFingerprint::from_machine_id("abc123");
    assert_eq!(DeviceFingerprint::from_machine_id("ABC123"), plain);
    assert_eq!(DeviceFingerprint::from_machine_id(" abc 123\r\n"), plain);
}

#[test]
fn different_machines_differ() {
    let a = DeviceFingerprint::from_machine_id("4c4c4544003957108052b4c04f384833");
    let b = DeviceFingerprint::from_machine_id("4c4c4544003957108052b4c04f384834");
    assert_eq!(a.id(), "7e9c648e");
    assert_ne!(a, b);
}

#[test]
fn from_id_accepts_lower_hex() {
    let fp = DeviceFingerprint::from_id("2339de14").unwrap();
    assert_eq!(fp, DeviceFingerprint::from_machine_id("abc123"));
}

#[test]
fn from_id_rejects_malformed() {
    for bad in ["", "2339de1", "2339de145", "2339DE14", "2339de1g"] {
        assert!(
            matches!(DeviceFingerprint::from_id(bad), Err(LicenseError::Validation(_))),
            "{bad}"
        );
    }
}

#[test]
fn app_id_is_grouped_uppercase() {
    let fp = DeviceFingerprint::from_id("2339de14").unwrap();
    assert_eq!(fp.app_id(), "2339-DE14");
}

#[test]
fn display_is_raw_id() {
    let fp = DeviceFingerprint::from_id("2339de14").unwrap();
    assert_eq!(fp.to_string(), "2339de14");
}

#[test]
fn fingerprint_serializes_as_string() {
    let fp = DeviceFingerprint::from_id("2339de14").unwrap();
    let json = serde_json::to_string(&fp).unwrap();
    assert_eq!(json, "\"2339de14\"");
    let parsed: DeviceFingerprint = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, fp);
}

#[test]
fn sources() {
    let fixed = DeviceFingerprint::from_id("2339de14").unwrap();
    assert_eq!(fixed.fingerprint(), fixed);
    assert_eq!(HostFingerprint.fingerprint(), DeviceFingerprint::generate());
}

// ── format_key ───────────────────────────────────────────────────

#[test]
fn format_key_groups_by_four() {
    assert_eq!(format_key("abcdefghijklmnop"), "ABCD-EFGH-IJKL-MNOP");
    assert_eq!(format_key("2339de14"), "2339-DE14");
}

#[test]
fn format_key_strips_punctuation() {
    assert_eq!(format_key("ab-cd_ef.gh!i"), "ABCD-EFGH-I");
    assert_eq!(format_key("  aqgw 4eq2/kw8h\t2en0 "), "AQGW-4EQ2-KW8H-2EN0");
}

#[test]
fn format_key_is_idempotent_on_keys() {
    assert_eq!(format_key("AQGW-4EQ2-KW8H-2EN0"), "AQGW-4EQ2-KW8H-2EN0");
}

#[test]
fn format_key_drops_non_ascii() {
    assert_eq!(format_key("ä1b2ß"), "1B2");
}

#[test]
fn format_key_empty() {
    assert_eq!(format_key(""), "");
    assert_eq!(format_key("--__--"), "");
}
