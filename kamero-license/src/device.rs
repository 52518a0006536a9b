//! Device fingerprinting for license binding.
//!
//! The fingerprint is the first eight hex characters of
//! `sha256(sha256_hex(machine_id))`, where the machine id is the platform's
//! stable identifier, lowercased with whitespace removed. The inner hash
//! matches what earlier releases read from the host, so a machine keeps the
//! same fingerprint across upgrades.

use crate::error::{LicenseError, LicenseResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use tracing::warn;

/// Number of hex characters kept from the digest.
pub const FINGERPRINT_LEN: usize = 8;

/// Characters per group in [`format_key`] output.
const GROUP_LEN: usize = 4;

/// A stable fingerprint that identifies this device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceFingerprint {
    id: String,
}

impl DeviceFingerprint {
    /// Generates a fingerprint for the current device.
    #[must_use]
    pub fn generate() -> Self {
        Self::from_machine_id(&host_identifier())
    }

    /// Derives a fingerprint from a raw machine identifier.
    #[must_use]
    pub fn from_machine_id(raw: &str) -> Self {
        let normalized: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        let machine_hash = sha256_hex(normalized.as_bytes());
        let digest = sha256_hex(machine_hash.as_bytes());

        Self {
            id: digest[..FINGERPRINT_LEN].to_string(),
        }
    }

    /// Wraps an already-derived fingerprint id.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Validation`] unless `id` is eight lowercase hex
    /// characters.
    pub fn from_id(id: &str) -> LicenseResult<Self> {
        let well_formed = id.len() == FINGERPRINT_LEN
            && id.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !well_formed {
            return Err(LicenseError::Validation(format!(
                "device id must be {FINGERPRINT_LEN} lowercase hex characters"
            )));
        }
        Ok(Self { id: id.to_string() })
    }

    /// Returns the fingerprint ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The grouped, uppercase form users type in as their app id.
    #[must_use]
    pub fn app_id(&self) -> String {
        format_key(&self.id)
    }

    /// Validates that this fingerprint matches the current device.
    #[must_use]
    pub fn matches_current(&self) -> bool {
        *self == Self::generate()
    }
}

impl fmt::Display for DeviceFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Where the running machine's fingerprint comes from.
pub trait FingerprintSource: Send + Sync {
    /// Returns the fingerprint of the machine as it is right now.
    fn fingerprint(&self) -> DeviceFingerprint;
}

/// Reads the fingerprint from the host on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostFingerprint;

impl FingerprintSource for HostFingerprint {
    fn fingerprint(&self) -> DeviceFingerprint {
        DeviceFingerprint::generate()
    }
}

impl FingerprintSource for DeviceFingerprint {
    fn fingerprint(&self) -> DeviceFingerprint {
        self.clone()
    }
}

/// Canonicalizes user input into hyphen-joined groups of four.
///
/// Everything but ASCII letters and digits is dropped and letters are
/// uppercased. The last group may be shorter. Used for both product keys and
/// app ids.
#[must_use]
pub fn format_key(raw: &str) -> String {
    let cleaned: Vec<char> = raw
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect();

    cleaned
        .chunks(GROUP_LEN)
        .map(|group| group.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("-")
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// The platform machine id, or the hostname when none can be read.
fn host_identifier() -> String {
    get_machine_id().unwrap_or_else(|| {
        let hostname = get_hostname();
        warn!(%hostname, "no machine id available, fingerprinting by hostname");
        hostname
    })
}

/// Gets the machine hostname.
fn get_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Gets the machine ID (platform-specific unique identifier).
fn get_machine_id() -> Option<String> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("ioreg")
            .args(["-rd1", "-c", "IOPlatformExpertDevice"])
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .and_then(|output| {
                output
                    .split("IOPlatformUUID")
                    .nth(1)
                    .and_then(|rest| rest.lines().next())
                    .map(|line| line.replace(['=', '"'], ""))
            })
            .filter(|id| !id.trim().is_empty())
    }

    #[cfg(target_os = "linux")]
    {
        // dbus first, then systemd; only the first line counts
        ["/var/lib/dbus/machine-id", "/etc/machine-id"]
            .iter()
            .find_map(|path| std::fs::read_to_string(path).ok())
            .and_then(|content| content.lines().next().map(str::to_string))
            .filter(|id| !id.trim().is_empty())
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("REG")
            .args([
                "QUERY",
                r"HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Cryptography",
                "/v",
                "MachineGuid",
            ])
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .and_then(|output| output.split("REG_SZ").nth(1).map(str::to_string))
            .filter(|id| !id.trim().is_empty())
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        None
    }
}
