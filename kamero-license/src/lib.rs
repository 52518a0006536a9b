//! Licensing and activation for Kamero.
//!
//! This module handles:
//! - Deterministic, date-derived product keys
//! - Hardware fingerprinting for device binding
//! - Issuing, activating and invalidating the installation's single license
//!
//! # Key Format
//!
//! Keys are four groups of four characters over `A-Z0-9`, e.g.
//! `MY8O-4EU2-K08H-AQGC`. One group is the obfuscated `ddmm` issue date,
//! the other three are filler derived from the full date. Nothing is signed:
//! the scheme keeps casual users honest and nothing more.
//!
//! # Lifecycle
//!
//! - [`ActivationGate::issue`] derives today's key and binds it to the
//!   current device
//! - [`ActivationGate::activate`] accepts the key and the device's app id
//!   before the deadline
//! - [`AccessMonitor::check`] clears activation if the bound device no longer
//!   matches the running machine
//!
//! Storage is behind [`LicenseStore`]; each of its operations is one atomic
//! step on the record.

mod config;
mod date_codec;
mod device;
mod error;
mod gate;
mod key;
mod monitor;
mod record;
mod segment;
mod store;

pub use config::LicenseConfig;
pub use date_codec::{decode_date_segment, encode_date_segment, ALPHABET, SEGMENT_LEN};
pub use device::{format_key, DeviceFingerprint, FingerprintSource, HostFingerprint, FINGERPRINT_LEN};
pub use error::{LicenseError, LicenseResult};
pub use gate::{Activation, ActivationGate, IssuedKey};
pub use key::{
    extract_date_from_key, extract_date_from_key_in_year, generate_canonical_key_from_date,
    KEY_LEN, KEY_SEGMENTS, SEGMENT_SEPARATOR,
};
pub use monitor::{AccessCheck, AccessMonitor};
pub use record::{LicenseRecord, LicenseState};
pub use segment::{generate_segment, hash_seed};
pub use store::{
    ActivationCommit, BusinessDataReset, IssueOutcome, LicenseStore, MemoryLicenseStore,
};
