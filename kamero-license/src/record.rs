//! The persisted license record and its lifecycle states.

use crate::device::DeviceFingerprint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a license is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseState {
    /// No key has been issued yet.
    Unissued,
    /// A key is bound to a device but not activated, or was invalidated.
    Bound,
    /// The bound device completed activation.
    Activated,
    /// The activation deadline has passed.
    Expired,
}

/// The single license row of an installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseRecord {
    /// The last issued canonical key.
    pub key: Option<String>,
    /// Fingerprint of the machine the key was issued to.
    pub bound_device_id: Option<String>,
    /// Activation deadline.
    pub expires_at: DateTime<Utc>,
    /// Whether a matching key and app id were submitted.
    pub activated: bool,
}

impl LicenseRecord {
    /// The row as seeded at install time.
    #[must_use]
    pub fn seeded(now: DateTime<Utc>) -> Self {
        Self {
            key: None,
            bound_device_id: None,
            expires_at: now,
            activated: false,
        }
    }

    /// Returns the lifecycle state as of `now`.
    #[must_use]
    pub fn state(&self, now: DateTime<Utc>) -> LicenseState {
        if self.key.is_none() {
            LicenseState::Unissued
        } else if self.is_expired(now) {
            LicenseState::Expired
        } else if self.activated {
            LicenseState::Activated
        } else {
            LicenseState::Bound
        }
    }

    /// Returns true if the host application may run.
    ///
    /// An activated license stays usable past its deadline; the deadline only
    /// gates activation itself.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.key.is_some() && self.activated
    }

    /// Returns true once `now` is past the deadline.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Returns true if the record is bound to `device`.
    #[must_use]
    pub fn is_bound_to(&self, device: &DeviceFingerprint) -> bool {
        self.bound_device_id.as_deref() == Some(device.id())
    }
}
