//! Key issuance and activation.
//!
//! ```text
//! Unissued --issue--> Bound --activate--> Activated
//!                       ^                     |
//!                       +----- monitor -------+   (device changed)
//! ```
//!
//! Issuing on a new calendar day replaces the key, restarts the deadline and
//! resets the host's business data. Issuing again on the same day only
//! rebinds the device. Activation checks its inputs in a fixed order (empty
//! fields, app id, key shape, stored key, deadline) so callers always get the
//! same error for the same request.

use crate::config::LicenseConfig;
use crate::device::DeviceFingerprint;
use crate::error::{LicenseError, LicenseResult};
use crate::key::{extract_date_from_key_in_year, generate_canonical_key_from_date};
use crate::record::LicenseRecord;
use crate::store::{ActivationCommit, BusinessDataReset, IssueOutcome, LicenseStore};
use chrono::{DateTime, Datelike, Days, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// A key handed out by [`ActivationGate::issue`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedKey {
    /// The canonical key for the issue date.
    pub key: String,
    /// The device the key is now bound to.
    pub device_id: String,
    /// Activation deadline.
    pub expires_at: DateTime<Utc>,
    /// True if the key already existed and only the device was rebound.
    pub reissued: bool,
}

/// A successful activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activation {
    /// The date read back from the key, in the current year.
    pub original_date: NaiveDate,
    /// Activation deadline of the record.
    pub expires_at: DateTime<Utc>,
}

/// Issues keys and activates them against a [`LicenseStore`].
#[derive(Debug)]
pub struct ActivationGate<S, R = ()> {
    store: S,
    reset: R,
    config: LicenseConfig,
}

impl<S: LicenseStore> ActivationGate<S> {
    /// Creates a gate with the default config and no business-data reset.
    pub fn new(store: S) -> Self {
        Self {
            store,
            reset: (),
            config: LicenseConfig::default(),
        }
    }
}

impl<S: LicenseStore, R: BusinessDataReset> ActivationGate<S, R> {
    /// Runs `reset` whenever a new key replaces the old one.
    pub fn with_reset<R2: BusinessDataReset>(self, reset: R2) -> ActivationGate<S, R2> {
        ActivationGate {
            store: self.store,
            reset,
            config: self.config,
        }
    }

    /// Replaces the config.
    #[must_use]
    pub fn with_config(mut self, config: LicenseConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the config.
    pub fn config(&self) -> &LicenseConfig {
        &self.config
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Issues today's key to `device`.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Storage`] if the store or the reset fails. A
    /// failed reset leaves the record as it was before the call.
    pub fn issue(&self, device: &DeviceFingerprint) -> LicenseResult<IssuedKey> {
        self.issue_at(device, Local::now())
    }

    /// Issues the key for `now`'s calendar date to `device`.
    ///
    /// The date is taken in `now`'s own time zone.
    pub fn issue_at<Tz: TimeZone>(
        &self,
        device: &DeviceFingerprint,
        now: DateTime<Tz>,
    ) -> LicenseResult<IssuedKey> {
        let key = generate_canonical_key_from_date(now.date_naive());
        let deadline = now
            .checked_add_days(Days::new(self.config.validity_days))
            .ok_or_else(|| LicenseError::Internal("activation deadline out of range".into()))?
            .with_timezone(&Utc);

        match self.store.issue(&key, deadline, device.id())? {
            IssueOutcome::Rebound { expires_at } => {
                debug!(device = %device, "key already issued today, device rebound");
                Ok(IssuedKey {
                    key,
                    device_id: device.id().to_string(),
                    expires_at,
                    reissued: true,
                })
            }
            IssueOutcome::Issued {
                expires_at,
                replaced,
            } => {
                if let Err(err) = self.reset.reset_business_data() {
                    // the next issue must see a new key again and retry the reset
                    warn!(error = %err, "business data reset failed, restoring previous key");
                    self.store.revert_issue(&key, &replaced)?;
                    return Err(err);
                }
                info!(device = %device, %expires_at, "new license key issued");
                Ok(IssuedKey {
                    key,
                    device_id: device.id().to_string(),
                    expires_at,
                    reissued: false,
                })
            }
        }
    }

    /// Activates `key` on `device`, where `app_id` is what the user typed as
    /// this machine's id.
    ///
    /// Activating an already activated record with the same key succeeds
    /// again.
    ///
    /// # Errors
    ///
    /// - [`LicenseError::Validation`] if `key` or `app_id` is empty
    /// - [`LicenseError::DeviceMismatch`] if `app_id` is not `device`'s app id
    /// - [`LicenseError::InvalidKeyFormat`] if no date can be read from `key`
    /// - [`LicenseError::NotFound`] if `key` is not the issued key
    /// - [`LicenseError::Expired`] if the deadline has passed
    pub fn activate(
        &self,
        key: &str,
        app_id: &str,
        device: &DeviceFingerprint,
    ) -> LicenseResult<Activation> {
        self.activate_at(key, app_id, device, Local::now())
    }

    /// Like [`activate`](Self::activate) at a given instant. The decoded date
    /// takes its year from `now` in `now`'s time zone.
    pub fn activate_at<Tz: TimeZone>(
        &self,
        key: &str,
        app_id: &str,
        device: &DeviceFingerprint,
        now: DateTime<Tz>,
    ) -> LicenseResult<Activation> {
        if key.is_empty() || app_id.is_empty() {
            return Err(LicenseError::Validation("key and app id are required".into()));
        }

        if app_id != device.app_id() {
            warn!(device = %device, "activation refused: app id does not match this device");
            return Err(LicenseError::DeviceMismatch);
        }

        let original_date = extract_date_from_key_in_year(key, now.year()).ok_or_else(|| {
            LicenseError::InvalidKeyFormat("no segment decodes to a date".into())
        })?;

        match self.store.activate(key, now.with_timezone(&Utc))? {
            ActivationCommit::Activated { expires_at } => {
                info!(device = %device, %original_date, "license activated");
                Ok(Activation {
                    original_date,
                    expires_at,
                })
            }
            ActivationCommit::UnknownKey => {
                warn!(device = %device, "activation refused: key was not issued");
                Err(LicenseError::NotFound)
            }
            ActivationCommit::Expired { expires_at } => {
                warn!(device = %device, %expires_at, "activation refused: key expired");
                Err(LicenseError::Expired(expires_at.to_rfc3339()))
            }
        }
    }

    /// Reads the license record.
    pub fn status(&self) -> LicenseResult<LicenseRecord> {
        self.store.load()
    }
}
