//! Storage seam for the license record.
//!
//! Every mutating method is one atomic step against the single record. The
//! gate never reads the record and writes it back in two calls, so two
//! concurrent requests cannot interleave between a check and its update.

use crate::error::{LicenseError, LicenseResult};
use crate::record::LicenseRecord;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard};

/// Result of [`LicenseStore::issue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueOutcome {
    /// The record held a different key and was replaced.
    Issued {
        /// The deadline as stored.
        expires_at: DateTime<Utc>,
        /// The record as it was before the replacement.
        replaced: LicenseRecord,
    },
    /// The record already held this key; only the device was rebound.
    Rebound {
        /// The deadline set when the key was first issued.
        expires_at: DateTime<Utc>,
    },
}

/// Result of [`LicenseStore::activate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationCommit {
    /// The record was marked activated.
    Activated {
        /// The record's deadline.
        expires_at: DateTime<Utc>,
    },
    /// The submitted key is not the stored key.
    UnknownKey,
    /// The key matches but its deadline has passed.
    Expired {
        /// The record's deadline.
        expires_at: DateTime<Utc>,
    },
}

/// Persistence for the singleton [`LicenseRecord`].
pub trait LicenseStore: Send + Sync {
    /// Reads the record.
    fn load(&self) -> LicenseResult<LicenseRecord>;

    /// Binds `key` to `device_id`.
    ///
    /// If the record already holds `key`, only the device is updated.
    /// Otherwise key, deadline and device are replaced and `activated` is
    /// cleared.
    fn issue(
        &self,
        key: &str,
        expires_at: DateTime<Utc>,
        device_id: &str,
    ) -> LicenseResult<IssueOutcome>;

    /// Marks the record activated if it holds `key` and `now` is not past its
    /// deadline. The check and the write happen as one step.
    fn activate(&self, key: &str, now: DateTime<Utc>) -> LicenseResult<ActivationCommit>;

    /// Clears `activated` if the record is not bound to `device_id`.
    ///
    /// Returns true when the bound device differed.
    fn invalidate_unless_bound_to(&self, device_id: &str) -> LicenseResult<bool>;

    /// Puts `previous` back if the record still holds `key`.
    ///
    /// Undoes an [`IssueOutcome::Issued`] whose follow-up failed. Returns
    /// false when the record has moved on and was left alone.
    fn revert_issue(&self, key: &str, previous: &LicenseRecord) -> LicenseResult<bool>;
}

impl<T: LicenseStore + ?Sized> LicenseStore for Arc<T> {
    fn load(&self) -> LicenseResult<LicenseRecord> {
        (**self).load()
    }

    fn issue(
        &self,
        key: &str,
        expires_at: DateTime<Utc>,
        device_id: &str,
    ) -> LicenseResult<IssueOutcome> {
        (**self).issue(key, expires_at, device_id)
    }

    fn activate(&self, key: &str, now: DateTime<Utc>) -> LicenseResult<ActivationCommit> {
        (**self).activate(key, now)
    }

    fn invalidate_unless_bound_to(&self, device_id: &str) -> LicenseResult<bool> {
        (**self).invalidate_unless_bound_to(device_id)
    }

    fn revert_issue(&self, key: &str, previous: &LicenseRecord) -> LicenseResult<bool> {
        (**self).revert_issue(key, previous)
    }
}

impl<T: LicenseStore + ?Sized> LicenseStore for &T {
    fn load(&self) -> LicenseResult<LicenseRecord> {
        (**self).load()
    }

    fn issue(
        &self,
        key: &str,
        expires_at: DateTime<Utc>,
        device_id: &str,
    ) -> LicenseResult<IssueOutcome> {
        (**self).issue(key, expires_at, device_id)
    }

    fn activate(&self, key: &str, now: DateTime<Utc>) -> LicenseResult<ActivationCommit> {
        (**self).activate(key, now)
    }

    fn invalidate_unless_bound_to(&self, device_id: &str) -> LicenseResult<bool> {
        (**self).invalidate_unless_bound_to(device_id)
    }

    fn revert_issue(&self, key: &str, previous: &LicenseRecord) -> LicenseResult<bool> {
        (**self).revert_issue(key, previous)
    }
}

/// Clears the host application's business data when a new key is issued.
///
/// A new key means a fresh install, so products, orders, customers and the
/// like are dropped. The data belongs to the host; the gate only triggers it.
pub trait BusinessDataReset: Send + Sync {
    /// Deletes the host's business data.
    fn reset_business_data(&self) -> LicenseResult<()>;
}

/// No business data to reset.
impl BusinessDataReset for () {
    fn reset_business_data(&self) -> LicenseResult<()> {
        Ok(())
    }
}

impl<T: BusinessDataReset + ?Sized> BusinessDataReset for Arc<T> {
    fn reset_business_data(&self) -> LicenseResult<()> {
        (**self).reset_business_data()
    }
}

/// A [`LicenseStore`] held in process memory.
///
/// Each operation runs under one lock, which gives it the same atomicity as a
/// single-row transaction.
#[derive(Debug)]
pub struct MemoryLicenseStore {
    record: Mutex<LicenseRecord>,
}

impl MemoryLicenseStore {
    /// Creates a store holding a freshly seeded record.
    #[must_use]
    pub fn new() -> Self {
        Self::with_record(LicenseRecord::seeded(Utc::now()))
    }

    /// Creates a store holding `record`.
    #[must_use]
    pub fn with_record(record: LicenseRecord) -> Self {
        Self {
            record: Mutex::new(record),
        }
    }

    fn lock(&self) -> LicenseResult<MutexGuard<'_, LicenseRecord>> {
        self.record
            .lock()
            .map_err(|e| LicenseError::Storage(format!("license record lock poisoned: {e}")))
    }
}

impl Default for MemoryLicenseStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LicenseStore for MemoryLicenseStore {
    fn load(&self) -> LicenseResult<LicenseRecord> {
        Ok(self.lock()?.clone())
    }

    fn issue(
        &self,
        key: &str,
        expires_at: DateTime<Utc>,
        device_id: &str,
    ) -> LicenseResult<IssueOutcome> {
        let mut record = self.lock()?;
        let previous_device = record.bound_device_id.replace(device_id.to_string());

        if record.key.as_deref() == Some(key) {
            return Ok(IssueOutcome::Rebound {
                expires_at: record.expires_at,
            });
        }

        let replaced = LicenseRecord {
            bound_device_id: previous_device,
            ..record.clone()
        };
        record.key = Some(key.to_string());
        record.expires_at = expires_at;
        record.activated = false;
        Ok(IssueOutcome::Issued {
            expires_at,
            replaced,
        })
    }

    fn activate(&self, key: &str, now: DateTime<Utc>) -> LicenseResult<ActivationCommit> {
        let mut record = self.lock()?;
        if record.key.as_deref() != Some(key) {
            return Ok(ActivationCommit::UnknownKey);
        }
        if record.is_expired(now) {
            return Ok(ActivationCommit::Expired {
                expires_at: record.expires_at,
            });
        }

        record.activated = true;
        Ok(ActivationCommit::Activated {
            expires_at: record.expires_at,
        })
    }

    fn invalidate_unless_bound_to(&self, device_id: &str) -> LicenseResult<bool> {
        let mut record = self.lock()?;
        if record.bound_device_id.as_deref() == Some(device_id) {
            return Ok(false);
        }
        record.activated = false;
        Ok(true)
    }

    fn revert_issue(&self, key: &str, previous: &LicenseRecord) -> LicenseResult<bool> {
        let mut record = self.lock()?;
        if record.key.as_deref() != Some(key) {
            return Ok(false);
        }
        *record = previous.clone();
        Ok(true)
    }
}
