//! Shared test helpers for license tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use kamero_license::{BusinessDataReset, DeviceFingerprint, LicenseError, LicenseResult};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Key issued on 2026-01-01. Its first segment decodes to 1 January.
pub const NEW_YEAR_KEY: &str = "AQGW-4EQ2-KW8H-2EN0";

/// Key issued on 2025-05-01. The date segment `AQGC` does not decode.
pub const FIXTURE_KEY: &str = "MY8O-4EU2-K08H-AQGC";

/// Key issued on 2025-05-09. None of its segments decode to a date.
pub const UNREADABLE_KEY: &str = "M68O-CEU2-K08H-AMGC";

/// Returns a UTC instant.
pub fn utc(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

/// Fingerprint of a machine named `name`.
pub fn device(name: &str) -> DeviceFingerprint {
    DeviceFingerprint::from_machine_id(name)
}

/// Counts how often business data was reset.
#[derive(Debug, Default)]
pub struct CountingReset {
    resets: AtomicUsize,
}

impl CountingReset {
    pub fn count(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

impl BusinessDataReset for CountingReset {
    fn reset_business_data(&self) -> LicenseResult<()> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Fails the first `failures` resets, then counts successful ones.
#[derive(Debug, Default)]
pub struct FailingReset {
    failures: AtomicUsize,
    resets: AtomicUsize,
}

impl FailingReset {
    pub fn failing(failures: usize) -> Self {
        Self {
            failures: AtomicUsize::new(failures),
            resets: AtomicUsize::new(0),
        }
    }

    pub fn count(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

impl BusinessDataReset for FailingReset {
    fn reset_business_data(&self) -> LicenseResult<()> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(LicenseError::Storage("disk full".into()));
        }
        self.resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
