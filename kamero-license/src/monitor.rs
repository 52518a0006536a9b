//! Detects a license that moved to another machine.

use crate::device::DeviceFingerprint;
use crate::error::LicenseResult;
use crate::store::LicenseStore;
use tracing::{debug, warn};

/// Result of [`AccessMonitor::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessCheck {
    /// The record is bound to this device; nothing changed.
    Matched,
    /// The record is bound elsewhere and activation was cleared.
    Invalidated,
}

/// Clears activation when the running machine is not the bound device.
///
/// Only the device is compared. The deadline is enforced by
/// [`ActivationGate::activate`](crate::ActivationGate::activate), not here.
#[derive(Debug)]
pub struct AccessMonitor<S> {
    store: S,
}

impl<S: LicenseStore> AccessMonitor<S> {
    /// Creates a monitor over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Compares `device` with the bound device and invalidates on mismatch.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Storage`](crate::LicenseError::Storage) if the
    /// store fails.
    pub fn check(&self, device: &DeviceFingerprint) -> LicenseResult<AccessCheck> {
        if self.store.invalidate_unless_bound_to(device.id())? {
            warn!(device = %device, "license bound to another device, activation cleared");
            Ok(AccessCheck::Invalidated)
        } else {
            debug!(device = %device, "access check passed");
            Ok(AccessCheck::Matched)
        }
    }
}
