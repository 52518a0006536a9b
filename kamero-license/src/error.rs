//! Error types for the licensing module.

use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// A required input was missing or empty.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The key does not decode to an issue date.
    #[error("invalid license key format: {0}")]
    InvalidKeyFormat(String),

    /// The submitted app id does not belong to this machine.
    #[error("app id does not match this device")]
    DeviceMismatch,

    /// The key is well-formed but is not the issued key.
    #[error("license key not found")]
    NotFound,

    /// License has expired.
    #[error("license expired on {0}")]
    Expired(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Anything else that should never reach a caller as-is.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LicenseError {
    /// Returns true for errors caused by the caller's input rather than by
    /// the store or the host.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Storage(_) | Self::Internal(_))
    }
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
