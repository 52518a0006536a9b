//! Activation settings.

use serde::{Deserialize, Serialize};

/// Settings for [`ActivationGate`](crate::ActivationGate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseConfig {
    /// Days a freshly issued key stays activatable.
    #[serde(default = "default_validity_days")]
    pub validity_days: u64,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            validity_days: default_validity_days(),
        }
    }
}

fn default_validity_days() -> u64 {
    2
}
