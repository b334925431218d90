//! Invitation issuing configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Upper bound accepted for `max_ttl_days`.
pub const TTL_DAYS_CEILING: i64 = 3650;

/// Limits applied when issuing invitations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationConfig {
    /// Lifetime used when the issuer does not specify one.
    #[serde(default = "default_ttl_days")]
    pub default_ttl_days: i64,
    /// Longest lifetime an issuer may request.
    #[serde(default = "default_max_ttl_days")]
    pub max_ttl_days: i64,
}

impl Default for InvitationConfig {
    fn default() -> Self {
        Self {
            default_ttl_days: default_ttl_days(),
            max_ttl_days: default_max_ttl_days(),
        }
    }
}

impl InvitationConfig {
    /// Check the limits are usable: `0 <= default_ttl_days <= max_ttl_days <= TTL_DAYS_CEILING`.
    pub fn validate(&self) -> Result<(), AppError> {
        if !(0..=TTL_DAYS_CEILING).contains(&self.max_ttl_days) {
            return Err(AppError::configuration(format!(
                "invitation.max_ttl_days must be between 0 and {TTL_DAYS_CEILING}, got {}",
                self.max_ttl_days
            )));
        }
        if !(0..=self.max_ttl_days).contains(&self.default_ttl_days) {
            return Err(AppError::configuration(format!(
                "invitation.default_ttl_days must be between 0 and max_ttl_days ({}), got {}",
                self.max_ttl_days, self.default_ttl_days
            )));
        }
        Ok(())
    }
}

fn default_ttl_days() -> i64 {
    7
}

fn default_max_ttl_days() -> i64 {
    30
}
