//! Invitation lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where an invitation is in its lifecycle.
///
/// Only `accepted` and `cancelled` are recorded in storage. `expired` is
/// derived from the expiry timestamp whenever the state is read, see
/// [`Invitation::state_at`](super::Invitation::state_at).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationState {
    /// Issued, not yet expired, accepted, or cancelled.
    Pending,
    /// Redeemed. A grant was created.
    Accepted,
    /// Past expiry without being redeemed.
    Expired,
    /// Withdrawn by an administrator.
    Cancelled,
}

impl InvitationState {
    /// Return the state as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for InvitationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InvitationState {
    type Err = keelson_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "expired" => Ok(Self::Expired),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(keelson_core::AppError::validation(format!(
                "Invalid invitation state: '{s}'"
            ))),
        }
    }
}
