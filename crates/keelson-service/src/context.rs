//! Identity of the caller redeeming an invitation.

use serde::{Deserialize, Serialize};

use keelson_core::types::PrincipalId;

/// A principal together with the out-of-band identity its authentication
/// provider vouched for (e.g. a verified email address).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    /// The authenticated principal.
    pub principal_id: PrincipalId,
    /// The verified identity string.
    pub identity: String,
}

impl VerifiedIdentity {
    /// Creates a new verified identity.
    pub fn new(principal_id: PrincipalId, identity: impl Into<String>) -> Self {
        Self {
            principal_id,
            identity: identity.into(),
        }
    }
}
