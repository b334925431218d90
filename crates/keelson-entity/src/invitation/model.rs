//! Invitation entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use keelson_core::types::{GrantId, InvitationId, PrincipalId, ResourceId};

use super::state::InvitationState;
use crate::access::{PermissionSet, Role};

/// A pending, token-addressed offer of access to a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Invitation {
    /// Unique invitation identifier.
    pub id: InvitationId,
    /// The resource access is offered on.
    pub resource_id: ResourceId,
    /// Normalized out-of-band identity of the invitee (e.g. an email address).
    pub target_identity: String,
    /// Proposed role.
    pub role: Role,
    /// Proposed permission set.
    pub permissions: PermissionSet,
    /// Principal who issued the invitation.
    pub invited_by: PrincipalId,
    /// Redemption token. Never serialized into listings.
    #[serde(skip_serializing, default)]
    pub token: String,
    /// When the invitation stops being redeemable.
    pub expires_at: DateTime<Utc>,
    /// Expiry carried onto the grant created at redemption.
    pub grant_expires_at: Option<DateTime<Utc>>,
    /// When the invitation was issued.
    pub created_at: DateTime<Utc>,
    /// When the invitation was redeemed.
    pub accepted_at: Option<DateTime<Utc>>,
    /// Principal who redeemed it.
    pub accepted_by: Option<PrincipalId>,
    /// Grant created by the redemption.
    pub grant_id: Option<GrantId>,
    /// When an administrator withdrew it.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Administrator who withdrew it.
    pub cancelled_by: Option<PrincipalId>,
}

impl Invitation {
    /// Derive the lifecycle state at `now`.
    ///
    /// This is the only place the expiry rule for invitations is defined.
    /// Recorded terminal states win over expiry.
    pub fn state_at(&self, now: DateTime<Utc>) -> InvitationState {
        if self.accepted_at.is_some() {
            InvitationState::Accepted
        } else if self.cancelled_at.is_some() {
            InvitationState::Cancelled
        } else if now >= self.expires_at {
            InvitationState::Expired
        } else {
            InvitationState::Pending
        }
    }

    /// Whether `identity` is the identity this invitation was issued to.
    pub fn is_addressed_to(&self, identity: &str) -> bool {
        self.target_identity == normalize_identity(identity)
    }

    /// The outcome recorded at redemption, if the invitation was accepted.
    pub fn redemption(&self) -> Option<Redemption> {
        let grant_id = self.grant_id?;
        self.accepted_at?;
        Some(Redemption {
            invitation_id: self.id,
            resource_id: self.resource_id,
            grant_id,
            role: self.role,
            permissions: self.permissions.clone(),
        })
    }

    /// Public view of the invitation at `now`, without the token.
    pub fn view_at(&self, now: DateTime<Utc>) -> InvitationView {
        InvitationView {
            id: self.id,
            resource_id: self.resource_id,
            target_identity: self.target_identity.clone(),
            role: self.role,
            permissions: self.permissions.clone(),
            state: self.state_at(now),
            expires_at: self.expires_at,
            created_at: self.created_at,
        }
    }
}

/// Data required to issue an invitation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInvitation {
    /// The resource.
    pub resource_id: ResourceId,
    /// Normalized invitee identity.
    pub target_identity: String,
    /// Proposed role.
    pub role: Role,
    /// Proposed permissions.
    pub permissions: PermissionSet,
    /// Issuing principal.
    pub invited_by: PrincipalId,
    /// Redemption token.
    pub token: String,
    /// Redemption deadline.
    pub expires_at: DateTime<Utc>,
    /// Expiry for the resulting grant.
    pub grant_expires_at: Option<DateTime<Utc>>,
}

impl NewInvitation {
    /// Materialize the row this request creates.
    pub fn into_invitation(self, id: InvitationId, now: DateTime<Utc>) -> Invitation {
        Invitation {
            id,
            resource_id: self.resource_id,
            target_identity: self.target_identity,
            role: self.role,
            permissions: self.permissions,
            invited_by: self.invited_by,
            token: self.token,
            expires_at: self.expires_at,
            grant_expires_at: self.grant_expires_at,
            created_at: now,
            accepted_at: None,
            accepted_by: None,
            grant_id: None,
            cancelled_at: None,
            cancelled_by: None,
        }
    }
}

/// What an invitee sees before accepting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationView {
    /// Invitation id.
    pub id: InvitationId,
    /// Resource on offer.
    pub resource_id: ResourceId,
    /// Identity the invitation is addressed to.
    pub target_identity: String,
    /// Offered role.
    pub role: Role,
    /// Offered permissions.
    pub permissions: PermissionSet,
    /// Derived state.
    pub state: InvitationState,
    /// Redemption deadline.
    pub expires_at: DateTime<Utc>,
    /// Issue time.
    pub created_at: DateTime<Utc>,
}

/// Result of a successful redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redemption {
    /// The redeemed invitation.
    pub invitation_id: InvitationId,
    /// The resource access was granted on.
    pub resource_id: ResourceId,
    /// The grant created.
    pub grant_id: GrantId,
    /// Granted role.
    pub role: Role,
    /// Granted permissions.
    pub permissions: PermissionSet,
}

/// Canonical form of an out-of-band identity: trimmed and lowercased.
pub fn normalize_identity(identity: &str) -> String {
    identity.trim().to_lowercase()
}
