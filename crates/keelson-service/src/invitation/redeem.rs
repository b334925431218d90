//! Invitation redemption.

use tracing::{info, warn};

use keelson_core::error::AppError;
use keelson_core::result::AppResult;
use keelson_database::store::AcceptOutcome;
use keelson_entity::access::Permission;
use keelson_entity::grant::NewGrant;
use keelson_entity::invitation::{Invitation, InvitationState, Redemption};

use super::service::InvitationManager;
use crate::access::{ensure_within_ceiling, resource_ref};
use crate::context::VerifiedIdentity;

impl InvitationManager {
    /// Turn the invitation behind `token` into a grant for `redeemer`.
    ///
    /// Redeeming an invitation the same principal already accepted returns
    /// the recorded outcome without creating another grant.
    pub async fn redeem(&self, token: &str, redeemer: &VerifiedIdentity) -> AppResult<Redemption> {
        let invitation = self
            .invitations
            .find_by_token(token)
            .await?
            .ok_or_else(AppError::invalid_token)?;

        let now = self.clock.now();
        match invitation.state_at(now) {
            InvitationState::Accepted => return replay(&invitation, redeemer),
            InvitationState::Cancelled => return Err(AppError::invitation_cancelled()),
            InvitationState::Expired => return Err(AppError::invitation_expired()),
            InvitationState::Pending => {}
        }

        if !invitation.is_addressed_to(&redeemer.identity) {
            warn!(
                invitation_id = %invitation.id,
                principal = %redeemer.principal_id,
                "Invitation presented by a different identity"
            );
            return Err(AppError::identity_mismatch());
        }

        let resource = resource_ref(self.directory.as_ref(), invitation.resource_id).await?;

        let issuer = self
            .resolver
            .resolve(invitation.invited_by, &resource, Permission::ManageAccess)
            .await?;
        if !issuer.allow {
            warn!(
                invitation_id = %invitation.id,
                issuer = %invitation.invited_by,
                resource = %resource.id,
                "Issuer no longer manages access; refusing redemption"
            );
            return Err(AppError::forbidden(
                "The person who sent this invitation can no longer grant access",
            ));
        }
        ensure_within_ceiling(&issuer, &invitation.permissions)?;

        if resource.is_owned_by(redeemer.principal_id) {
            return Err(AppError::validation(
                "The owner cannot accept an invitation to their own resource",
            ));
        }

        let grant = NewGrant {
            resource_id: invitation.resource_id,
            principal_id: redeemer.principal_id,
            role: invitation.role,
            permissions: invitation.permissions.clone(),
            expires_at: invitation.grant_expires_at,
            granted_by: invitation.invited_by,
        };

        match self
            .invitations
            .accept(invitation.id, redeemer.principal_id, grant, now)
            .await?
        {
            AcceptOutcome::Accepted { invitation, grant } => {
                info!(
                    invitation_id = %invitation.id,
                    resource = %invitation.resource_id,
                    principal = %redeemer.principal_id,
                    grant_id = %grant.id,
                    role = %grant.role,
                    "Invitation redeemed"
                );
                Ok(Redemption {
                    invitation_id: invitation.id,
                    resource_id: invitation.resource_id,
                    grant_id: grant.id,
                    role: grant.role,
                    permissions: grant.permissions,
                })
            }
            AcceptOutcome::AlreadyAccepted(accepted) => replay(&accepted, redeemer),
            AcceptOutcome::Cancelled => Err(AppError::invitation_cancelled()),
            AcceptOutcome::Expired => Err(AppError::invitation_expired()),
        }
    }
}

/// Outcome for a token that was already accepted.
fn replay(invitation: &Invitation, redeemer: &VerifiedIdentity) -> AppResult<Redemption> {
    if invitation.accepted_by != Some(redeemer.principal_id) {
        return Err(AppError::identity_mismatch());
    }
    invitation
        .redemption()
        .ok_or_else(|| AppError::internal("Accepted invitation has no recorded grant"))
}
