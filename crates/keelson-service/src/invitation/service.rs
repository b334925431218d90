//! Invitation issuing and administration.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use keelson_auth::{AuthorizationResolver, CapabilityModel, TokenGenerator};
use keelson_core::config::InvitationConfig;
use keelson_core::error::AppError;
use keelson_core::result::AppResult;
use keelson_core::traits::{Clock, ResourceDirectory};
use keelson_core::types::{InvitationId, PrincipalId};
use keelson_database::store::InvitationStore;
use keelson_entity::access::{PermissionSet, Role};
use keelson_entity::invitation::{
    Invitation, InvitationState, InvitationView, NewInvitation, normalize_identity,
};
use keelson_entity::resource::ResourceRef;

use crate::access::{
    authorize_manager, ensure_future, ensure_within_ceiling, permissions_for, resource_ref,
};

/// Request to invite someone to a resource.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreateInvitationRequest {
    /// Out-of-band identity of the invitee (e.g. an email address).
    pub target_identity: String,
    /// Role on offer.
    pub role: Role,
    /// Explicit permissions. Defaults to the role's defaults.
    pub permissions: Option<PermissionSet>,
    /// Days until the invitation lapses. Defaults to the configured TTL.
    pub ttl_days: Option<i64>,
    /// Expiry of the grant created at redemption.
    pub grant_expires_at: Option<DateTime<Utc>>,
}

/// A freshly issued invitation and its token.
///
/// The token is only ever returned here; listings never carry it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IssuedInvitation {
    /// The stored invitation.
    pub invitation: Invitation,
    /// Token to deliver to the invitee.
    pub token: String,
}

/// Issues, tracks, and redeems invitations.
#[derive(Clone)]
pub struct InvitationManager {
    /// Invitation persistence.
    pub(super) invitations: Arc<dyn InvitationStore>,
    /// Resource ownership lookup.
    pub(super) directory: Arc<dyn ResourceDirectory>,
    /// Resolver used to authorize actors and issuers.
    pub(super) resolver: Arc<AuthorizationResolver>,
    /// Role defaults.
    capabilities: Arc<CapabilityModel>,
    /// Token source.
    tokens: TokenGenerator,
    /// Source of "now".
    pub(super) clock: Arc<dyn Clock>,
    /// TTL limits.
    config: InvitationConfig,
}

impl std::fmt::Debug for InvitationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvitationManager")
            .field("config", &self.config)
            .finish()
    }
}

impl InvitationManager {
    /// Creates a new invitation manager.
    pub fn new(
        invitations: Arc<dyn InvitationStore>,
        directory: Arc<dyn ResourceDirectory>,
        resolver: Arc<AuthorizationResolver>,
        capabilities: Arc<CapabilityModel>,
        clock: Arc<dyn Clock>,
        config: InvitationConfig,
    ) -> Self {
        Self {
            invitations,
            directory,
            resolver,
            capabilities,
            tokens: TokenGenerator::new(),
            clock,
            config,
        }
    }

    /// Issue an invitation for `req.target_identity` on `resource`.
    pub async fn create_invitation(
        &self,
        actor: PrincipalId,
        resource: &ResourceRef,
        req: CreateInvitationRequest,
    ) -> AppResult<IssuedInvitation> {
        let actor_decision = authorize_manager(&self.resolver, actor, resource).await?;

        let target_identity = normalize_identity(&req.target_identity);
        if target_identity.is_empty() {
            return Err(AppError::validation("Invitee identity must not be empty"));
        }

        let permissions = permissions_for(&self.capabilities, req.role, req.permissions)?;

        let ttl_days = req.ttl_days.unwrap_or(self.config.default_ttl_days);
        if !(0..=self.config.max_ttl_days).contains(&ttl_days) {
            return Err(AppError::validation(format!(
                "Invitation lifetime must be between 0 and {} days",
                self.config.max_ttl_days
            )));
        }

        let now = self.clock.now();
        let expires_at = Duration::try_days(ttl_days)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| AppError::validation("Invitation lifetime is out of range"))?;
        if let Some(grant_expires_at) = req.grant_expires_at {
            ensure_future(grant_expires_at, now)?;
            if grant_expires_at <= expires_at {
                return Err(AppError::validation(
                    "Grant expiry must be later than the invitation's own expiry",
                ));
            }
        }

        ensure_within_ceiling(&actor_decision, &permissions)?;

        let token = self.tokens.generate();
        let invitation = self
            .invitations
            .insert(
                NewInvitation {
                    resource_id: resource.id,
                    target_identity,
                    role: req.role,
                    permissions,
                    invited_by: actor,
                    token: token.clone(),
                    expires_at,
                    grant_expires_at: req.grant_expires_at,
                },
                now,
            )
            .await?;

        info!(
            actor = %actor,
            resource = %resource.id,
            invitation_id = %invitation.id,
            role = %invitation.role,
            expires_at = %invitation.expires_at,
            "Invitation issued"
        );

        Ok(IssuedInvitation { invitation, token })
    }

    /// Withdraw a pending invitation.
    ///
    /// Cancelling an invitation that is already accepted, cancelled, or
    /// expired changes nothing and still succeeds.
    pub async fn cancel_invitation(
        &self,
        actor: PrincipalId,
        id: InvitationId,
    ) -> AppResult<InvitationView> {
        let invitation = self.find(id).await?;
        let resource = resource_ref(self.directory.as_ref(), invitation.resource_id).await?;
        authorize_manager(&self.resolver, actor, &resource).await?;

        let now = self.clock.now();
        match self.invitations.mark_cancelled(id, actor, now).await? {
            Some(cancelled) => {
                info!(
                    actor = %actor,
                    resource = %resource.id,
                    invitation_id = %id,
                    "Invitation cancelled"
                );
                Ok(cancelled.view_at(now))
            }
            None => {
                let current = self.find(id).await?;
                debug!(
                    invitation_id = %id,
                    state = %current.state_at(now),
                    "Invitation already terminal; nothing to cancel"
                );
                Ok(current.view_at(now))
            }
        }
    }

    /// Invitations on `resource`, newest first, optionally filtered by state.
    pub async fn list_invitations(
        &self,
        actor: PrincipalId,
        resource: &ResourceRef,
        state: Option<InvitationState>,
    ) -> AppResult<Vec<InvitationView>> {
        authorize_manager(&self.resolver, actor, resource).await?;
        let now = self.clock.now();
        Ok(self
            .invitations
            .list_invitations(resource.id)
            .await?
            .iter()
            .map(|inv| inv.view_at(now))
            .filter(|view| state.is_none_or(|s| view.state == s))
            .collect())
    }

    /// The newest pending invitation for `target_identity` on `resource`.
    ///
    /// Its role is the one currently on offer to that invitee.
    pub async fn latest_pending_for(
        &self,
        actor: PrincipalId,
        resource: &ResourceRef,
        target_identity: &str,
    ) -> AppResult<Option<InvitationView>> {
        let pending = self
            .list_invitations(actor, resource, Some(InvitationState::Pending))
            .await?;
        let identity = normalize_identity(target_identity);
        Ok(pending.into_iter().find(|view| view.target_identity == identity))
    }

    /// What the holder of `token` is being offered. Possessing the token is
    /// the only requirement.
    pub async fn preview(&self, token: &str) -> AppResult<InvitationView> {
        let invitation = self
            .invitations
            .find_by_token(token)
            .await?
            .ok_or_else(AppError::invalid_token)?;
        Ok(invitation.view_at(self.clock.now()))
    }

    pub(super) async fn find(&self, id: InvitationId) -> AppResult<Invitation> {
        self.invitations
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invitation {id} not found")))
    }
}
