//! In-memory grant and invitation store backed by dashmap.
//!
//! Each (resource, principal) pair owns one map entry holding its grant
//! history; mutating that entry under its shard guard is what serializes
//! writers on the same pair while leaving other pairs independent. Guards
//! are always taken in the order invitations, then grants, then the grant
//! index, and are never held across an `.await`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, info};

use keelson_core::error::AppError;
use keelson_core::result::AppResult;
use keelson_core::types::{GrantId, InvitationId, PrincipalId, ResourceId};
use keelson_entity::grant::{Grant, GrantUpdate, NewGrant};
use keelson_entity::invitation::{Invitation, InvitationState, NewInvitation};

use crate::store::{AcceptOutcome, GrantStore, InvitationStore};

type PairKey = (ResourceId, PrincipalId);

/// In-memory [`GrantStore`] and [`InvitationStore`].
///
/// Suitable for single-node deployments and tests.
#[derive(Debug, Default)]
pub struct MemoryAccessStore {
    /// Grant history per pair, oldest first.
    grants: DashMap<PairKey, Vec<Grant>>,
    /// Grant id to its pair.
    grant_index: DashMap<GrantId, PairKey>,
    /// Invitations by id.
    invitations: DashMap<InvitationId, Invitation>,
    /// Token to invitation id. Enforces token uniqueness.
    tokens: DashMap<String, InvitationId>,
}

impl MemoryAccessStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new active grant to the pair's history, superseding the current one.
    fn push_replacing(&self, grant: NewGrant, now: DateTime<Utc>) -> Grant {
        let key = (grant.resource_id, grant.principal_id);
        let created = {
            let mut history = self.grants.entry(key).or_default();
            if deactivate_in(&mut history, grant.granted_by, now).is_some() {
                debug!(
                    resource = %grant.resource_id,
                    principal = %grant.principal_id,
                    "Superseded active grant"
                );
            }
            let created = grant.into_grant(GrantId::new(), now);
            history.push(created.clone());
            created
        };
        self.grant_index.insert(created.id, key);
        created
    }
}

/// Deactivate the active grant in `history`, if any.
fn deactivate_in(history: &mut [Grant], by: PrincipalId, now: DateTime<Utc>) -> Option<Grant> {
    let active = history.iter_mut().find(|g| g.is_active)?;
    active.is_active = false;
    active.revoked_by = Some(by);
    active.revoked_at = Some(now);
    active.updated_at = now;
    Some(active.clone())
}

#[async_trait]
impl GrantStore for MemoryAccessStore {
    async fn find_active(
        &self,
        resource: ResourceId,
        principal: PrincipalId,
    ) -> AppResult<Option<Grant>> {
        Ok(self
            .grants
            .get(&(resource, principal))
            .and_then(|history| history.iter().find(|g| g.is_active).cloned()))
    }

    async fn replace_active(&self, grant: NewGrant, now: DateTime<Utc>) -> AppResult<Grant> {
        Ok(self.push_replacing(grant, now))
    }

    async fn update_active(
        &self,
        id: GrantId,
        update: &GrantUpdate,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Grant>> {
        let Some(key) = self.grant_index.get(&id).map(|k| *k) else {
            return Ok(None);
        };
        let Some(mut history) = self.grants.get_mut(&key) else {
            return Ok(None);
        };
        Ok(history
            .iter_mut()
            .find(|g| g.id == id && g.is_active)
            .map(|g| {
                update.apply_to(g, now);
                g.clone()
            }))
    }

    async fn deactivate(
        &self,
        resource: ResourceId,
        principal: PrincipalId,
        revoked_by: PrincipalId,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Grant>> {
        Ok(self
            .grants
            .get_mut(&(resource, principal))
            .and_then(|mut history| deactivate_in(&mut history, revoked_by, now)))
    }

    async fn list_grants(
        &self,
        resource: ResourceId,
        include_inactive: bool,
    ) -> AppResult<Vec<Grant>> {
        let mut grants: Vec<Grant> = self
            .grants
            .iter()
            .filter(|entry| entry.key().0 == resource)
            .flat_map(|entry| {
                entry
                    .value()
                    .iter()
                    .filter(|g| include_inactive || g.is_active)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();
        grants.sort_by_key(|g| g.created_at);
        Ok(grants)
    }
}

#[async_trait]
impl InvitationStore for MemoryAccessStore {
    async fn insert(&self, invitation: NewInvitation, now: DateTime<Utc>) -> AppResult<Invitation> {
        match self.tokens.entry(invitation.token.clone()) {
            Entry::Occupied(_) => Err(AppError::conflict("Invitation token collision")),
            Entry::Vacant(slot) => {
                let created = invitation.into_invitation(InvitationId::new(), now);
                self.invitations.insert(created.id, created.clone());
                slot.insert(created.id);
                Ok(created)
            }
        }
    }

    async fn find_by_id(&self, id: InvitationId) -> AppResult<Option<Invitation>> {
        Ok(self.invitations.get(&id).map(|inv| inv.clone()))
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<Invitation>> {
        let Some(id) = self.tokens.get(token).map(|id| *id) else {
            return Ok(None);
        };
        self.find_by_id(id).await
    }

    async fn list_invitations(&self, resource: ResourceId) -> AppResult<Vec<Invitation>> {
        let mut invitations: Vec<Invitation> = self
            .invitations
            .iter()
            .filter(|entry| entry.resource_id == resource)
            .map(|entry| entry.value().clone())
            .collect();
        invitations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invitations)
    }

    async fn mark_cancelled(
        &self,
        id: InvitationId,
        cancelled_by: PrincipalId,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Invitation>> {
        let Some(mut invitation) = self.invitations.get_mut(&id) else {
            return Ok(None);
        };
        if invitation.state_at(now) != InvitationState::Pending {
            return Ok(None);
        }
        invitation.cancelled_at = Some(now);
        invitation.cancelled_by = Some(cancelled_by);
        Ok(Some(invitation.clone()))
    }

    async fn accept(
        &self,
        id: InvitationId,
        redeemer: PrincipalId,
        grant: NewGrant,
        now: DateTime<Utc>,
    ) -> AppResult<AcceptOutcome> {
        let mut invitation = self
            .invitations
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Invitation {id} not found")))?;

        match invitation.state_at(now) {
            InvitationState::Accepted => return Ok(AcceptOutcome::AlreadyAccepted(invitation.clone())),
            InvitationState::Cancelled => return Ok(AcceptOutcome::Cancelled),
            InvitationState::Expired => return Ok(AcceptOutcome::Expired),
            InvitationState::Pending => {}
        }

        let created = self.push_replacing(grant, now);
        invitation.accepted_at = Some(now);
        invitation.accepted_by = Some(redeemer);
        invitation.grant_id = Some(created.id);

        info!(
            invitation_id = %id,
            grant_id = %created.id,
            principal = %redeemer,
            "Invitation accepted"
        );

        Ok(AcceptOutcome::Accepted {
            invitation: invitation.clone(),
            grant: created,
        })
    }
}
