//! Store traits the access-control engine is written against.
//!
//! Implementations must provide two atomicity guarantees:
//! - [`GrantStore::replace_active`] supersedes and inserts as one unit per
//!   (resource, principal) key, so concurrent replacements serialize and
//!   exactly one active grant survives.
//! - [`InvitationStore::accept`] locks the invitation, creates the grant,
//!   and marks the invitation accepted as one unit, so an invitation yields
//!   at most one grant.
//!
//! Two implementations are provided:
//! - PostgreSQL (transactions, row locks and advisory locks)
//! - In-memory (dashmap entry guards)

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use keelson_core::result::AppResult;
use keelson_core::types::{GrantId, InvitationId, PrincipalId, ResourceId};
use keelson_entity::grant::{Grant, GrantUpdate, NewGrant};
use keelson_entity::invitation::{Invitation, NewInvitation};

/// Authoritative record of who holds which grant on which resource.
#[async_trait]
pub trait GrantStore: Send + Sync + 'static {
    /// The active grant for the pair, whether or not it has expired.
    async fn find_active(
        &self,
        resource: ResourceId,
        principal: PrincipalId,
    ) -> AppResult<Option<Grant>>;

    /// Deactivate any active grant for the pair and insert `grant` as the
    /// new active one, atomically.
    async fn replace_active(&self, grant: NewGrant, now: DateTime<Utc>) -> AppResult<Grant>;

    /// Overwrite role, permissions and expiry of grant `id` in place.
    ///
    /// Returns `None` when the grant is no longer active.
    async fn update_active(
        &self,
        id: GrantId,
        update: &GrantUpdate,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Grant>>;

    /// Deactivate the active grant for the pair, returning it if one existed.
    async fn deactivate(
        &self,
        resource: ResourceId,
        principal: PrincipalId,
        revoked_by: PrincipalId,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Grant>>;

    /// Grants on a resource, oldest first.
    async fn list_grants(
        &self,
        resource: ResourceId,
        include_inactive: bool,
    ) -> AppResult<Vec<Grant>>;
}

/// Outcome of an atomic acceptance attempt, decided under the invitation lock.
#[derive(Debug, Clone)]
pub enum AcceptOutcome {
    /// The invitation is now accepted and `grant` was created.
    Accepted {
        /// The invitation after acceptance.
        invitation: Invitation,
        /// The grant created.
        grant: Grant,
    },
    /// Someone accepted the invitation first. Nothing was written.
    AlreadyAccepted(Invitation),
    /// The invitation was cancelled. Nothing was written.
    Cancelled,
    /// The invitation is past its expiry. Nothing was written.
    Expired,
}

/// Storage for invitations.
#[async_trait]
pub trait InvitationStore: Send + Sync + 'static {
    /// Store a new invitation. A token collision is a `Conflict` error.
    async fn insert(&self, invitation: NewInvitation, now: DateTime<Utc>) -> AppResult<Invitation>;

    /// Find an invitation by id.
    async fn find_by_id(&self, id: InvitationId) -> AppResult<Option<Invitation>>;

    /// Find an invitation by its redemption token.
    async fn find_by_token(&self, token: &str) -> AppResult<Option<Invitation>>;

    /// Invitations on a resource, newest first.
    async fn list_invitations(&self, resource: ResourceId) -> AppResult<Vec<Invitation>>;

    /// Record cancellation if the invitation is still pending at `now`.
    ///
    /// Returns `None` when it was already terminal.
    async fn mark_cancelled(
        &self,
        id: InvitationId,
        cancelled_by: PrincipalId,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Invitation>>;

    /// Accept invitation `id` on behalf of `redeemer`, creating `grant`.
    async fn accept(
        &self,
        id: InvitationId,
        redeemer: PrincipalId,
        grant: NewGrant,
        now: DateTime<Utc>,
    ) -> AppResult<AcceptOutcome>;
}
