//! Invitation repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;

use keelson_core::error::{AppError, ErrorKind};
use keelson_core::result::AppResult;
use keelson_core::types::{InvitationId, PrincipalId, ResourceId};
use keelson_entity::grant::NewGrant;
use keelson_entity::invitation::{Invitation, InvitationState, NewInvitation};

use super::grant::supersede_and_insert;
use crate::store::{AcceptOutcome, InvitationStore};

/// PostgreSQL-backed [`InvitationStore`].
#[derive(Debug, Clone)]
pub struct InvitationRepository {
    pool: PgPool,
}

impl InvitationRepository {
    /// Create a new invitation repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InvitationStore for InvitationRepository {
    async fn insert(&self, invitation: NewInvitation, now: DateTime<Utc>) -> AppResult<Invitation> {
        sqlx::query_as::<_, Invitation>(
            "INSERT INTO access_invitations (id, resource_id, target_identity, role, permissions, \
             invited_by, token, expires_at, grant_expires_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
        )
        .bind(InvitationId::new())
        .bind(invitation.resource_id)
        .bind(&invitation.target_identity)
        .bind(invitation.role)
        .bind(&invitation.permissions)
        .bind(invitation.invited_by)
        .bind(&invitation.token)
        .bind(invitation.expires_at)
        .bind(invitation.grant_expires_at)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn find_by_id(&self, id: InvitationId) -> AppResult<Option<Invitation>> {
        sqlx::query_as::<_, Invitation>("SELECT * FROM access_invitations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find invitation", e))
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<Invitation>> {
        sqlx::query_as::<_, Invitation>("SELECT * FROM access_invitations WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find invitation by token", e)
            })
    }

    async fn list_invitations(&self, resource: ResourceId) -> AppResult<Vec<Invitation>> {
        sqlx::query_as::<_, Invitation>(
            "SELECT * FROM access_invitations WHERE resource_id = $1 ORDER BY created_at DESC",
        )
        .bind(resource)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list invitations", e))
    }

    async fn mark_cancelled(
        &self,
        id: InvitationId,
        cancelled_by: PrincipalId,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Invitation>> {
        sqlx::query_as::<_, Invitation>(
            "UPDATE access_invitations SET cancelled_at = $3, cancelled_by = $2 \
             WHERE id = $1 AND accepted_at IS NULL AND cancelled_at IS NULL AND expires_at > $3 \
             RETURNING *",
        )
        .bind(id)
        .bind(cancelled_by)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to cancel invitation", e))
    }

    async fn accept(
        &self,
        id: InvitationId,
        redeemer: PrincipalId,
        grant: NewGrant,
        now: DateTime<Utc>,
    ) -> AppResult<AcceptOutcome> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let locked = sqlx::query_as::<_, Invitation>(
            "SELECT * FROM access_invitations WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock invitation", e))?
        .ok_or_else(|| AppError::not_found(format!("Invitation {id} not found")))?;

        // Dropping `tx` on an early return rolls back and releases the row lock.
        match locked.state_at(now) {
            InvitationState::Accepted => return Ok(AcceptOutcome::AlreadyAccepted(locked)),
            InvitationState::Cancelled => return Ok(AcceptOutcome::Cancelled),
            InvitationState::Expired => return Ok(AcceptOutcome::Expired),
            InvitationState::Pending => {}
        }

        let created = supersede_and_insert(&mut tx, &grant, now).await?;

        let invitation = sqlx::query_as::<_, Invitation>(
            "UPDATE access_invitations SET accepted_at = $2, accepted_by = $3, grant_id = $4 \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(now)
        .bind(redeemer)
        .bind(created.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to accept invitation", e))?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit redemption", e)
        })?;

        info!(
            invitation_id = %id,
            grant_id = %created.id,
            principal = %redeemer,
            "Invitation accepted"
        );

        Ok(AcceptOutcome::Accepted {
            invitation,
            grant: created,
        })
    }
}
