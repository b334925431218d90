//! Grant repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::debug;

use keelson_core::error::{AppError, ErrorKind};
use keelson_core::result::AppResult;
use keelson_core::types::{GrantId, PrincipalId, ResourceId};
use keelson_entity::grant::{Grant, GrantUpdate, NewGrant};

use crate::store::GrantStore;

/// PostgreSQL-backed [`GrantStore`].
#[derive(Debug, Clone)]
pub struct GrantRepository {
    pool: PgPool,
}

impl GrantRepository {
    /// Create a new grant repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Serialize writers on one (resource, principal) pair for the rest of the
/// current transaction.
pub(crate) async fn lock_pair(
    conn: &mut PgConnection,
    resource: ResourceId,
    principal: PrincipalId,
) -> AppResult<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text || ':' || $2::text, 0))")
        .bind(resource)
        .bind(principal)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock grant pair", e))?;
    Ok(())
}

/// Deactivate the current grant for the pair and insert `grant`.
///
/// Must run inside a transaction. Takes the pair lock first, so two
/// replacements for the same pair never both observe "no active grant".
pub(crate) async fn supersede_and_insert(
    conn: &mut PgConnection,
    grant: &NewGrant,
    now: DateTime<Utc>,
) -> AppResult<Grant> {
    lock_pair(conn, grant.resource_id, grant.principal_id).await?;

    let superseded = sqlx::query(
        "UPDATE access_grants SET is_active = FALSE, revoked_by = $3, revoked_at = $4, updated_at = $4 \
         WHERE resource_id = $1 AND principal_id = $2 AND is_active",
    )
    .bind(grant.resource_id)
    .bind(grant.principal_id)
    .bind(grant.granted_by)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to supersede grant", e))?;

    if superseded.rows_affected() > 0 {
        debug!(
            resource = %grant.resource_id,
            principal = %grant.principal_id,
            "Superseded active grant"
        );
    }

    sqlx::query_as::<_, Grant>(
        "INSERT INTO access_grants (id, resource_id, principal_id, role, permissions, is_active, \
         expires_at, granted_by, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, TRUE, $6, $7, $8, $8) RETURNING *",
    )
    .bind(GrantId::new())
    .bind(grant.resource_id)
    .bind(grant.principal_id)
    .bind(grant.role)
    .bind(&grant.permissions)
    .bind(grant.expires_at)
    .bind(grant.granted_by)
    .bind(now)
    .fetch_one(&mut *conn)
    .await
    .map_err(AppError::from)
}

#[async_trait]
impl GrantStore for GrantRepository {
    async fn find_active(
        &self,
        resource: ResourceId,
        principal: PrincipalId,
    ) -> AppResult<Option<Grant>> {
        sqlx::query_as::<_, Grant>(
            "SELECT * FROM access_grants WHERE resource_id = $1 AND principal_id = $2 AND is_active",
        )
        .bind(resource)
        .bind(principal)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find grant", e))
    }

    async fn replace_active(&self, grant: NewGrant, now: DateTime<Utc>) -> AppResult<Grant> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let created = supersede_and_insert(&mut tx, &grant, now).await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit grant", e)
        })?;
        Ok(created)
    }

    async fn update_active(
        &self,
        id: GrantId,
        update: &GrantUpdate,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Grant>> {
        sqlx::query_as::<_, Grant>(
            "UPDATE access_grants SET role = $2, permissions = $3, expires_at = $4, updated_at = $5 \
             WHERE id = $1 AND is_active RETURNING *",
        )
        .bind(id)
        .bind(update.role)
        .bind(&update.permissions)
        .bind(update.expires_at)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update grant", e))
    }

    async fn deactivate(
        &self,
        resource: ResourceId,
        principal: PrincipalId,
        revoked_by: PrincipalId,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Grant>> {
        sqlx::query_as::<_, Grant>(
            "UPDATE access_grants SET is_active = FALSE, revoked_by = $3, revoked_at = $4, updated_at = $4 \
             WHERE resource_id = $1 AND principal_id = $2 AND is_active RETURNING *",
        )
        .bind(resource)
        .bind(principal)
        .bind(revoked_by)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to revoke grant", e))
    }

    async fn list_grants(
        &self,
        resource: ResourceId,
        include_inactive: bool,
    ) -> AppResult<Vec<Grant>> {
        sqlx::query_as::<_, Grant>(
            "SELECT * FROM access_grants WHERE resource_id = $1 AND (is_active OR $2) \
             ORDER BY created_at ASC",
        )
        .bind(resource)
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list grants", e))
    }
}
