//! Test context over a real PostgreSQL database.
//!
//! Tests using it return early unless `KEELSON_TEST_DATABASE_URL` is set.

use std::sync::Arc;

use keelson::Engine;
use keelson_core::config::AppConfig;
use keelson_core::types::{PrincipalId, ResourceId};
use keelson_database::DatabasePool;
use keelson_database::migration::run_migrations;
use keelson_database::repositories::{GrantRepository, InvitationRepository};
use keelson_entity::resource::ResourceRef;

/// Environment variable naming the test database.
pub const DATABASE_URL_VAR: &str = "KEELSON_TEST_DATABASE_URL";

/// Postgres-backed test application context
pub struct PgTestApp {
    /// Engine over the Postgres stores
    pub engine: Engine,
    /// Connection pool for direct queries
    pub pool: DatabasePool,
    /// Grant repository, for store-level assertions
    pub grants: Arc<GrantRepository>,
    /// Invitation repository, for store-level assertions
    pub invitations: Arc<InvitationRepository>,
}

impl PgTestApp {
    /// Connect, migrate, and make sure the vessel table exists.
    ///
    /// Returns `None` when no test database is configured.
    pub async fn connect() -> Option<Self> {
        let Ok(url) = std::env::var(DATABASE_URL_VAR) else {
            eprintln!("{DATABASE_URL_VAR} not set; skipping Postgres test");
            return None;
        };

        let mut config = AppConfig::load("tests/fixtures/test_config.toml", "test")
            .expect("Failed to load test config");
        config.database.url = url;

        let pool = DatabasePool::connect(&config.database)
            .await
            .expect("Failed to connect to test database");
        run_migrations(pool.pool())
            .await
            .expect("Failed to run migrations");
        Self::ensure_vessel_table(&pool).await;

        let engine = Engine::postgres(&pool, &config).expect("Failed to build engine");
        let grants = Arc::new(GrantRepository::new(pool.pool().clone()));
        let invitations = Arc::new(InvitationRepository::new(pool.pool().clone()));

        Some(Self {
            engine,
            pool,
            grants,
            invitations,
        })
    }

    /// The collaborator-owned table the directory reads owners from.
    async fn ensure_vessel_table(pool: &DatabasePool) {
        let mut tx = pool.pool().begin().await.expect("begin");
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext('keelson_test_vessels'))")
            .execute(&mut *tx)
            .await
            .expect("lock");
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS vessels (id UUID PRIMARY KEY, owner_id UUID NOT NULL)",
        )
        .execute(&mut *tx)
        .await
        .expect("create vessels");
        tx.commit().await.expect("commit");
    }

    /// Insert a fresh vessel owned by `owner`
    pub async fn vessel(&self, owner: PrincipalId) -> ResourceRef {
        let vessel = ResourceRef::new(ResourceId::new(), owner);
        sqlx::query("INSERT INTO vessels (id, owner_id) VALUES ($1, $2)")
            .bind(vessel.id)
            .bind(vessel.owner_id)
            .execute(self.pool.pool())
            .await
            .expect("insert vessel");
        vessel
    }

    /// Count active grant rows for a pair, bypassing the stores
    pub async fn active_rows(&self, vessel: &ResourceRef, principal: PrincipalId) -> i64 {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM access_grants \
             WHERE resource_id = $1 AND principal_id = $2 AND is_active",
        )
        .bind(vessel.id)
        .bind(principal)
        .fetch_one(self.pool.pool())
        .await
        .expect("count active grants")
    }
}
