//! Shared helpers for engine-level tests.

#![allow(dead_code)]

pub mod postgres;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use keelson::Engine;
use keelson_auth::CapabilityModel;
use keelson_core::config::InvitationConfig;
use keelson_core::traits::{Clock, ManualClock};
use keelson_core::types::{PrincipalId, ResourceId};
use keelson_database::memory::MemoryResourceDirectory;
use keelson_entity::access::{Permission, Role};
use keelson_entity::grant::Grant;
use keelson_entity::resource::ResourceRef;
use keelson_service::{CreateGrantRequest, CreateInvitationRequest, IssuedInvitation};

/// Test application context over the in-memory engine
pub struct TestApp {
    /// The assembled engine
    pub engine: Engine,
    /// Clock driving every expiry decision
    pub clock: Arc<ManualClock>,
    /// Resource ownership
    pub directory: Arc<MemoryResourceDirectory>,
}

impl TestApp {
    /// Create a new test application
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::default());
        let directory = Arc::new(MemoryResourceDirectory::new());
        let engine = Engine::in_memory(
            directory.clone(),
            Arc::new(CapabilityModel::v1()),
            clock.clone(),
            InvitationConfig::default(),
        );
        Self {
            engine,
            clock,
            directory,
        }
    }

    /// Register a fresh vessel owned by `owner`
    pub fn vessel(&self, owner: PrincipalId) -> ResourceRef {
        let vessel = ResourceRef::new(ResourceId::new(), owner);
        self.directory.register(vessel.id, vessel.owner_id);
        vessel
    }

    /// Current test time
    pub fn clock_now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Move the clock forward
    pub fn advance_days(&self, days: i64) {
        self.clock.advance(Duration::days(days));
    }

    /// Whether `principal` may exercise `permission` on `vessel`
    pub async fn allowed(
        &self,
        principal: PrincipalId,
        vessel: &ResourceRef,
        permission: Permission,
    ) -> bool {
        self.engine
            .resolver
            .resolve(principal, vessel, permission)
            .await
            .expect("resolve")
            .allow
    }

    /// Grant `role` with default permissions
    pub async fn grant(
        &self,
        actor: PrincipalId,
        vessel: &ResourceRef,
        target: PrincipalId,
        role: Role,
    ) -> Grant {
        self.engine
            .grants
            .create_or_replace_grant(
                actor,
                vessel,
                CreateGrantRequest {
                    target,
                    role,
                    permissions: None,
                    expires_at: None,
                },
            )
            .await
            .expect("create grant")
    }

    /// Invite `identity` with `role` and the given lifetime
    pub async fn invite(
        &self,
        actor: PrincipalId,
        vessel: &ResourceRef,
        identity: &str,
        role: Role,
        ttl_days: Option<i64>,
    ) -> IssuedInvitation {
        self.engine
            .invitations
            .create_invitation(
                actor,
                vessel,
                CreateInvitationRequest {
                    target_identity: identity.to_string(),
                    role,
                    permissions: None,
                    ttl_days,
                    grant_expires_at: None,
                },
            )
            .await
            .expect("create invitation")
    }
}
