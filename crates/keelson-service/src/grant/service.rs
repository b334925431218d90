//! Grant administration: create or replace, update, revoke, list.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use keelson_auth::{AuthorizationResolver, CapabilityModel};
use keelson_core::error::AppError;
use keelson_core::result::AppResult;
use keelson_core::traits::Clock;
use keelson_core::types::PrincipalId;
use keelson_database::store::GrantStore;
use keelson_entity::access::{PermissionSet, Role};
use keelson_entity::grant::{Grant, GrantUpdate, NewGrant};
use keelson_entity::resource::ResourceRef;

use crate::access::{
    authorize_manager, ensure_future, ensure_grantable, ensure_within_ceiling, permissions_for,
};

/// Request to create (or replace) a grant.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreateGrantRequest {
    /// Principal receiving access.
    pub target: PrincipalId,
    /// Role to grant.
    pub role: Role,
    /// Explicit permissions. Defaults to the role's defaults.
    pub permissions: Option<PermissionSet>,
    /// Optional expiry. Must be in the future.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Request to update an active grant in place.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct UpdateGrantRequest {
    /// New role.
    pub role: Option<Role>,
    /// New permissions.
    pub permissions: Option<PermissionSet>,
    /// New expiry: `None` keeps it, `Some(None)` clears it.
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

/// Manages grants on resources on behalf of an acting principal.
#[derive(Clone)]
pub struct GrantAdministration {
    /// Grant persistence.
    grants: Arc<dyn GrantStore>,
    /// Resolver used to authorize the actor.
    resolver: Arc<AuthorizationResolver>,
    /// Role defaults.
    capabilities: Arc<CapabilityModel>,
    /// Source of "now".
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for GrantAdministration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrantAdministration")
            .field("capability_version", &self.capabilities.version())
            .finish()
    }
}

impl GrantAdministration {
    /// Creates a new grant administration service.
    pub fn new(
        grants: Arc<dyn GrantStore>,
        resolver: Arc<AuthorizationResolver>,
        capabilities: Arc<CapabilityModel>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            grants,
            resolver,
            capabilities,
            clock,
        }
    }

    /// Give `req.target` access to `resource`, replacing any active grant.
    pub async fn create_or_replace_grant(
        &self,
        actor: PrincipalId,
        resource: &ResourceRef,
        req: CreateGrantRequest,
    ) -> AppResult<Grant> {
        let actor_decision = authorize_manager(&self.resolver, actor, resource).await?;

        if resource.is_owned_by(req.target) {
            return Err(AppError::validation(
                "The owner already has full access and cannot be granted a role",
            ));
        }

        let permissions = permissions_for(&self.capabilities, req.role, req.permissions)?;
        let now = self.clock.now();
        if let Some(expires_at) = req.expires_at {
            ensure_future(expires_at, now)?;
        }
        ensure_within_ceiling(&actor_decision, &permissions)?;

        let grant = self
            .grants
            .replace_active(
                NewGrant {
                    resource_id: resource.id,
                    principal_id: req.target,
                    role: req.role,
                    permissions,
                    expires_at: req.expires_at,
                    granted_by: actor,
                },
                now,
            )
            .await?;

        info!(
            actor = %actor,
            resource = %resource.id,
            principal = %grant.principal_id,
            grant_id = %grant.id,
            role = %grant.role,
            permissions = %grant.permissions,
            "Grant created"
        );

        Ok(grant)
    }

    /// Change role, permissions, or expiry of `target`'s active grant.
    ///
    /// The grant keeps its id and `granted_by`. Changing the role without
    /// naming permissions resets them to the new role's defaults.
    pub async fn update_grant(
        &self,
        actor: PrincipalId,
        resource: &ResourceRef,
        target: PrincipalId,
        req: UpdateGrantRequest,
    ) -> AppResult<Grant> {
        let actor_decision = authorize_manager(&self.resolver, actor, resource).await?;

        let existing = self
            .grants
            .find_active(resource.id, target)
            .await?
            .ok_or_else(|| grant_not_found(resource, target))?;

        let role = req.role.unwrap_or(existing.role);
        ensure_grantable(role)?;

        let permissions = match req.permissions {
            Some(explicit) => permissions_for(&self.capabilities, role, Some(explicit))?,
            None if role != existing.role => self.capabilities.default_permissions(role),
            None => existing.permissions.clone(),
        };

        let now = self.clock.now();
        let expires_at = match req.expires_at {
            None => existing.expires_at,
            Some(None) => None,
            Some(Some(at)) => {
                ensure_future(at, now)?;
                Some(at)
            }
        };

        ensure_within_ceiling(&actor_decision, &permissions)?;

        let update = GrantUpdate {
            role,
            permissions,
            expires_at,
        };
        let grant = self
            .grants
            .update_active(existing.id, &update, now)
            .await?
            .ok_or_else(|| grant_not_found(resource, target))?;

        info!(
            actor = %actor,
            resource = %resource.id,
            principal = %target,
            grant_id = %grant.id,
            role = %grant.role,
            permissions = %grant.permissions,
            "Grant updated"
        );

        Ok(grant)
    }

    /// Withdraw `target`'s access. Returns whether an active grant existed.
    pub async fn revoke_grant(
        &self,
        actor: PrincipalId,
        resource: &ResourceRef,
        target: PrincipalId,
    ) -> AppResult<bool> {
        authorize_manager(&self.resolver, actor, resource).await?;

        let revoked = self
            .grants
            .deactivate(resource.id, target, actor, self.clock.now())
            .await?;

        match revoked {
            Some(grant) => {
                info!(
                    actor = %actor,
                    resource = %resource.id,
                    principal = %target,
                    grant_id = %grant.id,
                    "Grant revoked"
                );
                Ok(true)
            }
            None => {
                debug!(
                    actor = %actor,
                    resource = %resource.id,
                    principal = %target,
                    "No active grant to revoke"
                );
                Ok(false)
            }
        }
    }

    /// Grants on `resource`, oldest first.
    pub async fn list_grants(
        &self,
        actor: PrincipalId,
        resource: &ResourceRef,
        include_inactive: bool,
    ) -> AppResult<Vec<Grant>> {
        authorize_manager(&self.resolver, actor, resource).await?;
        self.grants.list_grants(resource.id, include_inactive).await
    }
}

fn grant_not_found(resource: &ResourceRef, target: PrincipalId) -> AppError {
    AppError::grant_not_found(format!(
        "Principal {target} has no active grant on resource {}",
        resource.id
    ))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use keelson_core::ErrorKind;
    use keelson_core::traits::ManualClock;
    use keelson_core::types::ResourceId;
    use keelson_database::memory::MemoryAccessStore;
    use keelson_entity::access::Permission;

    use super::*;

    struct Fixture {
        admin: GrantAdministration,
        resolver: Arc<AuthorizationResolver>,
        clock: Arc<ManualClock>,
        vessel: ResourceRef,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryAccessStore::new());
        let clock = Arc::new(ManualClock::default());
        let resolver = Arc::new(AuthorizationResolver::new(store.clone(), clock.clone()));
        let admin = GrantAdministration::new(
            store,
            resolver.clone(),
            Arc::new(CapabilityModel::v1()),
            clock.clone(),
        );
        Fixture {
            admin,
            resolver,
            clock,
            vessel: ResourceRef::new(ResourceId::new(), PrincipalId::new()),
        }
    }

    fn request(target: PrincipalId, role: Role) -> CreateGrantRequest {
        CreateGrantRequest {
            target,
            role,
            permissions: None,
            expires_at: None,
        }
    }

    impl Fixture {
        fn owner(&self) -> PrincipalId {
            self.vessel.owner_id
        }

        async fn grant(&self, target: PrincipalId, role: Role) -> Grant {
            self.admin
                .create_or_replace_grant(self.owner(), &self.vessel, request(target, role))
                .await
                .unwrap()
        }
    }

    #[tokio::test]
    async fn test_create_uses_role_defaults() {
        let f = fixture();
        let crew = PrincipalId::new();
        let grant = f.grant(crew, Role::CrewMember).await;

        assert_eq!(grant.granted_by, f.owner());
        assert_eq!(
            grant.permissions,
            CapabilityModel::v1().default_permissions(Role::CrewMember)
        );
        assert!(
            f.resolver
                .is_allowed(crew, &f.vessel, Permission::EditCatchRecords)
                .await
        );
    }

    #[tokio::test]
    async fn test_replace_supersedes() {
        let f = fixture();
        let crew = PrincipalId::new();
        let first = f.grant(crew, Role::Viewer).await;
        let second = f.grant(crew, Role::Captain).await;
        assert_ne!(first.id, second.id);

        let all = f.admin.list_grants(f.owner(), &f.vessel, true).await.unwrap();
        assert_eq!(all.len(), 2);
        let active = f.admin.list_grants(f.owner(), &f.vessel, false).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].role, Role::Captain);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let f = fixture();
        let crew = PrincipalId::new();

        let err = f
            .admin
            .create_or_replace_grant(f.owner(), &f.vessel, request(crew, Role::Owner))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let err = f
            .admin
            .create_or_replace_grant(f.owner(), &f.vessel, request(f.owner(), Role::Viewer))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let mut empty = request(crew, Role::Viewer);
        empty.permissions = Some(PermissionSet::empty());
        let err = f
            .admin
            .create_or_replace_grant(f.owner(), &f.vessel, empty)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let mut past = request(crew, Role::Viewer);
        past.expires_at = Some(f.clock.now());
        let err = f
            .admin
            .create_or_replace_grant(f.owner(), &f.vessel, past)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_non_manager_is_forbidden() {
        let f = fixture();
        let viewer = PrincipalId::new();
        f.grant(viewer, Role::Viewer).await;

        let err = f
            .admin
            .create_or_replace_grant(viewer, &f.vessel, request(PrincipalId::new(), Role::Viewer))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);

        let err = f
            .admin
            .list_grants(PrincipalId::new(), &f.vessel, false)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_moderator_cannot_escalate() {
        let f = fixture();
        let moderator = PrincipalId::new();
        f.grant(moderator, Role::Moderator).await;

        let crew = PrincipalId::new();
        let ok = f
            .admin
            .create_or_replace_grant(moderator, &f.vessel, request(crew, Role::Captain))
            .await
            .unwrap();
        assert_eq!(ok.granted_by, moderator);

        let err = f
            .admin
            .create_or_replace_grant(moderator, &f.vessel, request(crew, Role::Delegate))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);

        let mut delete = request(crew, Role::Editor);
        delete.permissions = Some(PermissionSet::from_iter([Permission::DeleteVessel]));
        let err = f
            .admin
            .create_or_replace_grant(moderator, &f.vessel, delete)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_delegate_may_grant_anything() {
        let f = fixture();
        let delegate = PrincipalId::new();
        f.grant(delegate, Role::Delegate).await;

        let other = PrincipalId::new();
        let grant = f
            .admin
            .create_or_replace_grant(delegate, &f.vessel, request(other, Role::Delegate))
            .await
            .unwrap();
        assert_eq!(grant.permissions, PermissionSet::full_access());
    }

    #[tokio::test]
    async fn test_update_in_place() {
        let f = fixture();
        let crew = PrincipalId::new();
        let original = f.grant(crew, Role::Viewer).await;

        let updated = f
            .admin
            .update_grant(
                f.owner(),
                &f.vessel,
                crew,
                UpdateGrantRequest {
                    role: Some(Role::Editor),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.granted_by, original.granted_by);
        assert_eq!(updated.role, Role::Editor);
        assert_eq!(
            updated.permissions,
            CapabilityModel::v1().default_permissions(Role::Editor)
        );

        let explicit = PermissionSet::from_iter([Permission::ViewTrips]);
        let narrowed = f
            .admin
            .update_grant(
                f.owner(),
                &f.vessel,
                crew,
                UpdateGrantRequest {
                    permissions: Some(explicit.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(narrowed.role, Role::Editor);
        assert_eq!(narrowed.permissions, explicit);
    }

    #[tokio::test]
    async fn test_update_expiry_patch() {
        let f = fixture();
        let crew = PrincipalId::new();
        f.grant(crew, Role::Viewer).await;

        let at = f.clock.now() + Duration::days(3);
        let set = f
            .admin
            .update_grant(
                f.owner(),
                &f.vessel,
                crew,
                UpdateGrantRequest {
                    expires_at: Some(Some(at)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(set.expires_at, Some(at));

        let kept = f
            .admin
            .update_grant(f.owner(), &f.vessel, crew, UpdateGrantRequest::default())
            .await
            .unwrap();
        assert_eq!(kept.expires_at, Some(at));

        let cleared = f
            .admin
            .update_grant(
                f.owner(),
                &f.vessel,
                crew,
                UpdateGrantRequest {
                    expires_at: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.expires_at, None);
    }

    #[tokio::test]
    async fn test_update_without_grant() {
        let f = fixture();
        let err = f
            .admin
            .update_grant(
                f.owner(),
                &f.vessel,
                PrincipalId::new(),
                UpdateGrantRequest::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::GrantNotFound);
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let f = fixture();
        let crew = PrincipalId::new();
        f.grant(crew, Role::Captain).await;

        assert!(f.admin.revoke_grant(f.owner(), &f.vessel, crew).await.unwrap());
        assert!(!f.admin.revoke_grant(f.owner(), &f.vessel, crew).await.unwrap());
        assert!(
            !f.resolver
                .is_allowed(crew, &f.vessel, Permission::ViewTrips)
                .await
        );

        let history = f.admin.list_grants(f.owner(), &f.vessel, true).await.unwrap();
        assert_eq!(history[0].revoked_by, Some(f.owner()));
    }
}
