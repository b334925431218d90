//! Checks shared by every administrative operation.

use chrono::{DateTime, Utc};
use tracing::warn;

use keelson_auth::{AuthorizationResolver, CapabilityModel, Decision};
use keelson_core::error::AppError;
use keelson_core::result::AppResult;
use keelson_core::traits::ResourceDirectory;
use keelson_core::types::{PrincipalId, ResourceId};
use keelson_entity::access::{Permission, PermissionSet, Role};
use keelson_entity::resource::ResourceRef;

/// Require `actor` to hold `manage_access` on `resource`.
///
/// Returns the actor's decision so callers can apply the delegation ceiling.
pub async fn authorize_manager(
    resolver: &AuthorizationResolver,
    actor: PrincipalId,
    resource: &ResourceRef,
) -> AppResult<Decision> {
    let decision = resolver
        .resolve(actor, resource, Permission::ManageAccess)
        .await?;
    if !decision.allow {
        warn!(
            actor = %actor,
            resource = %resource.id,
            "Access administration denied"
        );
        return Err(AppError::forbidden(format!(
            "Principal {actor} may not manage access to resource {}",
            resource.id
        )));
    }
    Ok(decision)
}

/// Refuse to hand out permissions the acting non-owner does not hold.
///
/// The owner and holders of `full_access` may grant anything.
pub fn ensure_within_ceiling(
    actor: &Decision,
    requested: &PermissionSet,
) -> AppResult<()> {
    if actor.effective_permissions.covers(requested) {
        return Ok(());
    }
    let exceeding: Vec<&str> = requested
        .iter()
        .filter(|p| !actor.effective_permissions.allows(*p))
        .map(|p| p.as_str())
        .collect();
    Err(AppError::forbidden(format!(
        "Cannot grant permissions you do not hold: {}",
        exceeding.join(", ")
    )))
}

/// The permission set a grant or invitation for `role` will carry.
///
/// Explicit permissions win over the role defaults but may not be empty.
pub fn permissions_for(
    capabilities: &CapabilityModel,
    role: Role,
    explicit: Option<PermissionSet>,
) -> AppResult<PermissionSet> {
    ensure_grantable(role)?;
    match explicit {
        Some(set) if set.is_empty() => Err(AppError::validation(
            "Permission set must not be empty; revoke the grant instead",
        )),
        Some(set) => Ok(set),
        None => Ok(capabilities.default_permissions(role)),
    }
}

/// Reject the `owner` role on grants and invitations.
pub fn ensure_grantable(role: Role) -> AppResult<()> {
    if role.is_grantable() {
        Ok(())
    } else {
        Err(AppError::validation("The owner role cannot be granted"))
    }
}

/// Reject an expiry that is not strictly in the future.
pub fn ensure_future(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> AppResult<()> {
    if expires_at > now {
        Ok(())
    } else {
        Err(AppError::validation("Expiry must be in the future"))
    }
}

/// Build the ownership fact for `resource` from the directory.
pub async fn resource_ref(
    directory: &dyn ResourceDirectory,
    resource: ResourceId,
) -> AppResult<ResourceRef> {
    directory
        .owner_of(resource)
        .await?
        .map(|owner| ResourceRef::new(resource, owner))
        .ok_or_else(|| AppError::not_found(format!("Resource {resource} not found")))
}
