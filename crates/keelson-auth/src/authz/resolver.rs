//! Authorization resolver.
//!
//! Resolution order:
//! 1. Owner check: the resource owner holds `{full_access}` as `owner`.
//! 2. Grant lookup: the active grant for the pair, if effective at `now`.
//! 3. Permission check on the grant's permission set.
//!
//! Every call reads the clock and the grant store afresh. Nothing is cached,
//! so a revocation or expiry is visible to the very next call.

use std::sync::Arc;

use tracing::{debug, warn};

use keelson_core::error::AppError;
use keelson_core::result::AppResult;
use keelson_core::traits::Clock;
use keelson_core::types::PrincipalId;
use keelson_database::store::GrantStore;
use keelson_entity::access::Permission;
use keelson_entity::resource::ResourceRef;

use super::decision::Decision;
use crate::capability::CapabilityModel;

/// Answers "may this principal do this to this resource right now?".
#[derive(Clone)]
pub struct AuthorizationResolver {
    /// Grant lookup.
    grants: Arc<dyn GrantStore>,
    /// Source of "now" for expiry checks.
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for AuthorizationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationResolver").finish()
    }
}

impl AuthorizationResolver {
    /// Creates a new resolver.
    pub fn new(grants: Arc<dyn GrantStore>, clock: Arc<dyn Clock>) -> Self {
        Self { grants, clock }
    }

    /// Everything `principal` may currently do on `resource`.
    ///
    /// `allow` is true iff the principal holds any access at all.
    pub async fn effective_permissions(
        &self,
        principal: PrincipalId,
        resource: &ResourceRef,
    ) -> AppResult<Decision> {
        if resource.is_owned_by(principal) {
            return Ok(Decision::owner());
        }

        let now = self.clock.now();
        let grant = self
            .grants
            .find_active(resource.id, principal)
            .await?
            .filter(|g| g.is_effective_at(now));

        Ok(match grant {
            Some(grant) => Decision {
                allow: true,
                effective_permissions: grant.permissions,
                role: Some(grant.role),
            },
            None => Decision::deny(),
        })
    }

    /// Decide whether `principal` may exercise `required` on `resource`.
    ///
    /// Store failures are returned as errors, never as a decision.
    pub async fn resolve(
        &self,
        principal: PrincipalId,
        resource: &ResourceRef,
        required: Permission,
    ) -> AppResult<Decision> {
        let mut decision = self.effective_permissions(principal, resource).await?;
        decision.allow =
            CapabilityModel::has_permission(&decision.effective_permissions, required);

        debug!(
            principal = %principal,
            resource = %resource.id,
            required = %required,
            allow = decision.allow,
            role = ?decision.role,
            "Resolved access"
        );

        Ok(decision)
    }

    /// Boolean form of [`resolve`](Self::resolve). A fault counts as a denial.
    pub async fn is_allowed(
        &self,
        principal: PrincipalId,
        resource: &ResourceRef,
        required: Permission,
    ) -> bool {
        match self.resolve(principal, resource, required).await {
            Ok(decision) => decision.allow,
            Err(e) => {
                warn!(
                    principal = %principal,
                    resource = %resource.id,
                    required = %required,
                    error = %e,
                    "Access check failed; denying"
                );
                false
            }
        }
    }

    /// Like [`resolve`](Self::resolve), but a denial is `Forbidden`.
    pub async fn require(
        &self,
        principal: PrincipalId,
        resource: &ResourceRef,
        required: Permission,
    ) -> AppResult<Decision> {
        let decision = self.resolve(principal, resource, required).await?;
        if decision.allow {
            Ok(decision)
        } else {
            Err(AppError::forbidden(format!(
                "Principal {principal} lacks '{required}' on resource {}",
                resource.id
            )))
        }
    }
}
