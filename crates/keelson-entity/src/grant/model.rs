//! Grant entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use keelson_core::types::{GrantId, PrincipalId, ResourceId};

use crate::access::{PermissionSet, Role};

/// One principal's access to one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Grant {
    /// Unique grant identifier.
    pub id: GrantId,
    /// The resource this grant applies to.
    pub resource_id: ResourceId,
    /// The principal holding the grant.
    pub principal_id: PrincipalId,
    /// The role the grant was issued under.
    pub role: Role,
    /// The effective permission set (may differ from the role defaults).
    pub permissions: PermissionSet,
    /// Whether the grant is active. At most one active grant exists per pair.
    pub is_active: bool,
    /// When the grant stops being effective (None = never).
    pub expires_at: Option<DateTime<Utc>>,
    /// Principal who created the grant.
    pub granted_by: PrincipalId,
    /// When the grant was created.
    pub created_at: DateTime<Utc>,
    /// When the grant was last modified.
    pub updated_at: DateTime<Utc>,
    /// Principal who revoked or superseded the grant.
    pub revoked_by: Option<PrincipalId>,
    /// When the grant was deactivated.
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Grant {
    /// Check if the grant's expiry has passed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| exp <= now).unwrap_or(false)
    }

    /// A grant is effective iff it is active and not expired at `now`.
    pub fn is_effective_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired_at(now)
    }
}

/// Data required to create a new active grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGrant {
    /// The resource.
    pub resource_id: ResourceId,
    /// The principal receiving access.
    pub principal_id: PrincipalId,
    /// Role under which access is given.
    pub role: Role,
    /// Effective permission set.
    pub permissions: PermissionSet,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Principal creating the grant.
    pub granted_by: PrincipalId,
}

impl NewGrant {
    /// Materialize the row this request creates.
    pub fn into_grant(self, id: GrantId, now: DateTime<Utc>) -> Grant {
        Grant {
            id,
            resource_id: self.resource_id,
            principal_id: self.principal_id,
            role: self.role,
            permissions: self.permissions,
            is_active: true,
            expires_at: self.expires_at,
            granted_by: self.granted_by,
            created_at: now,
            updated_at: now,
            revoked_by: None,
            revoked_at: None,
        }
    }
}

/// Replacement values for an in-place grant update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantUpdate {
    /// New role.
    pub role: Role,
    /// New effective permission set.
    pub permissions: PermissionSet,
    /// New expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

impl GrantUpdate {
    /// Apply the update to `grant`, keeping its identity and provenance.
    pub fn apply_to(&self, grant: &mut Grant, now: DateTime<Utc>) {
        grant.role = self.role;
        grant.permissions = self.permissions.clone();
        grant.expires_at = self.expires_at;
        grant.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn grant(expires_at: Option<DateTime<Utc>>) -> Grant {
        NewGrant {
            resource_id: ResourceId::new(),
            principal_id: PrincipalId::new(),
            role: Role::Viewer,
            permissions: PermissionSet::empty(),
            expires_at,
            granted_by: PrincipalId::new(),
        }
        .into_grant(GrantId::new(), Utc::now())
    }

    #[test]
    fn test_effective_without_expiry() {
        let g = grant(None);
        assert!(g.is_effective_at(Utc::now() + Duration::days(3650)));
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let now = Utc::now();
        let g = grant(Some(now));
        assert!(!g.is_effective_at(now));
        assert!(g.is_effective_at(now - Duration::seconds(1)));
    }

    #[test]
    fn test_inactive_is_never_effective() {
        let mut g = grant(None);
        g.is_active = false;
        assert!(!g.is_effective_at(Utc::now()));
    }
}
