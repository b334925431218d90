//! Authorization decision value.

use serde::{Deserialize, Serialize};

use keelson_entity::access::{PermissionSet, Role};

/// Outcome of resolving a principal's access to a resource.
///
/// A denial is a normal value, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Whether the required permission is allowed.
    pub allow: bool,
    /// Everything the principal may currently do on the resource.
    pub effective_permissions: PermissionSet,
    /// The role access is held under. `None` when there is no access.
    pub role: Option<Role>,
}

impl Decision {
    /// The owner's decision: everything, as `owner`.
    pub fn owner() -> Self {
        Self {
            allow: true,
            effective_permissions: PermissionSet::full_access(),
            role: Some(Role::Owner),
        }
    }

    /// No access at all.
    pub fn deny() -> Self {
        Self {
            allow: false,
            effective_permissions: PermissionSet::empty(),
            role: None,
        }
    }

    /// Whether the principal holds any access, regardless of `allow`.
    pub fn has_access(&self) -> bool {
        self.role.is_some()
    }
}
