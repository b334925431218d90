//! Resource reference value object.

use serde::{Deserialize, Serialize};

use keelson_core::types::{PrincipalId, ResourceId};

/// A protected resource together with its owner, as asserted by the caller.
///
/// The engine does not own resource metadata; whoever builds a
/// `ResourceRef` vouches for the ownership fact it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    /// The resource id.
    pub id: ResourceId,
    /// The single owner principal.
    pub owner_id: PrincipalId,
}

impl ResourceRef {
    /// Create a new resource reference.
    pub fn new(id: ResourceId, owner_id: PrincipalId) -> Self {
        Self { id, owner_id }
    }

    /// Whether `principal` owns this resource.
    pub fn is_owned_by(&self, principal: PrincipalId) -> bool {
        self.owner_id == principal
    }
}
