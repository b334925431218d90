//! In-memory resource directory.

use async_trait::async_trait;
use dashmap::DashMap;

use keelson_core::result::AppResult;
use keelson_core::traits::ResourceDirectory;
use keelson_core::types::{PrincipalId, ResourceId};

/// Resource ownership held in a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryResourceDirectory {
    owners: DashMap<ResourceId, PrincipalId>,
}

impl MemoryResourceDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `owner` as the owner of `resource`.
    pub fn register(&self, resource: ResourceId, owner: PrincipalId) {
        self.owners.insert(resource, owner);
    }
}

#[async_trait]
impl ResourceDirectory for MemoryResourceDirectory {
    async fn owner_of(&self, resource: ResourceId) -> AppResult<Option<PrincipalId>> {
        Ok(self.owners.get(&resource).map(|owner| *owner))
    }
}
