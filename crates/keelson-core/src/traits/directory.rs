//! Resource ownership lookup supplied by the resource-management collaborator.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::id::{PrincipalId, ResourceId};

/// Answers "who owns this resource?".
///
/// The engine never stores ownership. Operations that receive only a
/// resource id (cancelling or redeeming an invitation) use this to build
/// the ownership fact the resolver needs.
#[async_trait]
pub trait ResourceDirectory: Send + Sync + 'static {
    /// Return the owner of `resource`, or `None` if the resource does not exist.
    async fn owner_of(&self, resource: ResourceId) -> AppResult<Option<PrincipalId>>;
}
