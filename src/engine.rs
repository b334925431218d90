//! Engine assembly.
//!
//! Wires stores, the resource directory, the capability model, and the
//! clock into the resolver and the two services.

use std::sync::Arc;

use tracing::info;

use keelson_auth::{AuthorizationResolver, CapabilityModel};
use keelson_core::config::{AppConfig, InvitationConfig};
use keelson_core::result::AppResult;
use keelson_core::traits::{Clock, ResourceDirectory, SystemClock};
use keelson_core::types::ResourceId;
use keelson_database::DatabasePool;
use keelson_database::memory::MemoryAccessStore;
use keelson_database::repositories::{GrantRepository, InvitationRepository, PgResourceDirectory};
use keelson_database::store::{GrantStore, InvitationStore};
use keelson_entity::resource::ResourceRef;
use keelson_service::access::resource_ref;
use keelson_service::{GrantAdministration, InvitationManager};

/// The assembled access-control engine.
#[derive(Clone)]
pub struct Engine {
    /// Answers authorization questions.
    pub resolver: Arc<AuthorizationResolver>,
    /// Grant administration.
    pub grants: Arc<GrantAdministration>,
    /// Invitation lifecycle.
    pub invitations: Arc<InvitationManager>,
    /// Role defaults in force.
    pub capabilities: Arc<CapabilityModel>,
    /// Resource ownership lookup.
    pub directory: Arc<dyn ResourceDirectory>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("capability_version", &self.capabilities.version())
            .finish()
    }
}

impl Engine {
    /// Assemble an engine from its collaborators.
    pub fn new(
        grant_store: Arc<dyn GrantStore>,
        invitation_store: Arc<dyn InvitationStore>,
        directory: Arc<dyn ResourceDirectory>,
        capabilities: Arc<CapabilityModel>,
        clock: Arc<dyn Clock>,
        invitation_config: InvitationConfig,
    ) -> Self {
        let resolver = Arc::new(AuthorizationResolver::new(
            Arc::clone(&grant_store),
            Arc::clone(&clock),
        ));
        let grants = Arc::new(GrantAdministration::new(
            grant_store,
            Arc::clone(&resolver),
            Arc::clone(&capabilities),
            Arc::clone(&clock),
        ));
        let invitations = Arc::new(InvitationManager::new(
            invitation_store,
            Arc::clone(&directory),
            Arc::clone(&resolver),
            Arc::clone(&capabilities),
            clock,
            invitation_config,
        ));

        Self {
            resolver,
            grants,
            invitations,
            capabilities,
            directory,
        }
    }

    /// Engine over PostgreSQL, configured from `config`.
    pub fn postgres(pool: &DatabasePool, config: &AppConfig) -> AppResult<Self> {
        config.invitation.validate()?;
        let capabilities = Arc::new(capability_model(config)?);
        let directory = PgResourceDirectory::new(pool.pool().clone(), &config.directory)?;

        info!(
            capability_version = capabilities.version(),
            resource_table = %config.directory.table,
            "Access engine ready (postgres)"
        );

        Ok(Self::new(
            Arc::new(GrantRepository::new(pool.pool().clone())),
            Arc::new(InvitationRepository::new(pool.pool().clone())),
            Arc::new(directory),
            capabilities,
            Arc::new(SystemClock),
            config.invitation.clone(),
        ))
    }

    /// Engine over in-process stores.
    pub fn in_memory(
        directory: Arc<dyn ResourceDirectory>,
        capabilities: Arc<CapabilityModel>,
        clock: Arc<dyn Clock>,
        invitation_config: InvitationConfig,
    ) -> Self {
        let store = Arc::new(MemoryAccessStore::new());
        Self::new(
            store.clone(),
            store,
            directory,
            capabilities,
            clock,
            invitation_config,
        )
    }

    /// Look up `resource` and its owner in the directory.
    pub async fn resource(&self, resource: ResourceId) -> AppResult<ResourceRef> {
        resource_ref(self.directory.as_ref(), resource).await
    }
}

/// The capability model selected by `config`: the configured table when
/// present, otherwise the built-in one.
pub fn capability_model(config: &AppConfig) -> AppResult<CapabilityModel> {
    match &config.capabilities {
        Some(table) => CapabilityModel::from_config(table),
        None => Ok(CapabilityModel::v1()),
    }
}
