//! Authorization check command.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use keelson_core::config::AppConfig;
use keelson_core::error::AppError;
use keelson_core::types::{PrincipalId, ResourceId};
use keelson_entity::access::Permission;

/// Arguments for the check command
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Vessel ID
    #[arg(long)]
    pub vessel: ResourceId,
    /// Principal to check
    #[arg(long)]
    pub principal: PrincipalId,
    /// Permission required; omit to list effective permissions
    #[arg(long)]
    pub permission: Option<Permission>,
}

#[derive(Debug, Serialize, Tabled)]
struct DecisionRow {
    #[tabled(rename = "Allowed")]
    allow: bool,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Effective Permissions")]
    permissions: String,
}

/// Execute the check command
pub async fn execute(
    args: &CheckArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let engine = super::connect_engine(config).await?;
    let resource = engine.resource(args.vessel).await?;

    let decision = match args.permission {
        Some(permission) => {
            engine
                .resolver
                .resolve(args.principal, &resource, permission)
                .await?
        }
        None => {
            engine
                .resolver
                .effective_permissions(args.principal, &resource)
                .await?
        }
    };

    output::print_item(
        &DecisionRow {
            allow: decision.allow,
            role: decision
                .role
                .map(|r| r.to_string())
                .unwrap_or_else(|| "none".to_string()),
            permissions: decision.effective_permissions.to_string(),
        },
        format,
    );

    Ok(())
}
