//! Grant administration commands.

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use super::display_time;
use crate::output::{self, OutputFormat};
use keelson_core::config::AppConfig;
use keelson_core::error::AppError;
use keelson_core::types::{PrincipalId, ResourceId};
use keelson_entity::access::{PermissionSet, Role};
use keelson_entity::grant::Grant;
use keelson_service::{CreateGrantRequest, UpdateGrantRequest};

/// Arguments for the grant command
#[derive(Debug, Args)]
pub struct GrantArgs {
    /// Grant subcommand
    #[command(subcommand)]
    pub command: GrantCommand,
}

/// Grant subcommands
#[derive(Debug, Subcommand)]
pub enum GrantCommand {
    /// Give a principal a role on a vessel, replacing any active grant
    Create {
        /// Vessel ID
        #[arg(long)]
        vessel: ResourceId,
        /// Principal performing the change
        #[arg(long)]
        actor: PrincipalId,
        /// Principal receiving access
        #[arg(long)]
        principal: PrincipalId,
        /// Role to grant
        #[arg(long)]
        role: Role,
        /// Comma-separated permissions (defaults to the role's)
        #[arg(long)]
        permissions: Option<PermissionSet>,
        /// Grant expiry (RFC 3339)
        #[arg(long)]
        expires_at: Option<DateTime<Utc>>,
    },
    /// Change the active grant of a principal
    Update {
        /// Vessel ID
        #[arg(long)]
        vessel: ResourceId,
        /// Principal performing the change
        #[arg(long)]
        actor: PrincipalId,
        /// Principal whose grant changes
        #[arg(long)]
        principal: PrincipalId,
        /// New role
        #[arg(long)]
        role: Option<Role>,
        /// New comma-separated permissions
        #[arg(long)]
        permissions: Option<PermissionSet>,
        /// New expiry (RFC 3339)
        #[arg(long, conflicts_with = "clear_expiry")]
        expires_at: Option<DateTime<Utc>>,
        /// Remove the expiry
        #[arg(long)]
        clear_expiry: bool,
    },
    /// Revoke the active grant of a principal
    Revoke {
        /// Vessel ID
        #[arg(long)]
        vessel: ResourceId,
        /// Principal performing the change
        #[arg(long)]
        actor: PrincipalId,
        /// Principal losing access
        #[arg(long)]
        principal: PrincipalId,
        /// Skip confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// List grants on a vessel
    List {
        /// Vessel ID
        #[arg(long)]
        vessel: ResourceId,
        /// Principal asking
        #[arg(long)]
        actor: PrincipalId,
        /// Include revoked grants
        #[arg(long)]
        all: bool,
    },
}

/// Grant row for table display
#[derive(Debug, Serialize, Tabled)]
struct GrantRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Principal")]
    principal: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Permissions")]
    permissions: String,
    #[tabled(rename = "Active")]
    active: bool,
    #[tabled(rename = "Expires")]
    expires: String,
    #[tabled(rename = "Granted By")]
    granted_by: String,
}

impl From<&Grant> for GrantRow {
    fn from(g: &Grant) -> Self {
        Self {
            id: g.id.to_string(),
            principal: g.principal_id.to_string(),
            role: g.role.to_string(),
            permissions: g.permissions.to_string(),
            active: g.is_active,
            expires: display_time(g.expires_at),
            granted_by: g.granted_by.to_string(),
        }
    }
}

/// Execute grant commands
pub async fn execute(
    args: &GrantArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let engine = super::connect_engine(config).await?;

    match &args.command {
        GrantCommand::Create {
            vessel,
            actor,
            principal,
            role,
            permissions,
            expires_at,
        } => {
            let resource = engine.resource(*vessel).await?;
            let grant = engine
                .grants
                .create_or_replace_grant(
                    *actor,
                    &resource,
                    CreateGrantRequest {
                        target: *principal,
                        role: *role,
                        permissions: permissions.clone(),
                        expires_at: *expires_at,
                    },
                )
                .await?;
            output::print_item(&GrantRow::from(&grant), format);
        }
        GrantCommand::Update {
            vessel,
            actor,
            principal,
            role,
            permissions,
            expires_at,
            clear_expiry,
        } => {
            let expiry = match (*expires_at, *clear_expiry) {
                (_, true) => Some(None),
                (Some(at), false) => Some(Some(at)),
                (None, false) => None,
            };
            let resource = engine.resource(*vessel).await?;
            let grant = engine
                .grants
                .update_grant(
                    *actor,
                    &resource,
                    *principal,
                    UpdateGrantRequest {
                        role: *role,
                        permissions: permissions.clone(),
                        expires_at: expiry,
                    },
                )
                .await?;
            output::print_item(&GrantRow::from(&grant), format);
        }
        GrantCommand::Revoke {
            vessel,
            actor,
            principal,
            yes,
        } => {
            if !yes {
                let confirm = dialoguer::Confirm::new()
                    .with_prompt(format!("Revoke access of {principal} on {vessel}?"))
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

                if !confirm {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let resource = engine.resource(*vessel).await?;
            if engine.grants.revoke_grant(*actor, &resource, *principal).await? {
                output::print_success(&format!("Access of {principal} revoked."));
            } else {
                println!("{principal} had no active grant on {vessel}.");
            }
        }
        GrantCommand::List { vessel, actor, all } => {
            let resource = engine.resource(*vessel).await?;
            let grants = engine.grants.list_grants(*actor, &resource, *all).await?;
            let rows: Vec<GrantRow> = grants.iter().map(GrantRow::from).collect();
            output::print_list(&rows, format);
        }
    }

    Ok(())
}
