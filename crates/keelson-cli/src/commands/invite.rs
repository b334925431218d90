//! Invitation commands.

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use super::display_time;
use crate::output::{self, OutputFormat};
use keelson_core::config::AppConfig;
use keelson_core::error::AppError;
use keelson_core::types::{InvitationId, PrincipalId, ResourceId};
use keelson_entity::access::{PermissionSet, Role};
use keelson_entity::invitation::{InvitationState, InvitationView};
use keelson_service::{CreateInvitationRequest, VerifiedIdentity};

/// Arguments for the invite command
#[derive(Debug, Args)]
pub struct InviteArgs {
    /// Invitation subcommand
    #[command(subcommand)]
    pub command: InviteCommand,
}

/// Invitation subcommands
#[derive(Debug, Subcommand)]
pub enum InviteCommand {
    /// Invite someone to a vessel and print the token
    Create {
        /// Vessel ID
        #[arg(long)]
        vessel: ResourceId,
        /// Principal sending the invitation
        #[arg(long)]
        actor: PrincipalId,
        /// Invitee identity (e.g. email address)
        #[arg(long)]
        identity: String,
        /// Role on offer
        #[arg(long)]
        role: Role,
        /// Comma-separated permissions (defaults to the role's)
        #[arg(long)]
        permissions: Option<PermissionSet>,
        /// Days until the invitation lapses
        #[arg(long)]
        ttl_days: Option<i64>,
        /// Expiry of the resulting grant (RFC 3339)
        #[arg(long)]
        grant_expires_at: Option<DateTime<Utc>>,
    },
    /// Withdraw a pending invitation
    Cancel {
        /// Invitation ID
        id: InvitationId,
        /// Principal cancelling
        #[arg(long)]
        actor: PrincipalId,
    },
    /// List invitations on a vessel
    List {
        /// Vessel ID
        #[arg(long)]
        vessel: ResourceId,
        /// Principal asking
        #[arg(long)]
        actor: PrincipalId,
        /// Only show invitations in this state
        #[arg(long)]
        state: Option<InvitationState>,
    },
    /// Show the newest pending invitation for an identity
    Latest {
        /// Vessel ID
        #[arg(long)]
        vessel: ResourceId,
        /// Principal asking
        #[arg(long)]
        actor: PrincipalId,
        /// Invitee identity
        #[arg(long)]
        identity: String,
    },
    /// Show what a token offers
    Show {
        /// Invitation token
        #[arg(long)]
        token: String,
    },
    /// Redeem a token as a verified principal
    Redeem {
        /// Invitation token
        #[arg(long)]
        token: String,
        /// Redeeming principal
        #[arg(long)]
        principal: PrincipalId,
        /// Verified identity of the redeeming principal
        #[arg(long)]
        identity: String,
    },
}

/// Invitation row for table display
#[derive(Debug, Serialize, Tabled)]
struct InvitationRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Invitee")]
    invitee: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Permissions")]
    permissions: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Expires")]
    expires: String,
}

impl From<&InvitationView> for InvitationRow {
    fn from(v: &InvitationView) -> Self {
        Self {
            id: v.id.to_string(),
            invitee: v.target_identity.clone(),
            role: v.role.to_string(),
            permissions: v.permissions.to_string(),
            state: v.state.to_string(),
            expires: display_time(Some(v.expires_at)),
        }
    }
}

/// Execute invitation commands
pub async fn execute(
    args: &InviteArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let engine = super::connect_engine(config).await?;
    let manager = &engine.invitations;

    match &args.command {
        InviteCommand::Create {
            vessel,
            actor,
            identity,
            role,
            permissions,
            ttl_days,
            grant_expires_at,
        } => {
            let resource = engine.resource(*vessel).await?;
            let issued = manager
                .create_invitation(
                    *actor,
                    &resource,
                    CreateInvitationRequest {
                        target_identity: identity.clone(),
                        role: *role,
                        permissions: permissions.clone(),
                        ttl_days: *ttl_days,
                        grant_expires_at: *grant_expires_at,
                    },
                )
                .await?;

            match format {
                OutputFormat::Json => {
                    let json = serde_json::to_string_pretty(&issued)
                        .map_err(|e| AppError::internal(format!("Serialization error: {e}")))?;
                    println!("{json}");
                }
                OutputFormat::Table => {
                    output::print_success("Invitation issued.");
                    output::print_kv("ID", &issued.invitation.id.to_string());
                    output::print_kv("Invitee", &issued.invitation.target_identity);
                    output::print_kv("Role", issued.invitation.role.as_str());
                    output::print_kv("Expires", &display_time(Some(issued.invitation.expires_at)));
                    output::print_kv("Token", &issued.token);
                }
            }
        }
        InviteCommand::Cancel { id, actor } => {
            let view = manager.cancel_invitation(*actor, *id).await?;
            output::print_item(&InvitationRow::from(&view), format);
        }
        InviteCommand::List {
            vessel,
            actor,
            state,
        } => {
            let resource = engine.resource(*vessel).await?;
            let views = manager.list_invitations(*actor, &resource, *state).await?;
            let rows: Vec<InvitationRow> = views.iter().map(InvitationRow::from).collect();
            output::print_list(&rows, format);
        }
        InviteCommand::Latest {
            vessel,
            actor,
            identity,
        } => {
            let resource = engine.resource(*vessel).await?;
            match manager.latest_pending_for(*actor, &resource, identity).await? {
                Some(view) => output::print_item(&InvitationRow::from(&view), format),
                None => println!("No pending invitation for {identity}."),
            }
        }
        InviteCommand::Show { token } => {
            let view = manager.preview(token).await?;
            output::print_item(&InvitationRow::from(&view), format);
        }
        InviteCommand::Redeem {
            token,
            principal,
            identity,
        } => {
            let redeemer = VerifiedIdentity::new(*principal, identity.as_str());
            let redemption = manager.redeem(token, &redeemer).await?;
            output::print_success("Invitation accepted.");
            output::print_kv("Vessel", &redemption.resource_id.to_string());
            output::print_kv("Grant", &redemption.grant_id.to_string());
            output::print_kv("Role", redemption.role.as_str());
            output::print_kv("Permissions", &redemption.permissions.to_string());
        }
    }

    Ok(())
}
