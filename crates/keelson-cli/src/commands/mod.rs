//! CLI command definitions and dispatch.

pub mod check;
pub mod grant;
pub mod invite;
pub mod migrate;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use keelson::{Engine, init_logging};
use keelson_core::config::AppConfig;
use keelson_core::error::AppError;
use keelson_database::DatabasePool;

/// Keelson: delegated access control for vessels
#[derive(Debug, Parser)]
#[command(name = "keelson", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Environment overlay merged on top of the base file
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Grant administration
    Grant(grant::GrantArgs),
    /// Invitation lifecycle
    Invite(invite::InviteArgs),
    /// Ask whether a principal holds a permission
    Check(check::CheckArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = load_config(&self.config, &self.env)?;
        init_logging(&config.logging)?;

        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &config).await,
            Commands::Grant(args) => grant::execute(args, &config, self.format).await,
            Commands::Invite(args) => invite::execute(args, &config, self.format).await,
            Commands::Check(args) => check::execute(args, &config, self.format).await,
        }
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str, env: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(config_path, env)
}

/// Helper: create database pool from config
pub async fn create_db_pool(config: &AppConfig) -> Result<DatabasePool, AppError> {
    DatabasePool::connect(&config.database).await
}

/// Helper: connect and assemble the access engine
pub async fn connect_engine(config: &AppConfig) -> Result<Engine, AppError> {
    let pool = create_db_pool(config).await?;
    Engine::postgres(&pool, config)
}

/// Render an optional timestamp for table output.
pub(crate) fn display_time(at: Option<chrono::DateTime<chrono::Utc>>) -> String {
    at.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string())
}
