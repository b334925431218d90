//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod capability;
pub mod database;
pub mod directory;
pub mod invitation;
pub mod logging;

use serde::{Deserialize, Serialize};

pub use self::capability::CapabilityTableConfig;
pub use self::database::DatabaseConfig;
pub use self::directory::DirectoryConfig;
pub use self::invitation::InvitationConfig;
pub use self::logging::LoggingConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// Top-level deserialization target for the merged TOML files
/// (`config/default.toml` + environment overlay) and `KEELSON__*`
/// environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Invitation issuing limits.
    #[serde(default)]
    pub invitation: InvitationConfig,
    /// Where resource ownership is read from.
    #[serde(default)]
    pub directory: DirectoryConfig,
    /// Role-to-permission table override. The built-in table is used when absent.
    #[serde(default)]
    pub capabilities: Option<CapabilityTableConfig>,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// `path` names the base file (extension optional). An overlay named
    /// after `env` in the same directory is merged on top when present, then
    /// environment variables prefixed with `KEELSON__`.
    pub fn load(path: &str, env: &str) -> Result<Self, AppError> {
        let base = path.trim_end_matches(".toml");
        let overlay = match base.rsplit_once('/') {
            Some((dir, _)) => format!("{dir}/{env}"),
            None => env.to_string(),
        };

        let config = config::Config::builder()
            .add_source(config::File::with_name(base).required(false))
            .add_source(config::File::with_name(&overlay).required(false))
            .add_source(
                config::Environment::with_prefix("KEELSON")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        config.invitation.validate()?;
        Ok(config)
    }
}
