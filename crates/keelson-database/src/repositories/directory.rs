//! Resource ownership lookup against the collaborator's resource table.

use async_trait::async_trait;
use sqlx::PgPool;

use keelson_core::config::DirectoryConfig;
use keelson_core::error::{AppError, ErrorKind};
use keelson_core::result::AppResult;
use keelson_core::traits::ResourceDirectory;
use keelson_core::types::{PrincipalId, ResourceId};

/// Reads resource owners from a table in the same database.
#[derive(Debug, Clone)]
pub struct PgResourceDirectory {
    pool: PgPool,
    query: String,
}

impl PgResourceDirectory {
    /// Build a directory over the table and columns named in `config`.
    ///
    /// Names are interpolated into SQL, so each must be a plain identifier
    /// (optionally schema-qualified for the table).
    pub fn new(pool: PgPool, config: &DirectoryConfig) -> AppResult<Self> {
        let table = config
            .table
            .split('.')
            .map(checked_identifier)
            .collect::<AppResult<Vec<_>>>()?
            .join(".");
        let id_column = checked_identifier(&config.id_column)?;
        let owner_column = checked_identifier(&config.owner_column)?;

        Ok(Self {
            pool,
            query: format!("SELECT {owner_column} FROM {table} WHERE {id_column} = $1"),
        })
    }
}

#[async_trait]
impl ResourceDirectory for PgResourceDirectory {
    async fn owner_of(&self, resource: ResourceId) -> AppResult<Option<PrincipalId>> {
        sqlx::query_scalar::<_, PrincipalId>(&self.query)
            .bind(resource)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to look up owner", e))
    }
}

fn checked_identifier(name: &str) -> AppResult<&str> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(AppError::configuration(format!(
            "Invalid directory identifier: '{name}'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_check() {
        assert!(checked_identifier("vessels").is_ok());
        assert!(checked_identifier("owner_id").is_ok());
        assert!(checked_identifier("_v2").is_ok());
        assert!(checked_identifier("").is_err());
        assert!(checked_identifier("1table").is_err());
        assert!(checked_identifier("vessels; DROP TABLE x").is_err());
    }
}
