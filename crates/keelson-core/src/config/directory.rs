//! Resource directory configuration.

use serde::{Deserialize, Serialize};

/// Location of the collaborator-owned table that records resource ownership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Table holding resources.
    #[serde(default = "default_table")]
    pub table: String,
    /// Primary key column of that table.
    #[serde(default = "default_id_column")]
    pub id_column: String,
    /// Column holding the owner principal id.
    #[serde(default = "default_owner_column")]
    pub owner_column: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
            id_column: default_id_column(),
            owner_column: default_owner_column(),
        }
    }
}

fn default_table() -> String {
    "vessels".to_string()
}

fn default_id_column() -> String {
    "id".to_string()
}

fn default_owner_column() -> String {
    "owner_id".to_string()
}
