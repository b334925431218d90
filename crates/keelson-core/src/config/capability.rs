//! Capability table configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A role-to-permission table supplied through configuration.
///
/// Role and permission names are the snake_case tags. The table is parsed
/// and checked for totality when the capability model is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityTableConfig {
    /// Version number of this table. Must differ from every previously shipped table.
    pub version: u32,
    /// Role name to default permission names.
    pub roles: BTreeMap<String, Vec<String>>,
}
