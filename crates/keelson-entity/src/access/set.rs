//! Permission sets and the single permission predicate.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::permission::Permission;

/// An ordered set of permissions.
///
/// Stored as a PostgreSQL `TEXT[]` of snake_case tags and serialized as a
/// JSON array. Ordering is fixed so equal sets always encode identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    /// The empty set.
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    /// The wildcard set `{full_access}`.
    pub fn full_access() -> Self {
        Self::from_iter([Permission::FullAccess])
    }

    /// Whether `required` is allowed by this set.
    ///
    /// True iff `required` is a member or the set holds `full_access`.
    /// This is the only membership test used for authorization.
    pub fn allows(&self, required: Permission) -> bool {
        self.0.contains(&Permission::FullAccess) || self.0.contains(&required)
    }

    /// Whether every permission in `other` is allowed by this set.
    pub fn covers(&self, other: &PermissionSet) -> bool {
        other.iter().all(|p| self.allows(p))
    }

    /// Add a permission.
    pub fn insert(&mut self, permission: Permission) -> bool {
        self.0.insert(permission)
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of permissions in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate the permissions in tag order.
    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().copied()
    }

    /// The snake_case tags, in order.
    pub fn tags(&self) -> Vec<String> {
        self.iter().map(|p| p.as_str().to_string()).collect()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tags().join(","))
    }
}

impl std::str::FromStr for PermissionSet {
    type Err = keelson_core::AppError;

    /// Parse a comma-separated list of tags.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::parse::<Permission>)
            .collect()
    }
}

impl sqlx::Type<sqlx::Postgres> for PermissionSet {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Vec<String> as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Vec<String> as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for PermissionSet {
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::Postgres as sqlx::Database>::ArgumentBuffer<'q>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Vec<String> as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.tags(), buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for PermissionSet {
    fn decode(
        value: <sqlx::Postgres as sqlx::Database>::ValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let tags = <Vec<String> as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
        tags.iter()
            .map(|t| t.parse::<Permission>())
            .collect::<Result<PermissionSet, _>>()
            .map_err(|e| Box::new(e) as sqlx::error::BoxDynError)
    }
}
