//! Versioned role-to-permission table.

use std::collections::HashMap;

use keelson_core::config::CapabilityTableConfig;
use keelson_core::error::AppError;
use keelson_core::result::AppResult;
use keelson_entity::access::{Permission, PermissionSet, Role};

/// Maps each role to its default permission set.
///
/// Built once at startup and shared behind an `Arc`. The table never
/// changes after construction; a different table is a different version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityModel {
    version: u32,
    defaults: HashMap<Role, PermissionSet>,
}

impl CapabilityModel {
    /// Version number of the built-in table.
    pub const BUILTIN_VERSION: u32 = 1;

    /// The built-in table.
    pub fn v1() -> Self {
        use Permission::*;

        let every_view = Permission::ALL.into_iter().filter(|p| p.is_view());
        let every_edit = Permission::ALL.into_iter().filter(|p| p.is_edit());

        let mut defaults = HashMap::new();
        defaults.insert(Role::Owner, PermissionSet::full_access());
        defaults.insert(Role::Delegate, PermissionSet::full_access());
        defaults.insert(
            Role::Moderator,
            every_view
                .clone()
                .chain(every_edit)
                .chain([ManageAccess])
                .collect(),
        );
        defaults.insert(
            Role::Captain,
            every_view
                .clone()
                .chain([EditTrips, EditCatchRecords, EditCrew, EditLocations])
                .collect(),
        );
        defaults.insert(
            Role::Editor,
            every_view
                .chain([EditBasicInfo, EditDetailedInfo, EditCatchRecords, EditTrips])
                .collect(),
        );
        defaults.insert(
            Role::CrewMember,
            PermissionSet::from_iter([
                ViewBasicInfo,
                ViewDetailedInfo,
                ViewCatchRecords,
                ViewTrips,
                ViewCrew,
                EditCatchRecords,
                EditTrips,
            ]),
        );
        defaults.insert(
            Role::Viewer,
            PermissionSet::from_iter([ViewBasicInfo, ViewDetailedInfo, ViewCatchRecords, ViewTrips]),
        );

        Self {
            version: Self::BUILTIN_VERSION,
            defaults,
        }
    }

    /// Build a table from configuration.
    ///
    /// Every role must be listed with a non-empty set of known permissions,
    /// the owner row must hold `full_access`, and version 1 is reserved for
    /// the built-in table.
    pub fn from_config(config: &CapabilityTableConfig) -> AppResult<Self> {
        let mut defaults = HashMap::new();

        for (name, tags) in &config.roles {
            let role: Role = name
                .parse()
                .map_err(|_| AppError::configuration(format!("Unknown role '{name}' in capability table")))?;

            let permissions = tags
                .iter()
                .map(|tag| {
                    tag.parse::<Permission>().map_err(|_| {
                        AppError::configuration(format!(
                            "Unknown permission '{tag}' for role '{role}' in capability table"
                        ))
                    })
                })
                .collect::<AppResult<PermissionSet>>()?;

            if permissions.is_empty() {
                return Err(AppError::configuration(format!(
                    "Role '{role}' has no permissions in capability table"
                )));
            }
            defaults.insert(role, permissions);
        }

        if let Some(missing) = Role::ALL.iter().find(|r| !defaults.contains_key(*r)) {
            return Err(AppError::configuration(format!(
                "Capability table does not define role '{missing}'"
            )));
        }

        if !defaults
            .get(&Role::Owner)
            .is_some_and(|set| set.allows(Permission::FullAccess))
        {
            return Err(AppError::configuration(
                "Capability table must give the owner role full_access",
            ));
        }

        let model = Self {
            version: config.version,
            defaults,
        };

        if model.version == Self::BUILTIN_VERSION && model != Self::v1() {
            return Err(AppError::configuration(
                "Capability table version 1 is reserved for the built-in table",
            ));
        }

        Ok(model)
    }

    /// Version of this table.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// The default permission set for `role`.
    pub fn default_permissions(&self, role: Role) -> PermissionSet {
        self.defaults.get(&role).cloned().unwrap_or_default()
    }

    /// Whether `granted` allows `required`. Every authorization decision
    /// goes through this predicate.
    pub fn has_permission(granted: &PermissionSet, required: Permission) -> bool {
        granted.allows(required)
    }
}

impl Default for CapabilityModel {
    fn default() -> Self {
        Self::v1()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use keelson_core::ErrorKind;

    use super::*;

    fn table_from(model: &CapabilityModel, version: u32) -> CapabilityTableConfig {
        let roles: BTreeMap<String, Vec<String>> = Role::ALL
            .iter()
            .map(|r| (r.as_str().to_string(), model.default_permissions(*r).tags()))
            .collect();
        CapabilityTableConfig { version, roles }
    }

    #[test]
    fn test_builtin_table_is_total() {
        let model = CapabilityModel::v1();
        assert_eq!(model.version(), 1);
        for role in Role::ALL {
            assert!(!model.default_permissions(role).is_empty(), "{role} has no defaults");
        }
    }

    #[test]
    fn test_has_permission_honours_wildcard() {
        let viewer = CapabilityModel::v1().default_permissions(Role::Viewer);
        assert!(CapabilityModel::has_permission(&viewer, Permission::ViewTrips));
        assert!(!CapabilityModel::has_permission(&viewer, Permission::ManageAccess));

        let wildcard = PermissionSet::full_access();
        for permission in Permission::ALL {
            assert!(CapabilityModel::has_permission(&wildcard, permission));
        }
        assert!(!CapabilityModel::has_permission(
            &PermissionSet::empty(),
            Permission::ViewBasicInfo
        ));
    }

    #[test]
    fn test_builtin_rows() {
        let model = CapabilityModel::v1();

        assert_eq!(model.default_permissions(Role::Owner), PermissionSet::full_access());
        assert_eq!(model.default_permissions(Role::Delegate), PermissionSet::full_access());

        let viewer = model.default_permissions(Role::Viewer);
        assert_eq!(viewer.len(), 4);
        assert!(viewer.allows(Permission::ViewTrips));
        assert!(!viewer.allows(Permission::ViewCrew));

        let crew = model.default_permissions(Role::CrewMember);
        assert!(crew.allows(Permission::EditCatchRecords));
        assert!(!crew.allows(Permission::ViewLocations));

        let moderator = model.default_permissions(Role::Moderator);
        assert!(moderator.allows(Permission::ManageAccess));
        assert!(!moderator.allows(Permission::DeleteVessel));
        assert!(!moderator.allows(Permission::FullAccess));

        let captain = model.default_permissions(Role::Captain);
        assert!(captain.allows(Permission::EditLocations));
        assert!(!captain.allows(Permission::EditBasicInfo));
        assert!(!captain.allows(Permission::ManageAccess));

        let editor = model.default_permissions(Role::Editor);
        assert!(editor.allows(Permission::EditDetailedInfo));
        assert!(!editor.allows(Permission::EditCrew));
    }

    #[test]
    fn test_config_table_round_trips_with_new_version() {
        let mut table = table_from(&CapabilityModel::v1(), 2);
        table
            .roles
            .insert("viewer".to_string(), vec!["view_basic_info".to_string()]);
        let model = CapabilityModel::from_config(&table).unwrap();
        assert_eq!(model.version(), 2);
        assert_eq!(model.default_permissions(Role::Viewer).len(), 1);
    }

    #[test]
    fn test_config_table_must_be_total() {
        let mut table = table_from(&CapabilityModel::v1(), 2);
        table.roles.remove("captain");
        let err = CapabilityModel::from_config(&table).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
        assert!(err.message.contains("captain"));
    }

    #[test]
    fn test_config_rejects_empty_rows_and_unknown_tags() {
        let mut empty = table_from(&CapabilityModel::v1(), 2);
        empty.roles.insert("viewer".to_string(), Vec::new());
        assert_eq!(
            CapabilityModel::from_config(&empty).unwrap_err().kind,
            ErrorKind::Configuration
        );

        let mut unknown = table_from(&CapabilityModel::v1(), 2);
        unknown
            .roles
            .insert("viewer".to_string(), vec!["steer".to_string()]);
        assert_eq!(
            CapabilityModel::from_config(&unknown).unwrap_err().kind,
            ErrorKind::Configuration
        );

        let mut stranger = table_from(&CapabilityModel::v1(), 2);
        stranger
            .roles
            .insert("deckhand".to_string(), vec!["view_trips".to_string()]);
        assert_eq!(
            CapabilityModel::from_config(&stranger).unwrap_err().kind,
            ErrorKind::Configuration
        );
    }

    #[test]
    fn test_config_version_one_is_reserved() {
        assert!(CapabilityModel::from_config(&table_from(&CapabilityModel::v1(), 1)).is_ok());

        let mut changed = table_from(&CapabilityModel::v1(), 1);
        changed
            .roles
            .insert("viewer".to_string(), vec!["view_trips".to_string()]);
        assert!(CapabilityModel::from_config(&changed).is_err());
    }

    #[test]
    fn test_owner_row_needs_full_access() {
        let mut table = table_from(&CapabilityModel::v1(), 3);
        table
            .roles
            .insert("owner".to_string(), vec!["view_trips".to_string()]);
        assert!(CapabilityModel::from_config(&table).is_err());
    }
}
