//! Permission tags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An atomic capability on a resource.
///
/// [`Permission::FullAccess`] is a wildcard: a set containing it allows
/// every check. Never test membership directly; go through
/// [`PermissionSet::allows`](super::PermissionSet::allows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// See the vessel's public profile.
    ViewBasicInfo,
    /// Change the vessel's public profile.
    EditBasicInfo,
    /// See registration and equipment details.
    ViewDetailedInfo,
    /// Change registration and equipment details.
    EditDetailedInfo,
    /// See catch records.
    ViewCatchRecords,
    /// Create and change catch records.
    EditCatchRecords,
    /// See trips.
    ViewTrips,
    /// Create and change trips.
    EditTrips,
    /// See the crew list.
    ViewCrew,
    /// Change the crew list.
    EditCrew,
    /// See recorded locations.
    ViewLocations,
    /// Change recorded locations.
    EditLocations,
    /// Grant, change and revoke access; issue and cancel invitations.
    ManageAccess,
    /// Delete the vessel.
    DeleteVessel,
    /// Wildcard. Subsumes every other permission.
    FullAccess,
}

impl Permission {
    /// Every permission, in declaration order.
    pub const ALL: [Permission; 15] = [
        Self::ViewBasicInfo,
        Self::EditBasicInfo,
        Self::ViewDetailedInfo,
        Self::EditDetailedInfo,
        Self::ViewCatchRecords,
        Self::EditCatchRecords,
        Self::ViewTrips,
        Self::EditTrips,
        Self::ViewCrew,
        Self::EditCrew,
        Self::ViewLocations,
        Self::EditLocations,
        Self::ManageAccess,
        Self::DeleteVessel,
        Self::FullAccess,
    ];

    /// Return the permission as a snake_case tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewBasicInfo => "view_basic_info",
            Self::EditBasicInfo => "edit_basic_info",
            Self::ViewDetailedInfo => "view_detailed_info",
            Self::EditDetailedInfo => "edit_detailed_info",
            Self::ViewCatchRecords => "view_catch_records",
            Self::EditCatchRecords => "edit_catch_records",
            Self::ViewTrips => "view_trips",
            Self::EditTrips => "edit_trips",
            Self::ViewCrew => "view_crew",
            Self::EditCrew => "edit_crew",
            Self::ViewLocations => "view_locations",
            Self::EditLocations => "edit_locations",
            Self::ManageAccess => "manage_access",
            Self::DeleteVessel => "delete_vessel",
            Self::FullAccess => "full_access",
        }
    }

    /// Whether this is one of the `view_*` permissions.
    pub fn is_view(&self) -> bool {
        self.as_str().starts_with("view_")
    }

    /// Whether this is one of the `edit_*` permissions.
    pub fn is_edit(&self) -> bool {
        self.as_str().starts_with("edit_")
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Permission {
    type Err = keelson_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == tag)
            .ok_or_else(|| keelson_core::AppError::validation(format!("Invalid permission: '{s}'")))
    }
}
