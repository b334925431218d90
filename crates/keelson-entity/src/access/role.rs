//! Access role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named bundle of default permissions assignable to a grant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "access_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The resource owner. Never stored on a grant.
    Owner,
    /// Runs the vessel's access list alongside the owner.
    Moderator,
    /// Operates the vessel day to day.
    Captain,
    /// Works aboard and logs trips and catches.
    CrewMember,
    /// Maintains vessel records.
    Editor,
    /// Read-only access.
    Viewer,
    /// Acts on the owner's behalf.
    Delegate,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 7] = [
        Self::Owner,
        Self::Moderator,
        Self::Captain,
        Self::CrewMember,
        Self::Editor,
        Self::Viewer,
        Self::Delegate,
    ];

    /// Whether this role may appear on a grant or invitation.
    pub fn is_grantable(&self) -> bool {
        !matches!(self, Self::Owner)
    }

    /// Return the role as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Moderator => "moderator",
            Self::Captain => "captain",
            Self::CrewMember => "crew_member",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
            Self::Delegate => "delegate",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = keelson_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "owner" => Ok(Self::Owner),
            "moderator" => Ok(Self::Moderator),
            "captain" => Ok(Self::Captain),
            "crew_member" => Ok(Self::CrewMember),
            "editor" => Ok(Self::Editor),
            "viewer" => Ok(Self::Viewer),
            "delegate" => Ok(Self::Delegate),
            _ => Err(keelson_core::AppError::validation(format!(
                "Invalid role: '{s}'. Expected one of: owner, moderator, captain, \
                 crew_member, editor, viewer, delegate"
            ))),
        }
    }
}
