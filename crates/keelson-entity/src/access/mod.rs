//! Roles, permissions, and permission sets.

pub mod permission;
pub mod role;
pub mod set;

pub use permission::Permission;
pub use role::Role;
pub use set::PermissionSet;
