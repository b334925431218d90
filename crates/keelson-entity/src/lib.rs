//! # keelson-entity
//!
//! Domain entity models for Keelson. Every struct in this crate represents
//! a database table row or a domain value object. Database entities derive
//! `sqlx::FromRow`.

pub mod access;
pub mod grant;
pub mod invitation;
pub mod resource;

pub use access::{Permission, PermissionSet, Role};
pub use grant::{Grant, GrantUpdate, NewGrant};
pub use invitation::{Invitation, InvitationState, InvitationView, NewInvitation, Redemption};
pub use resource::ResourceRef;
