//! # keelson-service
//!
//! Access-control use cases for Keelson. Each service orchestrates the
//! grant and invitation stores, the authorization resolver, and the
//! capability model.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod access;
pub mod context;
pub mod grant;
pub mod invitation;

pub use context::VerifiedIdentity;
pub use grant::{CreateGrantRequest, GrantAdministration, UpdateGrantRequest};
pub use invitation::{CreateInvitationRequest, InvitationManager, IssuedInvitation};
