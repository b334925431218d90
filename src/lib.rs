//! # keelson
//!
//! Delegated access control for vessels: an owner grants other principals
//! role-based, permission-scoped, optionally expiring access, directly or
//! through invitations redeemed by token.
//!
//! This crate wires the workspace crates into an [`Engine`] backed either by
//! PostgreSQL or by in-process stores, and installs logging for binaries.

pub mod engine;
pub mod logging;

pub use engine::{Engine, capability_model};
pub use logging::init_logging;

pub use keelson_auth::{AuthorizationResolver, CapabilityModel, Decision};
pub use keelson_core::{AppError, AppResult, ErrorKind};
pub use keelson_service::{
    CreateGrantRequest, CreateInvitationRequest, GrantAdministration, InvitationManager,
    IssuedInvitation, UpdateGrantRequest, VerifiedIdentity,
};
