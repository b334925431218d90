//! # keelson-auth
//!
//! Authorization for Keelson.
//!
//! ## Modules
//!
//! - `capability`: the versioned role-to-permission table
//! - `authz`: the authorization resolver and its decisions
//! - `token`: invitation token generation

pub mod authz;
pub mod capability;
pub mod token;

pub use authz::{AuthorizationResolver, Decision};
pub use capability::CapabilityModel;
pub use token::TokenGenerator;
