//! Grant administration: create, update, revoke, and list grants.

pub mod service;

pub use service::{CreateGrantRequest, GrantAdministration, UpdateGrantRequest};
