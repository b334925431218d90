//! Grant domain entities.

pub mod model;

pub use model::{Grant, GrantUpdate, NewGrant};
