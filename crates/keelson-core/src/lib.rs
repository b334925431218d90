//! # keelson-core
//!
//! Core crate for Keelson. Contains the collaborator traits (clock and
//! resource directory), configuration schemas, typed identifiers, and the
//! unified error system.
//!
//! This crate has **no** internal dependencies on other Keelson crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
