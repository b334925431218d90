//! Core type definitions used across the Keelson workspace.

pub mod id;

pub use id::*;
