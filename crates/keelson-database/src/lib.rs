//! # keelson-database
//!
//! Storage for grants and invitations. [`store`] defines the store traits
//! the engine is written against; [`repositories`] implements them on
//! PostgreSQL and [`memory`] implements them in process.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::{MemoryAccessStore, MemoryResourceDirectory};
pub use store::{AcceptOutcome, GrantStore, InvitationStore};
