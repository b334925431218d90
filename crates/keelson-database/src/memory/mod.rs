//! In-process implementations for single-node deployments and tests.

pub mod directory;
pub mod store;

pub use directory::MemoryResourceDirectory;
pub use store::MemoryAccessStore;
