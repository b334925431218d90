//! Collaborator traits defined in `keelson-core` and implemented by other crates.

pub mod clock;
pub mod directory;

pub use clock::{Clock, ManualClock, SystemClock};
pub use directory::ResourceDirectory;
