//! PostgreSQL implementations of the access stores and the resource directory.

pub mod directory;
pub mod grant;
pub mod invitation;

pub use directory::PgResourceDirectory;
pub use grant::GrantRepository;
pub use invitation::InvitationRepository;
