//! Authorization resolution against the grant store.

pub mod decision;
pub mod resolver;

pub use decision::Decision;
pub use resolver::AuthorizationResolver;
