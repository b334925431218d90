//! Role defaults and the permission predicate.

pub mod model;

pub use model::CapabilityModel;
