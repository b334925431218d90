//! Invitation domain entities.

pub mod model;
pub mod state;

pub use model::{Invitation, InvitationView, NewInvitation, Redemption, normalize_identity};
pub use state::InvitationState;
