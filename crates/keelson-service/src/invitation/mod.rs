//! Invitation lifecycle: issue, cancel, inspect, and redeem.

pub mod redeem;
pub mod service;


pub use service::{CreateInvitationRequest, InvitationManager, IssuedInvitation};
