//! Client management system
//!
//! Handles the registry of connected clients, per-client state and the
//! per-connection session loop.

pub mod handler;
pub mod registry;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use handler::{Disconnect, handle_client};
pub use registry::{BroadcastReport, Membership, Registry};
pub use state::Client;
