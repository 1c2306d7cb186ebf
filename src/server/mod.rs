//! Server core functionality
//!
//! This module contains the listener, the accept loop and the admission of
//! new connections into the client registry.

pub mod core;

pub use core::{ChatRegistry, Server};
