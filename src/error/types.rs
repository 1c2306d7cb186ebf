//! Error types
//!
//! Defines the error types raised by the registry, the connection handler
//! and server startup.

use std::fmt;
use std::io;
use std::time::Duration;

/// Failure delivering a payload to a single client connection.
#[derive(Debug)]
pub enum SendError {
    IoError(io::Error),
    Timeout(Duration),
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::IoError(e) => write!(f, "write failed: {}", e),
            SendError::Timeout(d) => write!(f, "write timed out after {:?}", d),
        }
    }
}

impl std::error::Error for SendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SendError::IoError(e) => Some(e),
            SendError::Timeout(_) => None,
        }
    }
}

impl From<io::Error> for SendError {
    fn from(error: io::Error) -> Self {
        SendError::IoError(error)
    }
}

/// Returned by `Registry::insert` when every slot is occupied.
///
/// Hands the connection's writer back so the caller can tell the peer
/// before closing it.
#[derive(Debug)]
pub struct Rejected<W> {
    pub writer: W,
}

impl<W> fmt::Display for Rejected<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no free client slot")
    }
}

impl<W: fmt::Debug> std::error::Error for Rejected<W> {}

/// Startup and infrastructure errors for the chat server
#[derive(Debug)]
pub enum ServerError {
    Bind(String, io::Error),
    Config(config::ConfigError),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Bind(addr, e) => write!(f, "Failed to bind to {}: {}", addr, e),
            ServerError::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<config::ConfigError> for ServerError {
    fn from(error: config::ConfigError) -> Self {
        ServerError::Config(error)
    }
}
