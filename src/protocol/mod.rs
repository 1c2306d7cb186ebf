//! Chat protocol implementation
//!
//! Handles input line parsing and server response lines.

pub mod commands;
pub mod responses;

pub use commands::{Command, parse_command, trim_line_ending};
