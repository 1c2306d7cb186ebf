//! Chat wire responses
//!
//! Fixed server-to-client lines and chat line formatting.

pub const WELCOME: &str = "Welcome to Simple Chat! Use /nick <nick> to set your nick.\n";
pub const SERVER_FULL: &str = "Server is full\n";
pub const UNSUPPORTED_COMMAND: &str = "Unsupported command\n";
pub const LINE_TOO_LONG: &str = "Line too long\n";

/// Format a chat line as relayed to the other participants
pub fn format_chat(nick: &[u8], message: &[u8]) -> Vec<u8> {
    let mut line = Vec::with_capacity(nick.len() + message.len() + 3);
    line.extend_from_slice(nick);
    line.extend_from_slice(b"> ");
    line.extend_from_slice(message);
    line.push(b'\n');
    line
}

/// Display name given to a client before it picks one
pub fn default_nick(slot_id: usize) -> String {
    format!("user:{}", slot_id)
}
