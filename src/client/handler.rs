use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, BufReader};
use tokio::sync::watch;

use crate::client::{Membership, Registry};
use crate::protocol::responses::{LINE_TOO_LONG, UNSUPPORTED_COMMAND, WELCOME, format_chat};
use crate::protocol::{Command, parse_command};

/// Why a client session ended.
#[derive(Debug, PartialEq, Eq)]
pub enum Disconnect {
    /// The client sent `/quit`
    Quit,
    /// The peer closed its side of the connection
    EndOfStream,
    /// Reading from the connection failed
    ReadFault,
    /// A reply to this client could not be written
    SendFault,
    /// Another session removed this client after a failed broadcast
    Evicted,
}

/// Runs the chat session for one registered client until it ends.
///
/// - Sends the welcome banner, ending the session at once if that fails.
/// - Reads newline-terminated lines, never buffering more than
///   `max_line_length + 1` bytes of one line, and dispatches them as
///   commands or chat messages.
/// - Always leaves the client removed from `registry` on return.
pub async fn handle_client<R, W>(
    reader: R,
    registry: Arc<Registry<W>>,
    membership: Membership<W>,
    max_line_length: usize,
) -> Disconnect
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send,
{
    let Membership { client, mut closed } = membership;
    info!("Connected client {}", client.slot_id());

    if let Err(e) = registry.send(&client, WELCOME.as_bytes()).await {
        warn!("Failed to greet client {}: {}", client.slot_id(), e);
        registry.remove(&client).await;
        return Disconnect::SendFault;
    }

    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    let read_limit = max_line_length as u64 + 1;
    // Set while skipping the tail of a line that was already refused
    let mut discarding = false;

    let reason = loop {
        line.clear();
        let mut limited = (&mut reader).take(read_limit);

        let read = tokio::select! {
            biased;
            _ = closed_signal(&mut closed) => {
                let nick = client.display_name().await;
                info!("Client {} was removed by another session", nick);
                break Disconnect::Evicted;
            }
            read = limited.read_until(b'\n', &mut line) => read,
        };

        match read {
            Ok(0) => {
                let nick = client.display_name().await;
                info!("Disconnected client {}", nick);
                break Disconnect::EndOfStream;
            }
            Ok(_) => {}
            Err(e) => {
                let nick = client.display_name().await;
                error!("Error reading from client {}: {}", nick, e);
                break Disconnect::ReadFault;
            }
        }

        let complete = line.last() == Some(&b'\n');

        if discarding {
            discarding = !complete;
            continue;
        }

        if line.len() > max_line_length {
            debug!(
                "Refusing line over {} bytes from client {}",
                max_line_length,
                client.slot_id()
            );
            discarding = !complete;
            if let Err(e) = registry.send(&client, LINE_TOO_LONG.as_bytes()).await {
                warn!("Send message to client {} error: {}", client.slot_id(), e);
                break Disconnect::SendFault;
            }
            continue;
        }

        match parse_command(&line) {
            Command::Empty => {}
            Command::Nick(nick) => {
                let old = client.display_name().await;
                info!(
                    "Client {} is now known as {}",
                    old,
                    String::from_utf8_lossy(&nick)
                );
                client.set_nick(nick).await;
            }
            Command::Quit => {
                let nick = client.display_name().await;
                info!("Disconnected client {}", nick);
                break Disconnect::Quit;
            }
            Command::Unsupported(raw) => {
                debug!(
                    "Unsupported command from client {}: {}",
                    client.slot_id(),
                    String::from_utf8_lossy(&raw)
                );
                if let Err(e) = registry.send(&client, UNSUPPORTED_COMMAND.as_bytes()).await {
                    warn!("Send message to client {} error: {}", client.slot_id(), e);
                    break Disconnect::SendFault;
                }
            }
            Command::Message(text) => {
                let nick = client.nick().await;
                info!(
                    "{}> {}",
                    String::from_utf8_lossy(&nick),
                    String::from_utf8_lossy(&text)
                );

                let report = registry.broadcast(&client, &format_chat(&nick, &text)).await;
                if !report.failed.is_empty() {
                    debug!(
                        "Broadcast from {} reached {} clients, dropped slots {:?}",
                        client.slot_id(),
                        report.delivered,
                        report.failed
                    );
                }
            }
        }
    };

    registry.remove(&client).await;
    reason
}

/// Resolves once the client has been marked closed.
async fn closed_signal(closed: &mut watch::Receiver<bool>) {
    // The sender lives inside the client, which this session keeps alive.
    let _ = closed.wait_for(|closed| *closed).await;
}
