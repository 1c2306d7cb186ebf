//! Module `state`
//!
//! Defines the `Client` struct: one registered chat participant, holding its
//! slot, the write half of its connection and its display name.

use log::debug;
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, RwLock, watch};

use crate::protocol::responses::default_nick;

/// Represents a connected chat client.
///
/// Only ever created by `Registry::insert`, so a `Client` always sits in the
/// slot named by `slot_id` until it is removed. Writes to the connection are
/// serialized by the client's own mutex, independent of the registry lock.
pub struct Client<W> {
    slot_id: usize,
    writer: Mutex<W>,
    nick: RwLock<Vec<u8>>,
    closed: watch::Sender<bool>,
}

impl<W> Client<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Creates a client for `slot_id` along with the receiver that fires once
    /// the client has been removed from the registry.
    pub(crate) fn new(slot_id: usize, writer: W) -> (Self, watch::Receiver<bool>) {
        let (closed, closed_rx) = watch::channel(false);
        let client = Self {
            slot_id,
            writer: Mutex::new(writer),
            nick: RwLock::new(default_nick(slot_id).into_bytes()),
            closed,
        };
        (client, closed_rx)
    }

    /// Returns the slot index this client occupies.
    pub fn slot_id(&self) -> usize {
        self.slot_id
    }

    /// Returns a copy of the current display name, exactly as the client
    /// sent it.
    pub async fn nick(&self) -> Vec<u8> {
        self.nick.read().await.clone()
    }

    /// Display name decoded for log lines.
    pub async fn display_name(&self) -> String {
        String::from_utf8_lossy(&self.nick.read().await).into_owned()
    }

    /// Replaces the display name.
    pub async fn set_nick(&self, nick: Vec<u8>) {
        *self.nick.write().await = nick;
    }

    /// Returns whether the client has been torn down.
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Writes the whole payload and flushes it.
    pub(crate) async fn write(&self, payload: &[u8]) -> std::io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(payload).await?;
        writer.flush().await
    }

    /// Raises the closed signal and shuts the write half down.
    ///
    /// Callers must only reach this through `Registry::remove`, which
    /// guarantees it runs once per client.
    pub(crate) async fn close(&self, deadline: Option<Duration>) {
        self.closed.send_replace(true);

        let shutdown = async {
            let mut writer = self.writer.lock().await;
            writer.shutdown().await
        };
        let result = match deadline {
            Some(deadline) => tokio::time::timeout(deadline, shutdown)
                .await
                .unwrap_or_else(|_| Err(std::io::ErrorKind::TimedOut.into())),
            None => shutdown.await,
        };

        if let Err(e) = result {
            debug!("Shutdown of client {} connection failed: {}", self.slot_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_new_client_defaults() {
        let (client, closed) = Client::new(7, tokio::io::sink());
        assert_eq!(client.slot_id(), 7);
        assert_eq!(client.nick().await, b"user:7");
        assert_eq!(client.display_name().await, "user:7");
        assert!(!client.is_closed());
        assert!(!*closed.borrow());
    }

    #[tokio::test]
    async fn test_set_nick() {
        let (client, _closed) = Client::new(0, tokio::io::sink());
        client.set_nick(b"alice".to_vec()).await;
        assert_eq!(client.nick().await, b"alice");

        client.set_nick(b"Jos\xe9".to_vec()).await;
        assert_eq!(client.nick().await, b"Jos\xe9");
        assert_eq!(client.display_name().await, "Jos\u{FFFD}");
    }

    #[tokio::test]
    async fn test_close_signals_and_shuts_down() {
        let (mut peer, server_side) = tokio::io::duplex(64);
        let (client, closed) = Client::new(1, server_side);

        client.write(b"bye\n").await.unwrap();
        client.close(None).await;

        assert!(client.is_closed());
        assert!(*closed.borrow());

        let mut received = String::new();
        peer.read_to_string(&mut received).await.unwrap();
        assert_eq!(received, "bye\n");
    }
}
