//! Client registry
//!
//! Fixed-capacity slot table of registered clients. Owns slot allocation,
//! insertion, removal and the broadcast fan-out.
//!
//! Lock order is table lock, then a client's writer mutex. `send` only ever
//! takes the writer mutex, so the fan-out can call it while holding the
//! table lock. Clients that fail during a fan-out are torn down after the
//! table lock is released, never from inside it.

use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWrite;
use tokio::sync::{RwLock, watch};

use crate::client::Client;
use crate::error::{Rejected, SendError};

/// A successful registration: the shared client and the signal that fires
/// when someone else removes it.
pub struct Membership<W> {
    pub client: Arc<Client<W>>,
    pub closed: watch::Receiver<bool>,
}

/// Outcome of one broadcast fan-out
#[derive(Debug, Default, PartialEq)]
pub struct BroadcastReport {
    /// Recipients the payload was written to
    pub delivered: usize,
    /// Slots of recipients whose write failed and that were removed
    pub failed: Vec<usize>,
}

/// Registry of at most `capacity` live clients, indexed by slot.
pub struct Registry<W> {
    slots: RwLock<Vec<Option<Arc<Client<W>>>>>,
    capacity: usize,
    send_timeout: Option<Duration>,
}

impl<W> Registry<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: RwLock::new((0..capacity).map(|_| None).collect()),
            capacity,
            send_timeout: None,
        }
    }

    /// Bounds every write to a client by `timeout`. `None` leaves writes
    /// unbounded.
    pub fn with_send_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.send_timeout = timeout;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of occupied slots.
    pub async fn len(&self) -> usize {
        self.slots.read().await.iter().flatten().count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Occupied slot ids in increasing order.
    pub async fn occupied_slots(&self) -> Vec<usize> {
        self.slots
            .read()
            .await
            .iter()
            .enumerate()
            .filter_map(|(slot_id, entry)| entry.as_ref().map(|_| slot_id))
            .collect()
    }

    /// Returns the lowest free slot, or `None` when the registry is full.
    ///
    /// For inspection only; registration never goes through it. The slot
    /// may be taken by the time the caller looks at the answer, and
    /// `insert` does its own search under the exclusive lock.
    pub async fn allocate_slot(&self) -> Option<usize> {
        self.slots.read().await.iter().position(Option::is_none)
    }

    /// Claims the lowest free slot and registers a new client on `writer`.
    ///
    /// Search and claim happen in one exclusive critical section, so two
    /// concurrent callers can never land on the same slot. When every slot is
    /// taken the writer is handed back in `Rejected`.
    pub async fn insert(&self, writer: W) -> Result<Membership<W>, Rejected<W>> {
        let mut slots = self.slots.write().await;

        let Some(slot_id) = slots.iter().position(Option::is_none) else {
            return Err(Rejected { writer });
        };

        let (client, closed) = Client::new(slot_id, writer);
        let client = Arc::new(client);
        slots[slot_id] = Some(Arc::clone(&client));

        debug!(
            "Registered client {} ({}/{} slots in use)",
            slot_id,
            slots.iter().flatten().count(),
            self.capacity
        );

        Ok(Membership { client, closed })
    }

    /// Removes `client` from its slot and closes its connection.
    ///
    /// Returns `false` without touching anything if the client was already
    /// removed, including when its slot has since been reused by a newer
    /// client.
    pub async fn remove(&self, client: &Arc<Client<W>>) -> bool {
        let removed = {
            let mut slots = self.slots.write().await;
            match slots.get_mut(client.slot_id()) {
                Some(entry) if entry.as_ref().is_some_and(|held| Arc::ptr_eq(held, client)) => {
                    entry.take()
                }
                _ => None,
            }
        };

        match removed {
            Some(client) => {
                client.close(self.send_timeout).await;
                info!("Freed client slot {}", client.slot_id());
                true
            }
            None => false,
        }
    }

    /// Writes `payload` to every registered client except `sender`.
    ///
    /// The whole fan-out runs under the exclusive lock, so no client joins
    /// or leaves midway. A failed recipient does not stop the fan-out; it is
    /// collected and removed once the lock has been released.
    pub async fn broadcast(&self, sender: &Arc<Client<W>>, payload: &[u8]) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        let failed = {
            let slots = self.slots.write().await;
            let mut failed = Vec::new();

            for recipient in slots.iter().flatten() {
                if Arc::ptr_eq(recipient, sender) {
                    continue;
                }

                match self.send(recipient, payload).await {
                    Ok(()) => report.delivered += 1,
                    Err(e) => {
                        let nick = recipient.display_name().await;
                        warn!("Send message to client {} error: {}", nick, e);
                        failed.push(Arc::clone(recipient));
                    }
                }
            }

            failed
        };

        for recipient in failed {
            report.failed.push(recipient.slot_id());
            self.remove(&recipient).await;
        }

        report
    }

    /// Writes `payload` to a single client.
    ///
    /// Never takes the table lock. On error the caller decides whether to
    /// remove the client.
    pub async fn send(&self, client: &Client<W>, payload: &[u8]) -> Result<(), SendError> {
        match self.send_timeout {
            Some(deadline) => tokio::time::timeout(deadline, client.write(payload))
                .await
                .map_err(|_| SendError::Timeout(deadline))?
                .map_err(SendError::from),
            None => client.write(payload).await.map_err(SendError::from),
        }
    }
}
