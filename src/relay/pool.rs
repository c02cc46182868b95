/// Subscriber pool - fan-out broadcast and liveness bookkeeping
///
/// Owned exclusively by the dispatcher task. Each admitted subscriber is a
/// record holding the sender half of its connection task's outbound channel
/// plus the liveness flag the probe cycle flips. Writes are fire-and-forget:
/// a closed channel is skipped, never an error.
use std::collections::HashMap;
use tokio::sync::mpsc;

use crate::logger::{self, LogTag};
use crate::telemetry::message::SubscriberFrame;

use super::ConnectionId;

/// Outbound traffic for one subscriber connection task.
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriberOutbound {
    /// JSON text frame.
    Frame(String),
    /// Protocol-level liveness probe.
    Ping,
}

/// One admitted subscriber connection.
#[derive(Debug)]
struct SubscriberRecord {
    sender: mpsc::UnboundedSender<SubscriberOutbound>,
    /// Set when a probe has been sent and no pong has come back yet.
    expecting_pong: bool,
}

/// The set of currently open, authenticated subscriber connections.
#[derive(Debug, Default)]
pub struct SubscriberPool {
    subscribers: HashMap<ConnectionId, SubscriberRecord>,
}

impl SubscriberPool {
    pub fn new() -> Self {
        Self {
            subscribers: HashMap::new(),
        }
    }

    /// Admit an authenticated connection. The liveness flag starts clear; the
    /// subscriber owes nothing until the first probe goes out.
    pub fn admit(&mut self, id: ConnectionId, sender: mpsc::UnboundedSender<SubscriberOutbound>) {
        self.subscribers.insert(
            id,
            SubscriberRecord {
                sender,
                expecting_pong: false,
            },
        );
    }

    /// Idempotent removal on close/error/eviction.
    pub fn remove(&mut self, id: ConnectionId) -> bool {
        self.subscribers.remove(&id).is_some()
    }

    /// Send a frame to a single subscriber.
    pub fn send_to(&self, id: ConnectionId, frame: &SubscriberFrame) {
        let Some(record) = self.subscribers.get(&id) else {
            return;
        };
        match frame.to_json() {
            Ok(text) => {
                let _ = record.sender.send(SubscriberOutbound::Frame(text));
            }
            Err(e) => {
                logger::error(
                    LogTag::Subscriber,
                    &format!("failed to serialize frame: {}", e),
                );
            }
        }
    }

    /// Broadcast a frame to every open subscriber, serializing it once.
    /// Returns the number of subscribers written to. An empty pool skips
    /// serialization entirely.
    pub fn broadcast(&self, frame: &SubscriberFrame) -> usize {
        if self.subscribers.is_empty() {
            return 0;
        }

        let text = match frame.to_json() {
            Ok(text) => text,
            Err(e) => {
                logger::error(
                    LogTag::Subscriber,
                    &format!("failed to serialize broadcast frame: {}", e),
                );
                return 0;
            }
        };

        let mut sent = 0;
        for record in self.subscribers.values() {
            // A connection that closed mid-fan-out is skipped on its turn.
            if record
                .sender
                .send(SubscriberOutbound::Frame(text.clone()))
                .is_ok()
            {
                sent += 1;
            }
        }
        sent
    }

    /// A pong (or any liveness acknowledgment) arrived for a subscriber.
    pub fn acknowledge(&mut self, id: ConnectionId) {
        if let Some(record) = self.subscribers.get_mut(&id) {
            record.expecting_pong = false;
        }
    }

    /// Evict every subscriber that never acknowledged the previous probe.
    /// Removal drops the record's sender, which ends the connection task's
    /// outbound channel and closes the socket. Returns the evicted ids.
    pub fn evict_unresponsive(&mut self) -> Vec<ConnectionId> {
        let evicted: Vec<ConnectionId> = self
            .subscribers
            .iter()
            .filter(|(_, record)| record.expecting_pong)
            .map(|(id, _)| *id)
            .collect();
        for id in &evicted {
            self.subscribers.remove(id);
        }
        evicted
    }

    /// Mark every remaining subscriber as owing a pong and send the probe.
    pub fn probe_all(&mut self) {
        for record in self.subscribers.values_mut() {
            record.expecting_pong = true;
            let _ = record.sender.send(SubscriberOutbound::Ping);
        }
    }

    /// Number of open subscriber connections.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
