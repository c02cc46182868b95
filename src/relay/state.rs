/// Shared application state for the relay
///
/// Passed to the upgrade handlers; holds the resolved configuration and the
/// dispatcher handle. Connection ids are handed out here so producer and
/// subscriber sockets share one id space.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::RelayConfig;

use super::dispatcher::DispatcherHandle;
use super::ConnectionId;

pub struct AppState {
    /// Resolved relay configuration (auth secret already installed).
    pub config: Arc<RelayConfig>,

    /// Handle into the dispatcher task.
    pub dispatcher: DispatcherHandle,

    /// Server startup time
    pub started_at: chrono::DateTime<chrono::Utc>,

    next_connection_id: AtomicU64,
}

impl AppState {
    pub fn new(config: Arc<RelayConfig>, dispatcher: DispatcherHandle) -> Self {
        Self {
            config,
            dispatcher,
            started_at: chrono::Utc::now(),
            next_connection_id: AtomicU64::new(1),
        }
    }

    /// Allocate the next connection id.
    pub fn next_connection_id(&self) -> ConnectionId {
        self.next_connection_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        (chrono::Utc::now() - self.started_at).num_seconds().max(0) as u64
    }
}
