/// Producer registry - VIN to live connection mapping
///
/// Owned exclusively by the dispatcher task; no locking. A VIN maps to at
/// most one handle. A second connection claiming an already-registered VIN
/// silently overwrites the entry; the displaced connection is not closed.
use std::collections::HashMap;
use tokio::sync::mpsc;

use super::ConnectionId;

/// Handle held in the registry — used to send acks back to a producer.
#[derive(Debug, Clone)]
pub struct ProducerHandle {
    /// Connection this VIN was last seen on.
    pub connection_id: ConnectionId,
    /// Channel sender delivering ack frames to the connection's task.
    pub ack: mpsc::UnboundedSender<String>,
}

/// VIN → producer handle table.
#[derive(Debug, Default)]
pub struct ProducerRegistry {
    vehicles: HashMap<String, ProducerHandle>,
}

impl ProducerRegistry {
    pub fn new() -> Self {
        Self {
            vehicles: HashMap::new(),
        }
    }

    /// Insert a handle, returning any previous handle for the same VIN.
    pub fn insert(&mut self, vin: String, handle: ProducerHandle) -> Option<ProducerHandle> {
        self.vehicles.insert(vin, handle)
    }

    /// Look up the handle registered for a VIN.
    pub fn get(&self, vin: &str) -> Option<&ProducerHandle> {
        self.vehicles.get(vin)
    }

    pub fn contains(&self, vin: &str) -> bool {
        self.vehicles.contains_key(vin)
    }

    /// Remove the entry registered for a closing connection, returning its
    /// VIN. Producer counts are small, so a linear scan is fine. Returns None
    /// when the connection never established an identity (or was displaced by
    /// a newer connection for the same VIN) — removal is a no-op then.
    pub fn remove_by_connection(&mut self, connection_id: ConnectionId) -> Option<String> {
        let vin = self
            .vehicles
            .iter()
            .find(|(_, handle)| handle.connection_id == connection_id)
            .map(|(vin, _)| vin.clone())?;
        self.vehicles.remove(&vin);
        Some(vin)
    }

    /// Number of registered producers.
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_handle(connection_id: ConnectionId) -> (ProducerHandle, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            ProducerHandle {
                connection_id,
                ack: tx,
            },
            rx,
        )
    }

    #[test]
    fn test_insert_and_get() {
        let mut registry = ProducerRegistry::new();
        let (handle, _rx) = make_handle(1);

        assert!(registry.insert("V1".to_string(), handle).is_none());
        assert!(registry.contains("V1"));
        assert_eq!(registry.get("V1").unwrap().connection_id, 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_vin_silently_overwrites() {
        let mut registry = ProducerRegistry::new();
        let (first, _rx1) = make_handle(1);
        let (second, _rx2) = make_handle(2);

        assert!(registry.insert("V1".to_string(), first).is_none());
        let displaced = registry.insert("V1".to_string(), second);
        assert_eq!(displaced.unwrap().connection_id, 1);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("V1").unwrap().connection_id, 2);
    }

    #[test]
    fn test_remove_by_connection() {
        let mut registry = ProducerRegistry::new();
        let (handle, _rx) = make_handle(7);
        let _ = registry.insert("V1".to_string(), handle);

        assert_eq!(registry.remove_by_connection(7), Some("V1".to_string()));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut registry = ProducerRegistry::new();
        let (handle, _rx) = make_handle(7);
        let _ = registry.insert("V1".to_string(), handle);

        assert_eq!(registry.remove_by_connection(7), Some("V1".to_string()));
        assert_eq!(registry.remove_by_connection(7), None);
        assert_eq!(registry.remove_by_connection(99), None);
    }

    #[test]
    fn test_displaced_connection_removal_is_a_noop() {
        let mut registry = ProducerRegistry::new();
        let (first, _rx1) = make_handle(1);
        let (second, _rx2) = make_handle(2);
        let _ = registry.insert("V1".to_string(), first);
        let _ = registry.insert("V1".to_string(), second);

        // The displaced connection closing must not evict the newer one.
        assert_eq!(registry.remove_by_connection(1), None);
        assert!(registry.contains("V1"));
    }
}
