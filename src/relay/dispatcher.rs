/// Dispatcher - the relay's single thread of control
///
/// Owns the producer registry and the subscriber pool outright. Every
/// connection event (subscriber join/pong/close, producer frame/close) is
/// funneled here over one channel and handled one at a time, multiplexed
/// with the liveness probe interval; no other task ever touches the shared
/// state, so none of it needs a lock. Per-frame faults are contained in
/// their handlers and never escape the loop.
use std::time::Duration;
use tokio::sync::mpsc;

use crate::logger::{self, LogTag};
use crate::telemetry::decode::Payload;
use crate::telemetry::message::{
    ConnectionState, ProducerFrame, SubscriberFrame, TelemetryMessage,
};

use super::pool::{SubscriberOutbound, SubscriberPool};
use super::registry::{ProducerHandle, ProducerRegistry};
use super::ConnectionId;

/// Connection events serialized into the dispatcher.
#[derive(Debug)]
pub enum Event {
    SubscriberJoin {
        id: ConnectionId,
        sender: mpsc::UnboundedSender<SubscriberOutbound>,
    },
    SubscriberPong {
        id: ConnectionId,
    },
    SubscriberClosed {
        id: ConnectionId,
    },
    ProducerFrame {
        id: ConnectionId,
        vin: String,
        payload: Payload,
        ack: mpsc::UnboundedSender<String>,
    },
    ProducerClosed {
        id: ConnectionId,
    },
}

/// Cloneable handle used by connection tasks to reach the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherHandle {
    tx: mpsc::UnboundedSender<Event>,
}

impl DispatcherHandle {
    /// Queue an event. A send failure means the dispatcher is gone and the
    /// process is shutting down; there is nothing useful left to do with it.
    pub fn send(&self, event: Event) {
        let _ = self.tx.send(event);
    }
}

pub struct Dispatcher {
    registry: ProducerRegistry,
    pool: SubscriberPool,
    events: mpsc::UnboundedReceiver<Event>,
    ping_interval: Duration,
}

impl Dispatcher {
    pub fn new(events: mpsc::UnboundedReceiver<Event>, ping_interval: Duration) -> Self {
        Self {
            registry: ProducerRegistry::new(),
            pool: SubscriberPool::new(),
            events,
            ping_interval,
        }
    }

    /// Spawn the dispatcher task and return the handle connection tasks use.
    pub fn spawn(ping_interval: Duration) -> DispatcherHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = Dispatcher::new(rx, ping_interval);
        tokio::spawn(dispatcher.run());
        DispatcherHandle { tx }
    }

    /// Event loop. Ends when every handle is dropped.
    pub async fn run(mut self) {
        let start = tokio::time::Instant::now() + self.ping_interval;
        let mut probe = tokio::time::interval_at(start, self.ping_interval);
        probe.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                event = self.events.recv() => {
                    match event {
                        Some(event) => self.handle_event(event),
                        None => break,
                    }
                }

                _ = probe.tick() => {
                    self.probe_subscribers();
                }
            }
        }

        logger::debug(LogTag::Relay, "dispatcher stopped");
    }

    /// Handle one event. Synchronous by design: state changes never interleave.
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::SubscriberJoin { id, sender } => self.on_subscriber_join(id, sender),
            Event::SubscriberPong { id } => self.pool.acknowledge(id),
            Event::SubscriberClosed { id } => self.on_subscriber_closed(id),
            Event::ProducerFrame {
                id,
                vin,
                payload,
                ack,
            } => self.on_producer_frame(id, vin, payload, ack),
            Event::ProducerClosed { id } => self.on_producer_closed(id),
        }
    }

    fn on_subscriber_join(
        &mut self,
        id: ConnectionId,
        sender: mpsc::UnboundedSender<SubscriberOutbound>,
    ) {
        self.pool.admit(id, sender);
        // Queued before any broadcast can reach this connection, so the
        // welcome is always the first frame the subscriber sees.
        self.pool.send_to(id, &SubscriberFrame::welcome());
        logger::info(
            LogTag::Subscriber,
            &format!("subscriber {} admitted (active={})", id, self.pool.len()),
        );
    }

    fn on_subscriber_closed(&mut self, id: ConnectionId) {
        if self.pool.remove(id) {
            logger::info(
                LogTag::Subscriber,
                &format!("subscriber {} closed (active={})", id, self.pool.len()),
            );
        }
    }

    fn on_producer_frame(
        &mut self,
        id: ConnectionId,
        vin: String,
        payload: Payload,
        ack: mpsc::UnboundedSender<String>,
    ) {
        match self.registry.get(&vin) {
            None => {
                let _ = self.registry.insert(
                    vin.clone(),
                    ProducerHandle {
                        connection_id: id,
                        ack: ack.clone(),
                    },
                );
                logger::info(
                    LogTag::Producer,
                    &format!("vehicle {} connected (producers={})", vin, self.registry.len()),
                );
                // Announce the arrival before relaying the triggering frame.
                self.pool.broadcast(&SubscriberFrame::connectivity_event(
                    &vin,
                    ConnectionState::Connected,
                ));
            }
            Some(handle) if handle.connection_id != id => {
                // Duplicate identity: silent overwrite, no notification to
                // the displaced connection.
                let _ = self.registry.insert(
                    vin.clone(),
                    ProducerHandle {
                        connection_id: id,
                        ack: ack.clone(),
                    },
                );
                logger::debug(
                    LogTag::Producer,
                    &format!("vehicle {} re-registered on a new connection", vin),
                );
            }
            Some(_) => {}
        }

        let message = TelemetryMessage::classify(vin.clone(), &payload);
        if let TelemetryMessage::Unknown(_) = &message {
            logger::warning(
                LogTag::Relay,
                &format!("unrecognized payload shape from {}; forwarding as-is", vin),
            );
        }

        let sent = self
            .pool
            .broadcast(&SubscriberFrame::passthrough(&message, &payload));
        logger::debug(
            LogTag::Relay,
            &format!("{} frame from {} relayed to {} subscriber(s)", message.kind(), vin, sent),
        );

        if let TelemetryMessage::Data(_) = &message {
            match ProducerFrame::ack(&vin).to_json() {
                Ok(text) => {
                    let _ = ack.send(text);
                }
                Err(e) => {
                    logger::error(LogTag::Producer, &format!("failed to serialize ack: {}", e));
                }
            }
        }
    }

    fn on_producer_closed(&mut self, id: ConnectionId) {
        // A producer that never established an identity leaves silently.
        if let Some(vin) = self.registry.remove_by_connection(id) {
            logger::info(
                LogTag::Producer,
                &format!("vehicle {} disconnected (producers={})", vin, self.registry.len()),
            );
            self.pool.broadcast(&SubscriberFrame::connectivity_event(
                &vin,
                ConnectionState::Disconnected,
            ));
        }
    }

    /// Liveness tick: evict everything that missed the previous probe, then
    /// probe the rest.
    fn probe_subscribers(&mut self) {
        let evicted = self.pool.evict_unresponsive();
        for id in &evicted {
            logger::warning(
                LogTag::Subscriber,
                &format!("subscriber {} evicted: liveness probe unanswered", id),
            );
        }
        self.pool.probe_all();
    }

    #[cfg(test)]
    fn registry(&self) -> &ProducerRegistry {
        &self.registry
    }

    #[cfg(test)]
    fn pool(&self) -> &SubscriberPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn make_dispatcher() -> Dispatcher {
        let (_tx, rx) = mpsc::unbounded_channel();
        Dispatcher::new(rx, Duration::from_secs(30))
    }

    fn join_subscriber(
        dispatcher: &mut Dispatcher,
        id: ConnectionId,
    ) -> mpsc::UnboundedReceiver<SubscriberOutbound> {
        let (tx, rx) = mpsc::unbounded_channel();
        dispatcher.handle_event(Event::SubscriberJoin { id, sender: tx });
        rx
    }

    fn producer_frame(
        id: ConnectionId,
        payload: Value,
    ) -> (Event, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let Value::Object(map) = payload else {
            panic!("payload must be an object");
        };
        let vin = map["vin"].as_str().unwrap().to_string();
        (
            Event::ProducerFrame {
                id,
                vin,
                payload: map,
                ack: tx,
            },
            rx,
        )
    }

    fn next_json(rx: &mut mpsc::UnboundedReceiver<SubscriberOutbound>) -> Value {
        match rx.try_recv().unwrap() {
            SubscriberOutbound::Frame(text) => serde_json::from_str(&text).unwrap(),
            other => panic!("expected frame, got {:?}", other),
        }
    }

    #[test]
    fn test_subscriber_welcome_is_first_frame() {
        let mut dispatcher = make_dispatcher();
        let mut rx = join_subscriber(&mut dispatcher, 1);

        let welcome = next_json(&mut rx);
        assert_eq!(welcome["type"], "welcome");
    }

    // Scenario: first frame from a fresh producer registers it, announces
    // CONNECTED ahead of the data, and acks back to the producer.
    #[test]
    fn test_first_data_frame_registers_and_announces() {
        let mut dispatcher = make_dispatcher();
        let mut sub = join_subscriber(&mut dispatcher, 1);
        let _ = next_json(&mut sub); // welcome

        let (event, mut ack_rx) = producer_frame(
            10,
            json!({
                "vin": "V1",
                "data": [{"key": "soc", "value": {"doubleValue": 80.0}}],
                "createdAt": "T1"
            }),
        );
        dispatcher.handle_event(event);

        assert!(dispatcher.registry().contains("V1"));

        let connected = next_json(&mut sub);
        assert_eq!(connected["type"], "connectivity");
        assert_eq!(connected["vin"], "V1");
        assert_eq!(connected["connectivity"]["status"], "CONNECTED");

        let data = next_json(&mut sub);
        assert_eq!(data["type"], "data");
        assert_eq!(data["vin"], "V1");
        assert_eq!(data["createdAt"], "T1");
        assert_eq!(data["data"][0]["key"], "soc");

        let ack: Value = serde_json::from_str(&ack_rx.try_recv().unwrap()).unwrap();
        assert_eq!(ack["type"], "ack");
        assert_eq!(ack["vin"], "V1");
    }

    // Scenario: an alert fans out identically to both subscribers and
    // changes no producer state beyond first-contact registration.
    #[test]
    fn test_alert_fans_out_to_all_subscribers() {
        let mut dispatcher = make_dispatcher();
        let mut sub1 = join_subscriber(&mut dispatcher, 1);
        let mut sub2 = join_subscriber(&mut dispatcher, 2);
        let _ = next_json(&mut sub1);
        let _ = next_json(&mut sub2);

        // Register the producer first so the alert is the only broadcast.
        let (first, mut ack_rx) = producer_frame(
            10,
            json!({"vin": "V1", "data": [{"key": "soc", "value": {"intValue": 1}}]}),
        );
        dispatcher.handle_event(first);
        let _ = next_json(&mut sub1); // connectivity
        let _ = next_json(&mut sub1); // data
        let _ = next_json(&mut sub2);
        let _ = next_json(&mut sub2);
        let _ = ack_rx.try_recv().unwrap();
        let producers_before = dispatcher.registry().len();

        let (alert, mut alert_ack_rx) = producer_frame(
            10,
            json!({"vin": "V1", "alerts": [{"type": "speeding", "message": "over limit"}]}),
        );
        dispatcher.handle_event(alert);

        let got1 = next_json(&mut sub1);
        let got2 = next_json(&mut sub2);
        assert_eq!(got1, got2);
        assert_eq!(got1["type"], "alerts");

        // No ack for non-data frames; registry unchanged.
        assert!(alert_ack_rx.try_recv().is_err());
        assert_eq!(dispatcher.registry().len(), producers_before);
    }

    // Scenario: producer disconnect deregisters and announces DISCONNECTED.
    #[test]
    fn test_producer_disconnect_announces_departure() {
        let mut dispatcher = make_dispatcher();
        let mut sub = join_subscriber(&mut dispatcher, 1);
        let _ = next_json(&mut sub);

        let (event, _ack_rx) = producer_frame(
            10,
            json!({"vin": "V1", "data": [{"key": "soc", "value": {"intValue": 1}}]}),
        );
        dispatcher.handle_event(event);
        let _ = next_json(&mut sub); // connectivity
        let _ = next_json(&mut sub); // data

        dispatcher.handle_event(Event::ProducerClosed { id: 10 });

        assert!(!dispatcher.registry().contains("V1"));
        let disconnected = next_json(&mut sub);
        assert_eq!(disconnected["type"], "connectivity");
        assert_eq!(disconnected["connectivity"]["status"], "DISCONNECTED");
    }

    #[test]
    fn test_unidentified_producer_disconnect_is_silent() {
        let mut dispatcher = make_dispatcher();
        let mut sub = join_subscriber(&mut dispatcher, 1);
        let _ = next_json(&mut sub);

        dispatcher.handle_event(Event::ProducerClosed { id: 99 });
        assert!(sub.try_recv().is_err());
    }

    // Scenario: unknown shapes are forwarded, not dropped.
    #[test]
    fn test_unknown_shape_is_forwarded() {
        let mut dispatcher = make_dispatcher();
        let mut sub = join_subscriber(&mut dispatcher, 1);
        let _ = next_json(&mut sub);

        let (event, mut ack_rx) = producer_frame(10, json!({"vin": "V9", "wobble": 1}));
        dispatcher.handle_event(event);

        let _ = next_json(&mut sub); // connectivity for first contact
        let unknown = next_json(&mut sub);
        assert_eq!(unknown["type"], "unknown");
        assert_eq!(unknown["wobble"], 1);
        // Unknown frames are not acked.
        assert!(ack_rx.try_recv().is_err());
    }

    #[test]
    fn test_duplicate_vin_overwrites_and_reroutes_acks() {
        let mut dispatcher = make_dispatcher();

        let (first, mut old_ack) = producer_frame(
            10,
            json!({"vin": "V1", "data": [{"key": "soc", "value": {"intValue": 1}}]}),
        );
        dispatcher.handle_event(first);
        let _ = old_ack.try_recv().unwrap();

        let (second, mut new_ack) = producer_frame(
            11,
            json!({"vin": "V1", "data": [{"key": "soc", "value": {"intValue": 2}}]}),
        );
        dispatcher.handle_event(second);

        assert_eq!(dispatcher.registry().get("V1").unwrap().connection_id, 11);
        assert!(new_ack.try_recv().is_ok());
        // The displaced connection gets no further acks for this VIN.
        assert!(old_ack.try_recv().is_err());
    }

    #[test]
    fn test_subscriber_close_is_idempotent() {
        let mut dispatcher = make_dispatcher();
        let _rx = join_subscriber(&mut dispatcher, 1);

        dispatcher.handle_event(Event::SubscriberClosed { id: 1 });
        dispatcher.handle_event(Event::SubscriberClosed { id: 1 });
        assert!(dispatcher.pool().is_empty());
    }
}
