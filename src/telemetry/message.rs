/// Telemetry message schema - classification and relay frame building
///
/// A decoded payload is classified into one of four semantic shapes by which
/// of four disjoint field sets it carries, probed in a fixed priority order:
/// data -> connectivity -> errors -> alerts. A payload matching none of them
/// is an Unknown message and is forwarded unchanged rather than dropped.
/// Every shape carries a non-empty vin; payloads without one are rejected
/// before classification ever runs.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::decode::Payload;

// ============================================================================
// TYPED SHAPES
// ============================================================================

/// Dynamically-typed scalar: exactly one member is populated on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypedScalar {
    #[serde(rename = "stringValue")]
    String(String),
    #[serde(rename = "doubleValue")]
    Double(f64),
    #[serde(rename = "boolValue")]
    Bool(bool),
    #[serde(rename = "intValue")]
    Int(IntValue),
}

/// Integer values arrive as JSON numbers from text producers and as strings
/// from the binary decoder (which stringifies 64-bit integers).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntValue {
    Number(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Datum {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<TypedScalar>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataMessage {
    pub vin: String,
    pub data: Vec<Datum>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    #[serde(rename = "CONNECTED")]
    Connected,
    #[serde(rename = "DISCONNECTED")]
    Disconnected,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Connected => "CONNECTED",
            ConnectionState::Disconnected => "DISCONNECTED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivityEvent {
    #[serde(default)]
    pub connection_id: String,
    pub status: ConnectionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityMessage {
    pub vin: String,
    pub connectivity: ConnectivityEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEntry {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub vin: String,
    pub errors: Vec<ErrorEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEntry {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertMessage {
    pub vin: String,
    pub alerts: Vec<AlertEntry>,
}

/// Payload matching none of the four known shapes; forwarded unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownMessage {
    pub vin: String,
    pub payload: Payload,
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Tagged union over the semantic message shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryMessage {
    Data(DataMessage),
    Connectivity(ConnectivityMessage),
    Error(ErrorMessage),
    Alert(AlertMessage),
    Unknown(UnknownMessage),
}

impl TelemetryMessage {
    /// Classify a decoded payload. `vin` must already be validated non-empty.
    ///
    /// Probes run in fixed priority order; an array field counts as present
    /// only when non-empty (the binary decoder materializes empty arrays for
    /// absent sections). A probe whose field is present but whose contents do
    /// not parse falls through, ending at Unknown.
    pub fn classify(vin: String, payload: &Payload) -> TelemetryMessage {
        let value = Value::Object(payload.clone());

        if non_empty_array(payload, "data") {
            if let Ok(msg) = serde_json::from_value::<DataMessage>(value.clone()) {
                return TelemetryMessage::Data(msg);
            }
        }
        if payload.get("connectivity").map_or(false, Value::is_object) {
            if let Ok(msg) = serde_json::from_value::<ConnectivityMessage>(value.clone()) {
                return TelemetryMessage::Connectivity(msg);
            }
        }
        if non_empty_array(payload, "errors") {
            if let Ok(msg) = serde_json::from_value::<ErrorMessage>(value.clone()) {
                return TelemetryMessage::Error(msg);
            }
        }
        if non_empty_array(payload, "alerts") {
            if let Ok(msg) = serde_json::from_value::<AlertMessage>(value) {
                return TelemetryMessage::Alert(msg);
            }
        }

        TelemetryMessage::Unknown(UnknownMessage {
            vin,
            payload: payload.clone(),
        })
    }

    /// Type tag used on frames relayed to subscribers.
    pub fn kind(&self) -> &'static str {
        match self {
            TelemetryMessage::Data(_) => "data",
            TelemetryMessage::Connectivity(_) => "connectivity",
            TelemetryMessage::Error(_) => "errors",
            TelemetryMessage::Alert(_) => "alerts",
            TelemetryMessage::Unknown(_) => "unknown",
        }
    }

    pub fn vin(&self) -> &str {
        match self {
            TelemetryMessage::Data(m) => &m.vin,
            TelemetryMessage::Connectivity(m) => &m.vin,
            TelemetryMessage::Error(m) => &m.vin,
            TelemetryMessage::Alert(m) => &m.vin,
            TelemetryMessage::Unknown(m) => &m.vin,
        }
    }
}

/// Extract the producer identity from a decoded payload.
pub fn payload_vin(payload: &Payload) -> Option<&str> {
    payload
        .get("vin")
        .and_then(Value::as_str)
        .filter(|vin| !vin.is_empty())
}

fn non_empty_array(payload: &Payload, key: &str) -> bool {
    payload
        .get(key)
        .and_then(Value::as_array)
        .map_or(false, |arr| !arr.is_empty())
}

// ============================================================================
// RELAY -> SUBSCRIBER FRAMES
// ============================================================================

/// Frames written to subscriber connections. Classified producer payloads
/// pass through verbatim under their type tag; welcome and synthesized
/// connectivity frames are built here.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SubscriberFrame {
    Welcome {
        message: String,
        timestamp: String,
    },
    Data {
        #[serde(flatten)]
        payload: Payload,
    },
    Connectivity {
        #[serde(flatten)]
        payload: Payload,
    },
    Errors {
        #[serde(flatten)]
        payload: Payload,
    },
    Alerts {
        #[serde(flatten)]
        payload: Payload,
    },
    Unknown {
        #[serde(flatten)]
        payload: Payload,
    },
}

impl SubscriberFrame {
    /// Welcome frame sent as the first message on every admitted subscriber.
    pub fn welcome() -> Self {
        SubscriberFrame::Welcome {
            message: "connected to fleet telemetry relay".to_string(),
            timestamp: now_rfc3339(),
        }
    }

    /// Verbatim passthrough of a classified payload under its type tag.
    pub fn passthrough(message: &TelemetryMessage, payload: &Payload) -> Self {
        let mut payload = payload.clone();
        // The tag owns the "type" key on the outer object.
        payload.remove("type");

        match message {
            TelemetryMessage::Data(_) => SubscriberFrame::Data { payload },
            TelemetryMessage::Connectivity(_) => SubscriberFrame::Connectivity { payload },
            TelemetryMessage::Error(_) => SubscriberFrame::Errors { payload },
            TelemetryMessage::Alert(_) => SubscriberFrame::Alerts { payload },
            TelemetryMessage::Unknown(_) => SubscriberFrame::Unknown { payload },
        }
    }

    /// Synthesized connectivity notification for a producer joining or
    /// leaving the registry.
    pub fn connectivity_event(vin: &str, status: ConnectionState) -> Self {
        let event = ConnectivityMessage {
            vin: vin.to_string(),
            connectivity: ConnectivityEvent {
                connection_id: uuid::Uuid::new_v4().to_string(),
                status,
                timestamp: Some(Value::String(now_rfc3339())),
            },
        };
        let payload = match serde_json::to_value(&event) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        SubscriberFrame::Connectivity { payload }
    }

    /// Serialize to JSON text
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ============================================================================
// RELAY -> PRODUCER FRAMES
// ============================================================================

/// Frames written back to producer connections.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProducerFrame {
    /// Acknowledgment for a received DataMessage.
    Ack { vin: String, timestamp: String },
}

impl ProducerFrame {
    pub fn ack(vin: &str) -> Self {
        ProducerFrame::Ack {
            vin: vin.to_string(),
            timestamp: now_rfc3339(),
        }
    }

    /// Serialize to JSON text
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
