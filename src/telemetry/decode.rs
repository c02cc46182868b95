/// Frame decoding - binary protobuf or JSON text to a uniform payload object
///
/// Decoding is pure and side-effect free. Binary frames are decoded against
/// the compiled-in wire schema and expanded the way the upstream tooling
/// expects: proto3 scalar defaults are materialized, 64-bit integers are
/// rendered as strings so no precision is lost crossing into JSON, and the
/// populated oneof member appears under its explicit field name. Optional
/// message fields keep their presence semantics (absent fields stay absent).
use prost::Message;
use serde_json::{json, Map, Value};
use thiserror::Error;

use super::wire;

/// Decoded producer payload: a JSON object keyed by wire field names.
pub type Payload = Map<String, Value>;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed binary frame: {0}")]
    Binary(#[from] prost::DecodeError),

    #[error("malformed text frame: {0}")]
    Text(#[from] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,
}

/// Decode a binary protobuf frame.
pub fn decode_binary(bytes: &[u8]) -> Result<Payload, DecodeError> {
    let frame = wire::TelemetryFrame::decode(bytes)?;
    Ok(frame_to_payload(&frame))
}

/// Decode a UTF-8 JSON text frame. The document must be an object.
pub fn decode_text(text: &str) -> Result<Payload, DecodeError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        _ => Err(DecodeError::NotAnObject),
    }
}

/// Expand a decoded wire frame into the uniform payload object.
pub fn frame_to_payload(frame: &wire::TelemetryFrame) -> Payload {
    let mut payload = Map::new();

    payload.insert("vin".to_string(), Value::String(frame.vin.clone()));
    payload.insert(
        "data".to_string(),
        Value::Array(frame.data.iter().map(datum_to_value).collect()),
    );
    if let Some(ts) = frame.created_at.as_ref().and_then(timestamp_to_rfc3339) {
        payload.insert("createdAt".to_string(), Value::String(ts));
    }
    if let Some(connectivity) = &frame.connectivity {
        payload.insert(
            "connectivity".to_string(),
            connectivity_to_value(connectivity),
        );
    }
    payload.insert(
        "errors".to_string(),
        Value::Array(frame.errors.iter().map(error_to_value).collect()),
    );
    payload.insert(
        "alerts".to_string(),
        Value::Array(frame.alerts.iter().map(alert_to_value).collect()),
    );

    payload
}

fn datum_to_value(datum: &wire::Datum) -> Value {
    let mut obj = Map::new();
    obj.insert("key".to_string(), Value::String(datum.key.clone()));
    if let Some(value) = datum.value.as_ref().and_then(|v| v.value.as_ref()) {
        obj.insert("value".to_string(), scalar_to_value(value));
    }
    Value::Object(obj)
}

fn scalar_to_value(value: &wire::typed_value::Value) -> Value {
    use wire::typed_value::Value::*;
    match value {
        StringValue(s) => json!({ "stringValue": s }),
        DoubleValue(d) => json!({ "doubleValue": d }),
        BoolValue(b) => json!({ "boolValue": b }),
        // 64-bit integers cross into JSON as strings; a JSON number would be
        // read back as f64 and lose precision past 2^53.
        IntValue(i) => json!({ "intValue": i.to_string() }),
    }
}

fn connectivity_to_value(connectivity: &wire::Connectivity) -> Value {
    let status = wire::ConnectionStatus::try_from(connectivity.status)
        .unwrap_or(wire::ConnectionStatus::Unknown);

    let mut obj = Map::new();
    obj.insert(
        "connectionId".to_string(),
        Value::String(connectivity.connection_id.clone()),
    );
    obj.insert(
        "status".to_string(),
        Value::String(status.as_str_name().to_string()),
    );
    if let Some(ts) = connectivity.timestamp.as_ref().and_then(timestamp_to_rfc3339) {
        obj.insert("timestamp".to_string(), Value::String(ts));
    }
    Value::Object(obj)
}

fn error_to_value(error: &wire::VehicleError) -> Value {
    let mut obj = Map::new();
    obj.insert("code".to_string(), Value::String(error.code.clone()));
    obj.insert("message".to_string(), Value::String(error.message.clone()));
    if let Some(ts) = error.timestamp.as_ref().and_then(timestamp_to_rfc3339) {
        obj.insert("timestamp".to_string(), Value::String(ts));
    }
    Value::Object(obj)
}

fn alert_to_value(alert: &wire::VehicleAlert) -> Value {
    let mut obj = Map::new();
    obj.insert("type".to_string(), Value::String(alert.r#type.clone()));
    obj.insert("message".to_string(), Value::String(alert.message.clone()));
    if let Some(ts) = alert.timestamp.as_ref().and_then(timestamp_to_rfc3339) {
        obj.insert("timestamp".to_string(), Value::String(ts));
    }
    Value::Object(obj)
}

fn timestamp_to_rfc3339(ts: &prost_types::Timestamp) -> Option<String> {
    chrono::DateTime::from_timestamp(ts.seconds, ts.nanos.clamp(0, 999_999_999) as u32)
        .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
}
