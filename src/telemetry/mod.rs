//! Telemetry payload handling
//!
//! Producers push frames in one of two wire formats: binary protobuf
//! (`wire::TelemetryFrame`, schema in `proto/telemetry.proto`) or JSON text.
//! [`decode`] turns either into a uniform JSON object; [`message`] classifies
//! that object into one of the semantic message shapes and builds the frames
//! sent onward to subscribers and back to producers.

pub mod decode;
pub mod message;
pub mod wire;
