//! Fleet telemetry relay.
//!
//! A WebSocket relay sitting between a fleet of vehicle telemetry producers
//! and a population of dashboard subscribers. Producers connect on `/` with
//! no credential and are identified lazily by the VIN carried in their first
//! valid frame; subscribers connect on `/stream` behind a bearer-token gate
//! and receive every decoded message as JSON text.

pub mod arguments;
pub mod auth;
pub mod config;
pub mod errors;
pub mod fleet;
pub mod logger;
pub mod relay;
pub mod telemetry;
