//! The relay core
//!
//! One axum listener, two upgrade paths: producers on `/` (no credential,
//! identified lazily by VIN), subscribers on `/stream` (token-gated). Each
//! socket gets its own task for I/O; every state-changing event funnels into
//! the single [`dispatcher::Dispatcher`] task that owns the producer registry
//! and the subscriber pool, so no handler ever races another.

pub mod dispatcher;
pub mod pool;
pub mod producer;
pub mod registry;
pub mod routes;
pub mod server;
pub mod state;
pub mod subscriber;

/// Unique id per WebSocket connection, assigned at upgrade.
pub type ConnectionId = u64;
