/// Relay server lifecycle
///
/// Binds the single listener, serves the two upgrade endpoints, and shuts
/// down gracefully on ctrl-c.
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::errors::RelayError;
use crate::logger::{self, LogTag};

use super::routes;
use super::state::AppState;

/// Start the relay server
///
/// This function blocks until the server is shut down.
pub async fn start_server(state: Arc<AppState>) -> Result<(), RelayError> {
    let addr: SocketAddr = format!("{}:{}", state.config.server.host, state.config.server.port)
        .parse()
        .map_err(|e| RelayError::Config(format!("invalid bind address: {}", e)))?;

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| RelayError::Bind {
            addr: addr.to_string(),
            source,
        })?;

    logger::info(
        LogTag::System,
        &format!(
            "relay listening on {} (producers: ws://{}/ subscribers: ws://{}/stream)",
            addr, addr, addr
        ),
    );

    let app = routes::create_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| RelayError::Server(e.to_string()))?;

    logger::info(LogTag::System, "relay stopped gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        logger::info(LogTag::System, "shutdown signal received, stopping relay...");
    }
}
