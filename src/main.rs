use std::sync::Arc;
use std::time::Duration;

use fleet_relay::{
    config,
    logger::{self, LogTag},
    relay::{dispatcher::Dispatcher, server, state::AppState},
};

/// Main entry point for the fleet telemetry relay
///
/// Startup order matters: the logger comes up first so configuration errors
/// are reported properly, and configuration problems (including a missing
/// production secret) are fatal before the listener ever binds.
#[tokio::main]
async fn main() {
    logger::init();

    logger::info(LogTag::System, "fleet telemetry relay starting up...");

    if let Err(e) = run().await {
        logger::error(LogTag::System, &format!("fatal: {:#}", e));
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let mut config = config::load()?;

    // Resolve the token secret up front; in production a missing secret
    // stops the process here.
    let secret = config::resolve_secret(&config.auth)?;
    config.auth.jwt_secret = Some(secret);

    let ping_interval = Duration::from_secs(config.websocket.ping_interval_secs.max(1));
    let dispatcher = Dispatcher::spawn(ping_interval);

    let state = Arc::new(AppState::new(Arc::new(config), dispatcher));
    server::start_server(state).await?;

    Ok(())
}
