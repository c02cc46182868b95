/// Upgrade routing for the relay's two endpoints
///
/// One listener, path-routed:
/// - `/`        producer upgrade, no credential; identity comes from frames
/// - `/stream`  subscriber upgrade behind the token gate
/// - elsewhere  404 before any upgrade happens
///
/// Handlers are infallible: every outcome, including internal faults, maps
/// to an explicit response so an upgrade request never hangs or kills the
/// process.
use std::sync::Arc;

use axum::{
    extract::{ws::WebSocketUpgrade, Query, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::auth;
use crate::logger::{self, LogTag};

use super::state::AppState;
use super::{producer, subscriber};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(producer_handler))
        .route("/stream", get(subscriber_handler))
        .fallback(fallback_handler)
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub token: Option<String>,
}

/// Producer upgrade: admitted without a credential. The VIN is discovered
/// from the first valid frame, not at upgrade time.
async fn producer_handler(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> Response {
    logger::debug(LogTag::Producer, "producer connection upgrading");
    ws.on_upgrade(move |socket| producer::handle_producer_socket(socket, state))
}

/// Subscriber upgrade: token gate first, upgrade only on success.
async fn subscriber_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StreamQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(secret) = state.config.auth.jwt_secret.as_deref() else {
        // Startup installs the resolved secret before the listener binds, so
        // this is unreachable in a running relay; answer 500 rather than
        // letting an unverified socket through.
        logger::error(LogTag::Auth, "no token secret installed; refusing upgrade");
        return (StatusCode::INTERNAL_SERVER_ERROR, "server error").into_response();
    };

    match auth::authenticate(query.token.as_deref(), auth::bearer_token(&headers), secret) {
        Ok(claims) => {
            logger::debug(
                LogTag::Auth,
                &format!(
                    "subscriber authenticated (sub={})",
                    claims.sub.as_deref().unwrap_or("-")
                ),
            );
            ws.on_upgrade(move |socket| subscriber::handle_subscriber_socket(socket, state))
        }
        Err(e) => {
            logger::warning(LogTag::Auth, &format!("subscriber rejected: {}", e));
            (StatusCode::UNAUTHORIZED, "unauthorized").into_response()
        }
    }
}

/// Any other path: refuse before upgrading.
async fn fallback_handler(uri: Uri) -> Response {
    logger::warning(
        LogTag::Relay,
        &format!("rejected connection to unknown path {}", uri.path()),
    );
    (StatusCode::NOT_FOUND, "not found").into_response()
}
