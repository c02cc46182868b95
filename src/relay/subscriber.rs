/// Subscriber socket handler
///
/// Forwards broadcast frames from the dispatcher to the client and relays
/// protocol pongs back as liveness acknowledgments. When the liveness
/// monitor evicts this subscriber the pool drops the outbound sender; the
/// closed channel ends the loop here and the socket is terminated.
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::logger::{self, LogTag};

use super::dispatcher::Event;
use super::pool::SubscriberOutbound;
use super::state::AppState;

pub async fn handle_subscriber_socket(socket: WebSocket, state: Arc<AppState>) {
    let id = state.next_connection_id();
    let (tx, mut rx) = mpsc::unbounded_channel::<SubscriberOutbound>();
    state.dispatcher.send(Event::SubscriberJoin { id, sender: tx });

    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            biased;

            outbound = rx.recv() => {
                match outbound {
                    Some(SubscriberOutbound::Frame(text)) => {
                        if ws_tx.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Some(SubscriberOutbound::Ping) => {
                        if ws_tx.send(Message::Ping(Vec::new())).await.is_err() {
                            break;
                        }
                    }
                    None => {
                        // Evicted by the liveness monitor; terminate the socket.
                        logger::debug(
                            LogTag::Subscriber,
                            &format!("subscriber connection {} terminated by liveness monitor", id),
                        );
                        let _ = ws_tx.close().await;
                        break;
                    }
                }
            }

            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Pong(_))) => {
                        state.dispatcher.send(Event::SubscriberPong { id });
                    }
                    Some(Ok(Message::Ping(_))) => {
                        // Axum answers client pings on its own.
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {
                        // Subscribers are listen-only; inbound text is ignored.
                    }
                    Some(Err(e)) => {
                        logger::warning(
                            LogTag::Subscriber,
                            &format!("subscriber connection {} errored: {}", id, e),
                        );
                        break;
                    }
                }
            }
        }
    }

    // Idempotent: a no-op when the liveness monitor already removed us.
    state.dispatcher.send(Event::SubscriberClosed { id });
    logger::debug(LogTag::Subscriber, &format!("subscriber connection {} closed", id));
}
