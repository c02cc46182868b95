/// Producer socket handler
///
/// Runs the per-frame pipeline's connection-local half: decode the frame,
/// reject payloads without a usable identity, and hand everything else to
/// the dispatcher. Decode failures drop the frame with a diagnostic and keep
/// the connection open. Acks decided by the dispatcher flow back through
/// this task's outbound channel.
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::logger::{self, LogTag};
use crate::telemetry::decode::{self, DecodeError, Payload};
use crate::telemetry::message::payload_vin;

use super::dispatcher::Event;
use super::state::AppState;
use super::ConnectionId;

pub async fn handle_producer_socket(socket: WebSocket, state: Arc<AppState>) {
    let id = state.next_connection_id();
    let (ack_tx, mut ack_rx) = mpsc::unbounded_channel::<String>();
    let (mut ws_tx, mut ws_rx) = socket.split();

    logger::debug(LogTag::Producer, &format!("producer connection {} open", id));

    loop {
        tokio::select! {
            biased;

            // Acks from the dispatcher, written back to the producer.
            Some(ack) = ack_rx.recv() => {
                if ws_tx.send(Message::Text(ack)).await.is_err() {
                    break;
                }
            }

            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Binary(bytes))) => {
                        forward_frame(id, decode::decode_binary(&bytes), &ack_tx, &state);
                    }
                    Some(Ok(Message::Text(text))) => {
                        forward_frame(id, decode::decode_text(&text), &ack_tx, &state);
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                        // Axum answers pings; producer liveness is not probed.
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        logger::warning(
                            LogTag::Producer,
                            &format!("producer connection {} errored: {}", id, e),
                        );
                        break;
                    }
                }
            }
        }
    }

    state.dispatcher.send(Event::ProducerClosed { id });
    logger::debug(LogTag::Producer, &format!("producer connection {} closed", id));
}

/// Frame-local half of the pipeline: a decode failure or a missing identity
/// drops the frame here; valid frames go to the dispatcher in arrival order.
fn forward_frame(
    id: ConnectionId,
    decoded: Result<Payload, DecodeError>,
    ack_tx: &mpsc::UnboundedSender<String>,
    state: &Arc<AppState>,
) {
    let payload = match decoded {
        Ok(payload) => payload,
        Err(e) => {
            logger::warning(
                LogTag::Decoder,
                &format!("dropped undecodable frame from connection {}: {}", id, e),
            );
            return;
        }
    };

    let Some(vin) = payload_vin(&payload).map(str::to_string) else {
        logger::warning(
            LogTag::Decoder,
            &format!("dropped frame without vin from connection {}", id),
        );
        return;
    };

    state.dispatcher.send(Event::ProducerFrame {
        id,
        vin,
        payload,
        ack: ack_tx.clone(),
    });
}
