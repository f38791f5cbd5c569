//! WebSocket connection task
//!
//! One task per client. The socket is split: a writer task drains the
//! connection's outbox into the sink, and the reader loop decodes frames and
//! forwards them to the hub in arrival order.

use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::protocol;
use crate::session::SessionContext;

use super::hub::HubHandle;

/// Drive one accepted WebSocket until either side closes it
pub(crate) async fn run_connection(
    socket: WebSocket,
    context: SessionContext,
    hub: HubHandle,
    outbox_capacity: usize,
) {
    let connection = context.connection_id;
    let namespace = context.namespace;
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Bytes>(outbox_capacity);

    if !hub.attach(context, tx) {
        tracing::warn!(connection = %connection, "Hub unavailable, closing connection");
        let _ = sink.close().await;
        return;
    }

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let Some(text) = frame_text(&frame) else {
                tracing::warn!(connection = %connection, "Non UTF-8 frame dropped");
                continue;
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(result) = stream.next().await {
        let text = match result {
            Ok(Message::Text(text)) => text,
            Ok(Message::Binary(data)) => match String::from_utf8(data) {
                Ok(text) => text,
                Err(_) => {
                    tracing::debug!(connection = %connection, "Non UTF-8 binary frame ignored");
                    continue;
                }
            },
            Ok(Message::Close(frame)) => {
                tracing::debug!(connection = %connection, reason = ?frame, "Client initiated close");
                break;
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
            Err(e) => {
                tracing::debug!(connection = %connection, error = %e, "WebSocket receive error");
                break;
            }
        };

        match protocol::decode(namespace, &text) {
            Ok(message) => {
                tracing::trace!(
                    connection = %connection,
                    event = message.event_name(),
                    "Frame received"
                );
                if !hub.inbound(connection, message) {
                    break;
                }
            }
            Err(e) => {
                tracing::debug!(connection = %connection, error = %e, "Frame ignored");
            }
        }
    }

    hub.detach(connection);
    writer.abort();
}

/// Text payload for an encoded frame
///
/// axum 0.7 text messages own a `String`, so each recipient gets its own
/// copy of the shared frame here.
fn frame_text(frame: &Bytes) -> Option<String> {
    String::from_utf8(frame.to_vec()).ok()
}
