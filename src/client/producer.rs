//! Trace producer
//!
//! High-level API for publishing a tree and its execution steps to a relay.

use std::time::Instant;

use futures_util::SinkExt;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::{Error, Result};
use crate::protocol::{encode_inbound, InboundMessage};
use crate::registry::{RoomId, StepEvent, Structure};

use super::config::ProducerConfig;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Trace producer
///
/// Owns one `/ws/accept` connection. The introduced structure is kept so the
/// room can be re-established after a reconnect.
///
/// # Example
/// ```no_run
/// use serde_json::json;
/// use tree_relay::client::{ProducerConfig, TraceProducer};
///
/// # async fn example() -> tree_relay::error::Result<()> {
/// let config = ProducerConfig::new("ws://localhost:3000");
/// let mut producer = TraceProducer::connect(config, json!({"id": 1})).await?;
///
/// producer.step(json!(1), None).await?;
/// producer.step(json!(2), Some(json!("done"))).await?;
/// producer.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct TraceProducer {
    config: ProducerConfig,
    room: RoomId,
    structure: Structure,
    socket: Option<Socket>,
    last_sent: Instant,
}

impl TraceProducer {
    /// Connect to the relay and introduce `structure`
    pub async fn connect(config: ProducerConfig, structure: impl Into<Value>) -> Result<Self> {
        let room = config.room_id()?;
        let mut producer = Self {
            config,
            room,
            structure: Structure::new(structure.into()),
            socket: None,
            last_sent: Instant::now(),
        };

        producer.reconnect().await?;
        Ok(producer)
    }

    /// Room this producer publishes under
    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// Check if a connection is currently open
    pub fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    /// Replace the room's structure
    pub async fn introduce(&mut self, structure: impl Into<Value>) -> Result<()> {
        self.structure = Structure::new(structure.into());
        let message = InboundMessage::Introduce {
            room: self.room.clone(),
            structure: self.structure.clone(),
        };
        self.send(&message).await
    }

    /// Emit one step
    ///
    /// If nothing was sent for longer than the configured idle threshold the
    /// connection is reopened and the structure introduced again first.
    pub async fn step(&mut self, step_id: impl Into<Value>, value: Option<Value>) -> Result<()> {
        if self.socket.is_none() || self.last_sent.elapsed() > self.config.reconnect_after {
            tracing::debug!(room = %self.room, "Reconnecting idle producer");
            self.reconnect().await?;
        }

        let step = StepEvent {
            step_id: step_id.into(),
            value,
        };
        self.send(&InboundMessage::Step { step, room: None }).await
    }

    /// Close the connection
    pub async fn close(&mut self) -> Result<()> {
        if let Some(mut socket) = self.socket.take() {
            socket.close(None).await?;
        }
        Ok(())
    }

    async fn reconnect(&mut self) -> Result<()> {
        if let Some(mut old) = self.socket.take() {
            let _ = old.close(None).await;
        }

        let endpoint = self.config.endpoint();
        let (socket, _) = connect_async(endpoint.as_str()).await?;
        self.socket = Some(socket);
        tracing::info!(endpoint = %endpoint, room = %self.room, "Producer connected");

        let message = InboundMessage::Introduce {
            room: self.room.clone(),
            structure: self.structure.clone(),
        };
        self.send(&message).await
    }

    async fn send(&mut self, message: &InboundMessage) -> Result<()> {
        let text = encode_inbound(message)?;
        let socket = self.socket.as_mut().ok_or(Error::NotConnected)?;

        if let Err(e) = socket.send(Message::Text(text)).await {
            self.socket = None;
            return Err(e.into());
        }

        self.last_sent = Instant::now();
        Ok(())
    }
}
