//! WebSocket transport for the stream driver

use axum::extract::ws::{Message, WebSocket};

use super::driver::{Channel, ChannelClosed};
use super::protocol::{ProtocolError, ServerMessage};

pub struct WsChannel {
    socket: WebSocket,
}

impl WsChannel {
    pub fn new(socket: WebSocket) -> Self {
        Self { socket }
    }
}

#[axum::async_trait]
impl Channel for WsChannel {
    async fn recv(&mut self) -> Option<Result<String, ProtocolError>> {
        loop {
            match self.socket.recv().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(_)) => return Some(Err(ProtocolError::Binary)),
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
                Ok(Message::Close(_)) => return None,
                Err(e) => {
                    tracing::debug!("WebSocket receive failed: {}", e);
                    return None;
                }
            }
        }
    }

    async fn send(&mut self, message: &ServerMessage) -> Result<(), ChannelClosed> {
        let text = serde_json::to_string(message).map_err(|e| {
            tracing::error!("Failed to encode stream message: {}", e);
            ChannelClosed
        })?;
        self.socket.send(Message::Text(text)).await.map_err(|_| ChannelClosed)
    }

    async fn close(&mut self) {
        let _ = self.socket.send(Message::Close(None)).await;
    }
}
