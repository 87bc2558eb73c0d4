//! Stream driver
//!
//! Runs one session's channel: messages are handled strictly in arrival
//! order and the next one is not read until the reply to the current one
//! has been sent.
//!
//! Whatever ends the channel (end_session, disconnect, protocol violation,
//! a dropped task) ends the session through `FinalizeGuard`. Persistence
//! happens once, in whichever path performs the Active -> Ended transition.

use std::sync::Arc;

use chrono::Utc;

use super::protocol::{ClientMessage, ControlMessage, ErrorMessage, ProtocolError, ServerMessage};
use crate::models::FrameResponse;
use crate::provider::{decode_frame, Detection, LandmarkProvider, ProviderError};
use crate::service::{EndOutcome, PostureService};
use crate::session::{SessionError, SessionId};

/// Stream settings
#[derive(Debug, Clone, Copy)]
pub struct StreamConfig {
    /// Attach session stats to every n-th frame result (0 = never)
    pub stats_every: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { stats_every: 1 }
    }
}

/// The peer went away while we were sending
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("channel closed")]
pub struct ChannelClosed;

/// Bidirectional message channel bound to one session
#[axum::async_trait]
pub trait Channel: Send {
    /// Next text message; `None` once the peer has gone away
    async fn recv(&mut self) -> Option<Result<String, ProtocolError>>;

    async fn send(&mut self, message: &ServerMessage) -> Result<(), ChannelClosed>;

    /// Close from the server side
    async fn close(&mut self);
}

/// Why a stream stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// Client sent end_session
    Requested,
    /// Channel closed without end_session
    Disconnected,
    /// Client sent something the protocol does not allow
    ProtocolViolation,
    /// Session was ended or deleted elsewhere
    SessionGone,
}

/// Ends the session when dropped unless finalized or disarmed first
struct FinalizeGuard {
    service: Option<Arc<PostureService>>,
    id: SessionId,
}

impl FinalizeGuard {
    fn new(service: Arc<PostureService>, id: SessionId) -> Self {
        Self {
            service: Some(service),
            id,
        }
    }

    /// End the session on a detached task, so cancelling the caller cannot
    /// interrupt persistence halfway.
    async fn finalize(mut self) -> Option<Result<EndOutcome, SessionError>> {
        let service = self.service.take()?;
        let id = self.id;
        let task = tokio::spawn(async move { service.end_session(id, Utc::now()).await });

        match task.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::error!(session_id = %id, "Finalize task failed: {}", e);
                None
            }
        }
    }

    fn disarm(mut self) {
        self.service = None;
    }
}

impl Drop for FinalizeGuard {
    fn drop(&mut self) {
        let Some(service) = self.service.take() else {
            return;
        };
        let id = self.id;

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                tracing::warn!(session_id = %id, "Stream dropped without finalizing; ending session");
                runtime.spawn(async move {
                    if let Err(e) = service.end_session(id, Utc::now()).await {
                        tracing::debug!(session_id = %id, "Deferred finalize skipped: {}", e);
                    }
                });
            }
            Err(_) => {
                tracing::error!(session_id = %id, "No runtime to finalize dropped stream");
            }
        }
    }
}

/// Drive `channel` until it ends; the session is finalized before returning.
pub async fn run_stream<C: Channel>(
    service: Arc<PostureService>,
    provider: Arc<dyn LandmarkProvider>,
    id: SessionId,
    channel: &mut C,
    config: StreamConfig,
) -> StreamEnd {
    let guard = FinalizeGuard::new(service.clone(), id);
    let mut frames: u64 = 0;

    tracing::info!(session_id = %id, "Stream opened");

    let end = loop {
        let text = match channel.recv().await {
            None => break StreamEnd::Disconnected,
            Some(Ok(text)) => text,
            Some(Err(e)) => {
                reject(channel, id, e).await;
                break StreamEnd::ProtocolViolation;
            }
        };

        let message = match ClientMessage::parse(&text) {
            Ok(message) => message,
            Err(e) => {
                reject(channel, id, e).await;
                break StreamEnd::ProtocolViolation;
            }
        };

        match message {
            ClientMessage::Ping => {
                if channel.send(&ServerMessage::Control(ControlMessage::Pong)).await.is_err() {
                    break StreamEnd::Disconnected;
                }
            }

            ClientMessage::Frame { frame } => {
                let detection = match detect(provider.as_ref(), &frame).await {
                    Ok(detection) => detection,
                    Err(e) => {
                        // Frame is skipped, the session carries on
                        tracing::warn!(session_id = %id, "Frame skipped: {}", e);
                        if channel.send(&ServerMessage::Error(ErrorMessage::new(e))).await.is_err() {
                            break StreamEnd::Disconnected;
                        }
                        continue;
                    }
                };

                let (result, snapshot) = match service.analyze_detection(id, detection, Utc::now()) {
                    Ok(analysis) => analysis,
                    Err(e) => {
                        tracing::info!(session_id = %id, "Stream closed: {}", e);
                        let _ = channel.send(&ServerMessage::Error(ErrorMessage::new(&e))).await;
                        channel.close().await;
                        guard.disarm();
                        return StreamEnd::SessionGone;
                    }
                };

                frames += 1;
                let with_stats = config.stats_every > 0 && frames % u64::from(config.stats_every) == 0;
                let response = FrameResponse::new(&result, with_stats.then_some(snapshot));

                if channel.send(&ServerMessage::Frame(response)).await.is_err() {
                    break StreamEnd::Disconnected;
                }
            }

            ClientMessage::EndSession => break StreamEnd::Requested,
        }
    };

    let outcome = guard.finalize().await;

    if end == StreamEnd::Requested {
        let reply = match outcome {
            Some(Ok(outcome)) => ServerMessage::Control(ControlMessage::SessionEnded {
                session_stats: outcome.snapshot,
                saved_to_database: outcome.saved,
            }),
            Some(Err(e)) => ServerMessage::Error(ErrorMessage::new(e)),
            None => ServerMessage::Error(ErrorMessage::new("failed to end session")),
        };
        let _ = channel.send(&reply).await;
    }

    if end != StreamEnd::Disconnected {
        channel.close().await;
    }

    tracing::info!(session_id = %id, frames, reason = ?end, "Stream closed");
    end
}

async fn detect(provider: &dyn LandmarkProvider, frame: &str) -> Result<Detection, ProviderError> {
    let image = decode_frame(frame)?;
    provider.detect(&image).await
}

async fn reject<C: Channel>(channel: &mut C, id: SessionId, error: ProtocolError) {
    tracing::warn!(session_id = %id, "Protocol violation: {}", error);
    let _ = channel.send(&ServerMessage::Error(ErrorMessage::new(error))).await;
}
