//! Session types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for SessionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Tracker lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Active,
    Ended,
}

/// Aggregated session statistics at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub state: SessionState,
    pub start_time: DateTime<Utc>,
    pub duration_seconds: f64,
    pub total_frames: u64,
    pub good_frames: u64,
    pub bad_frames: u64,
    pub good_percent: f64,
    pub bad_percent: f64,
    pub average_score: f64,
    pub longest_bad_duration: f64,
    pub current_bad_duration: f64,
}

impl SessionSnapshot {
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Flat record handed to the persistence collaborator
    pub fn to_record(&self, ended_at: DateTime<Utc>) -> SessionRecord {
        SessionRecord {
            session_id: self.session_id,
            start_time: self.start_time,
            ended_at,
            duration_seconds: round2(self.duration_seconds),
            total_frames: self.total_frames as i64,
            good_frames: self.good_frames as i64,
            bad_frames: self.bad_frames as i64,
            good_percent: round2(self.good_percent),
            bad_percent: round2(self.bad_percent),
            average_score: round2(self.average_score),
            longest_bad_duration_seconds: round2(self.longest_bad_duration),
        }
    }
}

/// Finalized session as stored in history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub start_time: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub total_frames: i64,
    pub good_frames: i64,
    pub bad_frames: i64,
    pub good_percent: f64,
    pub bad_percent: f64,
    pub average_score: f64,
    pub longest_bad_duration_seconds: f64,
}

/// Session errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("session {0} not found")]
    NotFound(SessionId),

    #[error("session {0} has already ended")]
    Ended(SessionId),

    #[error("session {0} is busy")]
    Busy(SessionId),

    #[error("session {0} is still active; end it before deleting")]
    Active(SessionId),

    #[error("session {0} already has a stream attached")]
    Streaming(SessionId),
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Seconds between two instants, never negative
pub(crate) fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let millis = to.signed_duration_since(from).num_milliseconds();
    millis.max(0) as f64 / 1000.0
}
