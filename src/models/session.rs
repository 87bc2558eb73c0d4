//! Session request/response models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::session::{SessionId, SessionRecord, SessionSnapshot};
use crate::store::HistorySummary;

#[derive(Debug, Serialize, Deserialize)]
pub struct StartSessionResponse {
    pub status: String,
    pub session_id: SessionId,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionStatusResponse {
    pub status: String,
    pub session_id: SessionId,
    pub is_active: bool,
    pub statistics: SessionSnapshot,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EndSessionResponse {
    pub status: String,
    pub message: String,
    pub session_statistics: SessionSnapshot,
    pub saved_to_database: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActiveSessionsResponse {
    pub status: String,
    pub count: usize,
    pub active_sessions: Vec<SessionSnapshot>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct HistoryQuery {
    #[validate(range(min = 1, max = 500))]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub status: String,
    pub count: usize,
    pub sessions: Vec<SessionRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatisticsResponse {
    pub status: String,
    pub statistics: HistorySummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub status: String,
    pub message: String,
}
