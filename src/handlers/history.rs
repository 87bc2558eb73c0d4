//! Persisted session history

use axum::{
    extract::{Path, Query, State},
    Json,
};
use validator::Validate;

use crate::models::{HistoryQuery, HistoryResponse, MessageResponse, StatisticsResponse};
use crate::session::SessionId;
use crate::{AppError, AppResult, AppState};

const DEFAULT_HISTORY_LIMIT: i64 = 10;

/// Most recent ended sessions, newest first
pub async fn recent(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<HistoryResponse>> {
    query.validate()?;

    let sessions = state
        .service
        .store()
        .recent(query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
        .await?;

    Ok(Json(HistoryResponse {
        status: "success".to_string(),
        count: sessions.len(),
        sessions,
    }))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> AppResult<Json<MessageResponse>> {
    if !state.service.store().delete(session_id).await? {
        return Err(AppError::NotFound(format!("Session {} not found in history", session_id)));
    }

    tracing::info!(session_id = %session_id, "Deleted session from history");

    Ok(Json(MessageResponse {
        status: "success".to_string(),
        message: format!("Session {} deleted from history", session_id),
    }))
}

/// Aggregates over all persisted sessions
pub async fn statistics(State(state): State<AppState>) -> AppResult<Json<StatisticsResponse>> {
    let statistics = state.service.store().summary().await?;

    Ok(Json(StatisticsResponse {
        status: "success".to_string(),
        statistics,
    }))
}
