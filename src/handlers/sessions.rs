//! Session lifecycle and frame handlers

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::models::{
    ActiveSessionsResponse, AnalyzeRequest, EndSessionResponse, FrameRequest, FrameResponse, MessageResponse,
    SessionStatusResponse, StartSessionResponse,
};
use crate::provider::{decode_frame, Detection};
use crate::session::{SessionError, SessionId};
use crate::{AppResult, AppState};

/// Start a new session
pub async fn start(State(state): State<AppState>) -> AppResult<Json<StartSessionResponse>> {
    let now = Utc::now();
    let session_id = state.service.start_session(now);

    Ok(Json(StartSessionResponse {
        status: "success".to_string(),
        session_id,
        start_time: now,
    }))
}

/// List active sessions with their current stats
pub async fn list(State(state): State<AppState>) -> AppResult<Json<ActiveSessionsResponse>> {
    let active_sessions = state.service.active_snapshots(Utc::now());

    Ok(Json(ActiveSessionsResponse {
        status: "success".to_string(),
        count: active_sessions.len(),
        active_sessions,
    }))
}

pub async fn get(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> AppResult<Json<SessionStatusResponse>> {
    let statistics = state.service.get_stats(session_id, Utc::now())?;

    Ok(Json(SessionStatusResponse {
        status: "success".to_string(),
        session_id,
        is_active: statistics.is_active(),
        statistics,
    }))
}

/// Drop a session from the registry without persisting it
pub async fn delete(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> AppResult<Json<MessageResponse>> {
    state.service.delete_session(session_id)?;

    Ok(Json(MessageResponse {
        status: "success".to_string(),
        message: format!("Session {} deleted", session_id),
    }))
}

/// Analyze landmarks detected on the client and record the frame
pub async fn analyze(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    Json(req): Json<AnalyzeRequest>,
) -> AppResult<Json<FrameResponse>> {
    req.validate()?;

    let detection = Detection {
        present: req.present,
        landmarks: req.landmarks,
    };
    let (result, snapshot) = state.service.analyze_detection(session_id, detection, Utc::now())?;

    Ok(Json(FrameResponse::new(&result, Some(snapshot))))
}

/// Run an encoded frame through the landmark provider and record it
pub async fn frame(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    Json(req): Json<FrameRequest>,
) -> AppResult<Json<FrameResponse>> {
    req.validate()?;

    // Fail fast before paying for detection
    if !state.service.get_stats(session_id, Utc::now())?.is_active() {
        return Err(SessionError::Ended(session_id).into());
    }

    let image = decode_frame(&req.frame)?;
    let detection = state.provider.detect(&image).await?;
    let (result, snapshot) = state.service.analyze_detection(session_id, detection, Utc::now())?;

    Ok(Json(FrameResponse::new(&result, Some(snapshot))))
}

/// End a session; repeated calls return the same final stats
pub async fn end(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> AppResult<Json<EndSessionResponse>> {
    let outcome = state.service.end_session(session_id, Utc::now()).await?;

    let message = if outcome.newly_ended {
        "Session ended"
    } else {
        "Session already ended"
    };

    Ok(Json(EndSessionResponse {
        status: "success".to_string(),
        message: message.to_string(),
        session_statistics: outcome.snapshot,
        saved_to_database: outcome.saved,
    }))
}
