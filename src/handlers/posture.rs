//! Stateless posture analysis

use axum::{extract::State, Json};
use chrono::Utc;
use validator::Validate;

use crate::models::{AnalyzeRequest, FrameResponse};
use crate::provider::Detection;
use crate::{AppResult, AppState};

/// Classify one frame without touching any session
pub async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> AppResult<Json<FrameResponse>> {
    req.validate()?;

    let landmarks = Detection {
        present: req.present,
        landmarks: req.landmarks,
    }
    .into_landmarks();
    let result = state.service.evaluate(landmarks.as_ref(), Utc::now());

    Ok(Json(FrameResponse::new(&result, None)))
}
