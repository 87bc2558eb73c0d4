//! Error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::provider::ProviderError;
use crate::session::SessionError;
use crate::store::StoreError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Resource errors
    NotFound(String),
    Conflict(String),
    Busy(String),

    // Validation errors
    ValidationError(String),

    // Database errors
    DatabaseError(String),

    // External service errors
    ExternalServiceError(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.as_str()),
            AppError::Busy(msg) => (StatusCode::LOCKED, msg.as_str()),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error occurred")
            }
            AppError::ExternalServiceError(msg) => {
                tracing::error!("Pose detector error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Pose detector error")
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(_) => AppError::NotFound(err.to_string()),
            SessionError::Ended(_) | SessionError::Active(_) | SessionError::Streaming(_) => {
                AppError::Conflict(err.to_string())
            }
            SessionError::Busy(_) => AppError::Busy(err.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            // A frame we cannot read is the client's fault
            ProviderError::Decode(msg) => AppError::ValidationError(format!("Invalid frame: {}", msg)),
            other => AppError::ExternalServiceError(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionId;

    #[test]
    fn test_session_error_status_codes() {
        let id = SessionId::new();
        let cases = [
            (SessionError::NotFound(id), StatusCode::NOT_FOUND),
            (SessionError::Ended(id), StatusCode::CONFLICT),
            (SessionError::Busy(id), StatusCode::LOCKED),
            (SessionError::Active(id), StatusCode::CONFLICT),
            (SessionError::Streaming(id), StatusCode::CONFLICT),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).into_response().status(), expected);
        }
    }

    #[test]
    fn test_provider_error_status_codes() {
        let decode = AppError::from(ProviderError::Decode("bad base64".to_string()));
        assert_eq!(decode.into_response().status(), StatusCode::BAD_REQUEST);

        let detector = AppError::from(ProviderError::Detector("timeout".to_string()));
        assert_eq!(detector.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
