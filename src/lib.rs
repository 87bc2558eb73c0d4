//! Posture Cloud
//!
//! Posture analysis and session tracking server.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       POSTURE CLOUD                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌──────────────┐  ┌───────────────────────┐ │
//! │  │  REST     │  │  WebSocket   │  │  Supervisor           │ │
//! │  │  (Axum)   │  │  stream      │  │  (idle / retention)   │ │
//! │  └─────┬─────┘  └──────┬───────┘  └───────────┬───────────┘ │
//! │        └───────────────┼──────────────────────┘             │
//! │                        ▼                                    │
//! │   LandmarkProvider → MetricExtractor → PostureClassifier    │
//! │                        ▼                                    │
//! │             SessionRegistry → SessionTracker                │
//! │                        ▼                                    │
//! │              SessionStore (PostgreSQL / memory)             │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod posture;
pub mod provider;
pub mod service;
pub mod session;
pub mod store;
pub mod stream;
pub mod supervisor;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use config::Config;
pub use error::{AppError, AppResult};
pub use service::PostureService;

use provider::LandmarkProvider;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PostureService>,
    pub provider: Arc<dyn LandmarkProvider>,
    pub config: Config,
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    let session_routes = Router::new()
        .route("/api/v1/sessions", post(handlers::sessions::start).get(handlers::sessions::list))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::sessions::get).delete(handlers::sessions::delete),
        )
        .route("/api/v1/sessions/:id/analyze", post(handlers::sessions::analyze))
        .route("/api/v1/sessions/:id/frame", post(handlers::sessions::frame))
        .route("/api/v1/sessions/:id/end", post(handlers::sessions::end))
        .route("/api/v1/sessions/:id/stream", get(handlers::stream::connect));

    let history_routes = Router::new()
        .route("/api/v1/history", get(handlers::history::recent))
        .route("/api/v1/history/:id", delete(handlers::history::delete))
        .route("/api/v1/statistics", get(handlers::history::statistics));

    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/api/v1/posture/analyze", post(handlers::posture::analyze))
        .merge(session_routes)
        .merge(history_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
