//! Session history storage
//!
//! Finalized sessions are handed to a `SessionStore` exactly once.
//! - `postgres.rs`: `PgSessionStore` (sqlx)
//! - `memory.rs`: `MemorySessionStore` (no database configured, tests)

pub mod memory;
pub mod postgres;

use serde::{Deserialize, Serialize};

use crate::session::{SessionId, SessionRecord};

pub use memory::MemorySessionStore;
pub use postgres::PgSessionStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Aggregate statistics over all stored sessions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub total_sessions: i64,
    pub total_duration_seconds: f64,
    pub average_good_percent: f64,
    pub average_bad_percent: f64,
    pub average_score: f64,
}

#[axum::async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a finalized session
    async fn save(&self, record: &SessionRecord) -> Result<(), StoreError>;

    /// Most recently ended sessions, newest first
    async fn recent(&self, limit: i64) -> Result<Vec<SessionRecord>, StoreError>;

    async fn summary(&self) -> Result<HistorySummary, StoreError>;

    /// Remove a session from history. Returns false if it was not stored.
    async fn delete(&self, id: SessionId) -> Result<bool, StoreError>;
}
