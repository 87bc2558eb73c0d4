//! PostgreSQL session history

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};
use uuid::Uuid;

use super::{HistorySummary, SessionStore, StoreError};
use crate::session::{types::round2, SessionId, SessionRecord};

#[derive(Debug, FromRow)]
struct SessionRow {
    session_id: Uuid,
    start_time: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    duration_seconds: f64,
    total_frames: i64,
    good_frames: i64,
    bad_frames: i64,
    good_percent: f64,
    bad_percent: f64,
    average_score: f64,
    longest_bad_duration_seconds: f64,
}

impl From<SessionRow> for SessionRecord {
    fn from(row: SessionRow) -> Self {
        Self {
            session_id: SessionId::from(row.session_id),
            start_time: row.start_time,
            ended_at: row.ended_at,
            duration_seconds: row.duration_seconds,
            total_frames: row.total_frames,
            good_frames: row.good_frames,
            bad_frames: row.bad_frames,
            good_percent: row.good_percent,
            bad_percent: row.bad_percent,
            average_score: row.average_score,
            longest_bad_duration_seconds: row.longest_bad_duration_seconds,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[axum::async_trait]
impl SessionStore for PgSessionStore {
    async fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO posture_sessions (
                session_id, start_time, ended_at, duration_seconds,
                total_frames, good_frames, bad_frames,
                good_percent, bad_percent, average_score, longest_bad_duration_seconds
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#
        )
        .bind(record.session_id.as_uuid())
        .bind(record.start_time)
        .bind(record.ended_at)
        .bind(record.duration_seconds)
        .bind(record.total_frames)
        .bind(record.good_frames)
        .bind(record.bad_frames)
        .bind(record.good_percent)
        .bind(record.bad_percent)
        .bind(record.average_score)
        .bind(record.longest_bad_duration_seconds)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<SessionRecord>, StoreError> {
        let rows = sqlx::query_as::<_, SessionRow>(
            "SELECT * FROM posture_sessions ORDER BY ended_at DESC LIMIT $1"
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SessionRecord::from).collect())
    }

    async fn summary(&self) -> Result<HistorySummary, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                COALESCE(SUM(duration_seconds), 0) AS duration,
                COALESCE(AVG(good_percent), 0) AS good,
                COALESCE(AVG(bad_percent), 0) AS bad,
                COALESCE(AVG(average_score), 0) AS score
            FROM posture_sessions
            "#
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(HistorySummary {
            total_sessions: row.get("total"),
            total_duration_seconds: round2(row.get("duration")),
            average_good_percent: round2(row.get("good")),
            average_bad_percent: round2(row.get("bad")),
            average_score: round2(row.get("score")),
        })
    }

    async fn delete(&self, id: SessionId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM posture_sessions WHERE session_id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
