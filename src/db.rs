//! Database module - PostgreSQL connection and schema

use sqlx::{postgres::PgPoolOptions, PgPool};

/// Create database connection pool
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Apply the session history schema
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;

    tracing::info!("Database schema applied successfully");
    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Finalized posture sessions
CREATE TABLE IF NOT EXISTS posture_sessions (
    session_id UUID PRIMARY KEY,
    start_time TIMESTAMPTZ NOT NULL,
    ended_at TIMESTAMPTZ NOT NULL,
    duration_seconds DOUBLE PRECISION NOT NULL,
    total_frames BIGINT NOT NULL,
    good_frames BIGINT NOT NULL,
    bad_frames BIGINT NOT NULL,
    good_percent DOUBLE PRECISION NOT NULL,
    bad_percent DOUBLE PRECISION NOT NULL,
    average_score DOUBLE PRECISION NOT NULL,
    longest_bad_duration_seconds DOUBLE PRECISION NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_posture_sessions_ended ON posture_sessions(ended_at);
"#;
