//! Posture Cloud Server
//!
//! Posture analysis over REST and WebSocket, with session history kept in
//! PostgreSQL (or in memory when no database is configured).

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use posture_cloud::{
    config::Config,
    create_router, db,
    posture::{MetricExtractor, PostureAnalyzer, PostureClassifier},
    provider::{LandmarkProvider, PayloadProvider, RemoteProvider},
    store::{MemorySessionStore, PgSessionStore, SessionStore},
    supervisor, AppState, PostureService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "posture_cloud=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing::info!("Posture Cloud Server starting...");

    let store = open_store(&config).await?;
    let provider = open_provider(&config)?;

    let analyzer = PostureAnalyzer::new(
        MetricExtractor::new(config.min_landmark_confidence),
        PostureClassifier::new(config.thresholds.clone()),
    );
    let service = Arc::new(PostureService::new(analyzer, store));

    // Background supervisor
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let supervisor = tokio::spawn(supervisor::run(service.clone(), config.clone(), shutdown_rx));

    // Build application state
    let state = AppState {
        service: service.clone(),
        provider,
        config: config.clone(),
    };

    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // Stop sweeping, then persist whatever is still open
    let _ = shutdown_tx.send(true);
    if let Err(e) = supervisor.await {
        tracing::error!("Supervisor task failed: {}", e);
    }

    let finalized = service.finalize_all(Utc::now()).await;
    tracing::info!(finalized, "Shutdown complete");

    Ok(())
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn SessionStore>> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set; session history is kept in memory");
        return Ok(Arc::new(MemorySessionStore::new()));
    };

    tracing::info!("Database: {}", database_url.split('@').last().unwrap_or("***"));

    // Initialize database pool
    let pool = db::create_pool(database_url)
        .await
        .context("failed to create database pool")?;

    // Run migrations
    tracing::info!("Running database migrations...");
    db::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    Ok(Arc::new(PgSessionStore::new(pool)))
}

fn open_provider(config: &Config) -> anyhow::Result<Arc<dyn LandmarkProvider>> {
    match config.pose_detector_url.as_deref() {
        Some(url) => {
            tracing::info!("Pose detector: {}", url);
            let provider = RemoteProvider::new(url, config.detector_timeout())
                .context("failed to build pose detector client")?;
            Ok(Arc::new(provider))
        }
        None => {
            tracing::info!("No pose detector configured; frames must carry their landmarks");
            Ok(Arc::new(PayloadProvider))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
