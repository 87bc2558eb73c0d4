//! Background session supervisor
//!
//! Ends sessions that stopped sending frames and evicts ended sessions
//! once their retention window has passed.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::config::Config;
use crate::service::PostureService;

/// Run sweeps until `shutdown` flips to true
pub async fn run(service: Arc<PostureService>, config: Config, mut shutdown: watch::Receiver<bool>) {
    let idle = config.session_idle();
    let retention = config.session_retention();

    let mut interval = tokio::time::interval(config.sweep_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        idle_secs = config.session_idle_secs,
        retention_secs = config.session_retention_secs,
        "Session supervisor started"
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let report = service.sweep(idle, retention, Utc::now()).await;
                if report.expired + report.removed + report.busy > 0 {
                    tracing::debug!(
                        expired = report.expired,
                        removed = report.removed,
                        busy = report.busy,
                        "Session sweep"
                    );
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    tracing::info!("Session supervisor stopped");
}
