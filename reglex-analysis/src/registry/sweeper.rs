//! Periodic removal of expired sessions

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::AnalysisRegistry;

/// Spawn a task that calls [`AnalysisRegistry::cleanup`] every `period` until
/// `shutdown` is cancelled
pub fn spawn_session_sweeper(
    registry: AnalysisRegistry,
    period: Duration,
    ttl: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    info!(
        "Starting session sweeper (interval: {}s, ttl: {}s)",
        period.as_secs(),
        ttl.as_secs()
    );

    tokio::spawn(async move {
        let mut timer = interval(period.max(Duration::from_millis(1)));
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // First tick completes immediately
        timer.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Session sweeper stopped");
                    break;
                }
                _ = timer.tick() => {
                    let removed = registry.cleanup(ttl);
                    debug!(removed, remaining = registry.session_count(), "Session sweep complete");
                }
            }
        }
    })
}
