//! Background cleanup task for idle calls.
//!
//! A call whose participants stopped talking (or whose code was minted
//! and never joined) would otherwise occupy its code until a
//! disconnect. The sweep removes calls with no activity for longer
//! than the configured threshold.

use crate::config::CleanupConfig;
use crate::server::SignalRelay;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

/// Spawn the idle-call cleanup task.
///
/// Returns a handle that can be used to abort the task.
pub fn spawn_cleanup_task(
    relay: Arc<SignalRelay>,
    config: CleanupConfig,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if !config.enabled {
            tracing::info!("Cleanup task disabled");
            return;
        }

        let max_idle = Duration::from_secs(config.max_idle_secs);
        tracing::info!(
            "Cleanup task started (interval: {}s, max idle: {}s)",
            config.interval_secs,
            config.max_idle_secs
        );

        let mut timer = interval(Duration::from_secs(config.interval_secs));

        loop {
            timer.tick().await;

            let removed = relay.registry().remove_idle(max_idle);
            if removed > 0 {
                tracing::info!("Cleanup: removed {} idle call(s)", removed);
            } else {
                tracing::debug!("Cleanup: no idle calls");
            }
        }
    })
}
