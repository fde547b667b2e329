//! Background keepalive broadcaster.
//!
//! Sends a `{"type":"ping"}` frame to every live connection on a fixed
//! period so idle connections survive proxy and load-balancer timeouts.
//! Carries no call semantics and never touches the call registry.

use crate::config::KeepaliveConfig;
use crate::server::SignalRelay;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

/// Spawn the keepalive task.
///
/// Returns a handle that can be used to abort the task.
pub fn spawn_keepalive_task(
    relay: Arc<SignalRelay>,
    config: KeepaliveConfig,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if !config.enabled {
            tracing::info!("Keepalive task disabled");
            return;
        }

        let interval_secs = config.interval_secs;
        tracing::info!("Keepalive task started (interval: {}s)", interval_secs);

        let mut timer = interval(Duration::from_secs(interval_secs));
        timer.tick().await; // the first tick fires immediately

        loop {
            timer.tick().await;
            tracing::trace!("Pinging {} connection(s)", relay.connection_count());
            relay.broadcast_ping();
        }
    })
}
