//! signal-relay binary entry point.
//!
//! Usage:
//! ```bash
//! signal-relay --config signal.toml
//! PORT=8080 signal-relay
//! ```

use anyhow::Context;
use signal_relay::cleanup::spawn_cleanup_task;
use signal_relay::config::Config;
use signal_relay::keepalive::spawn_keepalive_task;
use signal_relay::server::SignalRelay;
use signal_relay::session;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut config = Config::load(&get_config_path()).context("loading configuration")?;
    config.apply_env();

    let relay = Arc::new(SignalRelay::new(config));

    let keepalive = spawn_keepalive_task(relay.clone(), relay.config().keepalive.clone());
    let cleanup = spawn_cleanup_task(relay.clone(), relay.config().cleanup.clone());

    tokio::select! {
        result = session::run_server(relay.clone()) => {
            result.context("relay server failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down ({} live connection(s))", relay.connection_count());
        }
    }

    keepalive.abort();
    cleanup.abort();

    Ok(())
}

fn get_config_path() -> PathBuf {
    std::env::args()
        .skip_while(|arg| arg != "--config")
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("signal.toml"))
}
