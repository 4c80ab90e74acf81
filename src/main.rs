//! Avatar Sync client - headless entry point
//!
//! Connects to the relay, loads the avatar asset, reads key signals from
//! stdin and runs the frame loop until Ctrl+C or the relay disconnects.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use avatar_sync::app::frame::TracingFrameSink;
use avatar_sync::app::keys::spawn_stdin_reader;
use avatar_sync::app::ClientRunner;
use avatar_sync::config::Config;
use avatar_sync::game::asset::ManifestLoader;
use avatar_sync::ws::client;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    info!("Starting Avatar Sync client");
    info!("Relay: {}", config.relay_url);

    // Connect to relay
    let client::RelayConnection {
        inbound,
        outbound,
        tasks,
    } = client::connect(&config.relay_url).await?;

    // Key input
    let (keys_tx, keys_rx) = mpsc::unbounded_channel();
    let key_reader = spawn_stdin_reader(keys_tx);

    let loader = Arc::new(ManifestLoader::new(&config.asset_manifest));
    let runner = ClientRunner::new(
        &config,
        outbound,
        inbound,
        keys_rx,
        loader,
        TracingFrameSink,
    );

    let stats = runner.run(shutdown_signal()).await;

    key_reader.abort();
    tasks.close();

    info!(
        received = stats.events_received,
        sent = stats.events_sent,
        throttled = stats.moves_throttled,
        avg_roster = stats.avg_roster_size,
        "Client shutdown complete"
    );
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
