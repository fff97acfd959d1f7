// Fastbreak draft server entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file)
// 2. Load config
// 3. Open database
// 4. Build notifier and draft engine
// 5. Run the WebSocket server until Ctrl+C

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};

use fastbreak::config;
use fastbreak::db;
use fastbreak::engine::DraftEngine;
use fastbreak::notify::ChannelNotifier;
use fastbreak::ws_server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Fastbreak draft server starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: {} rounds, {}s per pick, up to {} teams",
        config.draft.total_rounds, config.draft.seconds_per_pick, config.draft.default_max_teams
    );

    // 3. Open database
    if let Some(parent) = std::path::Path::new(&config.db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = db::Database::open(&config.db_path).context("failed to open database")?;
    info!("Database opened at {}", config.db_path);

    // 4. Build notifier and engine
    let notifier = Arc::new(ChannelNotifier::new(256));
    let engine = Arc::new(DraftEngine::new(
        Arc::new(db),
        notifier.clone(),
        config.draft,
    ));

    // 5. Run the WebSocket server, shutting down on Ctrl+C
    let ws_port = config.ws_port;
    let server = tokio::spawn(async move {
        if let Err(e) = ws_server::run(ws_port, engine, notifier).await {
            error!("WebSocket server error: {}", e);
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    server.abort();
    info!("Fastbreak draft server shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file so the terminal stays clean.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("fastbreak.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fastbreak=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
