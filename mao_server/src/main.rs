//! Mao session server.
//!
//! Each game runs in its own actor task owned by the registry; clients play
//! over a WebSocket and are told about every state change.

use std::net::SocketAddr;

use anyhow::{Context, Error};
use log::info;
use mao::{GameRegistry, GameService, SessionDirectory};
use mao_server::{api, config::ServerConfig, logging, metrics};
use pico_args::Arguments;

const HELP: &str = "\
Run a Mao game server

USAGE:
  mao_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8080]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND                  Server bind address (e.g., 0.0.0.0:8080)
  METRICS_BIND                 Prometheus exporter address (disabled if unset)
  STARTING_HAND_SIZE           Cards dealt to each player at start [default: 7]
  RECENT_EVENT_CAPACITY        Events kept per game [default: 10]
  GAME_CODE_LENGTH             Letters in a session code [default: 4]
  GAME_INBOX_CAPACITY          Queued commands per game [default: 100]
  CONNECTION_OUTBOX_CAPACITY   Queued state views per connection [default: 32]
  MAX_PENALTY                  Most cards one penalty may deal [default: 10]
  WS_BURST_LIMIT               Messages per second per connection [default: 10]
  WS_SUSTAINED_LIMIT           Messages per minute per connection [default: 100]
  RUST_LOG                     Log filter [default: info]
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let bind: Option<SocketAddr> = pargs
        .opt_value_from_str("--bind")
        .context("Invalid --bind address")?;

    logging::init();

    let config = ServerConfig::from_env(bind)?;
    config.validate()?;

    if let Some(metrics_bind) = config.metrics_bind {
        metrics::init_metrics(metrics_bind).map_err(anyhow::Error::msg)?;
        info!("Prometheus metrics exported at http://{}/metrics", metrics_bind);
    }

    info!(
        "Starting Mao server at {} (hand size {}, code length {})",
        config.bind, config.game.starting_hand_size, config.game.code_length
    );

    let service = GameService::new(GameRegistry::new(config.game), SessionDirectory::new());
    let app = api::create_router(api::AppState::new(service, config.ws_limits));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
