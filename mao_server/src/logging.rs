//! Structured logging configuration.
//!
//! The server logs through `tracing`; the game library logs through the
//! `log` facade, whose records are forwarded into the same subscriber.

use mao::{Command, ErrorKind, GameCode, GameError, PlayerId};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,hyper=warn,tower_http=warn";

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// use mao_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    // `init` also installs the `log` -> `tracing` bridge.
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a command that changed a game
pub fn log_game_event(command: &str, game_id: &GameCode, player_id: Option<&PlayerId>, version: u64) {
    tracing::info!(
        command = command,
        game_id = %game_id,
        player_id = player_id.map(PlayerId::as_str),
        version = version,
        "Game updated"
    );
}

/// Log a rejected command
///
/// Client mistakes are logged at debug; a stopped game actor is a warning.
pub fn log_command_rejected(command: &Command, player_id: Option<&PlayerId>, error: &GameError) {
    let kind = error.kind();
    if kind == ErrorKind::Unavailable {
        tracing::warn!(
            command = command.label(),
            player_id = player_id.map(PlayerId::as_str),
            error_kind = %kind,
            "Command failed: {}",
            error
        );
    } else {
        tracing::debug!(
            command = command.label(),
            player_id = player_id.map(PlayerId::as_str),
            error_kind = %kind,
            "Command rejected: {}",
            error
        );
    }
}
