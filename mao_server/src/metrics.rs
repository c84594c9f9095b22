//! Prometheus metrics for monitoring game server health.
//!
//! Metrics are recorded through the `metrics` facade and, when an exporter
//! address is configured, exposed in Prometheus text format for scraping.
//! Without an installed exporter every call is a no-op.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use mao_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::games_created_total();
//! metrics::websocket_connections_active(10);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// Set current active WebSocket connections count.
pub fn websocket_connections_active(count: u64) {
    metrics::gauge!("websocket_connections_active").set(count as f64);
}

/// Increment WebSocket messages received counter.
pub fn websocket_messages_received() {
    metrics::counter!("websocket_messages_received").increment(1);
}

/// Increment rate limit hits counter.
pub fn rate_limit_hits_total(limiter: &'static str) {
    metrics::counter!("rate_limit_hits_total", "limiter" => limiter).increment(1);
}

// ============================================================================
// Game Metrics
// ============================================================================

/// Increment games created counter.
pub fn games_created_total() {
    metrics::counter!("games_created_total").increment(1);
}

/// Record a command outcome (`ok` or the error kind).
pub fn game_commands_total(command: &'static str, outcome: String) {
    metrics::counter!("game_commands_total",
        "command" => command,
        "outcome" => outcome
    )
    .increment(1);
}

/// Publish the running total of views that couldn't be delivered.
pub fn broadcast_drops_total(total: u64) {
    metrics::counter!("broadcast_drops_total").absolute(total);
}
