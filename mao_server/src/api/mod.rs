//! HTTP/WebSocket API for the Mao server.
//!
//! Games are played entirely over the WebSocket; the HTTP routes are for
//! monitoring and inspection.
//!
//! # Modules
//!
//! - [`games`]: Read-only game summaries
//! - [`websocket`]: The game protocol
//! - [`rate_limiter`]: Per-connection message limits
//! - [`request_id`]: Request correlation middleware
//!
//! # Endpoints Overview
//!
//! ```text
//! GET /health                  - Server health status
//! GET /api/v1/games/{code}     - Public game summary
//! GET /ws                      - Game WebSocket
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use mao::{GameConfig, GameRegistry, GameService, SessionDirectory};
//! use mao_server::{api::{AppState, create_router}, config::WsLimits};
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let service = GameService::new(
//!     GameRegistry::new(GameConfig::default()),
//!     SessionDirectory::new(),
//! );
//! let app = create_router(AppState::new(service, WsLimits::default()));
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod games;
pub mod rate_limiter;
pub mod request_id;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Json},
    routing::get,
};
use mao::GameService;
use serde_json::json;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tower_http::cors::CorsLayer;

use crate::config::WsLimits;

/// Application state shared across all HTTP handlers and WebSocket connections.
#[derive(Clone)]
pub struct AppState {
    pub service: GameService,
    pub ws_limits: WsLimits,
    /// Open WebSocket connections
    pub connections: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(service: GameService, ws_limits: WsLimits) -> Self {
        Self {
            service,
            ws_limits,
            connections: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// Create the API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let v1_routes = Router::new().route("/games/{code}", get(games::get_game));

    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket::websocket_handler))
        .nest("/api/v1", v1_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/health
/// # {"status":"healthy","version":"0.1.0","games":{"active_count":2},"connections":3,"timestamp":"..."}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let game_count = state.service.registry().game_count().await;

    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "games": {
            "active_count": game_count
        },
        "connections": state.connections.load(Ordering::Relaxed),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
