//! Game inspection API handlers.
//!
//! Games are created and played over the WebSocket; HTTP only exposes a
//! read-only public summary.
//!
//! # Examples
//!
//! ```bash
//! curl http://localhost:8080/api/v1/games/ABCD
//! ```

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use mao::{ErrorKind, GameError, game::GameSummary};
use serde::Serialize;

use super::{AppState, request_id::RequestId};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub error: String,
}

impl From<GameError> for ErrorResponse {
    fn from(error: GameError) -> Self {
        Self {
            kind: error.kind(),
            error: error.to_string(),
        }
    }
}

/// HTTP status for an error kind
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidState | ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Get the public summary of a game.
///
/// # Path Parameters
///
/// - `code`: Session code (case-insensitive)
///
/// # Response
///
/// Returns `200 OK` with the seats (hand sizes only), top card, pending
/// action, winner, and recent events:
/// ```json
/// {
///   "id": "ABCD",
///   "status": "ACTIVE",
///   "adminId": "alice",
///   "seats": [{"id": "alice", "name": "alice", "seat": 0, "isAdmin": true, "handSize": 7}],
///   "topCard": {"rank": "Q", "suit": "hearts"},
///   "currentAction": null,
///   "winnerId": null,
///   "recentEvents": [{"type": "GAME_STARTED", "timestamp": "2026-01-01T00:00:00Z"}],
///   "version": 3
/// }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: No game with this code
pub async fn get_game(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(code): Path<String>,
) -> Result<Json<GameSummary>, (StatusCode, Json<ErrorResponse>)> {
    match state.service.registry().snapshot(&code).await {
        Ok(snapshot) => Ok(Json(snapshot.summary())),
        Err(e) => {
            tracing::debug!(
                request_id = %request_id.as_str(),
                code = %code,
                "Game lookup failed: {}",
                e
            );
            Err((status_for(e.kind()), Json(ErrorResponse::from(e))))
        }
    }
}
