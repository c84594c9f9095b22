//! WebSocket handler for live games.
//!
//! A connection starts unbound. `CREATE_GAME` or `JOIN_GAME` binds it to a
//! game and player; every later in-game message acts as that player. After
//! each successful command every connection bound to the game receives its
//! own `GAME_STATE` view. Errors go only to the connection that caused them.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws`
//! 2. Server spawns a send task draining the connection's outbox and replies
//! 3. The receive loop parses, rate limits, and executes client messages
//! 4. On disconnect the send task is stopped and the binding removed
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:8080/ws');
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   if (msg.type === "GAME_STATE") {
//!     render(msg.payload);
//!   } else if (msg.type === "ERROR") {
//!     showError(msg.payload.kind, msg.payload.message);
//!   }
//! };
//!
//! ws.send(JSON.stringify({ type: "CREATE_GAME", name: "alice" }));
//! ws.send(JSON.stringify({ type: "PROPOSE_PLAY", card: { rank: "Q", suit: "hearts" } }));
//! ```

use std::sync::atomic::Ordering;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use mao::{
    Card, Command, Connection, ErrorKind, GameCommand, GameError, GameResult, PlayerId,
    PlayerView, Proposal, Resolution,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::{AppState, rate_limiter::MessageLimiter};
use crate::{logging, metrics};

/// Capacity of the per-connection reply channel (errors and pongs)
const REPLY_CAPACITY: usize = 16;

#[derive(Debug, Deserialize)]
struct WireCard {
    rank: String,
    suit: String,
}

/// Client messages received via WebSocket
///
/// In-game messages may repeat the `gameId` they target; it must match the
/// connection's binding.
#[derive(Debug, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
enum ClientMessage {
    CreateGame {
        name: String,
    },
    JoinGame {
        game_id: String,
        name: String,
    },
    StartGame {
        game_id: Option<String>,
    },
    ProposePlay {
        game_id: Option<String>,
        card: WireCard,
    },
    ProposeDraw {
        game_id: Option<String>,
    },
    AcceptAction {
        game_id: Option<String>,
    },
    ChallengeAction {
        game_id: Option<String>,
    },
    ResolveAction {
        game_id: Option<String>,
        resolution: String,
        #[serde(default)]
        penalty_count: u32,
    },
    AdminPenalize {
        game_id: Option<String>,
        target_player_id: String,
        #[serde(default)]
        penalty_count: u32,
    },
    Ping,
}

impl ClientMessage {
    /// Convert to a core command plus the game id the client claims to act in.
    ///
    /// Returns `Ok(None)` for `PING`.
    fn into_command(self) -> GameResult<Option<(Command, Option<String>)>> {
        let parsed = match self {
            Self::Ping => return Ok(None),
            Self::CreateGame { name } => (Command::CreateGame { admin_name: name }, None),
            Self::JoinGame { game_id, name } => (Command::JoinGame { game_id, name }, None),
            Self::StartGame { game_id } => (GameCommand::Start.into(), game_id),
            Self::ProposePlay { game_id, card } => {
                let card = Card::parse(&card.rank, &card.suit)?;
                let proposal = Proposal::PlayCard(card);
                (GameCommand::Propose { proposal }.into(), game_id)
            }
            Self::ProposeDraw { game_id } => (
                GameCommand::Propose {
                    proposal: Proposal::Draw,
                }
                .into(),
                game_id,
            ),
            Self::AcceptAction { game_id } => (GameCommand::Accept.into(), game_id),
            Self::ChallengeAction { game_id } => (GameCommand::Challenge.into(), game_id),
            Self::ResolveAction {
                game_id,
                resolution,
                penalty_count,
            } => {
                let resolution: Resolution = resolution.parse()?;
                (
                    GameCommand::Resolve {
                        resolution,
                        penalty_count,
                    }
                    .into(),
                    game_id,
                )
            }
            Self::AdminPenalize {
                game_id,
                target_player_id,
                penalty_count,
            } => {
                let target = PlayerId::new(&target_player_id)?;
                (
                    GameCommand::Penalize {
                        target,
                        count: penalty_count,
                    }
                    .into(),
                    game_id,
                )
            }
        };
        Ok(Some(parsed))
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&GameError> for ErrorPayload {
    fn from(error: &GameError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Messages sent to the client
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    GameState(PlayerView),
    Error(ErrorPayload),
    Pong,
}

/// Upgrade an HTTP connection to a game WebSocket.
///
/// No credentials are involved: a connection's identity is whatever player
/// it created or joined a game as.
///
/// # Response
///
/// `101 Switching Protocols` on upgrade. Requests without upgrade headers
/// are rejected by the extractor.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one established WebSocket until either side closes it.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let outbox_capacity = state.service.registry().config().outbox_capacity;
    let (connection, mut outbox) = Connection::new(outbox_capacity);
    let (reply_tx, mut reply_rx) = mpsc::channel::<ServerMessage>(REPLY_CAPACITY);

    let active = state.connections.fetch_add(1, Ordering::Relaxed) + 1;
    metrics::websocket_connections_active(active);
    info!("WebSocket connected: connection={}", connection.id);

    let connection_id = connection.id;
    let send_task = tokio::spawn(async move {
        loop {
            let message = tokio::select! {
                Some(view) = outbox.recv() => ServerMessage::GameState(view),
                Some(reply) = reply_rx.recv() => reply,
                else => break,
            };

            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize server message: {}", e);
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                debug!("Connection {} writer closed", connection_id);
                break;
            }
        }
    });

    let mut limiter = MessageLimiter::new(state.ws_limits);

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                metrics::websocket_messages_received();

                if let Err(exceeded) = limiter.check() {
                    metrics::rate_limit_hits_total(exceeded.label());
                    let retry_after = limiter.retry_after(exceeded);
                    warn!(
                        "{} rate limit exceeded for connection {}",
                        exceeded.label(),
                        connection.id
                    );
                    let reply = ServerMessage::Error(ErrorPayload {
                        kind: ErrorKind::Unavailable,
                        message: format!(
                            "rate limit exceeded, retry in {}ms",
                            retry_after.as_millis()
                        ),
                    });
                    if reply_tx.send(reply).await.is_err() {
                        break;
                    }
                    continue;
                }

                if let Some(reply) = handle_text(&text, &connection, &state).await
                    && reply_tx.send(reply).await.is_err()
                {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                info!("WebSocket closed: connection={}", connection.id);
                break;
            }
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    send_task.abort();

    if let Some(binding) = state.service.directory().unbind(connection.id).await {
        info!(
            "Player {} disconnected from game {}",
            binding.player_id, binding.game_id
        );
    }

    let active = state.connections.fetch_sub(1, Ordering::Relaxed).saturating_sub(1);
    metrics::websocket_connections_active(active);
    info!("WebSocket disconnected: connection={}", connection.id);
}

/// Execute one text frame. Returns the reply meant for this connection
/// only; game state reaches it through the outbox.
async fn handle_text(text: &str, connection: &Connection, state: &AppState) -> Option<ServerMessage> {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            debug!("Failed to parse client message: {}", e);
            return Some(ServerMessage::Error(ErrorPayload {
                kind: ErrorKind::InvalidInput,
                message: format!("invalid message: {e}"),
            }));
        }
    };

    let (command, claimed_game) = match message.into_command() {
        Ok(Some(parsed)) => parsed,
        Ok(None) => return Some(ServerMessage::Pong),
        Err(e) => return Some(ServerMessage::Error(ErrorPayload::from(&e))),
    };

    let label = command.label();
    let service = &state.service;
    let outcome = service
        .execute(connection, command.clone(), claimed_game.as_deref())
        .await;
    metrics::broadcast_drops_total(service.directory().dropped_views());

    let binding = service.directory().binding(connection.id).await;
    let player_id = binding.as_ref().map(|b| &b.player_id);

    match outcome {
        Ok(snapshot) => {
            if matches!(command, Command::CreateGame { .. }) {
                metrics::games_created_total();
            }
            metrics::game_commands_total(label, "ok".to_string());
            logging::log_game_event(label, &snapshot.id, player_id, snapshot.version);
            None
        }
        Err(e) => {
            metrics::game_commands_total(label, e.kind().to_string());
            logging::log_command_rejected(&command, player_id, &e);
            Some(ServerMessage::Error(ErrorPayload::from(&e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mao::{Rank, Suit};

    fn parse(json: &str) -> ClientMessage {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_create_and_join() {
        let (command, claimed) = parse(r#"{"type":"CREATE_GAME","name":"alice"}"#)
            .into_command()
            .unwrap()
            .unwrap();
        assert_eq!(
            command,
            Command::CreateGame {
                admin_name: "alice".to_string()
            }
        );
        assert!(claimed.is_none());

        let (command, _) = parse(r#"{"type":"JOIN_GAME","gameId":"abcd","name":"bob"}"#)
            .into_command()
            .unwrap()
            .unwrap();
        assert_eq!(
            command,
            Command::JoinGame {
                game_id: "abcd".to_string(),
                name: "bob".to_string()
            }
        );
    }

    #[test]
    fn test_parse_propose_play_with_game_id() {
        let (command, claimed) = parse(
            r#"{"type":"PROPOSE_PLAY","gameId":"ABCD","card":{"rank":"10","suit":"spades"}}"#,
        )
        .into_command()
        .unwrap()
        .unwrap();
        assert_eq!(
            command,
            Command::Game(GameCommand::Propose {
                proposal: Proposal::PlayCard(Card::new(Rank::Ten, Suit::Spades))
            })
        );
        assert_eq!(claimed.as_deref(), Some("ABCD"));
    }

    #[test]
    fn test_parse_bad_card_is_invalid_input() {
        let err = parse(r#"{"type":"PROPOSE_PLAY","card":{"rank":"1","suit":"spades"}}"#)
            .into_command()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_parse_resolve_defaults_penalty_to_zero() {
        let (command, _) = parse(r#"{"type":"RESOLVE_ACTION","resolution":"REJECT"}"#)
            .into_command()
            .unwrap()
            .unwrap();
        assert_eq!(
            command,
            Command::Game(GameCommand::Resolve {
                resolution: Resolution::Reject,
                penalty_count: 0
            })
        );

        let err = parse(r#"{"type":"RESOLVE_ACTION","resolution":"MAYBE"}"#)
            .into_command()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_parse_admin_penalize() {
        let (command, _) = parse(
            r#"{"type":"ADMIN_PENALIZE","targetPlayerId":"bob","penaltyCount":2}"#,
        )
        .into_command()
        .unwrap()
        .unwrap();
        assert_eq!(
            command,
            Command::Game(GameCommand::Penalize {
                target: PlayerId::new("bob").unwrap(),
                count: 2
            })
        );
    }

    #[test]
    fn test_ping_has_no_command() {
        assert!(parse(r#"{"type":"PING"}"#).into_command().unwrap().is_none());
    }

    #[test]
    fn test_unknown_type_fails_to_parse() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"FOLD"}"#).is_err());
    }

    #[test]
    fn test_server_message_shapes() {
        let error = ServerMessage::Error(ErrorPayload::from(&GameError::NoPendingAction));
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["type"], "ERROR");
        assert_eq!(json["payload"]["kind"], "INVALID_STATE");
        assert_eq!(json["payload"]["message"], "no pending action");

        let pong = serde_json::to_value(ServerMessage::Pong).unwrap();
        assert_eq!(pong, serde_json::json!({"type": "PONG"}));
    }
}
