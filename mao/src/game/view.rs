//! Read-only projections of a game.
//!
//! The actor hands out [`GameSnapshot`]s; everything a client sees is
//! computed from a snapshot outside the actor, so rendering views never
//! holds up game mutations.

use serde::Serialize;

use super::{
    action::{Action, ActionKind},
    card::Card,
    events::LoggedEvent,
    player::{Player, PlayerId, SeatIndex},
    state_machine::{GameCode, GameStatus},
};

/// Immutable copy of a game's full state at one version.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GameSnapshot {
    pub id: GameCode,
    pub status: GameStatus,
    pub admin_id: PlayerId,
    pub players: Vec<Player>,
    pub current_action: Option<Action>,
    pub top_card: Option<Card>,
    pub winner_id: Option<PlayerId>,
    pub last_action: Option<Action>,
    pub recent_events: Vec<LoggedEvent>,
    pub version: u64,
}

impl GameSnapshot {
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == *id)
    }

    /// The view sent to one player: public state plus their own hand.
    /// A viewer that isn't seated gets an empty hand.
    pub fn view_for(&self, viewer: &PlayerId) -> PlayerView {
        let hand = self
            .player(viewer)
            .map(|p| p.hand.clone())
            .unwrap_or_default();

        PlayerView {
            id: self.id.clone(),
            status: self.status,
            admin_id: self.admin_id.clone(),
            players: self.players.iter().map(|p| p.id.clone()).collect(),
            seats: self.seats(),
            hand,
            player_id: viewer.clone(),
            current_action: self.current_action.as_ref().map(ActionView::from),
            top_card: self.top_card,
            last_action: self.last_action.as_ref().map(ActionView::from),
            winner_id: self.winner_id.clone(),
            version: self.version,
        }
    }

    /// Public state without any hands.
    pub fn summary(&self) -> GameSummary {
        GameSummary {
            id: self.id.clone(),
            status: self.status,
            admin_id: self.admin_id.clone(),
            seats: self.seats(),
            top_card: self.top_card,
            current_action: self.current_action.as_ref().map(ActionView::from),
            winner_id: self.winner_id.clone(),
            recent_events: self.recent_events.clone(),
            version: self.version,
        }
    }

    fn seats(&self) -> Vec<SeatView> {
        self.players.iter().map(SeatView::from).collect()
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
    pub id: PlayerId,
    pub name: String,
    pub seat: SeatIndex,
    pub is_admin: bool,
    pub hand_size: usize,
}

impl From<&Player> for SeatView {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id.clone(),
            name: player.name.clone(),
            seat: player.seat,
            is_admin: player.is_admin,
            hand_size: player.hand.len(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionView {
    pub id: String,
    pub player_id: PlayerId,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<Card>,
    pub accepted_by: Vec<PlayerId>,
    pub challenged_by: Vec<PlayerId>,
}

impl From<&Action> for ActionView {
    fn from(action: &Action) -> Self {
        Self {
            id: action.id.clone(),
            player_id: action.proposer_id.clone(),
            kind: action.kind(),
            card: action.card(),
            accepted_by: action.votes().accepted_by().iter().cloned().collect(),
            challenged_by: action.votes().challenged_by().iter().cloned().collect(),
        }
    }
}

/// Per-player state pushed to a connection.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: GameCode,
    pub status: GameStatus,
    pub admin_id: PlayerId,
    pub players: Vec<PlayerId>,
    pub seats: Vec<SeatView>,
    pub hand: Vec<Card>,
    pub player_id: PlayerId,
    pub current_action: Option<ActionView>,
    pub top_card: Option<Card>,
    pub last_action: Option<ActionView>,
    pub winner_id: Option<PlayerId>,
    pub version: u64,
}

/// Public game state for inspection routes.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub id: GameCode,
    pub status: GameStatus,
    pub admin_id: PlayerId,
    pub seats: Vec<SeatView>,
    pub top_card: Option<Card>,
    pub current_action: Option<ActionView>,
    pub winner_id: Option<PlayerId>,
    pub recent_events: Vec<LoggedEvent>,
    pub version: u64,
}
