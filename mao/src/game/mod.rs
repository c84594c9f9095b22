//! Mao game engine: cards, actions, and the game state machine.
//!
//! This module provides:
//! - Card and action value types with parse-boundary validation
//! - The [`Game`] aggregate and its `WAITING → ACTIVE → ENDED` lifecycle
//! - A bounded event log of applied actions and penalties
//! - Snapshots and per-player views computed outside the game

pub mod action;
pub mod card;
pub mod errors;
pub mod events;
pub mod player;
pub mod state_machine;
pub mod view;

pub use action::{Action, ActionKind, Proposal, Resolution, VoteSet};
pub use card::{Card, Rank, Suit};
pub use errors::{ErrorKind, GameError, GameResult};
pub use events::{EventLog, GameEvent, LoggedEvent};
pub use player::{Player, PlayerId, SeatIndex};
pub use state_machine::{Game, GameCode, GameStatus};
pub use view::{ActionView, GameSnapshot, GameSummary, PlayerView, SeatView};
