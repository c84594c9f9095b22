//! Game error types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::{card::Card, player::PlayerId, state_machine::GameStatus};

/// Coarse classification of a [`GameError`], surfaced to clients.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed or missing required data
    InvalidInput,
    /// Unknown game, unknown player, or named card absent from a hand
    NotFound,
    /// Operation not legal in the current game or action state
    InvalidState,
    /// Caller lacks the required role
    Forbidden,
    /// Duplicate player or conflicting vote
    Conflict,
    /// The game's actor is no longer running
    Unavailable,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::InvalidInput => "invalid input",
            Self::NotFound => "not found",
            Self::InvalidState => "invalid state",
            Self::Forbidden => "forbidden",
            Self::Conflict => "conflict",
            Self::Unavailable => "unavailable",
        };
        write!(f, "{repr}")
    }
}

/// Errors that can occur during game operations
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum GameError {
    #[error("player name can't be empty")]
    EmptyPlayerName,
    #[error("invalid card: {0}")]
    InvalidCard(String),
    #[error("unsupported resolution '{0}'")]
    UnsupportedResolution(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("penalty of {count} cards exceeds the limit of {max}")]
    PenaltyTooLarge { count: u32, max: u32 },

    #[error("game {0} not found")]
    GameNotFound(String),
    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),
    #[error("card {}/{} is not in {player}'s hand", .card.rank, .card.suit.name())]
    CardNotInHand { player: PlayerId, card: Card },

    #[error("game is {actual}, expected {expected}")]
    WrongStatus {
        expected: GameStatus,
        actual: GameStatus,
    },
    #[error("another action is already pending")]
    ActionPending,
    #[error("no pending action")]
    NoPendingAction,
    #[error("action already resolved")]
    ActionAlreadyResolved,
    #[error("connection isn't bound to a game")]
    ConnectionNotBound,

    #[error("only the admin can {0}")]
    NotAdmin(&'static str),
    #[error("can't vote on your own action")]
    CannotVoteOnOwnAction,
    #[error("connection is bound to game {0}")]
    WrongGame(String),

    #[error("player {0} already in game")]
    PlayerAlreadyExists(PlayerId),
    #[error("already challenged this action")]
    AlreadyChallenged,
    #[error("already accepted this action")]
    AlreadyAccepted,
    #[error("session code space exhausted")]
    CodeSpaceExhausted,

    #[error("game {0} is no longer running")]
    GameUnavailable(String),
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyPlayerName
            | Self::InvalidCard(_)
            | Self::UnsupportedResolution(_)
            | Self::InvalidConfig(_)
            | Self::PenaltyTooLarge { .. } => ErrorKind::InvalidInput,
            Self::GameNotFound(_) | Self::PlayerNotFound(_) | Self::CardNotInHand { .. } => {
                ErrorKind::NotFound
            }
            Self::WrongStatus { .. }
            | Self::ActionPending
            | Self::NoPendingAction
            | Self::ActionAlreadyResolved
            | Self::ConnectionNotBound => ErrorKind::InvalidState,
            Self::NotAdmin(_) | Self::CannotVoteOnOwnAction | Self::WrongGame(_) => {
                ErrorKind::Forbidden
            }
            Self::PlayerAlreadyExists(_)
            | Self::AlreadyChallenged
            | Self::AlreadyAccepted
            | Self::CodeSpaceExhausted => ErrorKind::Conflict,
            Self::GameUnavailable(_) => ErrorKind::Unavailable,
        }
    }
}

/// Result type for game operations
pub type GameResult<T> = Result<T, GameError>;
