//! Game actor message types.

use tokio::sync::oneshot;

use crate::game::{GameResult, GameSnapshot, PlayerId, Proposal, Resolution};

/// Reply channel carrying the post-operation snapshot.
pub type Reply = oneshot::Sender<GameResult<GameSnapshot>>;

/// Messages that can be sent to a GameActor
#[derive(Debug)]
pub enum GameMessage {
    /// Add a player to a waiting game
    Join {
        player_id: PlayerId,
        name: String,
        response: Reply,
    },

    /// Start the game (admin only)
    Start {
        requester: PlayerId,
        response: Reply,
    },

    /// Propose a play or a draw
    Propose {
        proposer: PlayerId,
        proposal: Proposal,
        response: Reply,
    },

    /// Vote for the pending action
    Accept { voter: PlayerId, response: Reply },

    /// Vote against the pending action
    Challenge { voter: PlayerId, response: Reply },

    /// Rule on the pending action (admin only)
    Resolve {
        arbiter: PlayerId,
        resolution: Resolution,
        penalty_count: u32,
        response: Reply,
    },

    /// Deal penalty cards outside the resolve cycle (admin only)
    Penalize {
        requester: PlayerId,
        target: PlayerId,
        count: u32,
        response: Reply,
    },

    /// Get the current state
    GetSnapshot {
        response: oneshot::Sender<GameSnapshot>,
    },
}

impl GameMessage {
    /// Short name used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Start { .. } => "start",
            Self::Propose { .. } => "propose",
            Self::Accept { .. } => "accept",
            Self::Challenge { .. } => "challenge",
            Self::Resolve { .. } => "resolve",
            Self::Penalize { .. } => "penalize",
            Self::GetSnapshot { .. } => "snapshot",
        }
    }
}
