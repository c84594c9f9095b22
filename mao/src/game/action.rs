//! Proposed moves and the votes cast on them.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt, str::FromStr};
use uuid::Uuid;

use super::{
    card::Card,
    errors::{GameError, GameResult},
    player::PlayerId,
};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    PlayCard,
    Draw,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::PlayCard => "PLAY_CARD",
            Self::Draw => "DRAW",
        };
        write!(f, "{repr}")
    }
}

/// The admin's ruling on a pending action.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Resolution {
    /// Apply the action; every challenger draws one penalty card.
    Accept,
    /// Apply the action; the proposer still draws the penalty.
    AcceptWithPenalty,
    /// Don't apply the action; the proposer draws the penalty.
    Reject,
}

impl Resolution {
    pub fn applies_effect(&self) -> bool {
        matches!(self, Self::Accept | Self::AcceptWithPenalty)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Accept => "ACCEPT",
            Self::AcceptWithPenalty => "ACCEPT_WITH_PENALTY",
            Self::Reject => "REJECT",
        };
        write!(f, "{repr}")
    }
}

impl FromStr for Resolution {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACCEPT" => Ok(Self::Accept),
            "ACCEPT_WITH_PENALTY" => Ok(Self::AcceptWithPenalty),
            "REJECT" => Ok(Self::Reject),
            other => Err(GameError::UnsupportedResolution(other.to_string())),
        }
    }
}

/// What the proposer wants to do. A card is present exactly when the
/// proposal is a play.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum Proposal {
    PlayCard(Card),
    Draw,
}

impl Proposal {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::PlayCard(_) => ActionKind::PlayCard,
            Self::Draw => ActionKind::Draw,
        }
    }

    pub fn card(&self) -> Option<Card> {
        match self {
            Self::PlayCard(card) => Some(*card),
            Self::Draw => None,
        }
    }
}

/// Accept and challenge votes. A voter sits in at most one of the two sets.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct VoteSet {
    accepted_by: BTreeSet<PlayerId>,
    challenged_by: BTreeSet<PlayerId>,
}

impl VoteSet {
    /// Record an accept vote. Returns `false` if the voter had already
    /// accepted.
    pub fn accept(&mut self, voter: &PlayerId) -> GameResult<bool> {
        if self.challenged_by.contains(voter) {
            return Err(GameError::AlreadyChallenged);
        }
        Ok(self.accepted_by.insert(voter.clone()))
    }

    /// Record a challenge vote. Returns `false` if the voter had already
    /// challenged.
    pub fn challenge(&mut self, voter: &PlayerId) -> GameResult<bool> {
        if self.accepted_by.contains(voter) {
            return Err(GameError::AlreadyAccepted);
        }
        Ok(self.challenged_by.insert(voter.clone()))
    }

    pub fn accepted_by(&self) -> &BTreeSet<PlayerId> {
        &self.accepted_by
    }

    pub fn challenged_by(&self) -> &BTreeSet<PlayerId> {
        &self.challenged_by
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ResolutionRecord {
    pub resolution: Resolution,
    pub resolved_by: PlayerId,
}

/// One proposed move awaiting the admin's ruling.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Action {
    pub id: String,
    pub proposer_id: PlayerId,
    pub proposal: Proposal,
    votes: VoteSet,
    resolution: Option<ResolutionRecord>,
}

impl Action {
    pub fn new(proposer_id: PlayerId, proposal: Proposal) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            proposer_id,
            proposal,
            votes: VoteSet::default(),
            resolution: None,
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.proposal.kind()
    }

    pub fn card(&self) -> Option<Card> {
        self.proposal.card()
    }

    pub fn votes(&self) -> &VoteSet {
        &self.votes
    }

    pub fn accept(&mut self, voter: &PlayerId) -> GameResult<bool> {
        if *voter == self.proposer_id {
            return Err(GameError::CannotVoteOnOwnAction);
        }
        self.votes.accept(voter)
    }

    pub fn challenge(&mut self, voter: &PlayerId) -> GameResult<bool> {
        if *voter == self.proposer_id {
            return Err(GameError::CannotVoteOnOwnAction);
        }
        self.votes.challenge(voter)
    }

    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }

    pub fn resolution(&self) -> Option<&ResolutionRecord> {
        self.resolution.as_ref()
    }

    /// Record the ruling. A ruling is permanent.
    pub fn finalize(&mut self, resolution: Resolution, resolved_by: PlayerId) -> GameResult<()> {
        if self.resolution.is_some() {
            return Err(GameError::ActionAlreadyResolved);
        }
        self.resolution = Some(ResolutionRecord {
            resolution,
            resolved_by,
        });
        Ok(())
    }
}
