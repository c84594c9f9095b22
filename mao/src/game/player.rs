use serde::{Deserialize, Serialize};
use std::{borrow::Borrow, fmt};

use super::{
    card::Card,
    errors::{GameError, GameResult},
};

pub const MAX_PLAYER_NAME_LENGTH: usize = 32;

/// Type alias for seat positions; seat 0 is always the admin.
pub type SeatIndex = usize;

/// Player identity within a game. Derived from the display name the
/// player joined with, so two players can't share a name.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(name: &str) -> GameResult<Self> {
        let mut id: String = name
            .trim()
            .chars()
            .map(|c| if c.is_ascii_whitespace() { '_' } else { c })
            .collect();
        if id.is_empty() {
            return Err(GameError::EmptyPlayerName);
        }
        if let Some((idx, _)) = id.char_indices().nth(MAX_PLAYER_NAME_LENGTH) {
            id.truncate(idx);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Borrow<str> for PlayerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub seat: SeatIndex,
    pub is_admin: bool,
    pub hand: Vec<Card>,
}

impl Player {
    pub fn new(id: PlayerId, name: &str, seat: SeatIndex, is_admin: bool) -> Self {
        Self {
            id,
            name: name.trim().to_string(),
            seat,
            is_admin,
            hand: Vec::new(),
        }
    }

    /// Remove one card equal to `card`. Returns `false` if the hand
    /// doesn't hold one.
    pub fn remove_card(&mut self, card: &Card) -> bool {
        match self.hand.iter().position(|c| c == card) {
            Some(idx) => {
                self.hand.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn holds(&self, card: &Card) -> bool {
        self.hand.contains(card)
    }
}
