//! Bounded log of completed actions and penalties.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

use super::{action::ActionKind, card::Card, player::PlayerId};

/// Events that occur during gameplay
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameEvent {
    GameStarted,
    ActionApplied {
        player_id: PlayerId,
        action_id: String,
        kind: ActionKind,
        card: Option<Card>,
    },
    Penalty {
        player_id: PlayerId,
        count: u32,
    },
    GameEnded {
        winner_id: PlayerId,
    },
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct LoggedEvent {
    #[serde(flatten)]
    pub event: GameEvent,
    pub timestamp: DateTime<Utc>,
}

/// Keeps the newest `capacity` events, evicting the oldest.
#[derive(Clone, Debug, Serialize)]
#[serde(transparent)]
pub struct EventLog {
    #[serde(skip)]
    capacity: usize,
    events: VecDeque<LoggedEvent>,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            events: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, event: GameEvent) {
        if self.capacity == 0 {
            return;
        }
        while self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(LoggedEvent {
            event,
            timestamp: Utc::now(),
        });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoggedEvent> {
        self.events.iter()
    }

    pub fn last(&self) -> Option<&GameEvent> {
        self.events.back().map(|logged| &logged.event)
    }
}
