//! Mao game state machine.
//!
//! A [`Game`] moves through three statuses and never back:
//!
//! - **Waiting**: players join; the admin starts the game
//! - **Active**: players propose moves, others accept or challenge, the admin
//!   resolves; penalties are dealt
//! - **Ended**: some player emptied their hand; the game is read-only
//!
//! At most one [`Action`] is pending at a time. Every operation validates
//! completely before it mutates anything, so a failed operation leaves the
//! game exactly as it was.

use log::{debug, info};
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{
    action::{Action, Proposal, Resolution},
    card::Card,
    errors::{GameError, GameResult},
    events::{EventLog, GameEvent},
    player::{Player, PlayerId, SeatIndex},
    view::GameSnapshot,
};
use crate::session::GameConfig;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    Waiting,
    Active,
    Ended,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Waiting => "WAITING",
            Self::Active => "ACTIVE",
            Self::Ended => "ENDED",
        };
        write!(f, "{repr}")
    }
}

/// Short session code identifying a game. Codes are upper case.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct GameCode(String);

impl GameCode {
    pub fn new(code: &str) -> Self {
        Self(code.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The aggregate root for one session.
#[derive(Debug)]
pub struct Game {
    id: GameCode,
    status: GameStatus,
    players: Vec<Player>,
    admin_id: PlayerId,
    current_action: Option<Action>,
    top_card: Option<Card>,
    winner_id: Option<PlayerId>,
    last_successful_action: Option<Action>,
    recent_events: EventLog,
    version: u64,
    starting_hand_size: usize,
    max_penalty: u32,
    rng: StdRng,
}

impl Game {
    /// Create a game in the waiting state with the admin in seat 0.
    pub fn new(id: GameCode, admin_id: PlayerId, admin_name: &str, config: &GameConfig) -> Self {
        Self::with_rng(id, admin_id, admin_name, config, StdRng::from_os_rng())
    }

    /// Same as [`Game::new`] with a caller-provided random source.
    pub fn with_rng(
        id: GameCode,
        admin_id: PlayerId,
        admin_name: &str,
        config: &GameConfig,
        rng: StdRng,
    ) -> Self {
        let admin = Player::new(admin_id.clone(), admin_name, 0, true);
        Self {
            id,
            status: GameStatus::Waiting,
            players: vec![admin],
            admin_id,
            current_action: None,
            top_card: None,
            winner_id: None,
            last_successful_action: None,
            recent_events: EventLog::new(config.recent_event_capacity),
            version: 0,
            starting_hand_size: config.starting_hand_size,
            max_penalty: config.max_penalty,
            rng,
        }
    }

    pub fn id(&self) -> &GameCode {
        &self.id
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn admin_id(&self) -> &PlayerId {
        &self.admin_id
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == *id)
    }

    pub fn current_action(&self) -> Option<&Action> {
        self.current_action.as_ref()
    }

    pub fn top_card(&self) -> Option<Card> {
        self.top_card
    }

    pub fn winner_id(&self) -> Option<&PlayerId> {
        self.winner_id.as_ref()
    }

    pub fn last_successful_action(&self) -> Option<&Action> {
        self.last_successful_action.as_ref()
    }

    pub fn recent_events(&self) -> &EventLog {
        &self.recent_events
    }

    /// Incremented by every operation that changes the game.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            id: self.id.clone(),
            status: self.status,
            admin_id: self.admin_id.clone(),
            players: self.players.clone(),
            current_action: self.current_action.clone(),
            top_card: self.top_card,
            winner_id: self.winner_id.clone(),
            last_action: self.last_successful_action.clone(),
            recent_events: self.recent_events.iter().cloned().collect(),
            version: self.version,
        }
    }

    pub fn join(&mut self, id: PlayerId, name: &str) -> GameResult<()> {
        self.ensure_status(GameStatus::Waiting)?;
        if self.player(&id).is_some() {
            return Err(GameError::PlayerAlreadyExists(id));
        }

        let seat = self.players.len();
        debug!("{}: {} joined in seat {}", self.id, id, seat);
        self.players.push(Player::new(id, name, seat, false));
        self.version += 1;
        Ok(())
    }

    pub fn start(&mut self, requester: &PlayerId) -> GameResult<()> {
        self.ensure_status(GameStatus::Waiting)?;
        if *requester != self.admin_id {
            return Err(GameError::NotAdmin("start the game"));
        }

        self.status = GameStatus::Active;
        self.top_card = Some(Card::random(&mut self.rng));
        for player in self.players.iter_mut() {
            for _ in 0..self.starting_hand_size {
                player.hand.push(Card::random(&mut self.rng));
            }
        }
        self.recent_events.push(GameEvent::GameStarted);
        self.version += 1;

        info!(
            "{}: started with {} players",
            self.id,
            self.players.len()
        );
        Ok(())
    }

    /// Install a pending action. The proposer's hand is deliberately not
    /// checked here; a bluffed card is caught when the action is resolved.
    pub fn propose(&mut self, proposer: &PlayerId, proposal: Proposal) -> GameResult<&Action> {
        self.ensure_status(GameStatus::Active)?;
        if self.current_action.is_some() {
            return Err(GameError::ActionPending);
        }
        self.seat_of(proposer)?;

        let action = Action::new(proposer.clone(), proposal);
        debug!(
            "{}: {} proposed {} ({})",
            self.id,
            proposer,
            action.kind(),
            action.id
        );
        self.version += 1;
        Ok(self.current_action.insert(action))
    }

    /// Vote that the pending action is valid. Returns `false` if the vote
    /// was already recorded.
    pub fn accept(&mut self, voter: &PlayerId) -> GameResult<bool> {
        if self.current_action.is_none() {
            return Err(GameError::NoPendingAction);
        }
        self.seat_of(voter)?;

        let action = self
            .current_action
            .as_mut()
            .ok_or(GameError::NoPendingAction)?;
        let changed = action.accept(voter)?;
        if changed {
            self.version += 1;
        }
        Ok(changed)
    }

    /// Vote that the pending action is invalid. Returns `false` if the vote
    /// was already recorded.
    pub fn challenge(&mut self, voter: &PlayerId) -> GameResult<bool> {
        if self.current_action.is_none() {
            return Err(GameError::NoPendingAction);
        }
        self.seat_of(voter)?;

        let action = self
            .current_action
            .as_mut()
            .ok_or(GameError::NoPendingAction)?;
        let changed = action.challenge(voter)?;
        if changed {
            self.version += 1;
        }
        Ok(changed)
    }

    /// Rule on the pending action.
    ///
    /// - `Accept`: the action takes effect and each challenger draws one card
    /// - `AcceptWithPenalty`: the action takes effect and the proposer draws
    ///   `penalty_count` cards
    /// - `Reject`: the proposer keeps their hand and draws `penalty_count`
    ///
    /// The pending action is cleared and a win check runs afterwards.
    pub fn resolve(
        &mut self,
        arbiter: &PlayerId,
        resolution: Resolution,
        penalty_count: u32,
    ) -> GameResult<()> {
        self.ensure_status(GameStatus::Active)?;
        let action = self
            .current_action
            .as_ref()
            .ok_or(GameError::NoPendingAction)?;
        if *arbiter != self.admin_id {
            return Err(GameError::NotAdmin("resolve actions"));
        }
        if action.is_resolved() {
            return Err(GameError::ActionAlreadyResolved);
        }
        self.ensure_penalty_allowed(penalty_count)?;

        let proposer_seat = self.seat_of(&action.proposer_id)?;
        if resolution.applies_effect()
            && let Some(card) = action.card()
            && !self.players[proposer_seat].holds(&card)
        {
            return Err(GameError::CardNotInHand {
                player: action.proposer_id.clone(),
                card,
            });
        }
        let challenger_seats = match resolution {
            Resolution::Accept => action
                .votes()
                .challenged_by()
                .iter()
                .map(|id| self.seat_of(id))
                .collect::<GameResult<Vec<_>>>()?,
            Resolution::AcceptWithPenalty | Resolution::Reject => Vec::new(),
        };

        let mut action = self
            .current_action
            .take()
            .ok_or(GameError::NoPendingAction)?;
        action.finalize(resolution, arbiter.clone())?;

        if resolution.applies_effect() {
            self.apply_effect(proposer_seat, &action);
        }
        match resolution {
            Resolution::Accept => {
                for seat in challenger_seats {
                    self.draw_penalty(seat, 1);
                }
            }
            Resolution::AcceptWithPenalty | Resolution::Reject => {
                self.draw_penalty(proposer_seat, penalty_count);
            }
        }

        debug!(
            "{}: {} resolved {} as {}",
            self.id, arbiter, action.id, resolution
        );
        if resolution.applies_effect() {
            self.last_successful_action = Some(action);
        }
        self.check_for_win();
        self.version += 1;
        Ok(())
    }

    /// Deal `count` extra cards to a player.
    pub fn apply_penalty(&mut self, target: &PlayerId, count: u32) -> GameResult<()> {
        self.ensure_status(GameStatus::Active)?;
        let seat = self.seat_of(target)?;
        self.ensure_penalty_allowed(count)?;
        if count > 0 {
            self.draw_penalty(seat, count);
            self.version += 1;
        }
        Ok(())
    }

    /// Admin-issued penalty outside the propose/resolve cycle.
    pub fn penalize(&mut self, requester: &PlayerId, target: &PlayerId, count: u32) -> GameResult<()> {
        if *requester != self.admin_id {
            return Err(GameError::NotAdmin("hand out penalties"));
        }
        self.apply_penalty(target, count)
    }

    fn ensure_status(&self, expected: GameStatus) -> GameResult<()> {
        if self.status != expected {
            return Err(GameError::WrongStatus {
                expected,
                actual: self.status,
            });
        }
        Ok(())
    }

    fn ensure_penalty_allowed(&self, count: u32) -> GameResult<()> {
        if count > self.max_penalty {
            return Err(GameError::PenaltyTooLarge {
                count,
                max: self.max_penalty,
            });
        }
        Ok(())
    }

    fn seat_of(&self, id: &PlayerId) -> GameResult<SeatIndex> {
        self.players
            .iter()
            .position(|p| p.id == *id)
            .ok_or_else(|| GameError::PlayerNotFound(id.clone()))
    }

    fn apply_effect(&mut self, seat: SeatIndex, action: &Action) {
        match action.proposal {
            Proposal::PlayCard(card) => {
                self.players[seat].remove_card(&card);
                self.top_card = Some(card);
            }
            Proposal::Draw => {
                let card = Card::random(&mut self.rng);
                self.players[seat].hand.push(card);
            }
        }
        self.recent_events.push(GameEvent::ActionApplied {
            player_id: action.proposer_id.clone(),
            action_id: action.id.clone(),
            kind: action.kind(),
            card: action.card(),
        });
    }

    fn draw_penalty(&mut self, seat: SeatIndex, count: u32) {
        if count == 0 {
            return;
        }
        let player = &mut self.players[seat];
        for _ in 0..count {
            player.hand.push(Card::random(&mut self.rng));
        }
        debug!("{}: {} penalized {} card(s)", self.id, player.id, count);
        self.recent_events.push(GameEvent::Penalty {
            player_id: player.id.clone(),
            count,
        });
    }

    /// The first player in seat order with an empty hand wins.
    fn check_for_win(&mut self) {
        let Some(winner) = self.players.iter().find(|p| p.hand.is_empty()) else {
            return;
        };
        let winner_id = winner.id.clone();

        info!("{}: {} wins", self.id, winner_id);
        self.status = GameStatus::Ended;
        self.recent_events.push(GameEvent::GameEnded {
            winner_id: winner_id.clone(),
        });
        self.winner_id = Some(winner_id);
    }
}
