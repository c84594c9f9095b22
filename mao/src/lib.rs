//! # Mao
//!
//! A session server core for the card game Mao, where the rules are
//! enforced by the players themselves: anyone may propose a move, the
//! others accept or challenge it, and the game's admin rules on it.
//!
//! ## Architecture
//!
//! - [`game`]: the [`Game`] state machine, its value types, and views
//! - [`session`]: one actor task per game, the registry of running games,
//!   the directory of connections bound to games, and the command service
//!   tying them together
//!
//! ## Example
//!
//! ```
//! use mao::{Game, GameCode, GameConfig, PlayerId, Proposal, Resolution};
//!
//! let config = GameConfig::default();
//! let alice = PlayerId::new("alice").unwrap();
//! let bob = PlayerId::new("bob").unwrap();
//!
//! let mut game = Game::new(GameCode::new("ABCD"), alice.clone(), "alice", &config);
//! game.join(bob.clone(), "bob").unwrap();
//! game.start(&alice).unwrap();
//!
//! game.propose(&bob, Proposal::Draw).unwrap();
//! game.resolve(&alice, Resolution::Accept, 0).unwrap();
//! assert_eq!(game.player(&bob).unwrap().hand.len(), 8);
//! ```

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    Action, ActionKind, Card, ErrorKind, Game, GameCode, GameError, GameResult, GameSnapshot,
    GameStatus, Player, PlayerId, PlayerView, Proposal, Rank, Resolution, Suit,
};

/// Per-game actors, the session registry, and broadcast.
pub mod session;
pub use session::{
    Command, Connection, ConnectionId, GameCommand, GameConfig, GameHandle, GameRegistry,
    GameService, SessionDirectory,
};
