//! Session layer: running games and the connections bound to them.
//!
//! This module implements:
//! - GameActor: async actor that owns a single [`Game`](crate::game::Game)
//! - GameRegistry: code-keyed map of running game actors
//! - SessionDirectory: connection bindings and per-player broadcast
//! - GameService: command execution on behalf of a connection
//!
//! ## Architecture
//!
//! Each game runs in its own Tokio task with a bounded mpsc inbox, so
//! commands for one game are applied strictly one at a time while different
//! games never contend. The actor replies with an immutable snapshot; the
//! directory renders one view per bound connection from that snapshot and
//! pushes it with `try_send`, so a slow client never holds up a game.
//!
//! ## Example
//!
//! ```
//! use mao::session::{Command, Connection, GameConfig, GameRegistry, GameService, SessionDirectory};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let service = GameService::new(GameRegistry::new(GameConfig::default()), SessionDirectory::new());
//! let (connection, mut outbox) = Connection::new(8);
//!
//! let snapshot = service
//!     .execute(&connection, Command::CreateGame { admin_name: "alice".into() }, None)
//!     .await
//!     .unwrap();
//! let view = outbox.recv().await.unwrap();
//! assert_eq!(view.id, snapshot.id);
//! # }
//! ```

pub mod actor;
pub mod config;
pub mod directory;
pub mod messages;
pub mod registry;
pub mod service;

pub use actor::{GameActor, GameHandle};
pub use config::GameConfig;
pub use directory::{Binding, Connection, ConnectionId, SessionDirectory};
pub use messages::GameMessage;
pub use registry::{GameRegistry, MAX_CODE_ATTEMPTS};
pub use service::{Command, GameCommand, GameService};
