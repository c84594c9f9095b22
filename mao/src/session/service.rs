//! Command execution on behalf of a connection.

use std::fmt;

use super::{
    actor::GameHandle,
    directory::{Binding, Connection, SessionDirectory},
    registry::GameRegistry,
};
use crate::game::{
    GameCode, GameError, GameResult, GameSnapshot, PlayerId, Proposal, Resolution,
};

/// A client request. Only create and join name an identity explicitly;
/// in-game commands act as the player the connection is bound to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    CreateGame { admin_name: String },
    JoinGame { game_id: String, name: String },
    Game(GameCommand),
}

/// A command addressed to the game a connection is bound to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameCommand {
    Start,
    Propose {
        proposal: Proposal,
    },
    Accept,
    Challenge,
    Resolve {
        resolution: Resolution,
        penalty_count: u32,
    },
    Penalize {
        target: PlayerId,
        count: u32,
    },
}

impl Command {
    pub fn label(&self) -> &'static str {
        match self {
            Self::CreateGame { .. } => "create_game",
            Self::JoinGame { .. } => "join_game",
            Self::Game(GameCommand::Start) => "start_game",
            Self::Game(GameCommand::Propose { .. }) => "propose_action",
            Self::Game(GameCommand::Accept) => "accept_action",
            Self::Game(GameCommand::Challenge) => "challenge_action",
            Self::Game(GameCommand::Resolve { .. }) => "resolve_action",
            Self::Game(GameCommand::Penalize { .. }) => "apply_penalty",
        }
    }
}

impl From<GameCommand> for Command {
    fn from(command: GameCommand) -> Self {
        Self::Game(command)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ties the registry and the directory together: runs a command on the
/// right game, keeps the connection's binding current, and broadcasts the
/// resulting state. Failed commands broadcast nothing.
#[derive(Clone)]
pub struct GameService {
    registry: GameRegistry,
    directory: SessionDirectory,
}

impl GameService {
    pub fn new(registry: GameRegistry, directory: SessionDirectory) -> Self {
        Self {
            registry,
            directory,
        }
    }

    pub fn registry(&self) -> &GameRegistry {
        &self.registry
    }

    pub fn directory(&self) -> &SessionDirectory {
        &self.directory
    }

    /// Execute `command` for `connection`.
    ///
    /// `claimed_game` is the game id a client may repeat on in-game
    /// messages; if present it must match the binding.
    pub async fn execute(
        &self,
        connection: &Connection,
        command: Command,
        claimed_game: Option<&str>,
    ) -> GameResult<GameSnapshot> {
        let snapshot = match command {
            Command::CreateGame { admin_name } => {
                let snapshot = self.registry.create_game(&admin_name).await?;
                self.directory
                    .bind(connection, snapshot.id.clone(), snapshot.admin_id.clone())
                    .await;
                snapshot
            }
            Command::JoinGame { game_id, name } => {
                let player_id = PlayerId::new(&name)?;
                let snapshot = self.registry.join_game(&game_id, &name).await?;
                self.directory
                    .bind(connection, snapshot.id.clone(), player_id)
                    .await;
                snapshot
            }
            Command::Game(command) => {
                let (handle, binding) = self.bound_game(connection, claimed_game).await?;
                let player = binding.player_id;
                match command {
                    GameCommand::Start => handle.start(player).await?,
                    GameCommand::Propose { proposal } => handle.propose(player, proposal).await?,
                    GameCommand::Accept => handle.accept(player).await?,
                    GameCommand::Challenge => handle.challenge(player).await?,
                    GameCommand::Resolve {
                        resolution,
                        penalty_count,
                    } => handle.resolve(player, resolution, penalty_count).await?,
                    GameCommand::Penalize { target, count } => {
                        handle.penalize(player, target, count).await?
                    }
                }
            }
        };

        self.directory.broadcast_state(&snapshot).await;
        Ok(snapshot)
    }

    async fn bound_game(
        &self,
        connection: &Connection,
        claimed_game: Option<&str>,
    ) -> GameResult<(GameHandle, Binding)> {
        let binding = self
            .directory
            .binding(connection.id)
            .await
            .ok_or(GameError::ConnectionNotBound)?;

        if let Some(claimed) = claimed_game
            && GameCode::new(claimed) != binding.game_id
        {
            return Err(GameError::WrongGame(binding.game_id.to_string()));
        }

        let handle = self.registry.get_game(binding.game_id.as_str()).await?;
        Ok((handle, binding))
    }
}
