//! Registry of running games keyed by session code.

use rand::Rng;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

use super::{
    actor::{GameActor, GameHandle},
    config::GameConfig,
};
use crate::game::{Game, GameCode, GameError, GameResult, GameSnapshot, PlayerId};

/// Upper bound on code generation retries before giving up.
pub const MAX_CODE_ATTEMPTS: usize = 64;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Registry for spawning and locating game actors
#[derive(Clone)]
pub struct GameRegistry {
    config: Arc<GameConfig>,

    /// Active game handles
    games: Arc<RwLock<HashMap<GameCode, GameHandle>>>,
}

impl GameRegistry {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config: Arc::new(config),
            games: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Create a game with `admin_name` as its admin and spawn its actor.
    ///
    /// The code is generated and inserted under one write guard, so two
    /// concurrent creators never receive the same code.
    pub async fn create_game(&self, admin_name: &str) -> GameResult<GameSnapshot> {
        let admin_id = PlayerId::new(admin_name)?;

        let handle = {
            let mut games = self.games.write().await;
            let code = self.generate_code(|code| games.contains_key(code))?;

            let game = Game::new(code.clone(), admin_id, admin_name, &self.config);
            let handle = GameActor::spawn(game, self.config.inbox_capacity);
            games.insert(code, handle.clone());
            handle
        };

        log::info!("Created game {} for admin '{}'", handle.code(), admin_name.trim());
        handle.snapshot().await
    }

    /// Add a player to a waiting game.
    pub async fn join_game(&self, code: &str, name: &str) -> GameResult<GameSnapshot> {
        let player_id = PlayerId::new(name)?;
        let handle = self.get_game(code).await?;
        handle.join(player_id, name.to_string()).await
    }

    /// Look up a running game. Codes are matched case-insensitively.
    pub async fn get_game(&self, code: &str) -> GameResult<GameHandle> {
        let code = GameCode::new(code);
        let games = self.games.read().await;
        games
            .get(&code)
            .cloned()
            .ok_or_else(|| GameError::GameNotFound(code.to_string()))
    }

    pub async fn snapshot(&self, code: &str) -> GameResult<GameSnapshot> {
        self.get_game(code).await?.snapshot().await
    }

    pub async fn game_count(&self) -> usize {
        self.games.read().await.len()
    }

    fn generate_code(&self, taken: impl Fn(&GameCode) -> bool) -> GameResult<GameCode> {
        let mut rng = rand::rng();
        for _ in 0..MAX_CODE_ATTEMPTS {
            let raw: String = (0..self.config.code_length)
                .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
                .collect();
            let code = GameCode::new(&raw);
            if !taken(&code) {
                return Ok(code);
            }
        }
        Err(GameError::CodeSpaceExhausted)
    }
}
