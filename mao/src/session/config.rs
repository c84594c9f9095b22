//! Session configuration.

use serde::{Deserialize, Serialize};

use crate::game::{GameError, GameResult};

/// Longest session code the registry will generate.
pub const MAX_CODE_LENGTH: usize = 12;

/// Upper bound for a configured `max_penalty`.
pub const MAX_PENALTY_LIMIT: u32 = 1_000;

/// Settings shared by every game a registry creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Cards dealt to each player when the game starts (default: 7)
    pub starting_hand_size: usize,

    /// Number of recent events kept per game (default: 10)
    pub recent_event_capacity: usize,

    /// Length of generated session codes (default: 4)
    pub code_length: usize,

    /// Bounded inbox size of each game actor
    pub inbox_capacity: usize,

    /// Bounded outbox size of each connection
    pub outbox_capacity: usize,

    /// Most cards a single penalty may deal (default: 10)
    pub max_penalty: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_hand_size: 7,
            recent_event_capacity: 10,
            code_length: 4,
            inbox_capacity: 100,
            outbox_capacity: 32,
            max_penalty: 10,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> GameResult<()> {
        if self.starting_hand_size == 0 {
            return Err(GameError::InvalidConfig(
                "starting hand size must be at least 1".to_string(),
            ));
        }

        if self.code_length == 0 || self.code_length > MAX_CODE_LENGTH {
            return Err(GameError::InvalidConfig(format!(
                "code length must be between 1 and {MAX_CODE_LENGTH}"
            )));
        }

        if self.inbox_capacity == 0 || self.outbox_capacity == 0 {
            return Err(GameError::InvalidConfig(
                "channel capacities must be at least 1".to_string(),
            ));
        }

        if self.max_penalty == 0 || self.max_penalty > MAX_PENALTY_LIMIT {
            return Err(GameError::InvalidConfig(format!(
                "max penalty must be between 1 and {MAX_PENALTY_LIMIT}"
            )));
        }

        Ok(())
    }

    /// Number of distinct session codes.
    pub fn code_space(&self) -> u128 {
        26u128.saturating_pow(self.code_length as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.code_space(), 456_976);
    }

    #[test]
    fn test_invalid_configs() {
        let zero_hand = GameConfig {
            starting_hand_size: 0,
            ..GameConfig::default()
        };
        assert!(zero_hand.validate().is_err());

        let long_code = GameConfig {
            code_length: MAX_CODE_LENGTH + 1,
            ..GameConfig::default()
        };
        assert!(long_code.validate().is_err());

        let no_inbox = GameConfig {
            inbox_capacity: 0,
            ..GameConfig::default()
        };
        assert!(matches!(
            no_inbox.validate(),
            Err(GameError::InvalidConfig(_))
        ));

        for max_penalty in [0, MAX_PENALTY_LIMIT + 1] {
            let config = GameConfig {
                max_penalty,
                ..GameConfig::default()
            };
            assert!(config.validate().is_err(), "max_penalty {max_penalty}");
        }
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: GameConfig = serde_json::from_str(r#"{"starting_hand_size": 3}"#).unwrap();
        assert_eq!(config.starting_hand_size, 3);
        assert_eq!(config.code_length, 4);
    }
}
