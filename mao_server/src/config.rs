//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use mao::GameConfig;
use std::net::SocketAddr;

/// Default server bind address
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Prometheus exporter address; metrics are disabled when absent
    pub metrics_bind: Option<SocketAddr>,
    /// Game defaults applied to every session
    pub game: GameConfig,
    /// WebSocket message limits
    pub ws_limits: WsLimits,
}

/// Per-connection WebSocket message limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WsLimits {
    /// Messages allowed per second
    pub burst: usize,
    /// Messages allowed per minute
    pub sustained: usize,
}

impl Default for WsLimits {
    fn default() -> Self {
        Self {
            burst: 10,
            sustained: 100,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but can't be parsed
    pub fn from_env(bind_override: Option<SocketAddr>) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env("SERVER_BIND")?.unwrap_or(default_bind()),
        };
        let metrics_bind = parse_env("METRICS_BIND")?;

        let defaults = GameConfig::default();
        let game = GameConfig {
            starting_hand_size: parse_env_or("STARTING_HAND_SIZE", defaults.starting_hand_size)?,
            recent_event_capacity: parse_env_or(
                "RECENT_EVENT_CAPACITY",
                defaults.recent_event_capacity,
            )?,
            code_length: parse_env_or("GAME_CODE_LENGTH", defaults.code_length)?,
            inbox_capacity: parse_env_or("GAME_INBOX_CAPACITY", defaults.inbox_capacity)?,
            outbox_capacity: parse_env_or(
                "CONNECTION_OUTBOX_CAPACITY",
                defaults.outbox_capacity,
            )?,
            max_penalty: parse_env_or("MAX_PENALTY", defaults.max_penalty)?,
        };

        let limits = WsLimits::default();
        let ws_limits = WsLimits {
            burst: parse_env_or("WS_BURST_LIMIT", limits.burst)?,
            sustained: parse_env_or("WS_SUSTAINED_LIMIT", limits.sustained)?,
        };

        Ok(ServerConfig {
            bind,
            metrics_bind,
            game,
            ws_limits,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.game.validate().map_err(|e| ConfigError::Invalid {
            var: "game".to_string(),
            reason: e.to_string(),
        })?;

        if self.ws_limits.burst == 0 {
            return Err(ConfigError::Invalid {
                var: "WS_BURST_LIMIT".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.ws_limits.sustained < self.ws_limits.burst {
            return Err(ConfigError::Invalid {
                var: "WS_SUSTAINED_LIMIT".to_string(),
                reason: format!(
                    "Must be at least the burst limit ({})",
                    self.ws_limits.burst
                ),
            });
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: "Must differ from SERVER_BIND".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            metrics_bind: None,
            game: GameConfig::default(),
            ws_limits: WsLimits::default(),
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

/// Parse an optional environment variable. An unset or empty variable is
/// `None`; a value that fails to parse is an error.
fn parse_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => {
            value
                .trim()
                .parse()
                .map(Some)
                .map_err(|e: T::Err| ConfigError::Invalid {
                    var: key.to_string(),
                    reason: e.to_string(),
                })
        }
        _ => Ok(None),
    }
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_env(key)?.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 10] = [
        "SERVER_BIND",
        "METRICS_BIND",
        "STARTING_HAND_SIZE",
        "RECENT_EVENT_CAPACITY",
        "GAME_CODE_LENGTH",
        "GAME_INBOX_CAPACITY",
        "CONNECTION_OUTBOX_CAPACITY",
        "MAX_PENALTY",
        "WS_BURST_LIMIT",
        "WS_SUSTAINED_LIMIT",
    ];

    fn clear_env() {
        for var in VARS {
            // SAFETY: tests touching the environment run serially.
            unsafe { std::env::remove_var(var) };
        }
    }

    fn set_env(key: &str, value: &str) {
        // SAFETY: tests touching the environment run serially.
        unsafe { std::env::set_var(key, value) };
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        clear_env();
        let config = ServerConfig::from_env(None).unwrap();
        assert_eq!(config.bind, DEFAULT_BIND.parse().unwrap());
        assert_eq!(config.metrics_bind, None);
        assert_eq!(config.game, GameConfig::default());
        assert_eq!(config.ws_limits, WsLimits::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        set_env("SERVER_BIND", "0.0.0.0:9000");
        set_env("METRICS_BIND", "0.0.0.0:9090");
        set_env("STARTING_HAND_SIZE", "5");
        set_env("GAME_CODE_LENGTH", "6");
        set_env("WS_BURST_LIMIT", "20");
        set_env("WS_SUSTAINED_LIMIT", "200");

        let config = ServerConfig::from_env(None).unwrap();
        assert_eq!(config.bind, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(config.metrics_bind, Some("0.0.0.0:9090".parse().unwrap()));
        assert_eq!(config.game.starting_hand_size, 5);
        assert_eq!(config.game.code_length, 6);
        assert_eq!(config.ws_limits.burst, 20);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_bind_override_wins() {
        clear_env();
        set_env("SERVER_BIND", "0.0.0.0:9000");
        let bind: SocketAddr = "127.0.0.1:7000".parse().unwrap();
        let config = ServerConfig::from_env(Some(bind)).unwrap();
        assert_eq!(config.bind, bind);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_unparseable_value_is_an_error() {
        clear_env();
        set_env("STARTING_HAND_SIZE", "seven");
        let err = ServerConfig::from_env(None).unwrap_err();
        assert!(err.to_string().contains("STARTING_HAND_SIZE"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_max_penalty_from_env() {
        clear_env();
        set_env("MAX_PENALTY", "25");
        let config = ServerConfig::from_env(None).unwrap();
        assert_eq!(config.game.max_penalty, 25);
        assert!(config.validate().is_ok());

        set_env("MAX_PENALTY", "0");
        let config = ServerConfig::from_env(None).unwrap();
        assert!(config.validate().is_err());
        clear_env();
    }

    #[test]
    fn test_config_validation_zero_hand() {
        let mut config = ServerConfig::default();
        config.game.starting_hand_size = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_config_validation_limits() {
        let mut config = ServerConfig::default();
        config.ws_limits = WsLimits {
            burst: 50,
            sustained: 10,
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("WS_SUSTAINED_LIMIT"));
    }
}
