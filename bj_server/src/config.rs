//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use blackjack_rooms::GameConfig;
use std::{net::SocketAddr, time::Duration};

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Prometheus scrape address, metrics are off when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Deck endpoint root of a deckofcardsapi-compatible service, e.g.
    /// `https://deckofcardsapi.com/api/deck`; cards are shuffled
    /// in process when unset
    pub deck_api_url: Option<String>,
    /// How often expired stage deadlines are swept
    pub deadline_watch: Duration,
    /// Interval of SSE keep-alive comments
    pub keep_alive: Duration,
    /// Per-viewer event buffer
    pub broadcast_buffer: usize,
    /// Settings for rooms created without explicit values
    pub room_defaults: GameConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `deck_api_override` - Optional deck service URL override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is present but unusable
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        deck_api_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env("SERVER_BIND")?.unwrap_or(DEFAULT_BIND),
        };
        let metrics_bind = parse_env("METRICS_BIND")?;

        let deck_api_url = deck_api_override
            .or_else(|| std::env::var("DECK_API_URL").ok())
            .filter(|url| !url.trim().is_empty());

        let defaults = GameConfig::default();
        let room_defaults = GameConfig {
            starting_balance: parse_env_or("ROOM_STARTING_BALANCE", defaults.starting_balance),
            min_bet: parse_env_or("ROOM_MIN_BET", defaults.min_bet),
            betting_time_limit_secs: parse_env_or(
                "ROOM_BETTING_SECS",
                defaults.betting_time_limit_secs,
            ),
            turn_time_limit_secs: parse_env_or("ROOM_TURN_SECS", defaults.turn_time_limit_secs),
            deck_count: parse_env_or("ROOM_DECK_COUNT", defaults.deck_count),
            dealer_hits_soft_17: parse_env_or(
                "ROOM_DEALER_HITS_SOFT_17",
                defaults.dealer_hits_soft_17,
            ),
        };

        Ok(ServerConfig {
            bind,
            metrics_bind,
            deck_api_url,
            deadline_watch: Duration::from_secs(parse_env_or("DEADLINE_WATCH_SECS", 1)),
            keep_alive: Duration::from_secs(parse_env_or("SSE_KEEP_ALIVE_SECS", 15)),
            broadcast_buffer: parse_env_or("BROADCAST_BUFFER", 64),
            room_defaults,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deadline_watch.is_zero() {
            return Err(ConfigError::Invalid {
                var: "DEADLINE_WATCH_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.keep_alive.is_zero() {
            return Err(ConfigError::Invalid {
                var: "SSE_KEEP_ALIVE_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.broadcast_buffer == 0 {
            return Err(ConfigError::Invalid {
                var: "BROADCAST_BUFFER".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        self.room_defaults
            .validate()
            .map_err(|reason| ConfigError::Invalid {
                var: "ROOM_*".to_string(),
                reason,
            })
    }
}

const DEFAULT_BIND: SocketAddr =
    SocketAddr::V4(std::net::SocketAddrV4::new(std::net::Ipv4Addr::LOCALHOST, 6969));

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parse an optional variable, failing on values that don't parse
fn parse_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().map(Some).map_err(|e: T::Err| ConfigError::Invalid {
            var: key.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(None),
    }
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
