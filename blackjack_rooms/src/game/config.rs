//! Room game configuration, stored on the room as a JSON blob.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use super::{
    entities::Chips,
    errors::{GameError, GameResult},
};

/// Game configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Chips a player gets when joining the room
    pub starting_balance: Chips,

    /// Smallest accepted bet
    pub min_bet: Chips,

    /// Seconds the betting window stays open
    pub betting_time_limit_secs: u32,

    /// Seconds a player has to act on their turn
    pub turn_time_limit_secs: u32,

    /// Standard decks in the shoe
    pub deck_count: u8,

    /// Dealer draws on a soft 17 instead of standing
    pub dealer_hits_soft_17: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_balance: 1_000,
            min_bet: 10,
            betting_time_limit_secs: 30,
            turn_time_limit_secs: 30,
            deck_count: 6,
            dealer_hits_soft_17: false,
        }
    }
}

impl GameConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.min_bet <= 0 {
            return Err("Minimum bet must be positive".to_string());
        }

        if self.starting_balance < self.min_bet {
            return Err("Starting balance must cover the minimum bet".to_string());
        }

        if self.betting_time_limit_secs == 0 || self.turn_time_limit_secs == 0 {
            return Err("Time limits must be at least one second".to_string());
        }

        if self.deck_count == 0 || self.deck_count > 8 {
            return Err("Deck count must be between 1 and 8".to_string());
        }

        Ok(())
    }

    pub fn betting_window(&self) -> TimeDelta {
        TimeDelta::seconds(i64::from(self.betting_time_limit_secs))
    }

    pub fn turn_window(&self) -> TimeDelta {
        TimeDelta::seconds(i64::from(self.turn_time_limit_secs))
    }

    pub fn from_blob(blob: &str) -> GameResult<Self> {
        Ok(serde_json::from_str(blob)?)
    }

    pub fn to_blob(&self) -> GameResult<String> {
        self.validate().map_err(GameError::InvalidConfig)?;
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_min_bet() {
        let config = GameConfig {
            min_bet: 0,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(matches!(
            config.to_blob(),
            Err(GameError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_balance_below_min_bet() {
        let config = GameConfig {
            starting_balance: 5,
            min_bet: 10,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_blob_uses_defaults() {
        let config = GameConfig::from_blob(r#"{"min_bet": 25}"#).unwrap();
        assert_eq!(config.min_bet, 25);
        assert_eq!(config.starting_balance, 1_000);
    }

    #[test]
    fn test_windows() {
        let config = GameConfig {
            betting_time_limit_secs: 45,
            turn_time_limit_secs: 15,
            ..GameConfig::default()
        };
        assert_eq!(config.betting_window(), TimeDelta::seconds(45));
        assert_eq!(config.turn_window(), TimeDelta::seconds(15));
    }
}
