//! Player actions and their payloads.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{
    entities::Chips,
    errors::{GameError, GameResult},
};

/// An action request, tagged by its name: `{"action": "bet", "amount": 50}`.
///
/// `hand` picks one of the player's hands by split order. It may be left
/// out while the player holds a single hand.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Bet {
        amount: Chips,
    },
    Hit {
        #[serde(default)]
        hand: Option<u8>,
    },
    Stand {
        #[serde(default)]
        hand: Option<u8>,
    },
    Double {
        #[serde(default)]
        hand: Option<u8>,
    },
    Split {
        #[serde(default)]
        amount: Option<Chips>,
        #[serde(default)]
        hand: Option<u8>,
    },
    Surrender,
    HurryUp,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Bet,
    Hit,
    Stand,
    Double,
    Split,
    Surrender,
    HurryUp,
}

impl ActionKind {
    pub const ALL: [Self; 7] = [
        Self::Bet,
        Self::Hit,
        Self::Stand,
        Self::Double,
        Self::Split,
        Self::Surrender,
        Self::HurryUp,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Bet => "bet",
            Self::Hit => "hit",
            Self::Stand => "stand",
            Self::Double => "double",
            Self::Split => "split",
            Self::Surrender => "surrender",
            Self::HurryUp => "hurry_up",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Bet { .. } => ActionKind::Bet,
            Self::Hit { .. } => ActionKind::Hit,
            Self::Stand { .. } => ActionKind::Stand,
            Self::Double { .. } => ActionKind::Double,
            Self::Split { .. } => ActionKind::Split,
            Self::Surrender => ActionKind::Surrender,
            Self::HurryUp => ActionKind::HurryUp,
        }
    }

    /// Parse a request body, telling unknown action names apart from
    /// malformed payloads of known ones.
    pub fn from_json(value: serde_json::Value) -> GameResult<Self> {
        let name = value
            .get("action")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| GameError::InvalidPayload("missing action name".to_string()))?;

        if ActionKind::from_name(name).is_none() {
            return Err(GameError::UnsupportedAction(name.to_string()));
        }

        serde_json::from_value(value).map_err(|e| GameError::InvalidPayload(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_bet() {
        let action = Action::from_json(json!({"action": "bet", "amount": 50})).unwrap();
        assert_eq!(action, Action::Bet { amount: 50 });
        assert_eq!(action.kind(), ActionKind::Bet);
    }

    #[test]
    fn test_parse_empty_payloads() {
        assert_eq!(
            Action::from_json(json!({"action": "hit"})).unwrap(),
            Action::Hit { hand: None }
        );
        assert_eq!(
            Action::from_json(json!({"action": "surrender"})).unwrap(),
            Action::Surrender
        );
        assert_eq!(
            Action::from_json(json!({"action": "hurry_up"})).unwrap(),
            Action::HurryUp
        );
    }

    #[test]
    fn test_parse_hand_selector() {
        assert_eq!(
            Action::from_json(json!({"action": "stand", "hand": 1})).unwrap(),
            Action::Stand { hand: Some(1) }
        );
        assert_eq!(
            Action::from_json(json!({"action": "split", "amount": 20})).unwrap(),
            Action::Split {
                amount: Some(20),
                hand: None
            }
        );
    }

    #[test]
    fn test_unknown_action_not_supported() {
        let err = Action::from_json(json!({"action": "insurance"})).unwrap_err();
        assert!(matches!(err, GameError::UnsupportedAction(name) if name == "insurance"));
    }

    #[test]
    fn test_bad_payload() {
        let err = Action::from_json(json!({"action": "bet"})).unwrap_err();
        assert!(matches!(err, GameError::InvalidPayload(_)));

        let err = Action::from_json(json!({"amount": 3})).unwrap_err();
        assert!(matches!(err, GameError::InvalidPayload(_)));
    }
}
