//! Round stages and the serialized game state.
//!
//! A room is always in exactly one [`Stage`]. Each variant carries what is
//! needed to resume it from the stored blob, since no process keeps a room
//! in memory between requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{
    action::ActionKind,
    entities::{Card, Chips, HandId, PlayerId},
    errors::GameResult,
};

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Stage {
    /// Room created, game not started.
    #[default]
    Init,
    /// Deck being prepared.
    Setup,
    Betting {
        deadline: DateTime<Utc>,
        bets: BTreeMap<PlayerId, Chips>,
    },
    /// Cards being dealt.
    Dealing,
    PlayerAction {
        deadline: DateTime<Utc>,
        /// Index into the active players, in join order.
        turn_index: usize,
    },
    FinishRound,
    Teardown,
}

impl Stage {
    pub const fn name(&self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::Setup => "setup",
            Stage::Betting { .. } => "betting",
            Stage::Dealing => "dealing",
            Stage::PlayerAction { .. } => "player_action",
            Stage::FinishRound => "finish_round",
            Stage::Teardown => "teardown",
        }
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        match self {
            Stage::Betting { deadline, .. } | Stage::PlayerAction { deadline, .. } => {
                Some(*deadline)
            }
            _ => None,
        }
    }

    pub fn deadline_passed(&self, now: DateTime<Utc>) -> bool {
        self.deadline().is_some_and(|deadline| now >= deadline)
    }
}

/// Whether `action` may be taken while the room is in `stage`.
pub fn is_action_valid(action: ActionKind, stage: &Stage) -> bool {
    match action {
        ActionKind::Bet => matches!(stage, Stage::Betting { .. }),
        ActionKind::Hit
        | ActionKind::Stand
        | ActionKind::Double
        | ActionKind::Split
        | ActionKind::Surrender => matches!(stage, Stage::PlayerAction { .. }),
        ActionKind::HurryUp => {
            matches!(stage, Stage::Betting { .. } | Stage::PlayerAction { .. })
        }
    }
}

/// The shared state of a room's round, stored as JSON on the room record.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub current_stage: Stage,
    /// The second card stays hidden from viewers until `FinishRound`.
    #[serde(default)]
    pub dealer_hand: Vec<Card>,
    #[serde(default)]
    pub hands: BTreeMap<HandId, Vec<Card>>,
    /// Hands that can take no more actions this round.
    #[serde(default)]
    pub finished_hands: BTreeSet<HandId>,
}

impl GameState {
    pub fn from_blob(blob: &str) -> GameResult<Self> {
        Ok(serde_json::from_str(blob)?)
    }

    pub fn to_blob(&self) -> GameResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn hand_cards(&self, hand: HandId) -> &[Card] {
        self.hands.get(&hand).map_or(&[], Vec::as_slice)
    }

    pub fn is_finished(&self, hand: HandId) -> bool {
        self.finished_hands.contains(&hand)
    }

    /// Drop all round data, keeping the stage.
    pub fn clear_round(&mut self) {
        self.dealer_hand.clear();
        self.hands.clear();
        self.finished_hands.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{Rank, Suit};
    use chrono::TimeZone;
    use uuid::Uuid;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    // === Action Validity Tests ===

    #[test]
    fn test_bet_only_while_betting() {
        let betting = Stage::Betting {
            deadline: at(0),
            bets: BTreeMap::new(),
        };
        let acting = Stage::PlayerAction {
            deadline: at(0),
            turn_index: 0,
        };
        assert!(is_action_valid(ActionKind::Bet, &betting));
        assert!(!is_action_valid(ActionKind::Bet, &acting));
        assert!(!is_action_valid(ActionKind::Bet, &Stage::Init));
    }

    #[test]
    fn test_play_actions_only_during_player_action() {
        let acting = Stage::PlayerAction {
            deadline: at(0),
            turn_index: 0,
        };
        for kind in [
            ActionKind::Hit,
            ActionKind::Stand,
            ActionKind::Double,
            ActionKind::Split,
            ActionKind::Surrender,
        ] {
            assert!(is_action_valid(kind, &acting));
            assert!(!is_action_valid(kind, &Stage::FinishRound));
            assert!(!is_action_valid(kind, &Stage::Dealing));
        }
    }

    #[test]
    fn test_hurry_up_in_timed_stages() {
        let betting = Stage::Betting {
            deadline: at(0),
            bets: BTreeMap::new(),
        };
        assert!(is_action_valid(ActionKind::HurryUp, &betting));
        for stage in [
            Stage::Init,
            Stage::Setup,
            Stage::Dealing,
            Stage::FinishRound,
            Stage::Teardown,
        ] {
            assert!(!is_action_valid(ActionKind::HurryUp, &stage));
        }
    }

    // === Deadline Tests ===

    #[test]
    fn test_deadline_passed() {
        let stage = Stage::PlayerAction {
            deadline: at(10),
            turn_index: 0,
        };
        assert!(!stage.deadline_passed(at(9)));
        assert!(stage.deadline_passed(at(10)));
        assert!(!Stage::Init.deadline_passed(at(100)));
    }

    // === Serialization Tests ===

    #[test]
    fn test_blob_shape() {
        let player = Uuid::new_v4();
        let state = GameState {
            current_stage: Stage::Betting {
                deadline: at(0),
                bets: BTreeMap::from([(player, 50)]),
            },
            dealer_hand: vec![Card::new(Rank::Ace, Suit::Spades)],
            ..GameState::default()
        };

        let json: serde_json::Value = serde_json::from_str(&state.to_blob().unwrap()).unwrap();
        assert_eq!(json["currentStage"]["stage"], "betting");
        assert_eq!(json["currentStage"]["bets"][player.to_string()], 50);
        assert_eq!(json["dealerHand"][0]["value"], "ACE");

        let acting = serde_json::to_value(Stage::PlayerAction {
            deadline: at(0),
            turn_index: 2,
        })
        .unwrap();
        assert_eq!(acting["stage"], "player_action");
        assert_eq!(acting["turnIndex"], 2);
    }

    #[test]
    fn test_minimal_blob_loads() {
        let state = GameState::from_blob(r#"{"currentStage":{"stage":"init"}}"#).unwrap();
        assert_eq!(state.current_stage, Stage::Init);
        assert!(state.dealer_hand.is_empty());
    }

    #[test]
    fn test_corrupt_blob() {
        assert!(GameState::from_blob("{not json").is_err());
    }
}
