//! Events produced while resolving room operations.

use serde::Serialize;
use std::fmt;

use super::{
    entities::{Card, Chips, HandId, PlayerId, UserId},
    payout::HandResult,
};

/// Events that occur during gameplay. Each one is pushed to the room's
/// viewers under [`GameEvent::name`] with the variant's fields as payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum GameEvent {
    PlayerJoined {
        player_id: PlayerId,
        user_id: UserId,
    },
    PlayerLeft {
        player_id: PlayerId,
        user_id: UserId,
    },
    StageChanged {
        stage: &'static str,
    },
    BetPlaced {
        player_id: PlayerId,
        amount: Chips,
    },
    CardsDealt {
        hands: Vec<HandId>,
    },
    HandSplit {
        player_id: PlayerId,
        hand_id: HandId,
    },
    TurnChanged {
        player_id: PlayerId,
        turn_index: usize,
    },
    RoundSettled {
        dealer_hand: Vec<Card>,
        results: Vec<HandResult>,
    },
    RoomClosed {
        reason: String,
    },
}

impl GameEvent {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PlayerJoined { .. } => "player_joined",
            Self::PlayerLeft { .. } => "player_left",
            Self::StageChanged { .. } => "stage_changed",
            Self::BetPlaced { .. } => "bet_placed",
            Self::CardsDealt { .. } => "cards_dealt",
            Self::HandSplit { .. } => "hand_split",
            Self::TurnChanged { .. } => "turn_changed",
            Self::RoundSettled { .. } => "round_settled",
            Self::RoomClosed { .. } => "room_closed",
        }
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::PlayerJoined { user_id, .. } => format!("user {user_id} joined"),
            Self::PlayerLeft { user_id, .. } => format!("user {user_id} left"),
            Self::StageChanged { stage } => format!("stage is now {stage}"),
            Self::BetPlaced { player_id, amount } => format!("{player_id} bet {amount}"),
            Self::CardsDealt { hands } => format!("dealt {} hand(s)", hands.len()),
            Self::HandSplit { player_id, .. } => format!("{player_id} split"),
            Self::TurnChanged {
                player_id,
                turn_index,
            } => format!("turn {turn_index} goes to {player_id}"),
            Self::RoundSettled { results, .. } => {
                let paid: Chips = results.iter().map(|r| r.payout).sum();
                format!("round settled, {} hand(s) paid {paid}", results.len())
            }
            Self::RoomClosed { reason } => format!("room closed: {reason}"),
        };
        write!(f, "{repr}")
    }
}
