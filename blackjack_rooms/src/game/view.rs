//! What viewers of a room are allowed to see.

use serde::Serialize;

use super::{
    entities::{Card, Chips, HandId, HandValue, PlayerId, RoomId, UserId},
    stage::{GameState, Stage},
};
use crate::store::{PlayerStatus, Role, RoomSnapshot};

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub player_id: PlayerId,
    pub user_id: UserId,
    pub role: Role,
    pub status: PlayerStatus,
    pub balance: Chips,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandView {
    pub hand_id: HandId,
    pub player_id: PlayerId,
    pub order: u8,
    pub bet: Chips,
    pub cards: Vec<Card>,
    pub value: HandValue,
    pub finished: bool,
}

/// A room as broadcast under `game_state`. The dealer's hole card stays
/// hidden until the round is settled.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub room_id: RoomId,
    pub version: u64,
    pub stage: Stage,
    pub dealer_hand: Vec<Card>,
    pub dealer_hidden_cards: usize,
    /// Value of the visible dealer cards
    pub dealer_value: HandValue,
    pub turn_player: Option<PlayerId>,
    pub players: Vec<PlayerView>,
    pub hands: Vec<HandView>,
}

impl GameView {
    #[must_use]
    pub fn new(snapshot: &RoomSnapshot, state: &GameState) -> Self {
        let reveal = matches!(state.current_stage, Stage::FinishRound);
        let dealer_hand: Vec<Card> = if reveal {
            state.dealer_hand.clone()
        } else {
            state.dealer_hand.iter().take(1).cloned().collect()
        };

        let turn_player = match &state.current_stage {
            Stage::PlayerAction { turn_index, .. } => {
                snapshot.turn_order().get(*turn_index).copied()
            }
            _ => None,
        };

        let players = snapshot
            .players
            .iter()
            .filter(|p| p.status != PlayerStatus::Left)
            .map(|p| PlayerView {
                player_id: p.id,
                user_id: p.user_id,
                role: p.role,
                status: p.status,
                balance: p.balance,
            })
            .collect();

        let hands = snapshot
            .hands
            .iter()
            .map(|h| {
                let cards = state.hand_cards(h.id).to_vec();
                HandView {
                    hand_id: h.id,
                    player_id: h.player_id,
                    order: h.order,
                    bet: h.bet,
                    value: HandValue::of(&cards),
                    cards,
                    finished: state.is_finished(h.id),
                }
            })
            .collect();

        Self {
            room_id: snapshot.room.id,
            version: snapshot.room.version,
            stage: state.current_stage.clone(),
            dealer_hidden_cards: state.dealer_hand.len() - dealer_hand.len(),
            dealer_value: HandValue::of(&dealer_hand),
            dealer_hand,
            turn_player,
            players,
            hands,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        game::entities::{Rank, Suit},
        store::{HandRecord, Room, RoomPlayer},
    };
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn snapshot() -> (RoomSnapshot, PlayerId, HandId) {
        let room_id = Uuid::new_v4();
        let player_id = Uuid::new_v4();
        let hand_id = Uuid::new_v4();
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let snapshot = RoomSnapshot {
            room: Room {
                id: room_id,
                state: String::new(),
                config: String::new(),
                deck_id: None,
                version: 3,
                created_at: now,
            },
            players: vec![RoomPlayer {
                id: player_id,
                room_id,
                user_id: 7,
                role: Role::Admin,
                status: PlayerStatus::Active,
                balance: 950,
                joined_at: now,
            }],
            hands: vec![HandRecord {
                id: hand_id,
                player_id,
                order: 0,
                bet: 50,
            }],
        };
        (snapshot, player_id, hand_id)
    }

    fn state(stage: Stage, hand_id: HandId) -> GameState {
        let mut state = GameState {
            current_stage: stage,
            dealer_hand: vec![
                Card::new(Rank::King, Suit::Clubs),
                Card::new(Rank::Seven, Suit::Clubs),
            ],
            ..GameState::default()
        };
        state.hands.insert(
            hand_id,
            vec![
                Card::new(Rank::Ten, Suit::Hearts),
                Card::new(Rank::Nine, Suit::Hearts),
            ],
        );
        state
    }

    #[test]
    fn test_hole_card_hidden_during_play() {
        let (snapshot, player_id, hand_id) = snapshot();
        let stage = Stage::PlayerAction {
            deadline: Utc.timestamp_opt(1_700_000_030, 0).unwrap(),
            turn_index: 0,
        };
        let view = GameView::new(&snapshot, &state(stage, hand_id));

        assert_eq!(view.dealer_hand.len(), 1);
        assert_eq!(view.dealer_hidden_cards, 1);
        assert_eq!(view.dealer_value.total, 10);
        assert_eq!(view.turn_player, Some(player_id));
        assert_eq!(view.hands[0].value.total, 19);
        assert_eq!(view.version, 3);
    }

    #[test]
    fn test_hole_card_revealed_at_settlement() {
        let (snapshot, _, hand_id) = snapshot();
        let view = GameView::new(&snapshot, &state(Stage::FinishRound, hand_id));

        assert_eq!(view.dealer_hand.len(), 2);
        assert_eq!(view.dealer_hidden_cards, 0);
        assert_eq!(view.dealer_value.total, 17);
        assert_eq!(view.turn_player, None);
    }

    #[test]
    fn test_view_json_shape() {
        let (snapshot, _, hand_id) = snapshot();
        let view = GameView::new(&snapshot, &state(Stage::FinishRound, hand_id));
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["stage"]["stage"], "finish_round");
        assert_eq!(json["players"][0]["balance"], 950);
        assert_eq!(json["players"][0]["role"], "admin");
        assert_eq!(json["hands"][0]["bet"], 50);
    }
}
