//! Persisted room records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::entities::{Chips, HandId, PlayerId, RoomId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Moderator,
    Player,
}

impl Role {
    /// Admins and moderators may start the game.
    pub fn can_start(self) -> bool {
        matches!(self, Role::Admin | Role::Moderator)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    Active,
    Inactive,
    Away,
    Left,
}

/// A user's seat in a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomPlayer {
    pub id: PlayerId,
    pub room_id: RoomId,
    pub user_id: UserId,
    pub role: Role,
    pub status: PlayerStatus,
    pub balance: Chips,
    pub joined_at: DateTime<Utc>,
}

/// A wager. The cards of the hand live in the game state blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandRecord {
    pub id: HandId,
    pub player_id: PlayerId,
    /// 0 for the dealt hand, 1 for the hand created by a split
    pub order: u8,
    pub bet: Chips,
}

/// Room record holding the serialized game state and config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub state: String,
    pub config: String,
    pub deck_id: Option<String>,
    /// Optimistic concurrency token, bumped on every commit
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

/// Everything the engine reads and writes for one room, loaded and
/// committed as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub room: Room,
    /// In join order; turn order follows it.
    pub players: Vec<RoomPlayer>,
    pub hands: Vec<HandRecord>,
}

impl RoomSnapshot {
    pub fn player(&self, id: PlayerId) -> Option<&RoomPlayer> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut RoomPlayer> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// The seat a user currently holds, ignoring seats they left.
    pub fn player_by_user(&self, user_id: UserId) -> Option<&RoomPlayer> {
        self.players
            .iter()
            .find(|p| p.user_id == user_id && p.status != PlayerStatus::Left)
    }

    /// Ids of players taking part in the current round, in turn order.
    pub fn active_players(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| p.status == PlayerStatus::Active)
            .map(|p| p.id)
            .collect()
    }

    /// Seats that were dealt into the current round, in turn order. A
    /// player who leaves mid-round keeps their seat here until the round is
    /// settled, so positions never shift under the turn index.
    pub fn turn_order(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| match p.status {
                PlayerStatus::Active => true,
                PlayerStatus::Left => self.hands.iter().any(|h| h.player_id == p.id),
                PlayerStatus::Inactive | PlayerStatus::Away => false,
            })
            .map(|p| p.id)
            .collect()
    }

    /// Number of players still seated in the room.
    pub fn seated_count(&self) -> usize {
        self.players
            .iter()
            .filter(|p| p.status != PlayerStatus::Left)
            .count()
    }

    /// A player's hands ordered by split order.
    pub fn hands_of(&self, player_id: PlayerId) -> Vec<&HandRecord> {
        let mut hands: Vec<_> = self
            .hands
            .iter()
            .filter(|h| h.player_id == player_id)
            .collect();
        hands.sort_by_key(|h| h.order);
        hands
    }

    pub fn hand_mut(&mut self, id: HandId) -> Option<&mut HandRecord> {
        self.hands.iter_mut().find(|h| h.id == id)
    }
}
