//! Room store error types.

use thiserror::Error;

use crate::game::entities::RoomId;

/// Room store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Room not found
    #[error("Room not found: {0}")]
    RoomNotFound(RoomId),

    /// Room already exists
    #[error("Room already exists: {0}")]
    RoomExists(RoomId),

    /// Someone else committed first
    #[error("Room {room_id} changed concurrently: expected version {expected}, found {actual}")]
    Conflict {
        room_id: RoomId,
        expected: u64,
        actual: u64,
    },

    /// Backend unavailable
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
