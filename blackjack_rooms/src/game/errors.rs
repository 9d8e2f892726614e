//! Game error types.

use thiserror::Error;

use super::{
    action::ActionKind,
    entities::{Chips, PlayerId, RoomId, UserId},
};
use crate::{
    deck::DeckError,
    store::StoreError,
};

/// How a caller should treat a [`GameError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request was wrong; nothing was changed.
    ClientFault,
    /// The room, player or hand does not exist.
    NotFound,
    /// The room changed under the request; reload and try again.
    Conflict,
    /// State and stores disagree, or a collaborator failed.
    Fatal,
}

/// Game errors
#[derive(Debug, Error)]
pub enum GameError {
    #[error("{action} is not allowed during {stage}")]
    InvalidStage {
        action: ActionKind,
        stage: &'static str,
    },

    #[error("not your turn")]
    OutOfTurn,

    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: Chips, required: Chips },

    #[error("bet must be at least {min_bet}")]
    BetBelowMinimum { min_bet: Chips },

    #[error("{action} needs exactly two cards, hand has {cards}")]
    WrongCardCount { action: ActionKind, cards: usize },

    #[error("cards of different rank can't be split")]
    NotSplittable,

    #[error("split amount {given} must match the hand's bet of {bet}")]
    SplitAmountMismatch { given: Chips, bet: Chips },

    #[error("hand already split this round")]
    AlreadySplit,

    #[error("can't surrender after splitting")]
    SurrenderAfterSplit,

    #[error("player holds {hands} hands, say which one")]
    HandSelectorRequired { hands: usize },

    #[error("hand already finished")]
    HandFinished,

    #[error("deadline not reached, {remaining_secs}s remaining")]
    DeadlineNotReached { remaining_secs: i64 },

    #[error("action '{0}' is not supported")]
    UnsupportedAction(String),

    #[error("invalid action payload: {0}")]
    InvalidPayload(String),

    #[error("player {0} is not playing in this room")]
    UnknownActor(PlayerId),

    #[error("user {0} is not playing in this room")]
    NotInRoom(UserId),

    #[error("user {0} already joined this room")]
    AlreadyJoined(UserId),

    #[error("game already started")]
    GameAlreadyStarted,

    #[error("only an {required} may do that")]
    Forbidden { required: &'static str },

    #[error("invalid game config: {0}")]
    InvalidConfig(String),

    #[error("room not found: {0}")]
    RoomNotFound(RoomId),

    #[error("no hand with order {order}")]
    HandNotFound { order: u8 },

    #[error("bet recorded for player {0} who is no longer in the room")]
    OrphanedBet(PlayerId),

    #[error("corrupt room state: {0}")]
    CorruptState(#[from] serde_json::Error),

    #[error("deck error: {0}")]
    Deck(#[from] DeckError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::RoomNotFound(_)
            | GameError::HandNotFound { .. }
            | GameError::Store(StoreError::RoomNotFound(_)) => ErrorKind::NotFound,
            GameError::Store(StoreError::Conflict { .. }) => ErrorKind::Conflict,
            GameError::OrphanedBet(_)
            | GameError::CorruptState(_)
            | GameError::Deck(_)
            | GameError::Store(_)
            | GameError::Internal(_) => ErrorKind::Fatal,
            _ => ErrorKind::ClientFault,
        }
    }

    /// Get a client-safe error message that doesn't leak internal detail
    pub fn client_message(&self) -> String {
        match self.kind() {
            ErrorKind::Fatal => "Internal server error".to_string(),
            ErrorKind::Conflict => "Room changed, reload and retry".to_string(),
            ErrorKind::NotFound | ErrorKind::ClientFault => self.to_string(),
        }
    }
}

/// Result type for game operations
pub type GameResult<T> = Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_kinds() {
        assert_eq!(GameError::OutOfTurn.kind(), ErrorKind::ClientFault);
        assert_eq!(
            GameError::RoomNotFound(Uuid::nil()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            GameError::OrphanedBet(Uuid::nil()).kind(),
            ErrorKind::Fatal
        );
        assert_eq!(
            GameError::from(StoreError::Conflict {
                room_id: Uuid::nil(),
                expected: 1,
                actual: 2
            })
            .kind(),
            ErrorKind::Conflict
        );
    }

    #[test]
    fn test_fatal_messages_are_sanitized() {
        let err = GameError::OrphanedBet(Uuid::nil());
        assert_eq!(err.client_message(), "Internal server error");

        let err = GameError::InsufficientBalance {
            available: 5,
            required: 50,
        };
        assert_eq!(
            err.client_message(),
            "Insufficient balance: available 5, required 50"
        );
    }
}
