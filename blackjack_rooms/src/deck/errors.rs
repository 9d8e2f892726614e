//! Deck provider error types.

use thiserror::Error;

/// Deck provider errors
#[derive(Debug, Error)]
pub enum DeckError {
    /// Unknown deck id
    #[error("Deck not found: {0}")]
    DeckNotFound(String),

    /// Unknown pile in a known deck
    #[error("Pile {pile} not found in deck {deck}")]
    PileNotFound { deck: String, pile: String },

    /// Not enough cards left to draw
    #[error("Deck {deck} exhausted: wanted {wanted}, {remaining} left")]
    Exhausted {
        deck: String,
        wanted: usize,
        remaining: usize,
    },

    /// Transport failure talking to a remote deck service
    #[error("Deck service request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote deck service answered with `success: false`
    #[error("Deck service rejected request: {0}")]
    Rejected(String),
}

/// Result type for deck operations
pub type DeckResult<T> = Result<T, DeckError>;
