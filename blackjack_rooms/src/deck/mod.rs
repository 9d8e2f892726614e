//! Card deck providers.
//!
//! Cards are drawn from a shared deck into named piles, one pile per hand
//! plus the dealer's. Two providers are available:
//! - [`LocalDeck`]: shuffles in process, with a scripted mode for tests
//! - [`RemoteDeck`]: talks to a deckofcardsapi-compatible HTTP service

pub mod errors;
pub mod local;
pub mod remote;

use async_trait::async_trait;

use crate::game::entities::Card;

pub use errors::{DeckError, DeckResult};
pub use local::LocalDeck;
pub use remote::RemoteDeck;

pub type DeckId = String;

/// Name of the pile the dealer's cards are drawn into.
pub const DEALER_PILE: &str = "dealer";

/// Trait for card deck operations
#[async_trait]
pub trait DeckProvider: Send + Sync {
    /// Create a shuffled shoe of `deck_count` standard decks
    async fn create_deck(&self, deck_count: u8, jokers: bool) -> DeckResult<DeckId>;

    /// Open an empty named pile
    async fn create_pile(&self, deck: &str, pile: &str) -> DeckResult<()>;

    /// Draw `count` cards from the shoe into a named pile, returning them
    async fn draw(&self, deck: &str, pile: &str, count: usize) -> DeckResult<Vec<Card>>;

    /// Cards currently in a pile
    async fn list_pile(&self, deck: &str, pile: &str) -> DeckResult<Vec<Card>>;

    /// Put every card from every pile back in the shoe and reshuffle
    async fn return_all(&self, deck: &str) -> DeckResult<()>;
}
