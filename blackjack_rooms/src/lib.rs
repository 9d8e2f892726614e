//! # Blackjack Rooms
//!
//! A multi-player blackjack engine built around rooms. Players join a room,
//! bet during a timed window, then act in turn against a single dealer.
//!
//! ## Architecture
//!
//! A room moves through a fixed set of stages:
//!
//! - **Init**: Room created, waiting for the game to start
//! - **Setup**: Preparing the shoe
//! - **Betting**: Players place bets until everyone has bet or time runs out
//! - **Dealing**: Two cards to each bettor and to the dealer
//! - **PlayerAction**: Players hit, stand, double, split or surrender in turn
//! - **FinishRound**: Dealer plays out, hands are paid, betting reopens
//! - **Teardown**: Room closed
//!
//! Room state is never kept in memory between requests. Every operation
//! loads a snapshot from the store, resolves against it and commits it
//! back under an optimistic version check.
//!
//! ## Core Modules
//!
//! - [`game`]: Rules, stages, the action engine and settlement
//! - [`deck`]: Card deck providers (in process or over HTTP)
//! - [`store`]: Room persistence
//! - [`broadcast`]: Per-room event fan-out to viewers
//! - [`room`]: The service tying the pieces together
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use blackjack_rooms::{Broadcaster, GameConfig, LocalDeck, MemoryStore, RoomService};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let service = RoomService::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(LocalDeck::new()),
//!     Arc::new(Broadcaster::default()),
//! );
//! let view = service.create_room(1, GameConfig::default()).await.unwrap();
//! assert_eq!(view.players.len(), 1);
//! # }
//! ```

pub mod broadcast;
pub mod deck;
pub mod game;
pub mod room;
pub mod store;

pub use broadcast::{Broadcaster, Frame, Subscription};
pub use deck::{DeckProvider, LocalDeck, RemoteDeck};
pub use game::{
    Action, ActionKind, ErrorKind, GameConfig, GameError, GameEvent, GameResult, GameView, Stage,
    entities,
};
pub use room::RoomService;
pub use store::{MemoryStore, RoomStore};
