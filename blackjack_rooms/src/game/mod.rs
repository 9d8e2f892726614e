//! Blackjack rules and the room stage machine.
//!
//! This module provides:
//! - Cards, hand values and the blackjack predicates
//! - Stages and the serialized per-room game state
//! - The action engine that resolves bets and plays
//! - Settlement and the client view of a room

pub mod action;
pub mod config;
pub mod engine;
pub mod entities;
pub mod errors;
pub mod events;
pub mod payout;
pub mod stage;
pub mod view;

pub use action::{Action, ActionKind};
pub use config::GameConfig;
pub use engine::Engine;
pub use errors::{ErrorKind, GameError, GameResult};
pub use events::GameEvent;
pub use payout::{HandResult, Outcome};
pub use stage::{GameState, Stage, is_action_valid};
pub use view::{GameView, HandView, PlayerView};
