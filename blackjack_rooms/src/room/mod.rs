//! Room management.
//!
//! [`RoomService`] is what the outer surfaces talk to. It owns no room
//! state of its own: rooms live in a [`crate::store::RoomStore`] and are
//! pushed to viewers through a [`crate::broadcast::Broadcaster`].

pub mod service;

pub use service::RoomService;
