//! Room storage behind a repository trait.
//!
//! This module provides:
//! - Room, player and hand records
//! - `RoomStore`: load/commit of whole room snapshots with an optimistic
//!   version check
//! - `MemoryStore`: in-process implementation

pub mod errors;
pub mod models;
pub mod repository;

pub use errors::{StoreError, StoreResult};
pub use models::{HandRecord, PlayerStatus, Role, Room, RoomPlayer, RoomSnapshot};
pub use repository::{MemoryStore, RoomStore};
