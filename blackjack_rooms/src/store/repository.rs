//! Repository trait for room persistence.
//!
//! The engine only ever sees a [`RoomSnapshot`]; how rooms are stored is up
//! to the implementation. [`MemoryStore`] keeps everything in process and is
//! what the server and the tests run against.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{
    errors::{StoreError, StoreResult},
    models::RoomSnapshot,
};
use crate::game::entities::RoomId;

/// Trait for room repository operations
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Persist a freshly created room
    async fn insert_room(&self, snapshot: RoomSnapshot) -> StoreResult<()>;

    /// Load a room with its players and hands
    async fn load(&self, room_id: RoomId) -> StoreResult<RoomSnapshot>;

    /// Write the snapshot back if nobody else committed since it was loaded.
    ///
    /// The stored version must equal `snapshot.room.version`; the new
    /// version is returned.
    async fn commit(&self, snapshot: &RoomSnapshot) -> StoreResult<u64>;

    /// Delete a room and everything in it
    async fn delete_room(&self, room_id: RoomId) -> StoreResult<()>;

    /// Ids of all stored rooms
    async fn room_ids(&self) -> StoreResult<Vec<RoomId>>;
}

/// In-process implementation of `RoomStore`
#[derive(Default)]
pub struct MemoryStore {
    rooms: RwLock<HashMap<RoomId, RoomSnapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn insert_room(&self, snapshot: RoomSnapshot) -> StoreResult<()> {
        let mut rooms = self.rooms.write().await;
        let room_id = snapshot.room.id;
        if rooms.contains_key(&room_id) {
            return Err(StoreError::RoomExists(room_id));
        }
        rooms.insert(room_id, snapshot);
        Ok(())
    }

    async fn load(&self, room_id: RoomId) -> StoreResult<RoomSnapshot> {
        self.rooms
            .read()
            .await
            .get(&room_id)
            .cloned()
            .ok_or(StoreError::RoomNotFound(room_id))
    }

    async fn commit(&self, snapshot: &RoomSnapshot) -> StoreResult<u64> {
        let mut rooms = self.rooms.write().await;
        let room_id = snapshot.room.id;
        let stored = rooms
            .get_mut(&room_id)
            .ok_or(StoreError::RoomNotFound(room_id))?;

        if stored.room.version != snapshot.room.version {
            return Err(StoreError::Conflict {
                room_id,
                expected: snapshot.room.version,
                actual: stored.room.version,
            });
        }

        let mut next = snapshot.clone();
        next.room.version += 1;
        let version = next.room.version;
        *stored = next;
        Ok(version)
    }

    async fn delete_room(&self, room_id: RoomId) -> StoreResult<()> {
        self.rooms
            .write()
            .await
            .remove(&room_id)
            .map(|_| ())
            .ok_or(StoreError::RoomNotFound(room_id))
    }

    async fn room_ids(&self) -> StoreResult<Vec<RoomId>> {
        Ok(self.rooms.read().await.keys().copied().collect())
    }
}
