//! Room lifecycle and action entry points.

use chrono::{DateTime, Utc};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{
    sync::{Mutex, RwLock},
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use uuid::Uuid;

use crate::{
    broadcast::{Broadcaster, Frame},
    deck::DeckProvider,
    game::{
        Action, Engine, ErrorKind, GameConfig, GameError, GameEvent, GameResult, GameState,
        GameView,
        entities::{RoomId, UserId},
    },
    store::{PlayerStatus, Role, Room, RoomPlayer, RoomSnapshot, RoomStore},
};

/// Serializes work on each room and publishes the outcome to its viewers.
///
/// Every operation loads the room, applies one change through the
/// [`Engine`] and commits. Operations on the same room are queued behind a
/// per-room lock; the store's version check catches writers outside this
/// process.
pub struct RoomService {
    store: Arc<dyn RoomStore>,
    deck: Arc<dyn DeckProvider>,
    broadcaster: Arc<Broadcaster>,
    locks: RwLock<HashMap<RoomId, Arc<Mutex<()>>>>,
}

impl RoomService {
    pub fn new(
        store: Arc<dyn RoomStore>,
        deck: Arc<dyn DeckProvider>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            store,
            deck,
            broadcaster,
            locks: RwLock::new(HashMap::new()),
        }
    }

    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    async fn room_lock(&self, room_id: RoomId) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.read().await.get(&room_id) {
            return Arc::clone(lock);
        }
        Arc::clone(self.locks.write().await.entry(room_id).or_default())
    }

    fn engine(&self) -> Engine<'_> {
        Engine::new(self.deck.as_ref())
    }

    /// Create a room owned by `owner`, who is seated as its admin.
    pub async fn create_room(&self, owner: UserId, config: GameConfig) -> GameResult<GameView> {
        let now = Utc::now();
        let room_id = Uuid::new_v4();
        let state = GameState::default();

        let snapshot = RoomSnapshot {
            room: Room {
                id: room_id,
                state: state.to_blob()?,
                config: config.to_blob()?,
                deck_id: None,
                version: 0,
                created_at: now,
            },
            players: vec![RoomPlayer {
                id: Uuid::new_v4(),
                room_id,
                user_id: owner,
                role: Role::Admin,
                status: PlayerStatus::Inactive,
                balance: config.starting_balance,
                joined_at: now,
            }],
            hands: Vec::new(),
        };
        let view = GameView::new(&snapshot, &state);
        self.store.insert_room(snapshot).await?;

        log::info!("Room {room_id} created by user {owner}");
        Ok(view)
    }

    /// Seat `user_id` in a room. Players joining mid-round sit out until
    /// the next betting window.
    pub async fn join_room(&self, room_id: RoomId, user_id: UserId) -> GameResult<GameView> {
        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        let mut snapshot = self.store.load(room_id).await?;
        if snapshot.player_by_user(user_id).is_some() {
            return Err(GameError::AlreadyJoined(user_id));
        }

        let config = GameConfig::from_blob(&snapshot.room.config)?;
        let player_id = Uuid::new_v4();
        snapshot.players.push(RoomPlayer {
            id: player_id,
            room_id,
            user_id,
            role: Role::Player,
            status: PlayerStatus::Inactive,
            balance: config.starting_balance,
            joined_at: Utc::now(),
        });

        log::info!("Room {room_id}: user {user_id} joined");
        let events = vec![GameEvent::PlayerJoined { player_id, user_id }];
        self.commit(snapshot, events).await
    }

    pub async fn leave_room(&self, room_id: RoomId, user_id: UserId) -> GameResult<GameView> {
        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        let mut snapshot = self.store.load(room_id).await?;
        let player_id = snapshot
            .player_by_user(user_id)
            .map(|p| p.id)
            .ok_or(GameError::NotInRoom(user_id))?;

        let events = self
            .engine()
            .remove_player(&mut snapshot, player_id, Utc::now())
            .await?;

        log::info!("Room {room_id}: user {user_id} left");
        self.commit(snapshot, events).await
    }

    /// Start the game. Admins and moderators only.
    pub async fn start_game(&self, room_id: RoomId, user_id: UserId) -> GameResult<GameView> {
        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        let mut snapshot = self.store.load(room_id).await?;
        let player = snapshot
            .player_by_user(user_id)
            .ok_or(GameError::NotInRoom(user_id))?;
        if !player.role.can_start() {
            return Err(GameError::Forbidden {
                required: "admin or moderator",
            });
        }

        let events = self.engine().start(&mut snapshot, Utc::now()).await?;

        log::info!("Room {room_id}: game started by user {user_id}");
        self.commit(snapshot, events).await
    }

    /// Resolve `action` on behalf of `user_id`.
    pub async fn take_action(
        &self,
        room_id: RoomId,
        user_id: UserId,
        action: Action,
    ) -> GameResult<GameView> {
        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        let mut snapshot = self.store.load(room_id).await?;
        let player_id = snapshot
            .player_by_user(user_id)
            .map(|p| p.id)
            .ok_or(GameError::NotInRoom(user_id))?;

        let kind = action.kind();
        let events = self
            .engine()
            .resolve(&mut snapshot, player_id, action, Utc::now())
            .await
            .inspect_err(|e| {
                if e.kind() == ErrorKind::Fatal {
                    log::error!("Room {room_id}: {kind} by user {user_id} failed: {e}");
                } else {
                    log::debug!("Room {room_id}: {kind} by user {user_id} rejected: {e}");
                }
            })?;

        log::debug!("Room {room_id}: user {user_id} {kind}");
        self.commit(snapshot, events).await
    }

    pub async fn view(&self, room_id: RoomId) -> GameResult<GameView> {
        let snapshot = self.store.load(room_id).await?;
        let state = GameState::from_blob(&snapshot.room.state)?;
        Ok(GameView::new(&snapshot, &state))
    }

    pub async fn room_count(&self) -> GameResult<usize> {
        Ok(self.store.room_ids().await?.len())
    }

    /// Tear the room down, disconnect its viewers and delete it. Admin only.
    pub async fn close_room(&self, room_id: RoomId, user_id: UserId) -> GameResult<()> {
        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        let mut snapshot = self.store.load(room_id).await?;
        let player = snapshot
            .player_by_user(user_id)
            .ok_or(GameError::NotInRoom(user_id))?;
        if player.role != Role::Admin {
            return Err(GameError::Forbidden { required: "admin" });
        }

        let events = self.engine().teardown(&mut snapshot, Utc::now()).await?;
        self.commit(snapshot, events).await?;

        let disconnected = self.broadcaster.close_room(room_id);
        self.store.delete_room(room_id).await?;
        self.locks.write().await.remove(&room_id);

        log::info!("Room {room_id} closed by user {user_id}, {disconnected} viewer(s) disconnected");
        Ok(())
    }

    /// Push every room whose stage deadline has passed. Returns how many
    /// rooms advanced.
    pub async fn advance_expired(&self, now: DateTime<Utc>) -> usize {
        let room_ids = match self.store.room_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                log::error!("Deadline sweep could not list rooms: {e}");
                return 0;
            }
        };

        let mut advanced = 0;
        for room_id in room_ids {
            match self.advance_room(room_id, now).await {
                Ok(true) => advanced += 1,
                Ok(false) => {}
                Err(e) if e.kind() == ErrorKind::Fatal => {
                    log::error!("Room {room_id}: deadline advance failed: {e}");
                }
                Err(e) => log::debug!("Room {room_id}: deadline advance skipped: {e}"),
            }
        }
        advanced
    }

    async fn advance_room(&self, room_id: RoomId, now: DateTime<Utc>) -> GameResult<bool> {
        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        let mut snapshot = self.store.load(room_id).await?;
        let Some(events) = self.engine().advance_expired(&mut snapshot, now).await? else {
            return Ok(false);
        };

        log::debug!("Room {room_id}: deadline passed, advanced");
        self.commit(snapshot, events).await?;
        Ok(true)
    }

    /// Sweep for expired deadlines every `period` until the task is aborted.
    pub fn spawn_deadline_watcher(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            log::info!("Deadline watcher running every {period:?}");
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                self.advance_expired(Utc::now()).await;
            }
        })
    }

    async fn commit(
        &self,
        mut snapshot: RoomSnapshot,
        events: Vec<GameEvent>,
    ) -> GameResult<GameView> {
        snapshot.room.version = self.store.commit(&snapshot).await?;
        let state = GameState::from_blob(&snapshot.room.state)?;
        let view = GameView::new(&snapshot, &state);
        self.publish(snapshot.room.id, &events, &view);
        Ok(view)
    }

    fn publish(&self, room_id: RoomId, events: &[GameEvent], view: &GameView) {
        let frames = events
            .iter()
            .map(Frame::from_event)
            .chain(std::iter::once(Frame::game_state(view)));

        for frame in frames {
            match frame {
                Ok(frame) => {
                    self.broadcaster.broadcast(room_id, &frame);
                }
                Err(e) => log::error!("Room {room_id}: failed to encode event: {e}"),
            }
        }
    }
}
