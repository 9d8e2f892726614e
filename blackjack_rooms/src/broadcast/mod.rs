//! Per-room fan-out of events to long-lived viewer connections.
//!
//! Each connection owns a bounded channel. Broadcasting never waits on a
//! viewer: a full channel drops the frame for that viewer only, and a
//! closed one is deregistered on the spot.

pub mod frame;

use std::{
    collections::HashMap,
    io,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use futures_util::Stream;
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::mpsc,
    time::{MissedTickBehavior, interval},
};

use crate::game::entities::RoomId;

pub use frame::{CONNECTED_COMMENT, Frame, GAME_STATE_EVENT, KEEP_ALIVE_COMMENT};

/// Default per-connection channel capacity.
pub const DEFAULT_BUFFER: usize = 64;

type Connections = HashMap<RoomId, HashMap<u64, mpsc::Sender<Frame>>>;

/// What happened to one broadcast.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BroadcastReport {
    pub delivered: usize,
    /// Frames skipped because the viewer's buffer was full
    pub dropped: usize,
    /// Connections removed because they were gone
    pub pruned: usize,
}

/// Registry of viewer connections keyed by room.
pub struct Broadcaster {
    connections: Mutex<Connections>,
    next_id: AtomicU64,
    buffer: usize,
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER)
    }
}

impl Broadcaster {
    pub fn new(buffer: usize) -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
        }
    }

    fn connections(&self) -> MutexGuard<'_, Connections> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a connection for `room_id`. It stays registered until the
    /// returned [`Subscription`] is dropped or the room is closed.
    pub fn subscribe(self: &Arc<Self>, room_id: RoomId) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.buffer);
        self.connections().entry(room_id).or_default().insert(id, tx);
        log::debug!("Room {room_id}: viewer {id} connected");

        Subscription {
            broadcaster: Arc::clone(self),
            room_id,
            id,
            rx,
        }
    }

    /// Stream a room's events to `writer` until the room closes or a write
    /// fails. The connection is deregistered either way.
    pub async fn serve<W>(
        self: &Arc<Self>,
        room_id: RoomId,
        mut writer: W,
        keep_alive: Duration,
    ) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let mut subscription = self.subscribe(room_id);
        let result = subscription.pump(&mut writer, keep_alive).await;
        if let Err(e) = &result {
            log::debug!(
                "Room {room_id}: viewer {} write failed: {e}",
                subscription.id
            );
        }
        result
    }

    /// Send `frame` to every connection of `room_id`.
    pub fn broadcast(&self, room_id: RoomId, frame: &Frame) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let mut connections = self.connections();
        let Some(viewers) = connections.get_mut(&room_id) else {
            return report;
        };

        viewers.retain(|id, sender| match sender.try_send(frame.clone()) {
            Ok(()) => {
                report.delivered += 1;
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                log::warn!(
                    "Room {room_id}: viewer {id} channel full, dropping {}",
                    frame.event
                );
                report.dropped += 1;
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                log::debug!("Room {room_id}: viewer {id} disconnected, removing");
                report.pruned += 1;
                false
            }
        });

        if viewers.is_empty() {
            connections.remove(&room_id);
        }
        report
    }

    /// Drop every connection of a room, ending their streams.
    pub fn close_room(&self, room_id: RoomId) -> usize {
        let closed = self
            .connections()
            .remove(&room_id)
            .map_or(0, |viewers| viewers.len());
        log::debug!("Room {room_id}: closed {closed} viewer connection(s)");
        closed
    }

    pub fn connection_count(&self, room_id: RoomId) -> usize {
        self.connections()
            .get(&room_id)
            .map_or(0, HashMap::len)
    }

    fn deregister(&self, room_id: RoomId, id: u64) {
        let mut connections = self.connections();
        if let Some(viewers) = connections.get_mut(&room_id) {
            viewers.remove(&id);
            if viewers.is_empty() {
                connections.remove(&room_id);
            }
        }
    }
}

/// A registered viewer connection.
pub struct Subscription {
    broadcaster: Arc<Broadcaster>,
    room_id: RoomId,
    id: u64,
    rx: mpsc::Receiver<Frame>,
}

impl Subscription {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Next frame, or `None` once the room is closed.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }

    pub fn into_stream(self) -> impl Stream<Item = Frame> + Send {
        futures_util::stream::unfold(self, |mut subscription| async move {
            let frame = subscription.recv().await?;
            Some((frame, subscription))
        })
    }

    async fn pump<W>(&mut self, writer: &mut W, keep_alive: Duration) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_all(CONNECTED_COMMENT.as_bytes()).await?;
        writer.flush().await?;

        let mut ticker = interval(keep_alive);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                frame = self.rx.recv() => match frame {
                    Some(frame) => writer.write_all(frame.encode().as_bytes()).await?,
                    None => return Ok(()),
                },
                _ = ticker.tick() => {
                    writer.write_all(KEEP_ALIVE_COMMENT.as_bytes()).await?;
                }
            }
            writer.flush().await?;
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.broadcaster.deregister(self.room_id, self.id);
        log::debug!("Room {}: viewer {} deregistered", self.room_id, self.id);
    }
}
