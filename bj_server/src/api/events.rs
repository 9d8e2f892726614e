//! Server-sent event stream of a room.
//!
//! `GET /api/v1/rooms/{room_id}/events` opens a long-lived stream. The
//! first event is a `game_state` with the room as it is now; after that
//! every change to the room arrives as its named event followed by a fresh
//! `game_state`. The stream ends when the room is closed.

use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use blackjack_rooms::{Frame, GameError, entities::RoomId};
use futures_util::{Stream, StreamExt, stream};

use super::{
    AppState,
    rooms::{ApiError, reject},
};
use crate::metrics;

/// Keeps the active stream gauge in step with open connections.
struct ConnectionGauge;

impl ConnectionGauge {
    fn open() -> Self {
        metrics::sse_connections_total();
        metrics::sse_connection_opened();
        ConnectionGauge
    }
}

impl Drop for ConnectionGauge {
    fn drop(&mut self) {
        metrics::sse_connection_closed();
    }
}

fn to_event(frame: Frame) -> Result<Event, Infallible> {
    Ok(Event::default().event(frame.event).data(frame.data))
}

/// Subscribe to a room's events.
///
/// # Errors
///
/// - `404 Not Found`: Room doesn't exist
pub async fn room_events(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    // Subscribe first so nothing published between the snapshot and the
    // registration is lost
    let subscription = state.rooms.broadcaster().subscribe(room_id);
    let view = state
        .rooms
        .view(room_id)
        .await
        .map_err(|e| reject("room_events", None, e))?;
    let initial =
        Frame::game_state(&view).map_err(|e| reject("room_events", None, GameError::from(e)))?;

    tracing::debug!(room_id = %room_id, "Event stream opened");
    let gauge = ConnectionGauge::open();

    let events = stream::once(async { Ok(Event::default().comment("connected")) })
        .chain(stream::once(async move { to_event(initial) }))
        .chain(subscription.into_stream().map(move |frame| {
            let _ = &gauge;
            to_event(frame)
        }));

    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(state.keep_alive)))
}
