//! Server-sent event frames.

use serde::Serialize;

use crate::game::{GameEvent, GameView};

/// Comment written when a connection is first registered.
pub const CONNECTED_COMMENT: &str = ": connected\n\n";

/// Comment written on idle connections so proxies keep them open.
pub const KEEP_ALIVE_COMMENT: &str = ": keep-alive\n\n";

/// Event name of the full room view sent after every change.
pub const GAME_STATE_EVENT: &str = "game_state";

/// One named event with a JSON payload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Frame {
    pub event: String,
    pub data: String,
}

impl Frame {
    pub fn new(event: impl Into<String>, payload: &impl Serialize) -> serde_json::Result<Self> {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }

    pub fn from_event(event: &GameEvent) -> serde_json::Result<Self> {
        Self::new(event.name(), event)
    }

    pub fn game_state(view: &GameView) -> serde_json::Result<Self> {
        Self::new(GAME_STATE_EVENT, view)
    }

    /// Wire form: `event: <name>\ndata: <json>\n\n`.
    #[must_use]
    pub fn encode(&self) -> String {
        format!("event: {}\ndata: {}\n\n", self.event, self.data)
    }
}
