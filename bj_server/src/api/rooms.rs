//! Room API handlers.
//!
//! This module provides HTTP REST endpoints for room operations including:
//! - Creating rooms and reading their current view
//! - Joining, leaving and closing rooms
//! - Starting the game and taking actions
//!
//! Every handler returning a room responds with its [`GameView`].
//!
//! # Examples
//!
//! Place a bet:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/rooms/ROOM_ID/action \
//!   -H "x-user-id: 7" \
//!   -H "Content-Type: application/json" \
//!   -d '{"action": "bet", "amount": 50}'
//! ```

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use blackjack_rooms::{
    Action, ErrorKind, GameConfig, GameError, GameView,
    entities::{Chips, RoomId, UserId},
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::{logging, metrics};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Room settings; anything left out falls back to the server defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateRoomRequest {
    pub starting_balance: Option<Chips>,
    pub min_bet: Option<Chips>,
    pub betting_time_limit_secs: Option<u32>,
    pub turn_time_limit_secs: Option<u32>,
    pub deck_count: Option<u8>,
    pub dealer_hits_soft_17: Option<bool>,
}

impl CreateRoomRequest {
    fn apply(self, defaults: &GameConfig) -> GameConfig {
        GameConfig {
            starting_balance: self.starting_balance.unwrap_or(defaults.starting_balance),
            min_bet: self.min_bet.unwrap_or(defaults.min_bet),
            betting_time_limit_secs: self
                .betting_time_limit_secs
                .unwrap_or(defaults.betting_time_limit_secs),
            turn_time_limit_secs: self
                .turn_time_limit_secs
                .unwrap_or(defaults.turn_time_limit_secs),
            deck_count: self.deck_count.unwrap_or(defaults.deck_count),
            dealer_hits_soft_17: self
                .dealer_hits_soft_17
                .unwrap_or(defaults.dealer_hits_soft_17),
        }
    }
}

/// Map a room error to a response, logging it on the way.
pub(super) fn reject(route: &str, user_id: Option<UserId>, err: GameError) -> ApiError {
    let status = match (&err, err.kind()) {
        (GameError::Forbidden { .. }, _) => StatusCode::FORBIDDEN,
        (_, ErrorKind::ClientFault) => StatusCode::BAD_REQUEST,
        (_, ErrorKind::NotFound) => StatusCode::NOT_FOUND,
        (_, ErrorKind::Conflict) => StatusCode::CONFLICT,
        (_, ErrorKind::Fatal) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let message = err.client_message();
    if status.is_server_error() {
        logging::log_rejected_request(route, status.as_u16(), user_id, &err.to_string());
    } else {
        logging::log_rejected_request(route, status.as_u16(), user_id, &message);
    }

    (status, Json(ErrorResponse { error: message }))
}

fn kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::ClientFault => "client_fault",
        ErrorKind::NotFound => "not_found",
        ErrorKind::Conflict => "conflict",
        ErrorKind::Fatal => "fatal",
    }
}

/// Create a room owned by the caller.
///
/// # Response
///
/// Returns `201 Created` with the new room's view.
///
/// # Errors
///
/// - `400 Bad Request`: Settings fail validation
pub async fn create_room(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<GameView>), ApiError> {
    let config = request.apply(&state.room_defaults);
    let view = state
        .rooms
        .create_room(user_id, config)
        .await
        .map_err(|e| reject("create_room", Some(user_id), e))?;

    metrics::rooms_created_total();
    Ok((StatusCode::CREATED, Json(view)))
}

/// Current view of a room.
///
/// # Errors
///
/// - `404 Not Found`: Room doesn't exist
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
) -> Result<Json<GameView>, ApiError> {
    state
        .rooms
        .view(room_id)
        .await
        .map(Json)
        .map_err(|e| reject("get_room", None, e))
}

/// Take a seat in a room.
///
/// # Errors
///
/// - `400 Bad Request`: Caller is already seated
/// - `404 Not Found`: Room doesn't exist
pub async fn join_room(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(room_id): Path<RoomId>,
) -> Result<Json<GameView>, ApiError> {
    state
        .rooms
        .join_room(room_id, user_id)
        .await
        .map(Json)
        .map_err(|e| reject("join_room", Some(user_id), e))
}

/// Leave a room. A pending bet is withdrawn; hands in play are forfeited.
pub async fn leave_room(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(room_id): Path<RoomId>,
) -> Result<Json<GameView>, ApiError> {
    state
        .rooms
        .leave_room(room_id, user_id)
        .await
        .map(Json)
        .map_err(|e| reject("leave_room", Some(user_id), e))
}

/// Start the game and open the first betting window.
///
/// # Errors
///
/// - `403 Forbidden`: Caller is neither admin nor moderator
/// - `400 Bad Request`: Game already started
pub async fn start_game(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(room_id): Path<RoomId>,
) -> Result<Json<GameView>, ApiError> {
    state
        .rooms
        .start_game(room_id, user_id)
        .await
        .map(Json)
        .map_err(|e| reject("start_game", Some(user_id), e))
}

/// Close a room and disconnect its viewers.
///
/// # Response
///
/// Returns `204 No Content`.
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not the room's admin
pub async fn close_room(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(room_id): Path<RoomId>,
) -> Result<StatusCode, ApiError> {
    state
        .rooms
        .close_room(room_id, user_id)
        .await
        .map_err(|e| reject("close_room", Some(user_id), e))?;

    metrics::rooms_closed_total();
    Ok(StatusCode::NO_CONTENT)
}

/// Take an action.
///
/// # Request Body
///
/// The action name plus its payload:
/// ```json
/// {"action": "split", "amount": 50, "hand": 0}
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Unknown action, bad payload, wrong stage or turn,
///   or a rule violation
/// - `409 Conflict`: The room changed concurrently; reload and retry
/// - `500 Internal Server Error`: The room's state is inconsistent
pub async fn take_action(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(room_id): Path<RoomId>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<GameView>, ApiError> {
    let action = Action::from_json(body).map_err(|e| {
        metrics::actions_total("unknown", kind_label(e.kind()));
        reject("take_action", Some(user_id), e)
    })?;
    let name = action.kind().name();

    match state.rooms.take_action(room_id, user_id, action).await {
        Ok(view) => {
            metrics::actions_total(name, "ok");
            Ok(Json(view))
        }
        Err(e) => {
            metrics::actions_total(name, kind_label(e.kind()));
            Err(reject("take_action", Some(user_id), e))
        }
    }
}
