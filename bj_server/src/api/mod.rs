//! HTTP and server-sent events API for the room server.
//!
//! # Modules
//!
//! - [`rooms`]: Room lifecycle and player actions
//! - [`events`]: Live per-room event streams
//! - [`middleware`]: Caller identification for protected endpoints
//!
//! # Endpoints Overview
//!
//! ## Rooms (caller identified by `x-user-id`)
//! - `POST /api/v1/rooms` - Create a room
//! - `POST /api/v1/rooms/{id}/join` - Take a seat
//! - `POST /api/v1/rooms/{id}/leave` - Leave
//! - `POST /api/v1/rooms/{id}/start` - Start the game
//! - `POST /api/v1/rooms/{id}/close` - Close the room
//! - `POST /api/v1/rooms/{id}/action` - Take an action
//!
//! ## Public
//! - `GET /api/v1/rooms/{id}` - Current room view
//! - `GET /api/v1/rooms/{id}/events` - Server-sent event stream
//! - `GET /health` - Server health status
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod events;
pub mod middleware;
pub mod rooms;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use blackjack_rooms::{GameConfig, RoomService};
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers and event streams.
///
/// Cloned for each request; the room service sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RoomService>,
    /// Settings for rooms created without explicit values
    pub room_defaults: GameConfig,
    /// Interval of keep-alive comments on idle event streams
    pub keep_alive: Duration,
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Example
///
/// ```rust,no_run
/// # use bj_server::api::{create_router, AppState};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let state: AppState = unimplemented!();
/// let app = create_router(state);
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:6969").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", create_v1_router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router() -> Router<AppState> {
    let public_routes = Router::new()
        .route("/rooms/{room_id}", get(rooms::get_room))
        .route("/rooms/{room_id}/events", get(events::room_events));

    let protected_routes = Router::new()
        .route("/rooms", post(rooms::create_room))
        .route("/rooms/{room_id}/join", post(rooms::join_room))
        .route("/rooms/{room_id}/leave", post(rooms::leave_room))
        .route("/rooms/{room_id}/start", post(rooms::start_game))
        .route("/rooms/{room_id}/close", post(rooms::close_room))
        .route("/rooms/{room_id}/action", post(rooms::take_action))
        .layer(axum::middleware::from_fn(middleware::require_user));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the room store answers, `503 Service Unavailable`
/// otherwise.
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","rooms":3,"timestamp":"2025-11-22T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let timestamp = chrono::Utc::now().to_rfc3339();
    match state.rooms.room_count().await {
        Ok(rooms) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "rooms": rooms,
                "timestamp": timestamp,
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "timestamp": timestamp,
                })),
            )
        }
    }
}
