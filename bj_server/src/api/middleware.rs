//! Caller identification for room endpoints.
//!
//! Authentication happens in front of this server. The gateway forwards the
//! authenticated user as an `x-user-id` header, which this middleware parses
//! and injects into request extensions for downstream handlers.
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//!
//! async fn protected_handler(Extension(user_id): Extension<i64>) -> String {
//!     format!("Acting as user {}", user_id)
//! }
//! # let _ = protected_handler;
//! ```

use axum::{
    Json,
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use blackjack_rooms::entities::UserId;

use super::rooms::ErrorResponse;

/// Header carrying the caller's user id
pub const USER_ID_HEADER: &str = "x-user-id";

fn caller(headers: &HeaderMap) -> Option<UserId> {
    headers
        .get(USER_ID_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Reject requests without a usable `x-user-id` header with
/// `401 Unauthorized`; otherwise inject the `UserId`.
pub async fn require_user(mut request: Request, next: Next) -> Response {
    match caller(request.headers()) {
        Some(user_id) => {
            request.extensions_mut().insert(user_id);
            next.run(request).await
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: format!("missing or invalid {USER_ID_HEADER} header"),
            }),
        )
            .into_response(),
    }
}
