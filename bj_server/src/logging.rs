//! Structured logging configuration.
//!
//! The room library logs through the `log` facade; those records are
//! picked up by the same subscriber as the server's own `tracing` events.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels come from the RUST_LOG env var, defaulting to `info`.
///
/// # Example
///
/// ```no_run
/// use bj_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a request the room service turned down
///
/// # Arguments
///
/// * `route` - Route name
/// * `status_code` - Response status code
/// * `user_id` - Caller, when known
/// * `message` - Error message
pub fn log_rejected_request(route: &str, status_code: u16, user_id: Option<i64>, message: &str) {
    if status_code >= 500 {
        tracing::error!(
            http_route = route,
            http_status = status_code,
            user_id = user_id,
            "Request failed: {}",
            message
        );
    } else {
        tracing::debug!(
            http_route = route,
            http_status = status_code,
            user_id = user_id,
            "Request rejected: {}",
            message
        );
    }
}
