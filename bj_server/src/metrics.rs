//! Prometheus metrics for monitoring room server health.
//!
//! Metrics are exposed in Prometheus text format for scraping by monitoring
//! systems. Without an installed exporter every call is a no-op.
//!
//! # Metrics Categories
//!
//! - **Room Metrics**: Rooms created and closed
//! - **Action Metrics**: Actions by name and result
//! - **Stream Metrics**: Event stream connections
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use bj_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::actions_total("bet", "ok");
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// Room Metrics
// ============================================================================

pub fn rooms_created_total() {
    metrics::counter!("rooms_created_total").increment(1);
}

pub fn rooms_closed_total() {
    metrics::counter!("rooms_closed_total").increment(1);
}

// ============================================================================
// Action Metrics
// ============================================================================

/// Record an action request with its action name and result kind.
pub fn actions_total(action: &str, result: &str) {
    metrics::counter!("actions_total",
        "action" => action.to_string(),
        "result" => result.to_string()
    )
    .increment(1);
}

// ============================================================================
// Stream Metrics
// ============================================================================

/// Increment total event stream connections counter.
pub fn sse_connections_total() {
    metrics::counter!("sse_connections_total").increment(1);
}

pub fn sse_connection_opened() {
    metrics::gauge!("sse_connections_active").increment(1.0);
}

pub fn sse_connection_closed() {
    metrics::gauge!("sse_connections_active").decrement(1.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_exporter() {
        rooms_created_total();
        actions_total("hit", "client_fault");
        sse_connection_opened();
        sse_connection_closed();
    }
}
