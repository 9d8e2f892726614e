//! HTTP front end for shared blackjack rooms.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
