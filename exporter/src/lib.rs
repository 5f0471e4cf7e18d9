//! Exporter HTTP surface.
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/metrics/proposals` | Most recent governance proposals |
//! | GET | `/metrics/upgrade` | Pending upgrade plan and ETA |
//! | GET | `/health` | Liveness |
//!
//! The router is built here rather than in `main.rs` so integration tests
//! can drive it with in-memory node fakes.

pub mod config;
pub mod routes;
pub mod state;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use routes::{health, metrics};
pub use state::{AppState, SharedState};

/// Builds the complete router.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/metrics/proposals", get(metrics::proposals))
        .route("/metrics/upgrade", get(metrics::upgrade))
        .route("/health", get(health::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
