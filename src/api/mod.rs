//! HTTP API module
//!
//! Endpoint handlers, response envelopes, and the bearer-token extractor.

pub mod auth;
pub mod handlers;
pub mod responses;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/timers/add", post(add_timer_handler))
        .route("/api/timers/all", get(list_timers_handler))
        .route("/api/timers/delete/:id", delete(delete_timer_handler))
        .route("/api/timers/:id/start", post(start_timer_handler))
        .route("/api/timers/:id/pause", post(pause_timer_handler))
        .route("/api/timers/:id/reset", post(reset_timer_handler))
        .route("/api/clock", get(clock_handler))
        .route("/api/clock/toggle", post(toggle_all_handler))
        .route("/api/alerts/active", get(active_alert_handler))
        .route("/api/alerts/ack", post(acknowledge_alert_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
