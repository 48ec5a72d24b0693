//! API response structures

use axum::{http::StatusCode, response::Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::Timer;
use crate::tasks::ActiveAlert;

/// Every handler either returns its payload or a status plus error envelope.
pub type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

/// Generic success envelope for state-changing endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ApiResponse {
    pub fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Error envelope surfaced to clients; the message is meant to be shown as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// Build a `(status, body)` error pair for handler returns.
pub fn error_response(status: StatusCode, message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            success: false,
            error: message.to_string(),
        }),
    )
}

/// Response for timer creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTimerResponse {
    pub success: bool,
    pub id: String,
    pub message: String,
    /// The color actually persisted, which may differ from the request.
    #[serde(rename = "savedColor")]
    pub saved_color: String,
}

/// Response for listing a user's timers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimersResponse {
    pub success: bool,
    pub timers: Vec<Timer>,
}

/// Response for the global play-all/pause-all toggle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    pub command: String,
    pub issued_at: DateTime<Utc>,
}

/// Response for the active alert query.
#[derive(Debug, Clone, Serialize)]
pub struct AlertResponse {
    pub success: bool,
    pub alert: Option<ActiveAlert>,
}

/// Aggregate status response
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub timers: usize,
    pub any_running: bool,
    pub alert_active: bool,
    pub uptime: String,
    pub port: u16,
    pub host: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
