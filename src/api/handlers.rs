//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, info};

use crate::state::{clock, AppState, CommandKind, NewTimer, StoreError, Timer};
use crate::tasks::{spawn_engine, AlertControl, EngineCommand};

use super::auth::AuthUser;
use super::responses::{
    error_response, AddTimerResponse, AlertResponse, ApiResponse, ApiResult, CommandResponse,
    ErrorResponse, HealthResponse, StatusResponse, TimersResponse,
};

/// Handle POST /api/timers/add - Persist a timer and spawn its engine
pub async fn add_timer_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<NewTimer>,
) -> Result<(StatusCode, Json<AddTimerResponse>), (StatusCode, Json<ErrorResponse>)> {
    if let Err(message) = payload.validate() {
        return Err(error_response(StatusCode::BAD_REQUEST, &message));
    }

    let timer = match state.store.create(&user, &payload) {
        Ok(timer) => timer,
        Err(StoreError::Invalid(message)) => {
            return Err(error_response(StatusCode::BAD_REQUEST, &message));
        }
        Err(e) => {
            error!("Failed to create timer: {}", e);
            return Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to save timer",
            ));
        }
    };

    if let Err(e) = spawn_engine(&state, timer.clone()) {
        error!("Failed to spawn engine for {}: {}", timer.id, e);
        return Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to start timer engine",
        ));
    }

    info!("Timer {} ({}) created for user {}", timer.id, timer.label, user);
    Ok((
        StatusCode::CREATED,
        Json(AddTimerResponse {
            success: true,
            id: timer.id,
            message: "Timer saved successfully!".to_string(),
            saved_color: timer.color,
        }),
    ))
}

/// Handle GET /api/timers/all - List the user's timers, newest first
pub async fn list_timers_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> ApiResult<TimersResponse> {
    match state.store.list(&user) {
        Ok(timers) => Ok(Json(TimersResponse {
            success: true,
            timers,
        })),
        Err(e) => {
            error!("Failed to list timers: {}", e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load timers",
            ))
        }
    }
}

/// Handle DELETE /api/timers/delete/:id - Remove a timer and its engine
pub async fn delete_timer_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse> {
    match state.store.delete(&user, &id) {
        Ok(()) => {
            if let Err(e) = state.stop_engine(&id) {
                error!("Failed to stop engine for {}: {}", id, e);
            }
            info!("Timer {} deleted by user {}", id, user);
            Ok(Json(ApiResponse::ok("Timer deleted successfully")))
        }
        Err(StoreError::NotFound) => {
            Err(error_response(StatusCode::NOT_FOUND, "Timer not found"))
        }
        Err(StoreError::Forbidden) => Err(error_response(
            StatusCode::FORBIDDEN,
            "Not authorized to delete this timer!",
        )),
        Err(e) => {
            error!("Failed to delete timer {}: {}", id, e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to delete timer",
            ))
        }
    }
}

/// Look up a timer and check the caller owns it.
fn authorize_timer(
    state: &AppState,
    user: &str,
    id: &str,
) -> Result<Timer, (StatusCode, Json<ErrorResponse>)> {
    match state.store.get(id) {
        Ok(Some(timer)) if timer.user_id == user => Ok(timer),
        Ok(Some(_)) => Err(error_response(
            StatusCode::FORBIDDEN,
            "Not authorized to control this timer!",
        )),
        Ok(None) => Err(error_response(StatusCode::NOT_FOUND, "Timer not found")),
        Err(e) => {
            error!("Failed to look up timer {}: {}", id, e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load timer",
            ))
        }
    }
}

/// Send one command to one engine, after the ownership check.
fn control_timer(
    state: &AppState,
    user: &str,
    id: &str,
    command: EngineCommand,
    acted: &str,
) -> ApiResult<ApiResponse> {
    let timer = authorize_timer(state, user, id)?;
    match state.control_engine(&timer.id, command) {
        Ok(()) => {
            info!("Timer {} {} by user {}", timer.id, acted, user);
            Ok(Json(ApiResponse::ok(&format!("Timer {}", acted))))
        }
        Err(e) => {
            error!("Failed to control timer {}: {}", timer.id, e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Timer engine is not available",
            ))
        }
    }
}

/// Handle POST /api/timers/:id/start
pub async fn start_timer_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse> {
    control_timer(&state, &user, &id, EngineCommand::Start, "started")
}

/// Handle POST /api/timers/:id/pause
pub async fn pause_timer_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse> {
    control_timer(&state, &user, &id, EngineCommand::Pause, "paused")
}

/// Handle POST /api/timers/:id/reset
pub async fn reset_timer_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse> {
    control_timer(&state, &user, &id, EngineCommand::Reset, "reset")
}

/// Handle GET /api/clock - Project the user's radial clock frame
pub async fn clock_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> ApiResult<clock::ClockFrame> {
    let timers = match state.store.list(&user) {
        Ok(timers) => timers,
        Err(e) => {
            error!("Failed to list timers: {}", e);
            return Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load timers",
            ));
        }
    };
    let ids = timers.iter().map(|timer| timer.id.clone()).collect();
    let live = match state.registry.snapshot_for(&ids) {
        Ok(live) => live,
        Err(e) => {
            error!("Failed to read live registry: {}", e);
            return Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read timer state",
            ));
        }
    };
    Ok(Json(clock::project(&timers, &live)))
}

/// Handle POST /api/clock/toggle - Play or pause all of the user's timers
pub async fn toggle_all_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> ApiResult<CommandResponse> {
    let ids = match state.store.ids_for(&user) {
        Ok(ids) => ids,
        Err(e) => {
            error!("Failed to list timers: {}", e);
            return Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load timers",
            ));
        }
    };
    if ids.is_empty() {
        return Err(error_response(
            StatusCode::CONFLICT,
            "No timers to control",
        ));
    }
    let live = match state.registry.snapshot_for(&ids) {
        Ok(live) => live,
        Err(e) => {
            error!("Failed to read live registry: {}", e);
            return Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read timer state",
            ));
        }
    };

    let command = if crate::state::registry::any_running_in(&live) {
        CommandKind::Pause
    } else {
        CommandKind::Play
    };
    let issued = state.issue_command(&user, command);
    info!("Global {} issued for user {}", command.as_str(), user);
    Ok(Json(CommandResponse {
        success: true,
        command: command.as_str().to_string(),
        issued_at: issued.issued_at,
    }))
}

/// Handle GET /api/alerts/active - The currently raised alert, if any
pub async fn active_alert_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(_user): AuthUser,
) -> ApiResult<AlertResponse> {
    match state.get_active_alert() {
        Ok(alert) => Ok(Json(AlertResponse {
            success: true,
            alert,
        })),
        Err(e) => {
            error!("Failed to read active alert: {}", e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read alert state",
            ))
        }
    }
}

/// Handle POST /api/alerts/ack - Acknowledge the current alert
pub async fn acknowledge_alert_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> ApiResult<ApiResponse> {
    match state.alert_ctl_tx.send(AlertControl::Acknowledge) {
        Ok(()) => {
            info!("Alert acknowledged by user {}", user);
            Ok(Json(ApiResponse::ok("Alert acknowledged")))
        }
        Err(e) => {
            error!("Alert dispatcher unreachable: {}", e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Alert dispatcher is not available",
            ))
        }
    }
}

/// Handle GET /status - Aggregate server status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> ApiResult<StatusResponse> {
    let timers = match state.store.count() {
        Ok(count) => count,
        Err(e) => {
            error!("Failed to count timers: {}", e);
            return Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read store",
            ));
        }
    };
    let any_running = match state.registry.any_running() {
        Ok(flag) => flag,
        Err(e) => {
            error!("Failed to read live registry: {}", e);
            return Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read timer state",
            ));
        }
    };
    let alert_active = match state.get_active_alert() {
        Ok(alert) => alert.is_some(),
        Err(e) => {
            error!("Failed to read active alert: {}", e);
            false
        }
    };

    Ok(Json(StatusResponse {
        timers,
        any_running,
        alert_active,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
