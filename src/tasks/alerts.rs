//! Alert dispatcher background task
//!
//! Consumes checkpoint/completion events from the countdown engines and turns
//! them into a queryable active-alert record plus a looping tone. Checkpoint
//! alerts dismiss themselves after a fixed timeout; completion alerts ring
//! until acknowledged. At most one alert is live at a time: raising a new one
//! replaces the current record and its sound.

use std::future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, error, info};

use crate::services::SoundPlayer;
use crate::state::timeline::format_mmss;
use crate::state::AppState;

/// How long an unacknowledged checkpoint alert keeps ringing.
pub const CHECKPOINT_DISMISS: Duration = Duration::from_secs(10);

/// What a countdown engine observed on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Checkpoint { elapsed: u32 },
    Completion,
}

/// Event emitted by an engine toward the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertEvent {
    pub timer_id: String,
    pub label: String,
    pub kind: AlertKind,
}

/// Instructions flowing into the dispatcher from handlers and engines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertControl {
    /// User acknowledged the alert: stop the sound, dismiss the record.
    Acknowledge,
    /// A timer was reset; its alert (if live) must stop.
    CancelTimer(String),
}

/// The currently raised alert as clients see it.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveAlert {
    pub timer_id: String,
    pub kind: String,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

/// Receiving ends owned by the dispatcher, created with the app state.
#[derive(Debug)]
pub struct AlertChannels {
    pub event_rx: mpsc::UnboundedReceiver<AlertEvent>,
    pub control_rx: mpsc::UnboundedReceiver<AlertControl>,
}

/// Run the dispatcher until every sender is gone.
pub async fn alert_dispatcher_task(
    state: Arc<AppState>,
    channels: AlertChannels,
    sound: SoundPlayer,
) {
    let AlertChannels {
        mut event_rx,
        mut control_rx,
    } = channels;
    let mut deadline: Option<time::Instant> = None;
    info!("Starting alert dispatcher");

    loop {
        tokio::select! {
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                raise(&state, &sound, &mut deadline, event);
            }
            control = control_rx.recv() => {
                match control {
                    Some(AlertControl::Acknowledge) => {
                        info!("Alert acknowledged");
                        clear(&state, &sound, &mut deadline);
                    }
                    Some(AlertControl::CancelTimer(timer_id)) => {
                        if alert_is_for(&state, &timer_id) {
                            debug!("Cancelling alert for reset timer {}", timer_id);
                            clear(&state, &sound, &mut deadline);
                        }
                    }
                    None => break,
                }
            }
            _ = wait_deadline(deadline) => {
                debug!("Checkpoint alert timed out");
                clear(&state, &sound, &mut deadline);
            }
        }
    }

    sound.stop();
    info!("Alert dispatcher stopped");
}

async fn wait_deadline(deadline: Option<time::Instant>) {
    match deadline {
        Some(instant) => time::sleep_until(instant).await,
        None => future::pending().await,
    }
}

fn alert_is_for(state: &AppState, timer_id: &str) -> bool {
    match state.get_active_alert() {
        Ok(Some(alert)) => alert.timer_id == timer_id,
        Ok(None) => false,
        Err(e) => {
            error!("Failed to read active alert: {}", e);
            false
        }
    }
}

fn raise(
    state: &AppState,
    sound: &SoundPlayer,
    deadline: &mut Option<time::Instant>,
    event: AlertEvent,
) {
    let (message, kind, timeout) = match event.kind {
        AlertKind::Checkpoint { elapsed } => (
            format!("{}: checkpoint at {}", event.label, format_mmss(elapsed)),
            "checkpoint",
            Some(CHECKPOINT_DISMISS),
        ),
        AlertKind::Completion => (
            format!("{}: timer complete", event.label),
            "completion",
            None,
        ),
    };

    // Starting a new tone replaces whatever is currently playing.
    match event.kind {
        AlertKind::Checkpoint { .. } => sound.play_checkpoint(),
        AlertKind::Completion => sound.play_completion(),
    }

    info!("Alert raised: {}", message);
    if let Err(e) = state.set_active_alert(Some(ActiveAlert {
        timer_id: event.timer_id,
        kind: kind.to_string(),
        message,
        raised_at: Utc::now(),
    })) {
        error!("Failed to record active alert: {}", e);
    }
    *deadline = timeout.map(|t| time::Instant::now() + t);
}

fn clear(state: &AppState, sound: &SoundPlayer, deadline: &mut Option<time::Instant>) {
    sound.stop();
    if let Err(e) = state.set_active_alert(None) {
        error!("Failed to clear active alert: {}", e);
    }
    *deadline = None;
}
