//! Main application state management

use std::{
    collections::HashMap,
    sync::Mutex,
    time::Instant,
};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::tasks::alerts::{ActiveAlert, AlertChannels, AlertControl, AlertEvent};
use crate::tasks::countdown::{EngineCommand, EngineHandle};

use super::{
    bus::{CommandBus, CommandKind, GlobalCommand},
    registry::LiveRegistry,
    store::TimerStore,
};

/// Shared state behind every handler and background task.
#[derive(Debug)]
pub struct AppState {
    /// Persisted timer definitions, partitioned by user.
    pub store: TimerStore,
    /// Latest countdown snapshot per timer, written by the engines.
    pub registry: LiveRegistry,
    /// Broadcast channel for play-all/pause-all commands.
    pub command_bus: CommandBus,
    /// Control handle for each live countdown engine.
    engines: Mutex<HashMap<String, EngineHandle>>,
    /// Checkpoint/completion events flowing to the alert dispatcher.
    pub alert_tx: mpsc::UnboundedSender<AlertEvent>,
    /// Acknowledge/cancel instructions for the alert dispatcher.
    pub alert_ctl_tx: mpsc::UnboundedSender<AlertControl>,
    /// The currently raised alert, written only by the dispatcher.
    active_alert: Mutex<Option<ActiveAlert>>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
}

impl AppState {
    /// Create the state plus the receiving ends the alert dispatcher owns.
    pub fn new(port: u16, host: String) -> (Self, AlertChannels) {
        let (alert_tx, event_rx) = mpsc::unbounded_channel();
        let (alert_ctl_tx, control_rx) = mpsc::unbounded_channel();
        let state = Self {
            store: TimerStore::new(),
            registry: LiveRegistry::new(),
            command_bus: CommandBus::new(),
            engines: Mutex::new(HashMap::new()),
            alert_tx,
            alert_ctl_tx,
            active_alert: Mutex::new(None),
            start_time: Instant::now(),
            port,
            host,
        };
        (state, AlertChannels { event_rx, control_rx })
    }

    /// Record the control handle for a newly spawned engine.
    pub fn register_engine(&self, id: &str, handle: EngineHandle) -> Result<(), String> {
        let mut engines = self
            .engines
            .lock()
            .map_err(|e| format!("Failed to lock engine table: {}", e))?;
        engines.insert(id.to_string(), handle);
        Ok(())
    }

    /// Send a control command to one engine.
    pub fn control_engine(&self, id: &str, command: EngineCommand) -> Result<(), String> {
        let engines = self
            .engines
            .lock()
            .map_err(|e| format!("Failed to lock engine table: {}", e))?;
        let handle = engines
            .get(id)
            .ok_or_else(|| format!("No engine for timer {}", id))?;
        handle
            .control_tx
            .send(command)
            .map_err(|e| format!("Engine for timer {} is gone: {}", id, e))
    }

    /// Shut down a deleted timer's engine and drop its registry entry.
    pub fn stop_engine(&self, id: &str) -> Result<(), String> {
        let handle = {
            let mut engines = self
                .engines
                .lock()
                .map_err(|e| format!("Failed to lock engine table: {}", e))?;
            engines.remove(id)
        };
        match handle {
            Some(handle) => {
                if handle.control_tx.send(EngineCommand::Shutdown).is_err() {
                    debug!("Engine for timer {} already exited", id);
                }
            }
            None => warn!("Stop requested for unknown engine {}", id),
        }
        self.registry.remove(id)?;
        Ok(())
    }

    /// Broadcast a global command for this user's engines.
    pub fn issue_command(&self, user_id: &str, command: CommandKind) -> GlobalCommand {
        self.command_bus.issue(user_id, command)
    }

    /// Replace the currently raised alert (dispatcher only).
    pub fn set_active_alert(&self, alert: Option<ActiveAlert>) -> Result<(), String> {
        let mut active = self
            .active_alert
            .lock()
            .map_err(|e| format!("Failed to lock active alert: {}", e))?;
        *active = alert;
        Ok(())
    }

    pub fn get_active_alert(&self) -> Result<Option<ActiveAlert>, String> {
        self.active_alert
            .lock()
            .map(|alert| alert.clone())
            .map_err(|e| format!("Failed to lock active alert: {}", e))
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}
