//! Countdown engine background task
//!
//! One task per visible timer. The task owns the timer's `CountdownCore` and
//! a one-second ticker that exists only while the countdown runs: leaving the
//! running state drops the ticker, so no stray tick can decrement a timer the
//! user believes is stopped. Commands arrive on a per-engine control channel
//! (the individual play/pause/reset buttons) and on the global command bus.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, warn};

use crate::state::bus::{CommandKind, GlobalCommand};
use crate::state::countdown::{CountdownCore, TickEvent};
use crate::state::registry::LiveEntry;
use crate::state::timer::Timer;
use crate::state::AppState;

use super::alerts::{AlertControl, AlertEvent, AlertKind};

const TICK: Duration = Duration::from_secs(1);

/// Direct control commands for one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCommand {
    Start,
    Pause,
    Reset,
    Shutdown,
}

/// Sender half held in the engine table.
#[derive(Debug)]
pub struct EngineHandle {
    pub control_tx: mpsc::UnboundedSender<EngineCommand>,
}

/// Spawn the countdown engine for a freshly created timer.
///
/// The initial registry entry is published here so the timer is visible to
/// reads immediately; from then on the engine task owns the entry.
pub fn spawn_engine(state: &Arc<AppState>, timer: Timer) -> Result<(), String> {
    let (control_tx, control_rx) = mpsc::unbounded_channel();
    state.registry.publish(
        &timer.id,
        LiveEntry {
            time_left: timer.duration,
            is_running: false,
        },
    )?;
    state.register_engine(&timer.id, EngineHandle { control_tx })?;
    let task_state = Arc::clone(state);
    tokio::spawn(async move {
        countdown_task(timer, task_state, control_rx).await;
    });
    Ok(())
}

/// Drive one timer's countdown until shutdown.
pub async fn countdown_task(
    timer: Timer,
    state: Arc<AppState>,
    mut control_rx: mpsc::UnboundedReceiver<EngineCommand>,
) {
    let mut core = CountdownCore::new(timer.duration, &timer.intervals);
    let mut bus_rx = state.command_bus.subscribe();
    debug!("Engine started for timer {} ({})", timer.id, timer.label);

    'engine: loop {
        // Idle: nothing ticks; wait for a command that can start the clock.
        while !core.is_running() {
            tokio::select! {
                command = control_rx.recv() => {
                    if apply_control(command, &timer, &state, &mut core) {
                        break 'engine;
                    }
                }
                received = bus_rx.recv() => {
                    if apply_global(received, &timer, &state, &mut core) {
                        break 'engine;
                    }
                }
            }
        }

        // Running: one decrement per wall-clock second. Missed ticks are
        // skipped, never replayed.
        let mut ticker = time::interval_at(time::Instant::now() + TICK, TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        while core.is_running() {
            tokio::select! {
                _ = ticker.tick() => {
                    let event = core.tick();
                    publish(&state, &timer.id, &core);
                    emit_alert(&state, &timer, event);
                }
                command = control_rx.recv() => {
                    if apply_control(command, &timer, &state, &mut core) {
                        break 'engine;
                    }
                }
                received = bus_rx.recv() => {
                    if apply_global(received, &timer, &state, &mut core) {
                        break 'engine;
                    }
                }
            }
        }
        // The ticker drops here; a paused engine holds no pending tick.
    }

    // The timer left the visible set; its entry must not linger even if a
    // final tick published between the delete and the shutdown.
    if let Err(e) = state.registry.remove(&timer.id) {
        error!("Failed to drop live entry for {}: {}", timer.id, e);
    }
    debug!("Engine stopped for timer {}", timer.id);
}

/// Apply a direct command. Returns true when the engine must exit.
fn apply_control(
    command: Option<EngineCommand>,
    timer: &Timer,
    state: &AppState,
    core: &mut CountdownCore,
) -> bool {
    match command {
        Some(EngineCommand::Start) => core.start(),
        Some(EngineCommand::Pause) => core.pause(),
        Some(EngineCommand::Reset) => {
            core.reset();
            // A reset timer must not keep ringing.
            if state
                .alert_ctl_tx
                .send(AlertControl::CancelTimer(timer.id.clone()))
                .is_err()
            {
                warn!("Alert dispatcher unreachable while resetting {}", timer.id);
            }
        }
        Some(EngineCommand::Shutdown) | None => return true,
    }
    publish(state, &timer.id, core);
    false
}

/// Apply a bus emission. Returns true when the engine must exit.
fn apply_global(
    received: Result<GlobalCommand, RecvError>,
    timer: &Timer,
    state: &AppState,
    core: &mut CountdownCore,
) -> bool {
    match received {
        Ok(command) => {
            if command.user_id != timer.user_id {
                return false;
            }
            match command.command {
                CommandKind::Play => core.start(),
                CommandKind::Pause => core.pause(),
            }
            publish(state, &timer.id, core);
            false
        }
        Err(RecvError::Lagged(missed)) => {
            warn!("Engine {} missed {} global commands", timer.id, missed);
            false
        }
        Err(RecvError::Closed) => true,
    }
}

fn publish(state: &AppState, id: &str, core: &CountdownCore) {
    if let Err(e) = state.registry.publish(id, core.snapshot()) {
        error!("Failed to publish live entry for {}: {}", id, e);
    }
}

fn emit_alert(state: &AppState, timer: &Timer, event: TickEvent) {
    let kind = match event {
        TickEvent::None => return,
        TickEvent::Checkpoint { elapsed } => AlertKind::Checkpoint { elapsed },
        TickEvent::Completed => AlertKind::Completion,
    };
    let alert = AlertEvent {
        timer_id: timer.id.clone(),
        label: timer.label.clone(),
        kind,
    };
    if state.alert_tx.send(alert).is_err() {
        warn!("Alert dispatcher unreachable for timer {}", timer.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tokio::time::advance;

    fn timer(id: &str, user: &str, duration: u32, intervals: Vec<u32>) -> Timer {
        Timer {
            id: id.to_string(),
            user_id: user.to_string(),
            label: id.to_string(),
            color: "#FF5733".to_string(),
            duration,
            intervals,
            created_at: Utc::now(),
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    async fn pass_seconds(n: u32) {
        for _ in 0..n {
            advance(Duration::from_secs(1)).await;
            settle().await;
        }
    }

    fn live(state: &AppState, id: &str) -> LiveEntry {
        state.registry.get(id).unwrap().unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_second_until_completion() {
        let (state, mut channels) = AppState::new(0, "test".to_string());
        let state = Arc::new(state);
        spawn_engine(&state, timer("t", "u", 3, vec![1, 2])).unwrap();
        settle().await;
        assert_eq!(live(&state, "t"), LiveEntry { time_left: 3, is_running: false });

        state.control_engine("t", EngineCommand::Start).unwrap();
        settle().await;
        assert_eq!(live(&state, "t"), LiveEntry { time_left: 3, is_running: true });

        pass_seconds(1).await;
        assert_eq!(live(&state, "t"), LiveEntry { time_left: 2, is_running: true });
        let event = channels.event_rx.try_recv().unwrap();
        assert_eq!(event.kind, AlertKind::Checkpoint { elapsed: 1 });

        pass_seconds(1).await;
        assert_eq!(live(&state, "t"), LiveEntry { time_left: 1, is_running: true });
        assert!(channels.event_rx.try_recv().is_err());

        pass_seconds(1).await;
        assert_eq!(live(&state, "t"), LiveEntry { time_left: 0, is_running: false });
        let event = channels.event_rx.try_recv().unwrap();
        assert_eq!(event.kind, AlertKind::Completion);

        // Nothing ticks past zero.
        pass_seconds(5).await;
        assert_eq!(live(&state, "t"), LiveEntry { time_left: 0, is_running: false });
        assert!(channels.event_rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_cancels_the_pending_tick() {
        let (state, _channels) = AppState::new(0, "test".to_string());
        let state = Arc::new(state);
        spawn_engine(&state, timer("t", "u", 10, vec![])).unwrap();
        settle().await;

        state.control_engine("t", EngineCommand::Start).unwrap();
        settle().await;
        pass_seconds(3).await;
        assert_eq!(live(&state, "t"), LiveEntry { time_left: 7, is_running: true });

        state.control_engine("t", EngineCommand::Pause).unwrap();
        settle().await;
        pass_seconds(5).await;
        assert_eq!(live(&state, "t"), LiveEntry { time_left: 7, is_running: false });
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_global_pause_still_applies() {
        let (state, _channels) = AppState::new(0, "test".to_string());
        let state = Arc::new(state);
        spawn_engine(&state, timer("a", "u", 30, vec![])).unwrap();
        spawn_engine(&state, timer("b", "u", 60, vec![])).unwrap();
        settle().await;

        state.control_engine("a", EngineCommand::Start).unwrap();
        settle().await;
        state.issue_command("u", CommandKind::Pause);
        settle().await;
        assert!(!live(&state, "a").is_running);

        // Restart one engine; a second identical pause must still reach it.
        state.control_engine("a", EngineCommand::Start).unwrap();
        settle().await;
        assert!(live(&state, "a").is_running);
        state.issue_command("u", CommandKind::Pause);
        settle().await;
        assert!(!live(&state, "a").is_running);
        assert!(!live(&state, "b").is_running);
    }

    #[tokio::test(start_paused = true)]
    async fn global_commands_are_scoped_to_their_user() {
        let (state, _channels) = AppState::new(0, "test".to_string());
        let state = Arc::new(state);
        spawn_engine(&state, timer("mine", "u1", 30, vec![])).unwrap();
        spawn_engine(&state, timer("theirs", "u2", 30, vec![])).unwrap();
        settle().await;

        state.issue_command("u1", CommandKind::Play);
        settle().await;
        assert!(live(&state, "mine").is_running);
        assert!(!live(&state, "theirs").is_running);
    }

    #[tokio::test(start_paused = true)]
    async fn global_play_skips_completed_timers() {
        let (state, mut channels) = AppState::new(0, "test".to_string());
        let state = Arc::new(state);
        spawn_engine(&state, timer("t", "u", 1, vec![])).unwrap();
        settle().await;

        state.control_engine("t", EngineCommand::Start).unwrap();
        settle().await;
        pass_seconds(1).await;
        assert_eq!(live(&state, "t"), LiveEntry { time_left: 0, is_running: false });
        assert_eq!(channels.event_rx.try_recv().unwrap().kind, AlertKind::Completion);

        state.issue_command("u", CommandKind::Play);
        settle().await;
        assert!(!live(&state, "t").is_running);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_rearms_the_timer_and_cancels_its_alert() {
        let (state, mut channels) = AppState::new(0, "test".to_string());
        let state = Arc::new(state);
        spawn_engine(&state, timer("t", "u", 2, vec![1, 1])).unwrap();
        settle().await;

        state.control_engine("t", EngineCommand::Start).unwrap();
        settle().await;
        pass_seconds(1).await;
        assert_eq!(
            channels.event_rx.try_recv().unwrap().kind,
            AlertKind::Checkpoint { elapsed: 1 }
        );

        state.control_engine("t", EngineCommand::Reset).unwrap();
        settle().await;
        assert_eq!(
            channels.control_rx.try_recv().unwrap(),
            AlertControl::CancelTimer("t".to_string())
        );
        assert_eq!(live(&state, "t"), LiveEntry { time_left: 2, is_running: false });

        // A reset timer must not keep ticking.
        pass_seconds(3).await;
        assert_eq!(live(&state, "t"), LiveEntry { time_left: 2, is_running: false });
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_the_engine_and_clears_the_entry() {
        let (state, _channels) = AppState::new(0, "test".to_string());
        let state = Arc::new(state);
        spawn_engine(&state, timer("t", "u", 10, vec![])).unwrap();
        settle().await;

        state.control_engine("t", EngineCommand::Start).unwrap();
        settle().await;
        state.stop_engine("t").unwrap();
        settle().await;
        assert_eq!(state.registry.get("t").unwrap(), None);
        assert!(state.control_engine("t", EngineCommand::Pause).is_err());

        // The stopped engine publishes nothing further.
        pass_seconds(2).await;
        assert_eq!(state.registry.get("t").unwrap(), None);
    }
}
