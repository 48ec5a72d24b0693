//! Global command bus
//!
//! A broadcast channel carrying play-all/pause-all commands from the shared
//! clock control to every live countdown engine. Each emission is a fresh
//! value with its own timestamp, so issuing the same command twice still
//! re-applies it to any engine that started in between. Individual per-timer
//! controls bypass the bus entirely.

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Play,
    Pause,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Play => "play",
            CommandKind::Pause => "pause",
        }
    }
}

/// One broadcast emission, scoped to the issuing user's timers.
#[derive(Debug, Clone)]
pub struct GlobalCommand {
    pub user_id: String,
    pub command: CommandKind,
    pub issued_at: DateTime<Utc>,
}

/// Single-writer broadcast slot with one receiver per engine.
#[derive(Debug)]
pub struct CommandBus {
    tx: broadcast::Sender<GlobalCommand>,
}

impl CommandBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(100);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GlobalCommand> {
        self.tx.subscribe()
    }

    /// Broadcast a command to every engine owned by `user_id`.
    pub fn issue(&self, user_id: &str, command: CommandKind) -> GlobalCommand {
        let issued = GlobalCommand {
            user_id: user_id.to_string(),
            command,
            issued_at: Utc::now(),
        };
        if self.tx.send(issued.clone()).is_err() {
            // No engines are alive; the command simply has no audience.
            debug!("Global {} command issued with no listeners", command.as_str());
        }
        issued
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_emission_reaches_every_subscriber() {
        let bus = CommandBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.issue("user", CommandKind::Pause);
        bus.issue("user", CommandKind::Pause);

        for rx in [&mut first, &mut second] {
            let one = rx.recv().await.unwrap();
            let two = rx.recv().await.unwrap();
            assert_eq!(one.command, CommandKind::Pause);
            assert_eq!(two.command, CommandKind::Pause);
        }
    }

    #[tokio::test]
    async fn issued_command_carries_user_and_kind() {
        let bus = CommandBus::new();
        let issued = bus.issue("user-1", CommandKind::Play);
        assert_eq!(issued.user_id, "user-1");
        assert_eq!(issued.command, CommandKind::Play);
    }
}
