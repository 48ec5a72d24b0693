//! Background tasks module
//!
//! One countdown engine task per timer, plus the single alert dispatcher that
//! all engines feed.

pub mod alerts;
pub mod countdown;

// Re-export main types
pub use alerts::{alert_dispatcher_task, ActiveAlert, AlertChannels, AlertControl, AlertEvent, AlertKind};
pub use countdown::{countdown_task, spawn_engine, EngineCommand, EngineHandle};
