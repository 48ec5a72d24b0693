//! Ringclock - a state-managed multi-timer server
//!
//! Users create labeled countdown timers split into sequential sub-intervals,
//! run them concurrently, and get alerted at every checkpoint and at
//! completion. One background engine per timer drives the countdown; a shared
//! command bus carries play-all/pause-all; the live registry aggregates every
//! engine's latest state for the radial clock projection.

pub mod api;
pub mod config;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use state::AppState;
pub use utils::signals::shutdown_signal;
