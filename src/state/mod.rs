//! State management module
//!
//! The data model (timer records and their derivations), the per-timer
//! countdown core, and the shared structures every engine instance talks to:
//! the live registry, the global command bus, and the application state root.

pub mod app_state;
pub mod bus;
pub mod clock;
pub mod countdown;
pub mod registry;
pub mod store;
pub mod timeline;
pub mod timer;

// Re-export main types
pub use app_state::AppState;
pub use bus::{CommandBus, CommandKind, GlobalCommand};
pub use countdown::{CountdownCore, TickEvent};
pub use registry::{LiveEntry, LiveRegistry};
pub use store::{StoreError, TimerStore};
pub use timer::{NewTimer, Timer, ALLOWED_COLORS};
