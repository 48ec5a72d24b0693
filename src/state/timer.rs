//! Timer records and creation-time validation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timeline;

/// The fixed ring color palette. No two timers of one user may share a color,
/// so a user can hold at most this many timers at once.
pub const ALLOWED_COLORS: [&str; 5] = [
    "#FF5733", // vibrant orange
    "#33FF57", // slime green
    "#3357FF", // electric blue
    "#F0F0F0", // minimalist white
    "#121212", // deep black
];

/// A persisted timer definition. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timer {
    pub id: String,
    pub user_id: String,
    pub label: String,
    pub color: String,
    /// Total seconds; equals the sum of `intervals` when intervals are present.
    pub duration: u32,
    /// Ordered sub-interval lengths in seconds. Empty means one implicit block.
    pub intervals: Vec<u32>,
    pub created_at: DateTime<Utc>,
}

impl Timer {
    /// Cumulative checkpoint offsets derived from `intervals`.
    pub fn checkpoints(&self) -> Vec<u32> {
        timeline::compute_checkpoints(&self.intervals)
    }
}

/// Payload for creating a timer, as submitted by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTimer {
    pub label: String,
    pub color: String,
    #[serde(default)]
    pub intervals: Vec<u32>,
    pub duration: u32,
}

impl NewTimer {
    /// Local validation, run before any state is touched.
    pub fn validate(&self) -> Result<(), String> {
        if self.label.trim().is_empty() {
            return Err("Timer label must not be empty".to_string());
        }
        if self.duration == 0 {
            return Err("Timer duration must be positive".to_string());
        }
        if self.intervals.iter().any(|&interval| interval == 0) {
            return Err("Every sub-interval must be positive".to_string());
        }
        if !self.intervals.is_empty() {
            let total: u32 = self.intervals.iter().sum();
            if total != self.duration {
                return Err(format!(
                    "Sub-intervals sum to {}s but duration is {}s",
                    total, self.duration
                ));
            }
        }
        Ok(())
    }
}

/// Resolve the color a new timer actually gets.
///
/// A color outside the palette, or one already taken by the same user, is
/// silently replaced with the first free palette color. Fails only when the
/// user already holds every palette color.
pub fn resolve_color(requested: &str, taken: &[String]) -> Result<String, String> {
    let is_taken = |color: &str| taken.iter().any(|t| t == color);
    if ALLOWED_COLORS.contains(&requested) && !is_taken(requested) {
        return Ok(requested.to_string());
    }
    ALLOWED_COLORS
        .iter()
        .find(|color| !is_taken(color))
        .map(|color| color.to_string())
        .ok_or_else(|| "All ring colors are in use; delete a timer first".to_string())
}
