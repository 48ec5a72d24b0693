//! Live aggregation registry
//!
//! Shared map of timer id to the latest countdown snapshot. Every engine
//! overwrites its own entry (and only its own) at least once per tick; the
//! clock projection reads the map to find the overall running state and the
//! next timer to complete.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Latest known countdown state for one timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveEntry {
    pub time_left: u32,
    pub is_running: bool,
}

/// Shared `timer_id -> LiveEntry` map, last-write-wins per key.
#[derive(Debug, Default)]
pub struct LiveRegistry {
    entries: Mutex<HashMap<String, LiveEntry>>,
}

impl LiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the entry for `id`. Each engine writes only its own key.
    pub fn publish(&self, id: &str, entry: LiveEntry) -> Result<(), String> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| format!("Failed to lock live registry: {}", e))?;
        entries.insert(id.to_string(), entry);
        Ok(())
    }

    /// Drop the entry for a deleted timer so it stops influencing reads.
    pub fn remove(&self, id: &str) -> Result<(), String> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| format!("Failed to lock live registry: {}", e))?;
        entries.remove(id);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<LiveEntry>, String> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| format!("Failed to lock live registry: {}", e))?;
        Ok(entries.get(id).copied())
    }

    pub fn snapshot(&self) -> Result<HashMap<String, LiveEntry>, String> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| format!("Failed to lock live registry: {}", e))?;
        Ok(entries.clone())
    }

    /// Snapshot restricted to the given timer ids.
    pub fn snapshot_for(&self, ids: &HashSet<String>) -> Result<HashMap<String, LiveEntry>, String> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| format!("Failed to lock live registry: {}", e))?;
        Ok(entries
            .iter()
            .filter(|(id, _)| ids.contains(*id))
            .map(|(id, entry)| (id.clone(), *entry))
            .collect())
    }

    pub fn any_running(&self) -> Result<bool, String> {
        Ok(any_running_in(&self.snapshot()?))
    }

    pub fn next_to_complete(&self) -> Result<Option<(String, LiveEntry)>, String> {
        Ok(next_to_complete_in(&self.snapshot()?))
    }
}

/// True iff at least one entry is running.
pub fn any_running_in(entries: &HashMap<String, LiveEntry>) -> bool {
    entries.values().any(|entry| entry.is_running)
}

/// The entry closest to completion: smallest positive `time_left` among
/// running entries, falling back to all entries, else none. Ties break on id
/// so the projection is stable between reads.
pub fn next_to_complete_in(entries: &HashMap<String, LiveEntry>) -> Option<(String, LiveEntry)> {
    let pick = |running_only: bool| {
        entries
            .iter()
            .filter(|(_, entry)| entry.time_left > 0 && (!running_only || entry.is_running))
            .min_by(|(a_id, a), (b_id, b)| a.time_left.cmp(&b.time_left).then(a_id.cmp(b_id)))
            .map(|(id, entry)| (id.clone(), *entry))
    };
    pick(true).or_else(|| pick(false))
}
