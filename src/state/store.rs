//! Timer record store
//!
//! In-process stand-in for the user-partitioned document collection: one
//! record per timer, keyed by opaque id, listed newest-first per user. Only
//! create, list, get and delete exist; records never change after creation.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Mutex;

use chrono::Utc;
use uuid::Uuid;

use super::timer::{resolve_color, NewTimer, Timer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NotFound,
    Forbidden,
    /// Rejected input discovered at store level (e.g. no free ring color).
    Invalid(String),
    Internal(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound => write!(f, "Timer not found"),
            StoreError::Forbidden => write!(f, "Not authorized to access this timer"),
            StoreError::Invalid(msg) => write!(f, "{}", msg),
            StoreError::Internal(msg) => write!(f, "{}", msg),
        }
    }
}

#[derive(Debug, Default)]
pub struct TimerStore {
    records: Mutex<HashMap<String, Timer>>,
}

impl TimerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Timer>>, StoreError> {
        self.records
            .lock()
            .map_err(|e| StoreError::Internal(format!("Failed to lock timer store: {}", e)))
    }

    /// Persist a validated draft for `user_id`, resolving its ring color
    /// against the user's existing timers.
    pub fn create(&self, user_id: &str, draft: &NewTimer) -> Result<Timer, StoreError> {
        let mut records = self.lock()?;
        let taken: Vec<String> = records
            .values()
            .filter(|timer| timer.user_id == user_id)
            .map(|timer| timer.color.clone())
            .collect();
        let color = resolve_color(&draft.color, &taken).map_err(StoreError::Invalid)?;
        let timer = Timer {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            label: draft.label.trim().to_string(),
            color,
            duration: draft.duration,
            intervals: draft.intervals.clone(),
            created_at: Utc::now(),
        };
        records.insert(timer.id.clone(), timer.clone());
        Ok(timer)
    }

    pub fn get(&self, id: &str) -> Result<Option<Timer>, StoreError> {
        Ok(self.lock()?.get(id).cloned())
    }

    /// All timers belonging to `user_id`, newest first.
    pub fn list(&self, user_id: &str) -> Result<Vec<Timer>, StoreError> {
        let records = self.lock()?;
        let mut timers: Vec<Timer> = records
            .values()
            .filter(|timer| timer.user_id == user_id)
            .cloned()
            .collect();
        timers.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(timers)
    }

    /// Ids of all timers belonging to `user_id`.
    pub fn ids_for(&self, user_id: &str) -> Result<HashSet<String>, StoreError> {
        let records = self.lock()?;
        Ok(records
            .values()
            .filter(|timer| timer.user_id == user_id)
            .map(|timer| timer.id.clone())
            .collect())
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }

    /// Delete `id` if it exists and belongs to `user_id`.
    pub fn delete(&self, user_id: &str, id: &str) -> Result<(), StoreError> {
        let mut records = self.lock()?;
        let owner = match records.get(id) {
            Some(timer) => timer.user_id.clone(),
            None => return Err(StoreError::NotFound),
        };
        if owner != user_id {
            return Err(StoreError::Forbidden);
        }
        records.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::timer::ALLOWED_COLORS;

    fn draft(label: &str, color: &str, duration: u32) -> NewTimer {
        NewTimer {
            label: label.to_string(),
            color: color.to_string(),
            intervals: vec![],
            duration,
        }
    }

    #[test]
    fn create_then_list_round_trips() {
        let store = TimerStore::new();
        let first = store.create("u1", &draft("First", ALLOWED_COLORS[0], 60)).unwrap();
        let second = store.create("u1", &draft("Second", ALLOWED_COLORS[1], 90)).unwrap();

        let listed = store.list("u1").unwrap();
        assert_eq!(listed.len(), 2);
        // newest first
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
        assert!(store.list("u2").unwrap().is_empty());
    }

    #[test]
    fn color_collisions_are_resolved_per_user() {
        let store = TimerStore::new();
        store.create("u1", &draft("A", ALLOWED_COLORS[0], 60)).unwrap();
        let clashing = store.create("u1", &draft("B", ALLOWED_COLORS[0], 60)).unwrap();
        assert_eq!(clashing.color, ALLOWED_COLORS[1]);

        // A different user is free to reuse the color.
        let other = store.create("u2", &draft("C", ALLOWED_COLORS[0], 60)).unwrap();
        assert_eq!(other.color, ALLOWED_COLORS[0]);
    }

    #[test]
    fn palette_exhaustion_rejects_creation() {
        let store = TimerStore::new();
        for color in ALLOWED_COLORS {
            store.create("u1", &draft("T", color, 60)).unwrap();
        }
        let result = store.create("u1", &draft("Overflow", ALLOWED_COLORS[0], 60));
        assert!(matches!(result, Err(StoreError::Invalid(_))));
    }

    #[test]
    fn delete_enforces_ownership() {
        let store = TimerStore::new();
        let timer = store.create("u1", &draft("Mine", ALLOWED_COLORS[0], 60)).unwrap();

        assert_eq!(store.delete("u2", &timer.id), Err(StoreError::Forbidden));
        assert_eq!(store.delete("u1", "missing"), Err(StoreError::NotFound));
        assert_eq!(store.delete("u1", &timer.id), Ok(()));
        assert_eq!(store.get(&timer.id).unwrap(), None);
    }

    #[test]
    fn labels_are_stored_trimmed() {
        let store = TimerStore::new();
        let timer = store.create("u1", &draft("  Deep Work  ", ALLOWED_COLORS[0], 60)).unwrap();
        assert_eq!(timer.label, "Deep Work");
    }
}
