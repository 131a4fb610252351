//! Named JSON slots.
//!
//! Every piece of state is one JSON document under a fixed key. Loads never
//! fail: an absent or malformed slot yields the type's default and a
//! warning. Saves never panic and report success as `bool`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::StorageError;

/// Pre-v2 task storage: an object of pillar name to task array.
pub const LEGACY_PILLARS_KEY: &str = "game_pillars";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Profile,
    Stats,
    Tasks,
    WeeklyHistory,
    MonthlyHistory,
    WeeklyReports,
    MonthlyReports,
    WeeklyRewards,
    MonthlyRewards,
    Settings,
    SchemaVersion,
}

impl Slot {
    pub const ALL: [Slot; 11] = [
        Slot::Stats,
        Slot::Tasks,
        Slot::Settings,
        Slot::Profile,
        Slot::WeeklyHistory,
        Slot::MonthlyHistory,
        Slot::WeeklyReports,
        Slot::MonthlyReports,
        Slot::WeeklyRewards,
        Slot::MonthlyRewards,
        Slot::SchemaVersion,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Slot::Profile => "game_player",
            Slot::Stats => "game_stats",
            Slot::Tasks => "game_tasks_v2",
            Slot::WeeklyHistory => "game_history_weeks",
            Slot::MonthlyHistory => "game_history_months",
            Slot::WeeklyReports => "game_reports_weekly",
            Slot::MonthlyReports => "game_reports_monthly",
            Slot::WeeklyRewards => "game_rewards_weekly",
            Slot::MonthlyRewards => "game_rewards_monthly",
            Slot::Settings => "game_settings",
            Slot::SchemaVersion => "game_version",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|slot| slot.key() == key)
    }
}

/// Raw key/value medium holding serialized slots.
pub trait SlotStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;

    /// Remove every slot plus the legacy task key.
    fn clear_all(&mut self) -> Result<(), StorageError> {
        for key in managed_keys() {
            self.remove(key)?;
        }
        Ok(())
    }

    /// Replace every slot with `entries` as one unit.
    ///
    /// On failure the previous contents are written back before the error
    /// is returned. Stores with native transactions override this.
    fn replace_all(&mut self, entries: &[(Slot, String)]) -> Result<(), StorageError> {
        let mut previous = Vec::new();
        for key in managed_keys() {
            if let Some(value) = self.read(key)? {
                previous.push((key, value));
            }
        }

        let Err(e) = clear_and_write(self, entries) else {
            return Ok(());
        };
        tracing::warn!("slot replacement failed, restoring previous contents: {e}");
        if let Err(undo) = self.clear_all() {
            tracing::warn!("failed to clear partial slots: {undo}");
        }
        for (key, value) in &previous {
            if let Err(undo) = self.write(key, value) {
                tracing::warn!(key = *key, "failed to restore slot: {undo}");
            }
        }
        Err(e)
    }
}

/// Every key the store owns: all slots plus the legacy task key.
pub fn managed_keys() -> impl Iterator<Item = &'static str> {
    Slot::ALL
        .into_iter()
        .map(Slot::key)
        .chain(std::iter::once(LEGACY_PILLARS_KEY))
}

fn clear_and_write<S: SlotStore + ?Sized>(
    store: &mut S,
    entries: &[(Slot, String)],
) -> Result<(), StorageError> {
    store.clear_all()?;
    for (slot, value) in entries {
        store.write(slot.key(), value)?;
    }
    Ok(())
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write fail, to exercise persistence-failure handling.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SlotStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::Locked);
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::Locked);
        }
        self.entries.remove(key);
        Ok(())
    }
}

/// Load a slot, falling back to `T::default()` when absent or malformed.
pub fn load_slot<T, S>(store: &S, slot: Slot) -> T
where
    T: DeserializeOwned + Default,
    S: SlotStore + ?Sized,
{
    match store.read(slot.key()) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = slot.key(), "malformed slot, using default: {e}");
                T::default()
            }
        },
        Ok(None) => T::default(),
        Err(e) => {
            tracing::warn!(key = slot.key(), "failed to read slot: {e}");
            T::default()
        }
    }
}

/// Canonical JSON text for a value: object keys sorted, no whitespace.
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let tree = serde_json::to_value(value)?;
    serde_json::to_string(&tree)
}

/// Save a slot. Failures are logged and reported as `false`.
pub fn save_slot<T, S>(store: &mut S, slot: Slot, value: &T) -> bool
where
    T: Serialize + ?Sized,
    S: SlotStore + ?Sized,
{
    let text = match canonical_json(value) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(key = slot.key(), "failed to serialize slot: {e}");
            return false;
        }
    };
    match store.write(slot.key(), &text) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(key = slot.key(), "failed to save slot: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::UserStats;

    #[test]
    fn keys_round_trip() {
        for slot in Slot::ALL {
            assert_eq!(Slot::from_key(slot.key()), Some(slot));
        }
        assert_eq!(Slot::from_key("game_pillars"), None);
    }

    #[test]
    fn absent_slot_loads_default() {
        let store = MemoryStore::new();
        let tasks: Vec<crate::task::Task> = load_slot(&store, Slot::Tasks);
        assert!(tasks.is_empty());
    }

    #[test]
    fn malformed_slot_loads_default() {
        let mut store = MemoryStore::new();
        store.write(Slot::Stats.key(), "{not json").unwrap();
        let stats: UserStats = load_slot(&store, Slot::Stats);
        assert_eq!(stats, UserStats::default());
    }

    #[test]
    fn save_then_load() {
        let mut store = MemoryStore::new();
        let stats = UserStats {
            level: 7,
            ..UserStats::default()
        };
        assert!(save_slot(&mut store, Slot::Stats, &stats));
        let loaded: UserStats = load_slot(&store, Slot::Stats);
        assert_eq!(loaded.level, 7);
    }

    #[test]
    fn failed_write_returns_false() {
        let mut store = MemoryStore::new();
        store.set_read_only(true);
        assert!(!save_slot(&mut store, Slot::Stats, &UserStats::default()));
        assert!(store.is_empty());
    }

    #[test]
    fn canonical_json_sorts_keys() {
        let text = canonical_json(&serde_json::json!({"b": 1, "a": {"d": 2, "c": 3}})).unwrap();
        assert_eq!(text, r#"{"a":{"c":3,"d":2},"b":1}"#);
    }

    #[test]
    fn clear_all_removes_legacy_key() {
        let mut store = MemoryStore::new();
        store.write(LEGACY_PILLARS_KEY, "{}").unwrap();
        store.write(Slot::Tasks.key(), "[]").unwrap();
        store.clear_all().unwrap();
        assert!(store.is_empty());
    }
}
