//! Slot schema migrations.
//!
//! Migrations are versioned and applied before any slot is loaded.
//! The `game_version` slot tracks the current migration version.

use serde_json::Value;

use super::slots::{canonical_json, Slot, SlotStore, LEGACY_PILLARS_KEY};
use crate::error::StorageError;

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Apply all pending migrations. Returns the version the store ends at.
///
/// # Errors
/// Returns an error if the store cannot be read or written.
pub fn migrate<S: SlotStore + ?Sized>(store: &mut S) -> Result<u32, StorageError> {
    let current_version = get_schema_version(store)?;

    if current_version < 2 {
        migrate_v2(store)?;
    }

    if current_version < CURRENT_SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = CURRENT_SCHEMA_VERSION,
            "migrated slot schema"
        );
        set_schema_version(store, CURRENT_SCHEMA_VERSION)?;
        return Ok(CURRENT_SCHEMA_VERSION);
    }

    Ok(current_version)
}

/// Get the stored schema version.
///
/// Returns 0 if no version is set (initial store).
fn get_schema_version<S: SlotStore + ?Sized>(store: &S) -> Result<u32, StorageError> {
    let raw = match store.read(Slot::SchemaVersion.key())? {
        Some(raw) => raw,
        None => return Ok(0),
    };
    // Accept both `2` and `"2"`.
    let trimmed = raw.trim().trim_matches('"');
    Ok(trimmed.parse::<u32>().unwrap_or_else(|e| {
        tracing::warn!("unreadable schema version '{raw}': {e}");
        0
    }))
}

pub(crate) fn set_schema_version<S: SlotStore + ?Sized>(
    store: &mut S,
    version: u32,
) -> Result<(), StorageError> {
    store.write(Slot::SchemaVersion.key(), &version.to_string())
}

/// Migration v2: flatten the legacy pillar-keyed task object.
///
/// Every array value under `game_pillars` is concatenated into the flat
/// task slot and the legacy key is removed. An unreadable legacy value is
/// logged and left alone.
fn migrate_v2<S: SlotStore + ?Sized>(store: &mut S) -> Result<(), StorageError> {
    let raw = match store.read(LEGACY_PILLARS_KEY)? {
        Some(raw) => raw,
        None => return Ok(()),
    };

    let legacy: Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("legacy task data is unreadable, skipping flatten: {e}");
            return Ok(());
        }
    };

    let mut tasks: Vec<Value> = Vec::new();
    if let Value::Object(pillars) = legacy {
        for (_, entries) in pillars {
            if let Value::Array(items) = entries {
                tasks.extend(items);
            }
        }
    }

    let text = canonical_json(&tasks).map_err(|e| StorageError::MigrationFailed(e.to_string()))?;
    store.write(Slot::Tasks.key(), &text)?;
    store.remove(LEGACY_PILLARS_KEY)?;
    tracing::info!(count = tasks.len(), "flattened legacy pillar tasks");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::slots::{load_slot, MemoryStore};
    use crate::task::Task;

    const LEGACY: &str = r#"{
        "Learning": [
            {"id": "l1", "title": "Read", "pillar": "Learning", "completed": false,
             "energyCost": 8, "xpReward": 15, "createdAt": 1, "order": 0}
        ],
        "Exercise": [
            {"id": "e1", "title": "Run", "pillar": "Exercise", "completed": true,
             "energyCost": 12, "xpReward": 25, "createdAt": 2, "order": 1}
        ],
        "Quran": []
    }"#;

    #[test]
    fn fresh_store_is_stamped_current() {
        let mut store = MemoryStore::new();
        assert_eq!(migrate(&mut store).unwrap(), CURRENT_SCHEMA_VERSION);
        assert_eq!(
            store.read(Slot::SchemaVersion.key()).unwrap().as_deref(),
            Some("2")
        );
    }

    #[test]
    fn legacy_pillars_are_flattened() {
        let mut store = MemoryStore::new();
        store.write(LEGACY_PILLARS_KEY, LEGACY).unwrap();
        store.write(Slot::SchemaVersion.key(), "1").unwrap();

        migrate(&mut store).unwrap();

        let tasks: Vec<Task> = load_slot(&store, Slot::Tasks);
        let mut ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["e1", "l1"]);
        assert!(store.read(LEGACY_PILLARS_KEY).unwrap().is_none());
    }

    #[test]
    fn current_store_is_untouched() {
        let mut store = MemoryStore::new();
        store.write(LEGACY_PILLARS_KEY, LEGACY).unwrap();
        store.write(Slot::SchemaVersion.key(), "2").unwrap();

        migrate(&mut store).unwrap();
        assert!(store.read(LEGACY_PILLARS_KEY).unwrap().is_some());
        assert!(store.read(Slot::Tasks.key()).unwrap().is_none());
    }

    #[test]
    fn quoted_version_is_accepted() {
        let mut store = MemoryStore::new();
        store.write(Slot::SchemaVersion.key(), "\"2\"").unwrap();
        assert_eq!(migrate(&mut store).unwrap(), 2);
    }
}
