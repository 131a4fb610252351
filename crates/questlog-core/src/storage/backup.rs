//! Backup export and import.
//!
//! A backup is a single JSON object holding every present slot under its
//! key, plus `_backup_date` and `_app_version` metadata.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::slots::{canonical_json, Slot, SlotStore};
use crate::error::{CoreError, ValidationError};
use crate::state::PlayerProfile;
use crate::stats::UserStats;

pub const BACKUP_DATE_KEY: &str = "_backup_date";
pub const APP_VERSION_KEY: &str = "_app_version";

/// Serialize every present slot into a pretty-printed bundle.
///
/// A slot holding unparseable text is skipped with a warning.
pub fn create_backup<S: SlotStore + ?Sized>(
    store: &S,
    created_at: DateTime<Utc>,
) -> Result<String, CoreError> {
    let mut bundle = Map::new();
    for slot in Slot::ALL {
        let Some(raw) = store.read(slot.key())? else {
            continue;
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => {
                bundle.insert(slot.key().to_string(), value);
            }
            Err(e) => tracing::warn!(key = slot.key(), "skipping unreadable slot in backup: {e}"),
        }
    }
    bundle.insert(
        BACKUP_DATE_KEY.to_string(),
        Value::String(created_at.to_rfc3339()),
    );
    bundle.insert(
        APP_VERSION_KEY.to_string(),
        Value::String(env!("CARGO_PKG_VERSION").to_string()),
    );

    Ok(serde_json::to_string_pretty(&Value::Object(bundle))?)
}

/// Replace every slot with the contents of a backup bundle.
///
/// The bundle must hold a player profile and a parseable stats record;
/// otherwise nothing in `store` is touched.
pub fn restore_backup<S: SlotStore + ?Sized>(store: &mut S, json: &str) -> Result<(), CoreError> {
    let data: Value = serde_json::from_str(json)
        .map_err(|e| ValidationError::InvalidBackup(format!("not valid JSON: {e}")))?;
    let Value::Object(bundle) = data else {
        return Err(ValidationError::InvalidBackup("expected a JSON object".into()).into());
    };

    let present = |slot: Slot| bundle.get(slot.key()).filter(|v| !v.is_null());

    let profile = present(Slot::Profile)
        .ok_or_else(|| ValidationError::InvalidBackup("missing player profile".into()))?;
    let stats = present(Slot::Stats)
        .ok_or_else(|| ValidationError::InvalidBackup("missing stats".into()))?;
    serde_json::from_value::<PlayerProfile>(profile.clone())
        .map_err(|e| ValidationError::InvalidBackup(format!("unreadable player profile: {e}")))?;
    serde_json::from_value::<UserStats>(stats.clone())
        .map_err(|e| ValidationError::InvalidBackup(format!("unreadable stats: {e}")))?;

    let mut staged = Vec::new();
    for slot in Slot::ALL {
        if let Some(value) = present(slot) {
            staged.push((slot, canonical_json(value)?));
        }
    }

    store.replace_all(&staged)?;
    tracing::info!(slots = staged.len(), "restored backup");
    Ok(())
}
