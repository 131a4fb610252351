//! The game state container.
//!
//! `GameState` gathers every slot in memory. It is owned by a
//! [`Session`](crate::session::Session); nothing global holds it.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::calendar::deserialize_lenient_datetime;
use crate::error::ValidationError;
use crate::history::{MonthlyHistory, WeeklyHistory};
use crate::report::{MonthlyReport, WeeklyReport};
use crate::reward::{MonthlyReward, WeeklyReward};
use crate::stats::UserStats;
use crate::storage::slots::{load_slot, save_slot, Slot, SlotStore};
use crate::task::{sort_tasks, Task};

/// The person behind the character.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub name: String,
    #[serde(default)]
    pub age: u32,
    /// Centimetres
    #[serde(default)]
    pub height: f64,
    /// Kilograms
    #[serde(default)]
    pub weight: f64,
    #[serde(default, deserialize_with = "deserialize_lenient_datetime")]
    pub created_at: Option<NaiveDateTime>,
}

impl PlayerProfile {
    pub fn new(name: &str, age: u32, height: f64, weight: f64) -> Result<Self, ValidationError> {
        let mut profile = Self {
            name: String::new(),
            age: 0,
            height: 0.0,
            weight: 0.0,
            created_at: None,
        };
        profile.apply(ProfileUpdate {
            name: Some(name.to_string()),
            age: Some(age),
            height: Some(height),
            weight: Some(weight),
        })?;
        Ok(profile)
    }

    /// Apply a partial update. Nothing changes when validation fails.
    pub fn apply(&mut self, update: ProfileUpdate) -> Result<(), ValidationError> {
        let name = match update.name {
            Some(name) if name.trim().is_empty() => {
                return Err(ValidationError::InvalidValue {
                    field: "name".into(),
                    message: "must not be empty".into(),
                })
            }
            Some(name) => Some(name.trim().to_string()),
            None => None,
        };
        for (field, value) in [("height", update.height), ("weight", update.weight)] {
            if matches!(value, Some(v) if !v.is_finite() || v < 0.0) {
                return Err(ValidationError::InvalidValue {
                    field: field.into(),
                    message: "must be a non-negative number".into(),
                });
            }
        }

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(age) = update.age {
            self.age = age;
        }
        if let Some(height) = update.height {
            self.height = height;
        }
        if let Some(weight) = update.weight {
            self.weight = weight;
        }
        Ok(())
    }
}

/// Partial profile edit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
}

/// Everything persisted across activations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GameState {
    pub profile: Option<PlayerProfile>,
    pub stats: UserStats,
    pub tasks: Vec<Task>,
    pub weekly_history: Vec<WeeklyHistory>,
    pub monthly_history: Vec<MonthlyHistory>,
    pub weekly_reports: Vec<WeeklyReport>,
    pub monthly_reports: Vec<MonthlyReport>,
    pub weekly_rewards: Vec<WeeklyReward>,
    pub monthly_rewards: Vec<MonthlyReward>,
    /// Presentation settings, carried through untouched.
    pub settings: serde_json::Value,
}

impl GameState {
    /// Read every slot, deep-merging partial records against defaults.
    pub fn load<S: SlotStore + ?Sized>(store: &S) -> Self {
        let mut tasks: Vec<Task> = load_slot(store, Slot::Tasks);
        sort_tasks(&mut tasks);

        Self {
            profile: load_slot(store, Slot::Profile),
            stats: load_slot(store, Slot::Stats),
            tasks,
            weekly_history: load_slot(store, Slot::WeeklyHistory),
            monthly_history: load_slot(store, Slot::MonthlyHistory),
            weekly_reports: load_slot(store, Slot::WeeklyReports),
            monthly_reports: load_slot(store, Slot::MonthlyReports),
            weekly_rewards: load_slot(store, Slot::WeeklyRewards),
            monthly_rewards: load_slot(store, Slot::MonthlyRewards),
            settings: load_slot(store, Slot::Settings),
        }
    }

    /// Write every slot. Returns `false` if any write failed.
    pub fn save<S: SlotStore + ?Sized>(&self, store: &mut S) -> bool {
        let mut ok = true;
        if let Some(profile) = &self.profile {
            ok &= save_slot(store, Slot::Profile, profile);
        }
        ok &= save_slot(store, Slot::Stats, &self.stats);
        ok &= save_slot(store, Slot::Tasks, &self.tasks);
        ok &= save_slot(store, Slot::WeeklyHistory, &self.weekly_history);
        ok &= save_slot(store, Slot::MonthlyHistory, &self.monthly_history);
        ok &= save_slot(store, Slot::WeeklyReports, &self.weekly_reports);
        ok &= save_slot(store, Slot::MonthlyReports, &self.monthly_reports);
        ok &= save_slot(store, Slot::WeeklyRewards, &self.weekly_rewards);
        ok &= save_slot(store, Slot::MonthlyRewards, &self.monthly_rewards);
        if !self.settings.is_null() {
            ok &= save_slot(store, Slot::Settings, &self.settings);
        }
        ok
    }

    pub fn find_task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn has_active_shadow(&self) -> bool {
        self.tasks.iter().any(Task::is_active_shadow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::slots::MemoryStore;

    #[test]
    fn empty_store_loads_defaults() {
        let state = GameState::load(&MemoryStore::new());
        assert!(state.profile.is_none());
        assert_eq!(state.stats, UserStats::default());
        assert!(state.tasks.is_empty());
        assert!(state.settings.is_null());
    }

    #[test]
    fn save_and_reload() {
        let mut store = MemoryStore::new();
        let state = GameState {
            profile: Some(PlayerProfile {
                name: "Sung".into(),
                age: 24,
                height: 180.0,
                weight: 75.5,
                created_at: None,
            }),
            settings: serde_json::json!({"language": "en"}),
            ..GameState::default()
        };
        assert!(state.save(&mut store));
        let reloaded = GameState::load(&store);
        assert_eq!(reloaded, state);
    }

    #[test]
    fn profile_update_validates_before_applying() {
        let mut profile = PlayerProfile::new(" Jin ", 20, 175.0, 70.0).unwrap();
        assert_eq!(profile.name, "Jin");

        let err = profile
            .apply(ProfileUpdate {
                age: Some(40),
                weight: Some(-1.0),
                ..ProfileUpdate::default()
            })
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { .. }));
        assert_eq!(profile.age, 20);

        profile
            .apply(ProfileUpdate {
                age: Some(21),
                ..ProfileUpdate::default()
            })
            .unwrap();
        assert_eq!(profile.age, 21);
        assert!(PlayerProfile::new("  ", 1, 1.0, 1.0).is_err());
    }

    #[test]
    fn profile_accepts_iso_timestamp() {
        let profile: PlayerProfile = serde_json::from_str(
            r#"{"name": "A", "age": 30, "height": 170, "weight": 70, "createdAt": "2024-06-01T08:00:00.000Z"}"#,
        )
        .unwrap();
        assert!(profile.created_at.is_some());
        assert_eq!(profile.height, 170.0);
    }
}
