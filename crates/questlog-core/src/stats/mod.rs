//! Character sheet for Questlog.
//!
//! `UserStats` is the persisted progression record: level, XP, energy,
//! streak, period accumulators and the daily quest / weekly challenge
//! extras. Every field has a default so partially-shaped saves merge
//! against a fresh character instead of failing to load.

mod challenge;
mod daily_quest;

pub use challenge::{complete_weekly_challenge, set_weekly_challenge, ChallengeOutcome};
pub use daily_quest::{update_daily_quest, DailyQuestOutcome, QuestExercise};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{deserialize_lenient_date, start_of_week};
use crate::economy::{Pillar, BASE_XP_PER_LEVEL, MAX_ENERGY};

/// Five hunter attributes. They only ever increase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HunterAttributes {
    pub strength: f64,
    pub intelligence: f64,
    pub vitality: f64,
    pub sense: f64,
    pub agility: f64,
}

impl Default for HunterAttributes {
    fn default() -> Self {
        Self {
            strength: 10.0,
            intelligence: 10.0,
            vitality: 10.0,
            sense: 10.0,
            agility: 10.0,
        }
    }
}

impl HunterAttributes {
    /// Raise the attribute trained by `pillar`.
    pub fn train(&mut self, pillar: Pillar, amount: f64) {
        let slot = match pillar {
            Pillar::Exercise => &mut self.strength,
            Pillar::Learning | Pillar::Studying => &mut self.intelligence,
            Pillar::Entertainment => &mut self.vitality,
            Pillar::Quran => &mut self.sense,
            Pillar::Work => &mut self.agility,
        };
        *slot += amount.max(0.0);
    }

    /// Level-up bonus: `amount` to every attribute.
    pub fn raise_all(&mut self, amount: f64) {
        let amount = amount.max(0.0);
        self.strength += amount;
        self.intelligence += amount;
        self.vitality += amount;
        self.sense += amount;
        self.agility += amount;
    }
}

/// Progress on today's fixed exercise quest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DailyQuestProgress {
    pub pushups: u32,
    pub situps: u32,
    pub squats: u32,
    /// Kilometres run.
    pub run: f64,
    pub is_completed: bool,
    #[serde(deserialize_with = "deserialize_lenient_date")]
    pub last_reset_date: Option<NaiveDate>,
}

impl DailyQuestProgress {
    /// Zeroed progress stamped with `today`.
    pub fn fresh(today: NaiveDate) -> Self {
        Self {
            last_reset_date: Some(today),
            ..Self::default()
        }
    }
}

/// Optional goal for the current week.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyChallenge {
    pub id: String,
    pub title: String,
    pub week_start: NaiveDate,
    #[serde(default)]
    pub completed: bool,
}

/// Persisted progression record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserStats {
    pub level: u32,
    pub current_xp: u32,
    pub max_xp: u32,
    pub energy: u32,
    pub max_energy: u32,
    pub streak: u32,
    #[serde(deserialize_with = "deserialize_lenient_date")]
    pub last_login_date: Option<NaiveDate>,
    #[serde(
        deserialize_with = "deserialize_lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_task_completion_date: Option<NaiveDate>,
    /// Regeneration checkpoint in epoch milliseconds.
    pub last_energy_update: Option<i64>,
    pub quran_pages_read: u32,
    pub quran_badges: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly_challenge: Option<WeeklyChallenge>,
    /// Canonical Saturday of the open period.
    #[serde(deserialize_with = "deserialize_lenient_date")]
    pub current_week_start: Option<NaiveDate>,
    pub weekly_xp_accumulated: u32,
    pub weekly_tasks_completed: u32,
    pub weekly_max_streak: u32,
    pub weekly_exercise_count: u32,
    pub weekly_missed_tasks: u32,
    pub weekly_xp_lost: u32,
    pub daily_quest: DailyQuestProgress,
    pub hunter_attributes: HunterAttributes,
}

impl Default for UserStats {
    fn default() -> Self {
        Self {
            level: 1,
            current_xp: 0,
            max_xp: BASE_XP_PER_LEVEL,
            energy: MAX_ENERGY,
            max_energy: MAX_ENERGY,
            streak: 0,
            last_login_date: None,
            last_task_completion_date: None,
            last_energy_update: None,
            quran_pages_read: 0,
            quran_badges: 0,
            weekly_challenge: None,
            current_week_start: None,
            weekly_xp_accumulated: 0,
            weekly_tasks_completed: 0,
            weekly_max_streak: 0,
            weekly_exercise_count: 0,
            weekly_missed_tasks: 0,
            weekly_xp_lost: 0,
            daily_quest: DailyQuestProgress::default(),
            hunter_attributes: HunterAttributes::default(),
        }
    }
}

impl UserStats {
    /// A fresh character whose period, login and quest are aligned to `today`.
    pub fn new_character(today: NaiveDate, now_ms: i64) -> Self {
        Self {
            last_login_date: Some(today),
            last_energy_update: Some(now_ms),
            current_week_start: Some(start_of_week(today)),
            daily_quest: DailyQuestProgress::fresh(today),
            ..Self::default()
        }
    }

    /// Zero every per-period accumulator.
    pub fn reset_weekly_accumulators(&mut self) {
        self.weekly_xp_accumulated = 0;
        self.weekly_tasks_completed = 0;
        self.weekly_max_streak = 0;
        self.weekly_exercise_count = 0;
        self.weekly_missed_tasks = 0;
        self.weekly_xp_lost = 0;
    }

    pub fn is_energy_full(&self) -> bool {
        self.energy >= self.max_energy
    }

    /// Energy as a whole percent of capacity.
    pub fn energy_percent(&self) -> u32 {
        if self.max_energy == 0 {
            return 0;
        }
        self.energy.saturating_mul(100) / self.max_energy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_record_merges_with_defaults() {
        let stats: UserStats =
            serde_json::from_str(r#"{"level": 4, "currentXp": 12, "energy": 40}"#).unwrap();
        assert_eq!(stats.level, 4);
        assert_eq!(stats.current_xp, 12);
        assert_eq!(stats.energy, 40);
        assert_eq!(stats.max_energy, MAX_ENERGY);
        assert_eq!(stats.hunter_attributes.strength, 10.0);
        assert_eq!(stats.current_week_start, None);
    }

    #[test]
    fn blank_completion_date_loads_as_none() {
        let stats: UserStats = serde_json::from_str(
            r#"{"lastTaskCompletionDate": "", "lastLoginDate": "2024-06-03"}"#,
        )
        .unwrap();
        assert_eq!(stats.last_task_completion_date, None);
        assert_eq!(stats.last_login_date, NaiveDate::from_ymd_opt(2024, 6, 3));
    }

    #[test]
    fn new_character_aligns_week_start() {
        // Wednesday 2024-06-05 -> Saturday 2024-06-01
        let today = NaiveDate::from_ymd_opt(2024, 6, 5).unwrap();
        let stats = UserStats::new_character(today, 1_000);
        assert_eq!(stats.current_week_start, NaiveDate::from_ymd_opt(2024, 6, 1));
        assert_eq!(stats.daily_quest.last_reset_date, Some(today));
        assert_eq!(stats.last_energy_update, Some(1_000));
    }

    #[test]
    fn attributes_train_by_pillar() {
        let mut attrs = HunterAttributes::default();
        attrs.train(Pillar::Studying, 0.5);
        attrs.train(Pillar::Work, 1.5);
        assert_eq!(attrs.intelligence, 10.5);
        assert_eq!(attrs.agility, 11.5);
        attrs.raise_all(1.0);
        assert_eq!(attrs.strength, 11.0);
    }

    #[test]
    fn serializes_camel_case_keys() {
        let json = serde_json::to_value(UserStats::default()).unwrap();
        assert!(json.get("currentXp").is_some());
        assert!(json.get("weeklyXpAccumulated").is_some());
        assert!(json.get("hunterAttributes").is_some());
    }
}
