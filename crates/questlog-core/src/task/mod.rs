//! Task records.
//!
//! A task belongs to one pillar, carries a difficulty tier and the economy
//! values derived from it, and may be pinned to a day of the current period.
//! Tasks without a day form the backlog and survive period rollover.

pub mod lifecycle;
pub mod shadow;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{deserialize_lenient_date, DayOfWeek};
use crate::economy::{task_economy, Difficulty, Pillar};

/// A unit of work tracked on the quest board.
///
/// Invariant: never both `completed` and `is_missed`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// UUID v4 string; shadow tasks get a fresh one on each spawn
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub pillar: Pillar,
    #[serde(default)]
    pub completed: bool,
    /// Energy spent on completion; negative values give energy back
    #[serde(default)]
    pub energy_cost: i32,
    #[serde(default)]
    pub xp_reward: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(
        default,
        deserialize_with = "deserialize_lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<NaiveDate>,
    /// Day within the current period, if scheduled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<DayOfWeek>,
    /// Creation time in epoch milliseconds
    #[serde(default)]
    pub created_at: i64,
    /// Display position; lower sorts first
    #[serde(default)]
    pub order: i64,
    /// Quran pages covered by this task (defaults to one on completion)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
    #[serde(default)]
    pub is_shadow: bool,
    #[serde(default)]
    pub is_missed: bool,
}

impl Task {
    /// Still actionable: neither completed nor missed.
    pub fn is_open(&self) -> bool {
        !self.completed && !self.is_missed
    }

    /// Shadow task that has not been consumed yet.
    pub fn is_active_shadow(&self) -> bool {
        self.is_shadow && !self.completed
    }

    /// Recompute stored energy cost and XP reward from pillar and difficulty.
    pub fn refresh_economy(&mut self) {
        let econ = task_economy(self.pillar, self.difficulty);
        self.energy_cost = econ.energy_cost;
        self.xp_reward = econ.xp_reward;
    }
}

/// Stable display order: `order`, then creation time.
pub fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| a.order.cmp(&b.order).then(a.created_at.cmp(&b.created_at)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(order: i64, created_at: i64) -> Task {
        Task {
            id: format!("t{order}-{created_at}"),
            title: "Read".to_string(),
            description: String::new(),
            pillar: Pillar::Learning,
            completed: false,
            energy_cost: 0,
            xp_reward: 0,
            difficulty: Difficulty::D,
            due_date: None,
            day: None,
            created_at,
            order,
            pages: None,
            is_shadow: false,
            is_missed: false,
        }
    }

    #[test]
    fn legacy_record_loads_with_defaults() {
        let json = r#"{
            "id": "a1",
            "title": "Push-ups",
            "pillar": "Exercise",
            "completed": false,
            "energyCost": 12,
            "xpReward": 25,
            "createdAt": 1717200000000,
            "order": 0
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.difficulty, Difficulty::D);
        assert!(!task.is_shadow);
        assert!(!task.is_missed);
        assert_eq!(task.day, None);
    }

    #[test]
    fn optional_fields_are_omitted_when_absent() {
        let json = serde_json::to_value(task(0, 0)).unwrap();
        assert!(json.get("day").is_none());
        assert!(json.get("pages").is_none());
        assert!(json.get("isShadow").is_some());
    }

    #[test]
    fn refresh_economy_follows_difficulty() {
        let mut t = task(0, 0);
        t.pillar = Pillar::Exercise;
        t.difficulty = Difficulty::S;
        t.refresh_economy();
        assert_eq!(t.energy_cost, 60);
        assert_eq!(t.xp_reward, 125);
    }

    #[test]
    fn sort_uses_order_then_creation() {
        let mut tasks = vec![task(2, 0), task(1, 5), task(1, 3), task(-999, 9)];
        sort_tasks(&mut tasks);
        let keys: Vec<(i64, i64)> = tasks.iter().map(|t| (t.order, t.created_at)).collect();
        assert_eq!(keys, vec![(-999, 9), (1, 3), (1, 5), (2, 0)]);
    }
}
