use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::economy::Pillar;
use crate::report::{MonthlyRating, WeeklyRating};

/// Every observable state change produces an Event.
/// Front ends turn them into notifications; the core never displays anything.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Event {
    TaskCompleted {
        task_id: String,
        pillar: Pillar,
        xp_gained: u32,
        /// Positive when energy was spent, negative when regained.
        energy_spent: i32,
        critical: bool,
        at: NaiveDateTime,
    },
    LevelUp {
        level: u32,
        levels_gained: u32,
        at: NaiveDateTime,
    },
    StreakBroken {
        previous: u32,
        at: NaiveDateTime,
    },
    /// Overdue tasks were marked missed during reconciliation.
    TasksMissed {
        count: u32,
        xp_lost: u32,
        at: NaiveDateTime,
    },
    EnergyRestored {
        amount: u32,
        energy: u32,
        at: NaiveDateTime,
    },
    /// Energy fell to the critical threshold.
    EnergyCritical {
        energy: u32,
        at: NaiveDateTime,
    },
    ShadowTaskSpawned {
        task_id: String,
        title: String,
        energy_restore: u32,
        at: NaiveDateTime,
    },
    ShadowTasksCleared {
        count: u32,
        at: NaiveDateTime,
    },
    ShadowTaskConsumed {
        task_id: String,
        energy_restored: u32,
        at: NaiveDateTime,
    },
    WeekArchived {
        week_id: String,
        month_id: String,
        rank_score: u32,
        at: NaiveDateTime,
    },
    MonthArchived {
        month_id: String,
        total_xp: u32,
        at: NaiveDateTime,
    },
    /// Reports and rewards were appended for closed periods.
    ReportsGenerated {
        weekly_rating: Option<WeeklyRating>,
        monthly_rating: Option<MonthlyRating>,
        xp_bonus: u32,
        at: NaiveDateTime,
    },
    ChallengeCompleted {
        challenge_id: String,
        xp_bonus: u32,
        at: NaiveDateTime,
    },
    DailyQuestCompleted {
        xp_bonus: u32,
        at: NaiveDateTime,
    },
}

/// Receiver for emitted events.
pub trait EventSink {
    fn emit(&mut self, event: Event);
}

impl EventSink for Vec<Event> {
    fn emit(&mut self, event: Event) {
        self.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn events_are_tagged_by_type() {
        let at = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let mut sink: Vec<Event> = Vec::new();
        sink.emit(Event::LevelUp {
            level: 2,
            levels_gained: 1,
            at,
        });
        let json = serde_json::to_value(&sink[0]).unwrap();
        assert_eq!(json["type"], "LevelUp");
        assert_eq!(json["level"], 2);
    }
}
