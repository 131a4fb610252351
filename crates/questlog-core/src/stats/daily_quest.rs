//! Daily exercise quest.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::UserStats;
use crate::calendar::epoch_millis;
use crate::economy::{
    percent_of, DAILY_QUEST_BONUS_PERCENT, DAILY_QUEST_PUSHUPS, DAILY_QUEST_RUN_KM,
    DAILY_QUEST_SITUPS, DAILY_QUEST_SQUATS,
};
use crate::events::{Event, EventSink};
use crate::progression::apply_xp_gain;

const STRENGTH_BONUS: f64 = 2.0;
const VITALITY_BONUS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestExercise {
    Pushups,
    Situps,
    Squats,
    Run,
}

impl QuestExercise {
    pub const ALL: [QuestExercise; 4] = [
        QuestExercise::Pushups,
        QuestExercise::Situps,
        QuestExercise::Squats,
        QuestExercise::Run,
    ];

    /// Target for the day. Run is in kilometres.
    pub fn target(self) -> f64 {
        match self {
            QuestExercise::Pushups => f64::from(DAILY_QUEST_PUSHUPS),
            QuestExercise::Situps => f64::from(DAILY_QUEST_SITUPS),
            QuestExercise::Squats => f64::from(DAILY_QUEST_SQUATS),
            QuestExercise::Run => f64::from(DAILY_QUEST_RUN_KM),
        }
    }
}

impl fmt::Display for QuestExercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QuestExercise::Pushups => "pushups",
            QuestExercise::Situps => "situps",
            QuestExercise::Squats => "squats",
            QuestExercise::Run => "run",
        };
        f.write_str(s)
    }
}

impl FromStr for QuestExercise {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pushups" | "push-ups" => Ok(QuestExercise::Pushups),
            "situps" | "sit-ups" => Ok(QuestExercise::Situps),
            "squats" => Ok(QuestExercise::Squats),
            "run" => Ok(QuestExercise::Run),
            _ => Err(format!(
                "Invalid exercise: '{s}'. Use pushups/situps/squats/run"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DailyQuestOutcome {
    /// Quest already completed today.
    AlreadyCompleted,
    Progressed,
    Completed { xp_bonus: u32, levels_gained: u32 },
}

/// Set the counter for one exercise, clamped to its target.
///
/// Once all four reach their targets the quest pays out: energy refills,
/// 15% of the level's XP requirement is granted, strength +2, vitality +1.
pub fn update_daily_quest(
    stats: &mut UserStats,
    exercise: QuestExercise,
    amount: f64,
    now: NaiveDateTime,
    events: &mut dyn EventSink,
) -> DailyQuestOutcome {
    if stats.daily_quest.is_completed {
        return DailyQuestOutcome::AlreadyCompleted;
    }

    let value = if amount.is_finite() {
        amount.clamp(0.0, exercise.target())
    } else {
        0.0
    };
    let quest = &mut stats.daily_quest;
    match exercise {
        QuestExercise::Pushups => quest.pushups = value as u32,
        QuestExercise::Situps => quest.situps = value as u32,
        QuestExercise::Squats => quest.squats = value as u32,
        QuestExercise::Run => quest.run = value,
    }

    let done = quest.pushups >= DAILY_QUEST_PUSHUPS
        && quest.situps >= DAILY_QUEST_SITUPS
        && quest.squats >= DAILY_QUEST_SQUATS
        && quest.run >= f64::from(DAILY_QUEST_RUN_KM);
    if !done {
        return DailyQuestOutcome::Progressed;
    }

    quest.is_completed = true;
    stats.energy = stats.max_energy;
    stats.last_energy_update = Some(epoch_millis(now));

    let xp_bonus = percent_of(stats.max_xp, DAILY_QUEST_BONUS_PERCENT);
    let gain = apply_xp_gain(stats, xp_bonus);
    gain.commit(stats);
    stats.hunter_attributes.strength += STRENGTH_BONUS;
    stats.hunter_attributes.vitality += VITALITY_BONUS;
    if gain.leveled_up() {
        stats
            .hunter_attributes
            .raise_all(f64::from(gain.levels_gained));
        events.emit(Event::LevelUp {
            level: gain.level,
            levels_gained: gain.levels_gained,
            at: now,
        });
    }

    events.emit(Event::DailyQuestCompleted { xp_bonus, at: now });
    tracing::info!(xp_bonus, "daily quest completed");
    DailyQuestOutcome::Completed {
        xp_bonus,
        levels_gained: gain.levels_gained,
    }
}
