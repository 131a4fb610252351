//! History archiver.
//!
//! Builds immutable snapshots of closed periods. A weekly snapshot embeds a
//! deep copy of the live task list; a monthly snapshot aggregates the weekly
//! snapshots that share its `month_id`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::calendar::{month_id, week_index_in_month};
use crate::economy::Pillar;
use crate::error::ValidationError;
use crate::scoring::{balance_score, rank_score};
use crate::stats::UserStats;
use crate::task::Task;

/// Completed-task counts per pillar.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct PillarSummary {
    pub learning: u32,
    pub studying: u32,
    pub exercise: u32,
    pub work: u32,
    pub entertainment: u32,
    pub quran: u32,
}

impl PillarSummary {
    /// Count completed tasks by pillar.
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut summary = Self::default();
        for task in tasks.iter().filter(|t| t.completed) {
            *summary.slot_mut(task.pillar) += 1;
        }
        summary
    }

    pub fn get(&self, pillar: Pillar) -> u32 {
        match pillar {
            Pillar::Learning => self.learning,
            Pillar::Studying => self.studying,
            Pillar::Exercise => self.exercise,
            Pillar::Work => self.work,
            Pillar::Entertainment => self.entertainment,
            Pillar::Quran => self.quran,
        }
    }

    fn slot_mut(&mut self, pillar: Pillar) -> &mut u32 {
        match pillar {
            Pillar::Learning => &mut self.learning,
            Pillar::Studying => &mut self.studying,
            Pillar::Exercise => &mut self.exercise,
            Pillar::Work => &mut self.work,
            Pillar::Entertainment => &mut self.entertainment,
            Pillar::Quran => &mut self.quran,
        }
    }

    /// Counts in [`Pillar::ALL`] order.
    pub fn counts(&self) -> [u32; 6] {
        Pillar::ALL.map(|p| self.get(p))
    }

    pub fn add(&mut self, other: &PillarSummary) {
        for pillar in Pillar::ALL {
            let slot = self.slot_mut(pillar);
            *slot = slot.saturating_add(other.get(pillar));
        }
    }
}

/// Archived record of a closed week.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyHistory {
    pub week_id: String,
    /// `YYYY-MM` of the period start
    pub month_id: String,
    pub week_index_in_month: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(rename = "totalXP")]
    pub total_xp: u32,
    pub tasks_completed: u32,
    pub streak_max: u32,
    #[serde(default)]
    pub missed_tasks_count: u32,
    #[serde(default)]
    pub xp_lost: u32,
    #[serde(default)]
    pub balance_score: u32,
    /// Average XP per completed task
    #[serde(default)]
    pub efficiency_rate: u32,
    pub stats_summary: PillarSummary,
    #[serde(default)]
    pub archived_tasks: Vec<Task>,
    pub rank_score: u32,
    pub created_at: i64,
}

/// Rank label earned by a month's total XP.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MonthRank {
    Legend,
    #[serde(rename = "Elite Hunter")]
    EliteHunter,
    Grinder,
    Survivor,
}

impl MonthRank {
    pub fn from_total_xp(total_xp: u64) -> Self {
        if total_xp > 10_000 {
            MonthRank::Legend
        } else if total_xp > 5_000 {
            MonthRank::EliteHunter
        } else if total_xp > 2_000 {
            MonthRank::Grinder
        } else {
            MonthRank::Survivor
        }
    }
}

impl fmt::Display for MonthRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MonthRank::Legend => "Legend",
            MonthRank::EliteHunter => "Elite Hunter",
            MonthRank::Grinder => "Grinder",
            MonthRank::Survivor => "Survivor",
        };
        f.write_str(s)
    }
}

/// Archived aggregate of the weeks of one month.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyHistory {
    pub month_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub weeks_included: Vec<String>,
    #[serde(rename = "totalXP")]
    pub total_xp: u32,
    #[serde(rename = "averageXP")]
    pub average_xp: u32,
    pub total_tasks: u32,
    pub best_week_rank_score: u32,
    pub worst_week_rank_score: u32,
    #[serde(default)]
    pub best_week_id: String,
    #[serde(default)]
    pub worst_week_id: String,
    pub stats_summary: PillarSummary,
    pub streak_record: u32,
    /// `round(avg(rank) / max(rank) * 100)`
    pub consistency_rate: u32,
    pub month_rank: MonthRank,
    pub created_at: i64,
}

/// Close the open period described by `stats` into a snapshot.
///
/// Pillar counts cover every completed task in the live list.
pub fn create_weekly_snapshot(
    stats: &UserStats,
    tasks: &[Task],
    today: NaiveDate,
    now_ms: i64,
) -> WeeklyHistory {
    let start_date = stats.current_week_start.unwrap_or(today);
    let stats_summary = PillarSummary::from_tasks(tasks);
    let efficiency_rate = if stats.weekly_tasks_completed > 0 {
        (f64::from(stats.weekly_xp_accumulated) / f64::from(stats.weekly_tasks_completed)).round()
            as u32
    } else {
        0
    };

    WeeklyHistory {
        week_id: Uuid::new_v4().to_string(),
        month_id: month_id(start_date),
        week_index_in_month: week_index_in_month(start_date),
        start_date,
        end_date: today,
        total_xp: stats.weekly_xp_accumulated,
        tasks_completed: stats.weekly_tasks_completed,
        streak_max: stats.weekly_max_streak,
        missed_tasks_count: stats.weekly_missed_tasks,
        xp_lost: stats.weekly_xp_lost,
        balance_score: balance_score(&stats_summary.counts()),
        efficiency_rate,
        stats_summary,
        archived_tasks: tasks.to_vec(),
        rank_score: rank_score(
            stats.weekly_xp_accumulated,
            stats.weekly_tasks_completed,
            stats.weekly_max_streak,
            stats.weekly_exercise_count,
        ),
        created_at: now_ms,
    }
}

/// Aggregate weekly snapshots of one month.
pub fn create_monthly_snapshot(
    month: &str,
    weeks: &[WeeklyHistory],
    now_ms: i64,
) -> Result<MonthlyHistory, ValidationError> {
    let (first, last) = match (weeks.first(), weeks.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(ValidationError::EmptyCollection(format!(
                "no weekly snapshots for {month}"
            )))
        }
    };

    let total_xp: u64 = weeks.iter().map(|w| u64::from(w.total_xp)).sum();
    let total_tasks: u64 = weeks.iter().map(|w| u64::from(w.tasks_completed)).sum();
    let rank_total: u64 = weeks.iter().map(|w| u64::from(w.rank_score)).sum();

    // Ties resolve to the earliest week.
    let mut best = first;
    let mut worst = first;
    for week in weeks.iter().skip(1) {
        if week.rank_score > best.rank_score {
            best = week;
        }
        if week.rank_score < worst.rank_score {
            worst = week;
        }
    }

    let count = weeks.len() as f64;
    let consistency_rate = if best.rank_score > 0 {
        (rank_total as f64 / count / f64::from(best.rank_score) * 100.0).round() as u32
    } else {
        0
    };

    let mut stats_summary = PillarSummary::default();
    for week in weeks {
        stats_summary.add(&week.stats_summary);
    }

    Ok(MonthlyHistory {
        month_id: month.to_string(),
        start_date: first.start_date,
        end_date: last.end_date,
        weeks_included: weeks.iter().map(|w| w.week_id.clone()).collect(),
        total_xp: total_xp.min(u64::from(u32::MAX)) as u32,
        average_xp: (total_xp as f64 / count).round() as u32,
        total_tasks: total_tasks.min(u64::from(u32::MAX)) as u32,
        best_week_rank_score: best.rank_score,
        worst_week_rank_score: worst.rank_score,
        best_week_id: best.week_id.clone(),
        worst_week_id: worst.week_id.clone(),
        stats_summary,
        streak_record: weeks.iter().map(|w| w.streak_max).max().unwrap_or(0),
        consistency_rate,
        month_rank: MonthRank::from_total_xp(total_xp),
        created_at: now_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::Difficulty;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(pillar: Pillar, completed: bool) -> Task {
        Task {
            id: Uuid::new_v4().to_string(),
            title: "t".into(),
            description: String::new(),
            pillar,
            completed,
            energy_cost: 10,
            xp_reward: 20,
            difficulty: Difficulty::D,
            due_date: None,
            day: None,
            created_at: 0,
            order: 0,
            pages: None,
            is_shadow: false,
            is_missed: false,
        }
    }

    fn week(id: &str, xp: u32, rank: u32, streak: u32) -> WeeklyHistory {
        WeeklyHistory {
            week_id: id.into(),
            month_id: "2024-06".into(),
            week_index_in_month: 1,
            start_date: date(2024, 6, 1),
            end_date: date(2024, 6, 8),
            total_xp: xp,
            tasks_completed: 4,
            streak_max: streak,
            missed_tasks_count: 0,
            xp_lost: 0,
            balance_score: 0,
            efficiency_rate: 0,
            stats_summary: PillarSummary {
                work: 2,
                ..PillarSummary::default()
            },
            archived_tasks: Vec::new(),
            rank_score: rank,
            created_at: 0,
        }
    }

    #[test]
    fn weekly_snapshot_reads_accumulators() {
        let stats = UserStats {
            current_week_start: Some(date(2024, 6, 8)),
            weekly_xp_accumulated: 100,
            weekly_tasks_completed: 3,
            weekly_max_streak: 2,
            weekly_exercise_count: 1,
            weekly_missed_tasks: 1,
            weekly_xp_lost: 6,
            ..UserStats::default()
        };
        let tasks = vec![
            task(Pillar::Exercise, true),
            task(Pillar::Work, true),
            task(Pillar::Work, false),
        ];
        let snap = create_weekly_snapshot(&stats, &tasks, date(2024, 6, 15), 42);

        assert_eq!(snap.month_id, "2024-06");
        assert_eq!(snap.week_index_in_month, 2);
        assert_eq!(snap.start_date, date(2024, 6, 8));
        assert_eq!(snap.end_date, date(2024, 6, 15));
        assert_eq!(snap.efficiency_rate, 33);
        assert_eq!(snap.stats_summary.exercise, 1);
        assert_eq!(snap.stats_summary.work, 1);
        assert_eq!(snap.archived_tasks.len(), 3);
        assert_eq!(snap.missed_tasks_count, 1);
        assert_eq!(snap.xp_lost, 6);
        assert_eq!(snap.rank_score, rank_score(100, 3, 2, 1));
    }

    #[test]
    fn efficiency_is_zero_without_tasks() {
        let snap = create_weekly_snapshot(&UserStats::default(), &[], date(2024, 6, 1), 0);
        assert_eq!(snap.efficiency_rate, 0);
        assert_eq!(snap.start_date, date(2024, 6, 1));
    }

    #[test]
    fn archived_tasks_are_independent_copies() {
        let mut tasks = vec![task(Pillar::Learning, false)];
        let snap = create_weekly_snapshot(&UserStats::default(), &tasks, date(2024, 6, 1), 0);
        tasks[0].title = "changed".into();
        tasks[0].completed = true;
        assert_eq!(snap.archived_tasks[0].title, "t");
        assert!(!snap.archived_tasks[0].completed);
    }

    #[test]
    fn monthly_snapshot_aggregates() {
        let weeks = vec![
            week("w1", 1000, 100, 3),
            week("w2", 2000, 200, 5),
            week("w3", 500, 50, 1),
            week("w4", 1500, 200, 4),
        ];
        let month = create_monthly_snapshot("2024-06", &weeks, 7).unwrap();
        assert_eq!(month.total_xp, 5000);
        assert_eq!(month.average_xp, 1250);
        assert_eq!(month.total_tasks, 16);
        assert_eq!(month.best_week_rank_score, 200);
        assert_eq!(month.worst_week_rank_score, 50);
        assert_eq!(month.best_week_id, "w2");
        assert_eq!(month.worst_week_id, "w3");
        assert_eq!(month.streak_record, 5);
        // avg 137.5 / 200 = 68.75 -> 69
        assert_eq!(month.consistency_rate, 69);
        assert_eq!(month.month_rank, MonthRank::Grinder);
        assert_eq!(month.stats_summary.work, 8);
        assert_eq!(month.weeks_included, vec!["w1", "w2", "w3", "w4"]);
    }

    #[test]
    fn monthly_snapshot_rejects_empty_input() {
        let err = create_monthly_snapshot("2024-06", &[], 0).unwrap_err();
        assert!(matches!(err, ValidationError::EmptyCollection(_)));
    }

    #[test]
    fn month_rank_thresholds() {
        assert_eq!(MonthRank::from_total_xp(10_001), MonthRank::Legend);
        assert_eq!(MonthRank::from_total_xp(10_000), MonthRank::EliteHunter);
        assert_eq!(MonthRank::from_total_xp(2_001), MonthRank::Grinder);
        assert_eq!(MonthRank::from_total_xp(2_000), MonthRank::Survivor);
        assert_eq!(
            serde_json::to_string(&MonthRank::EliteHunter).unwrap(),
            "\"Elite Hunter\""
        );
    }

    #[test]
    fn history_keys_match_saved_format() {
        let json = serde_json::to_value(week("w1", 10, 1, 0)).unwrap();
        assert!(json.get("totalXP").is_some());
        assert!(json.get("statsSummary").is_some());
        assert!(json.get("weekIndexInMonth").is_some());
    }
}
