//! Report generator.
//!
//! Compares a freshly closed snapshot against the previous one of the same
//! kind and produces an immutable report with a rating and a deterministic
//! English summary.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::economy::Pillar;
use crate::history::{MonthlyHistory, WeeklyHistory};

/// Direction of the best streak compared to the previous week.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StreakTrend {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WeeklyRating {
    Excellent,
    Consistent,
    Unstable,
    Lazy,
}

impl fmt::Display for WeeklyRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WeeklyRating::Excellent => "Excellent",
            WeeklyRating::Consistent => "Consistent",
            WeeklyRating::Unstable => "Unstable",
            WeeklyRating::Lazy => "Lazy",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MonthlyRating {
    Legend,
    Grinder,
    Survivor,
    Falling,
}

impl fmt::Display for MonthlyRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MonthlyRating::Legend => "Legend",
            MonthlyRating::Grinder => "Grinder",
            MonthlyRating::Survivor => "Survivor",
            MonthlyRating::Falling => "Falling",
        };
        f.write_str(s)
    }
}

/// Week-over-week deltas. All `None` for the first archived week.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyComparison {
    pub xp_change_percent: Option<i64>,
    pub tasks_change: Option<i64>,
    pub streak_trend: Option<StreakTrend>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReport {
    /// Id of the snapshot this report describes
    pub week_id: String,
    pub comparison: WeeklyComparison,
    pub best_pillar: Pillar,
    pub worst_pillar: Pillar,
    pub rating: WeeklyRating,
    pub summary_text: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyComparison {
    pub xp_change_percent: Option<i64>,
    pub consistency_change: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    pub month_id: String,
    pub comparison: MonthlyComparison,
    pub best_week_id: String,
    pub weakest_week_id: String,
    pub month_rating: MonthlyRating,
    pub summary_text: String,
    pub created_at: i64,
}

/// Percent change from `previous` to `current`, rounded half up.
///
/// A zero baseline counts as +100 when anything was earned, else 0.
pub fn percent_change(current: u32, previous: u32) -> i64 {
    if previous == 0 {
        return if current > 0 { 100 } else { 0 };
    }
    let delta = f64::from(current) - f64::from(previous);
    (delta / f64::from(previous) * 100.0 + 0.5).floor() as i64
}

/// Pillar with the most completions; ties go to the earlier pillar.
pub fn best_pillar(week: &WeeklyHistory) -> Pillar {
    let mut best = Pillar::ALL[0];
    for pillar in Pillar::ALL.iter().copied().skip(1) {
        if week.stats_summary.get(pillar) > week.stats_summary.get(best) {
            best = pillar;
        }
    }
    best
}

/// Pillar with the fewest completions; ties go to the later pillar.
pub fn worst_pillar(week: &WeeklyHistory) -> Pillar {
    let mut worst = Pillar::ALL[0];
    for pillar in Pillar::ALL.iter().copied().skip(1) {
        if week.stats_summary.get(pillar) <= week.stats_summary.get(worst) {
            worst = pillar;
        }
    }
    worst
}

fn streak_trend(current: u32, previous: u32) -> StreakTrend {
    match current.cmp(&previous) {
        std::cmp::Ordering::Greater => StreakTrend::Up,
        std::cmp::Ordering::Less => StreakTrend::Down,
        std::cmp::Ordering::Equal => StreakTrend::Stable,
    }
}

/// Against a previous week the rank ratio decides; `Lazy` is reserved for a
/// sharp drop with nothing completed. A first week only uses absolute
/// rank thresholds.
fn rate_week(current: &WeeklyHistory, previous: Option<&WeeklyHistory>, trend: Option<StreakTrend>) -> WeeklyRating {
    match previous {
        Some(prev) => {
            let ratio = if prev.rank_score > 0 {
                f64::from(current.rank_score) / f64::from(prev.rank_score)
            } else {
                1.0
            };
            if ratio >= 1.0 && trend != Some(StreakTrend::Down) {
                WeeklyRating::Excellent
            } else if ratio >= 0.7 {
                WeeklyRating::Consistent
            } else if current.tasks_completed > 0 {
                WeeklyRating::Unstable
            } else {
                WeeklyRating::Lazy
            }
        }
        None => {
            if current.rank_score > 500 {
                WeeklyRating::Excellent
            } else if current.rank_score > 200 {
                WeeklyRating::Consistent
            } else {
                WeeklyRating::Unstable
            }
        }
    }
}

fn weekly_summary(rating: WeeklyRating, best: Pillar) -> String {
    let opening = match rating {
        WeeklyRating::Excellent => "Excellent week with a steady pace.",
        WeeklyRating::Consistent => "Consistent week; you kept a good rhythm.",
        WeeklyRating::Unstable => "An uneven week, though some quests were completed.",
        WeeklyRating::Lazy => "Activity dropped sharply; time to regroup.",
    };
    format!("{opening} Most of your effort went into {best}.")
}

pub fn generate_weekly_report(
    current: &WeeklyHistory,
    previous: Option<&WeeklyHistory>,
    now_ms: i64,
) -> WeeklyReport {
    let comparison = match previous {
        Some(prev) => WeeklyComparison {
            xp_change_percent: Some(percent_change(current.total_xp, prev.total_xp)),
            tasks_change: Some(i64::from(current.tasks_completed) - i64::from(prev.tasks_completed)),
            streak_trend: Some(streak_trend(current.streak_max, prev.streak_max)),
        },
        None => WeeklyComparison::default(),
    };

    let best = best_pillar(current);
    let rating = rate_week(current, previous, comparison.streak_trend);

    WeeklyReport {
        week_id: current.week_id.clone(),
        comparison,
        best_pillar: best,
        worst_pillar: worst_pillar(current),
        rating,
        summary_text: weekly_summary(rating, best),
        created_at: now_ms,
    }
}

fn rate_month(month: &MonthlyHistory) -> MonthlyRating {
    let consistency = month.consistency_rate;
    if consistency >= 85 && month.total_xp > 8_000 {
        MonthlyRating::Legend
    } else if consistency >= 65 {
        MonthlyRating::Grinder
    } else if consistency >= 40 {
        MonthlyRating::Survivor
    } else {
        MonthlyRating::Falling
    }
}

fn monthly_summary(rating: MonthlyRating, xp_change: Option<i64>) -> String {
    let mut text = match rating {
        MonthlyRating::Legend => "A legendary month of discipline and outstanding results.",
        MonthlyRating::Grinder => "A hard-working month with strong commitment.",
        MonthlyRating::Survivor => "You held on this month, with room to improve.",
        MonthlyRating::Falling => "Overall performance slipped; revisit your plan for next month.",
    }
    .to_string();

    match xp_change {
        Some(change) if change > 0 => text.push_str(&format!(" XP improved by {change}%.")),
        Some(change) if change < 0 => {
            text.push_str(&format!(" XP dropped by {}%.", change.unsigned_abs()))
        }
        Some(_) => text.push_str(" XP held steady."),
        None => {}
    }
    text
}

pub fn generate_monthly_report(
    current: &MonthlyHistory,
    previous: Option<&MonthlyHistory>,
    now_ms: i64,
) -> MonthlyReport {
    let comparison = match previous {
        Some(prev) => MonthlyComparison {
            xp_change_percent: Some(percent_change(current.total_xp, prev.total_xp)),
            consistency_change: Some(
                i64::from(current.consistency_rate) - i64::from(prev.consistency_rate),
            ),
        },
        None => MonthlyComparison::default(),
    };

    let rating = rate_month(current);

    MonthlyReport {
        month_id: current.month_id.clone(),
        comparison,
        best_week_id: current.best_week_id.clone(),
        weakest_week_id: current.worst_week_id.clone(),
        month_rating: rating,
        summary_text: monthly_summary(rating, comparison.xp_change_percent),
        created_at: now_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{MonthRank, PillarSummary};
    use chrono::NaiveDate;

    fn week(xp: u32, tasks: u32, streak: u32, rank: u32, summary: PillarSummary) -> WeeklyHistory {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        WeeklyHistory {
            week_id: "current".into(),
            month_id: "2024-06".into(),
            week_index_in_month: 1,
            start_date: start,
            end_date: start,
            total_xp: xp,
            tasks_completed: tasks,
            streak_max: streak,
            missed_tasks_count: 0,
            xp_lost: 0,
            balance_score: 0,
            efficiency_rate: 0,
            stats_summary: summary,
            archived_tasks: Vec::new(),
            rank_score: rank,
            created_at: 0,
        }
    }

    fn month(total_xp: u32, consistency: u32) -> MonthlyHistory {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        MonthlyHistory {
            month_id: "2024-06".into(),
            start_date: start,
            end_date: start,
            weeks_included: vec![],
            total_xp,
            average_xp: 0,
            total_tasks: 0,
            best_week_rank_score: 0,
            worst_week_rank_score: 0,
            best_week_id: "wb".into(),
            worst_week_id: "ww".into(),
            stats_summary: PillarSummary::default(),
            streak_record: 0,
            consistency_rate: consistency,
            month_rank: MonthRank::Survivor,
            created_at: 0,
        }
    }

    #[test]
    fn first_week_has_no_comparison() {
        let report = generate_weekly_report(&week(100, 5, 2, 600, PillarSummary::default()), None, 1);
        assert_eq!(report.comparison, WeeklyComparison::default());
        assert_eq!(report.rating, WeeklyRating::Excellent);
    }

    #[test]
    fn first_week_rank_thresholds() {
        let summary = PillarSummary::default();
        assert_eq!(generate_weekly_report(&week(0, 1, 0, 201, summary), None, 0).rating, WeeklyRating::Consistent);
        assert_eq!(generate_weekly_report(&week(0, 1, 0, 200, summary), None, 0).rating, WeeklyRating::Unstable);
    }

    #[test]
    fn zero_tasks_after_a_drop_is_lazy() {
        let prev = week(400, 6, 3, 200, PillarSummary::default());
        let cur = week(50, 0, 3, 20, PillarSummary::default());
        assert_eq!(generate_weekly_report(&cur, Some(&prev), 0).rating, WeeklyRating::Lazy);
    }

    #[test]
    fn zero_tasks_first_week_uses_rank_thresholds() {
        // challenge XP alone, no tasks
        let cur = week(75, 0, 0, 30, PillarSummary::default());
        assert_eq!(generate_weekly_report(&cur, None, 0).rating, WeeklyRating::Unstable);
        let empty = week(0, 0, 0, 0, PillarSummary::default());
        assert_eq!(generate_weekly_report(&empty, None, 0).rating, WeeklyRating::Unstable);
    }

    #[test]
    fn zero_tasks_holding_rank_is_not_lazy() {
        let prev = week(0, 0, 0, 0, PillarSummary::default());
        let cur = week(75, 0, 0, 30, PillarSummary::default());
        assert_eq!(generate_weekly_report(&cur, Some(&prev), 0).rating, WeeklyRating::Excellent);

        let prev = week(100, 2, 0, 40, PillarSummary::default());
        assert_eq!(generate_weekly_report(&cur, Some(&prev), 0).rating, WeeklyRating::Consistent);
    }

    #[test]
    fn comparison_against_previous_week() {
        let prev = week(200, 8, 4, 100, PillarSummary::default());
        let cur = week(300, 5, 2, 120, PillarSummary::default());
        let report = generate_weekly_report(&cur, Some(&prev), 0);
        assert_eq!(report.comparison.xp_change_percent, Some(50));
        assert_eq!(report.comparison.tasks_change, Some(-3));
        assert_eq!(report.comparison.streak_trend, Some(StreakTrend::Down));
        // ratio 1.2 but the streak went down
        assert_eq!(report.rating, WeeklyRating::Consistent);
    }

    #[test]
    fn sharp_rank_drop_is_unstable() {
        let prev = week(200, 8, 4, 100, PillarSummary::default());
        let cur = week(50, 2, 4, 60, PillarSummary::default());
        assert_eq!(generate_weekly_report(&cur, Some(&prev), 0).rating, WeeklyRating::Unstable);
    }

    #[test]
    fn percent_change_from_zero_baseline() {
        assert_eq!(percent_change(50, 0), 100);
        assert_eq!(percent_change(0, 0), 0);
        assert_eq!(percent_change(0, 40), -100);
        assert_eq!(percent_change(1, 3), -67);
    }

    #[test]
    fn pillar_ties_prefer_list_order() {
        let summary = PillarSummary {
            studying: 3,
            work: 3,
            exercise: 1,
            ..PillarSummary::default()
        };
        let report = generate_weekly_report(&week(10, 7, 1, 10, summary), None, 0);
        assert_eq!(report.best_pillar, Pillar::Studying);
        assert_eq!(report.worst_pillar, Pillar::Quran);
        assert!(report.summary_text.ends_with("Most of your effort went into Studying."));
    }

    #[test]
    fn empty_week_best_is_first_worst_is_last() {
        let report = generate_weekly_report(&week(0, 0, 0, 0, PillarSummary::default()), None, 0);
        assert_eq!(report.best_pillar, Pillar::Learning);
        assert_eq!(report.worst_pillar, Pillar::Quran);
    }

    #[test]
    fn worst_tie_among_nonzero_counts() {
        let summary = PillarSummary {
            learning: 2,
            studying: 1,
            exercise: 4,
            work: 1,
            entertainment: 3,
            quran: 5,
        };
        let report = generate_weekly_report(&week(10, 16, 1, 10, summary), None, 0);
        assert_eq!(report.best_pillar, Pillar::Quran);
        assert_eq!(report.worst_pillar, Pillar::Work);
    }

    #[test]
    fn monthly_ratings() {
        assert_eq!(generate_monthly_report(&month(9000, 85), None, 0).month_rating, MonthlyRating::Legend);
        assert_eq!(generate_monthly_report(&month(7000, 90), None, 0).month_rating, MonthlyRating::Grinder);
        assert_eq!(generate_monthly_report(&month(100, 40), None, 0).month_rating, MonthlyRating::Survivor);
        assert_eq!(generate_monthly_report(&month(100, 39), None, 0).month_rating, MonthlyRating::Falling);
    }

    #[test]
    fn monthly_comparison_and_week_ids() {
        let report = generate_monthly_report(&month(3000, 70), Some(&month(2000, 80)), 0);
        assert_eq!(report.comparison.xp_change_percent, Some(50));
        assert_eq!(report.comparison.consistency_change, Some(-10));
        assert_eq!(report.best_week_id, "wb");
        assert_eq!(report.weakest_week_id, "ww");
        assert!(report.summary_text.ends_with("XP improved by 50%."));
    }

    #[test]
    fn trend_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&StreakTrend::Stable).unwrap(), "\"stable\"");
    }
}
