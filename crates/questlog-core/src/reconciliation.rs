//! Activation-time reconciliation.
//!
//! Brings persisted state up to date with the wall clock before any user
//! intent is accepted:
//!
//! 1. Overdue day-assigned tasks are marked missed and penalised
//! 2. Energy regenerates (a new calendar day refills it)
//! 3. The daily quest resets and a lapsed streak breaks
//! 4. A period of seven or more days is archived with its report and reward,
//!    and a month is closed once it has four weeks or the calendar moved on
//!
//! Running it twice at the same instant changes nothing the second time.
//!
//! ## Usage
//! ```rust,ignore
//! let engine = ReconciliationEngine::with_config(&config);
//! let summary = engine.reconcile(&mut state, now, &mut events);
//! println!("{}", summary.message());
//! ```

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::calendar::{app_day_index, days_between, epoch_millis, month_id, start_of_week, DAYS_PER_WEEK};
use crate::economy::ceil_div;
use crate::events::{Event, EventSink};
use crate::history::{create_monthly_snapshot, create_weekly_snapshot, WeeklyHistory};
use crate::progression::{apply_xp_gain, apply_xp_loss, recover_energy, update_streak, StreakChange};
use crate::report::{generate_monthly_report, generate_weekly_report, MonthlyRating, WeeklyRating};
use crate::reward::{generate_monthly_reward, generate_weekly_reward};
use crate::state::GameState;
use crate::stats::DailyQuestProgress;
use crate::storage::{Config, EconomyConfig, RewardsConfig};

/// Weekly snapshots that close a month even before the calendar turns.
pub const WEEKS_PER_MONTH_CLOSE: usize = 4;

/// What one reconciliation pass did.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReconciliationSummary {
    pub missed_tasks: u32,
    pub xp_lost: u32,
    pub energy_restored: u32,
    pub new_day: bool,
    pub streak_broken: bool,
    /// Id of the weekly snapshot created this pass.
    pub week_archived: Option<String>,
    pub month_archived: Option<String>,
    pub weekly_rating: Option<WeeklyRating>,
    pub monthly_rating: Option<MonthlyRating>,
    /// Reward XP credited after the period closed.
    pub xp_bonus: u32,
}

impl ReconciliationSummary {
    pub fn archived(&self) -> bool {
        self.week_archived.is_some()
    }

    /// Get a human-readable summary message.
    pub fn message(&self) -> String {
        let mut parts = Vec::new();
        if self.missed_tasks > 0 {
            parts.push(format!(
                "{} task(s) missed, -{} XP",
                self.missed_tasks, self.xp_lost
            ));
        }
        if self.new_day {
            parts.push("new day, energy refilled".to_string());
        } else if self.energy_restored > 0 {
            parts.push(format!("+{} energy recovered", self.energy_restored));
        }
        if self.streak_broken {
            parts.push("streak broken".to_string());
        }
        if let Some(rating) = self.weekly_rating {
            parts.push(format!("week archived ({rating})"));
        }
        if let Some(rating) = self.monthly_rating {
            parts.push(format!("month archived ({rating})"));
        }
        if self.xp_bonus > 0 {
            parts.push(format!("+{} bonus XP", self.xp_bonus));
        }

        if parts.is_empty() {
            "Up to date.".to_string()
        } else {
            let mut text = parts.join("; ");
            text.push('.');
            text
        }
    }
}

/// Engine for bringing saved state up to date with elapsed time.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationEngine {
    economy: EconomyConfig,
    rewards: RewardsConfig,
}

impl ReconciliationEngine {
    /// Create a reconciliation engine with default tuning.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &Config) -> Self {
        Self {
            economy: config.economy.clone(),
            rewards: config.rewards.clone(),
        }
    }

    /// Run every reconciliation step against `state` at `now`.
    pub fn reconcile(
        &self,
        state: &mut GameState,
        now: NaiveDateTime,
        events: &mut dyn EventSink,
    ) -> ReconciliationSummary {
        let today = now.date();
        let mut summary = ReconciliationSummary::default();

        let week_start = *state
            .stats
            .current_week_start
            .get_or_insert_with(|| start_of_week(today));
        let boundary = days_between(week_start, today) >= DAYS_PER_WEEK;

        self.check_missed_tasks(state, today, boundary, now, events, &mut summary);
        self.recover_energy(state, now, events, &mut summary);
        self.reset_daily_quest(state, today, now, events, &mut summary);

        if boundary {
            self.archive_and_report(state, now, events, &mut summary);
        }

        if summary != ReconciliationSummary::default() {
            tracing::info!("reconciled: {}", summary.message());
        }
        summary
    }

    fn check_missed_tasks(
        &self,
        state: &mut GameState,
        today: NaiveDate,
        boundary: bool,
        now: NaiveDateTime,
        events: &mut dyn EventSink,
        summary: &mut ReconciliationSummary,
    ) {
        let today_idx = app_day_index(today);
        let mut missed = 0u32;
        let mut penalty = 0i64;

        for task in state.tasks.iter_mut() {
            if !task.is_open() || task.is_shadow {
                continue;
            }
            let Some(day) = task.day else { continue };
            if boundary || day.index() < today_idx {
                task.is_missed = true;
                missed += 1;
                penalty += ceil_div(
                    i64::from(task.xp_reward) * i64::from(self.economy.xp_penalty_percent),
                    100,
                );
            }
        }

        if missed == 0 {
            return;
        }

        let stats = &mut state.stats;
        let penalty = penalty.clamp(0, i64::from(u32::MAX)) as u32;
        let loss = apply_xp_loss(stats, penalty, self.economy.max_daily_xp_loss_percent);
        stats.current_xp = loss.current_xp;
        stats.weekly_missed_tasks = stats.weekly_missed_tasks.saturating_add(missed);
        stats.weekly_xp_lost = stats.weekly_xp_lost.saturating_add(loss.actual_loss);

        summary.missed_tasks = missed;
        summary.xp_lost = loss.actual_loss;
        tracing::debug!(missed, penalty, actual = loss.actual_loss, "marked overdue tasks");
        events.emit(Event::TasksMissed {
            count: missed,
            xp_lost: loss.actual_loss,
            at: now,
        });
    }

    fn recover_energy(
        &self,
        state: &mut GameState,
        now: NaiveDateTime,
        events: &mut dyn EventSink,
        summary: &mut ReconciliationSummary,
    ) {
        let stats = &mut state.stats;
        let now_ms = epoch_millis(now);
        let new_day = stats.last_login_date != Some(now.date());

        let restored = if new_day {
            let restored = stats.max_energy.saturating_sub(stats.energy);
            stats.energy = stats.max_energy;
            stats.last_energy_update = Some(now_ms);
            restored
        } else {
            recover_energy(stats, now_ms, self.economy.energy_recovery_rate)
        };

        summary.new_day = new_day;
        summary.energy_restored = restored;
        if restored > 0 {
            events.emit(Event::EnergyRestored {
                amount: restored,
                energy: stats.energy,
                at: now,
            });
        }
    }

    fn reset_daily_quest(
        &self,
        state: &mut GameState,
        today: NaiveDate,
        now: NaiveDateTime,
        events: &mut dyn EventSink,
        summary: &mut ReconciliationSummary,
    ) {
        let stats = &mut state.stats;
        if stats.daily_quest.last_reset_date != Some(today) {
            let streak = update_streak(stats.streak, stats.last_task_completion_date, today);
            if streak.change == StreakChange::Reset {
                if streak.broken {
                    events.emit(Event::StreakBroken {
                        previous: stats.streak,
                        at: now,
                    });
                    summary.streak_broken = true;
                }
                stats.streak = 0;
            }
            stats.daily_quest = DailyQuestProgress::fresh(today);
        }
        stats.last_login_date = Some(today);
    }

    fn archive_and_report(
        &self,
        state: &mut GameState,
        now: NaiveDateTime,
        events: &mut dyn EventSink,
        summary: &mut ReconciliationSummary,
    ) {
        let today = now.date();
        let now_ms = epoch_millis(now);

        let snapshot = create_weekly_snapshot(&state.stats, &state.tasks, today, now_ms);
        let report = generate_weekly_report(&snapshot, state.weekly_history.last(), now_ms);
        let reward = generate_weekly_reward(&report, now_ms);
        let closed_month = snapshot.month_id.clone();

        events.emit(Event::WeekArchived {
            week_id: snapshot.week_id.clone(),
            month_id: closed_month.clone(),
            rank_score: snapshot.rank_score,
            at: now,
        });
        tracing::info!(
            week_id = %snapshot.week_id,
            rank_score = snapshot.rank_score,
            rating = %report.rating,
            "archived week"
        );
        summary.week_archived = Some(snapshot.week_id.clone());
        summary.weekly_rating = Some(report.rating);
        let mut xp_bonus = u64::from(reward.xp_bonus);

        state.weekly_history.push(snapshot);
        state.weekly_reports.push(report);
        state.weekly_rewards.push(reward);

        let stats = &mut state.stats;
        stats.reset_weekly_accumulators();
        stats.weekly_challenge = None;
        stats.current_week_start = Some(start_of_week(today));
        state.tasks.retain(|t| t.day.is_none());

        let weeks: Vec<WeeklyHistory> = state
            .weekly_history
            .iter()
            .filter(|w| w.month_id == closed_month)
            .cloned()
            .collect();
        let month_over = weeks.len() >= WEEKS_PER_MONTH_CLOSE || closed_month != month_id(today);
        let already = state
            .monthly_history
            .iter()
            .any(|m| m.month_id == closed_month);

        if month_over && !already {
            match create_monthly_snapshot(&closed_month, &weeks, now_ms) {
                Ok(month) => {
                    let report =
                        generate_monthly_report(&month, state.monthly_history.last(), now_ms);
                    let reward = generate_monthly_reward(&report, now_ms);
                    events.emit(Event::MonthArchived {
                        month_id: month.month_id.clone(),
                        total_xp: month.total_xp,
                        at: now,
                    });
                    tracing::info!(month_id = %month.month_id, rating = %report.month_rating, "archived month");
                    summary.month_archived = Some(month.month_id.clone());
                    summary.monthly_rating = Some(report.month_rating);
                    xp_bonus += u64::from(reward.xp_bonus);

                    state.monthly_history.push(month);
                    state.monthly_reports.push(report);
                    state.monthly_rewards.push(reward);
                }
                Err(e) => tracing::warn!("monthly snapshot skipped: {e}"),
            }
        }

        let xp_bonus = xp_bonus.min(u64::from(u32::MAX)) as u32;
        if self.rewards.grant_xp_bonus && xp_bonus > 0 {
            let stats = &mut state.stats;
            let gain = apply_xp_gain(stats, xp_bonus);
            gain.commit(stats);
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
            summary.xp_bonus = xp_bonus;
        }

        events.emit(Event::ReportsGenerated {
            weekly_rating: summary.weekly_rating,
            monthly_rating: summary.monthly_rating,
            xp_bonus: summary.xp_bonus,
            at: now,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::DayOfWeek;
    use crate::economy::{Difficulty, Pillar};
    use crate::stats::UserStats;
    use crate::task::Task;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(day: NaiveDate, hour: u32) -> NaiveDateTime {
        day.and_hms_opt(hour, 0, 0).unwrap()
    }

    fn day_task(id: &str, day: Option<DayOfWeek>, xp_reward: u32) -> Task {
        Task {
            id: id.into(),
            title: id.into(),
            description: String::new(),
            pillar: Pillar::Work,
            completed: false,
            energy_cost: 10,
            xp_reward,
            difficulty: Difficulty::D,
            due_date: None,
            day,
            created_at: 0,
            order: 0,
            pages: None,
            is_shadow: false,
            is_missed: false,
        }
    }

    /// Reconciled state for Wednesday 2024-06-05 (week starting Saturday 06-01).
    fn settled_state() -> GameState {
        let today = date(2024, 6, 5);
        GameState {
            stats: UserStats::new_character(today, epoch_millis(at(today, 8))),
            ..GameState::default()
        }
    }

    #[test]
    fn initialises_missing_week_start() {
        let mut state = GameState::default();
        let engine = ReconciliationEngine::new();
        engine.reconcile(&mut state, at(date(2024, 6, 5), 9), &mut Vec::new());
        assert_eq!(state.stats.current_week_start, Some(date(2024, 6, 1)));
        assert_eq!(state.stats.last_login_date, Some(date(2024, 6, 5)));
    }

    #[test]
    fn earlier_day_tasks_are_missed_with_capped_penalty() {
        let mut state = settled_state();
        state.stats.current_xp = 100;
        state.tasks = vec![
            // Monday (index 2) is before Wednesday (index 4)
            day_task("mon", Some(DayOfWeek::Monday), 40),
            day_task("fri", Some(DayOfWeek::Friday), 40),
            day_task("backlog", None, 40),
        ];
        let mut events: Vec<Event> = Vec::new();

        let summary = ReconciliationEngine::new().reconcile(
            &mut state,
            at(date(2024, 6, 5), 12),
            &mut events,
        );

        // ceil(40 * 30%) = 12, capped at 15% of 100
        assert_eq!(summary.missed_tasks, 1);
        assert_eq!(summary.xp_lost, 12);
        assert_eq!(state.stats.current_xp, 88);
        assert!(state.find_task("mon").unwrap().is_missed);
        assert!(!state.find_task("fri").unwrap().is_missed);
        assert!(!state.find_task("backlog").unwrap().is_missed);
        assert_eq!(state.stats.weekly_missed_tasks, 1);
        assert_eq!(state.stats.weekly_xp_lost, 12);

        let cap_state = &mut settled_state();
        cap_state.stats.current_xp = 40;
        cap_state.tasks = vec![day_task("mon", Some(DayOfWeek::Monday), 100)];
        let summary = ReconciliationEngine::new().reconcile(
            cap_state,
            at(date(2024, 6, 5), 12),
            &mut Vec::new(),
        );
        assert_eq!(summary.xp_lost, 6);
        assert_eq!(cap_state.stats.current_xp, 34);
    }

    #[test]
    fn new_day_refills_energy_and_breaks_streak() {
        let mut state = settled_state();
        state.stats.energy = 12;
        state.stats.streak = 5;
        state.stats.last_task_completion_date = Some(date(2024, 6, 3));
        state.stats.daily_quest.pushups = 50;
        let mut events: Vec<Event> = Vec::new();

        let summary = ReconciliationEngine::new().reconcile(
            &mut state,
            at(date(2024, 6, 6), 7),
            &mut events,
        );

        assert!(summary.new_day);
        assert_eq!(summary.energy_restored, 88);
        assert_eq!(state.stats.energy, 100);
        assert!(summary.streak_broken);
        assert_eq!(state.stats.streak, 0);
        assert_eq!(state.stats.daily_quest.pushups, 0);
        assert_eq!(state.stats.daily_quest.last_reset_date, Some(date(2024, 6, 6)));
        assert!(events.iter().any(|e| matches!(e, Event::StreakBroken { previous: 5, .. })));
    }

    #[test]
    fn streak_survives_when_last_completion_was_yesterday() {
        let mut state = settled_state();
        state.stats.streak = 2;
        state.stats.last_task_completion_date = Some(date(2024, 6, 5));
        ReconciliationEngine::new().reconcile(&mut state, at(date(2024, 6, 6), 7), &mut Vec::new());
        assert_eq!(state.stats.streak, 2);
    }

    #[test]
    fn same_day_recovers_intraday() {
        let mut state = settled_state();
        state.stats.energy = 50;
        let today = date(2024, 6, 5);
        // two and a half hours at 8/h
        let summary = ReconciliationEngine::new().reconcile(
            &mut state,
            today.and_hms_opt(10, 30, 0).unwrap(),
            &mut Vec::new(),
        );
        assert!(!summary.new_day);
        assert_eq!(summary.energy_restored, 20);
        assert_eq!(state.stats.energy, 70);
    }

    #[test]
    fn week_boundary_archives_once_and_resets() {
        let mut state = settled_state();
        state.stats.weekly_xp_accumulated = 600;
        state.stats.weekly_tasks_completed = 12;
        state.stats.weekly_max_streak = 4;
        let mut done = day_task("done", Some(DayOfWeek::Sunday), 20);
        done.completed = true;
        state.tasks = vec![done, day_task("backlog", None, 20)];

        let now = at(date(2024, 6, 8), 9);
        let engine = ReconciliationEngine::new();
        let mut events: Vec<Event> = Vec::new();
        let summary = engine.reconcile(&mut state, now, &mut events);

        assert!(summary.archived());
        assert_eq!(state.weekly_history.len(), 1);
        assert_eq!(state.weekly_reports.len(), 1);
        assert_eq!(state.weekly_rewards.len(), 1);
        let week = &state.weekly_history[0];
        assert_eq!(week.total_xp, 600);
        assert_eq!(week.start_date, date(2024, 6, 1));
        assert_eq!(week.archived_tasks.len(), 2);
        assert_eq!(state.stats.weekly_xp_accumulated, 0);
        assert_eq!(state.stats.current_week_start, Some(date(2024, 6, 8)));
        assert_eq!(state.tasks.len(), 1);
        assert_eq!(state.tasks[0].id, "backlog");
        assert!(state.monthly_history.is_empty());

        let again = engine.reconcile(&mut state, now, &mut events);
        assert_eq!(again, ReconciliationSummary::default());
        assert_eq!(state.weekly_history.len(), 1);
    }

    #[test]
    fn reward_bonus_is_credited_after_reset() {
        let mut state = settled_state();
        // rank > 500 on a first week rates Excellent
        state.stats.weekly_xp_accumulated = 1_500;
        state.stats.weekly_tasks_completed = 1;
        let summary = ReconciliationEngine::new().reconcile(
            &mut state,
            at(date(2024, 6, 8), 9),
            &mut Vec::new(),
        );
        assert_eq!(summary.weekly_rating, Some(WeeklyRating::Excellent));
        assert_eq!(summary.xp_bonus, 500);
        assert_eq!(state.stats.level, 2);
        assert_eq!(state.stats.current_xp, 200);
        assert_eq!(state.stats.weekly_xp_accumulated, 0);
    }

    #[test]
    fn bonus_can_be_disabled() {
        let mut config = Config::default();
        config.rewards.grant_xp_bonus = false;
        let mut state = settled_state();
        state.stats.weekly_xp_accumulated = 1_500;
        state.stats.weekly_tasks_completed = 1;
        let summary = ReconciliationEngine::with_config(&config).reconcile(
            &mut state,
            at(date(2024, 6, 8), 9),
            &mut Vec::new(),
        );
        assert_eq!(summary.xp_bonus, 0);
        assert_eq!(state.stats.current_xp, 0);
    }

    #[test]
    fn month_change_closes_month() {
        let mut state = settled_state();
        state.stats.current_week_start = Some(date(2024, 6, 29));
        state.stats.last_login_date = Some(date(2024, 7, 4));
        let summary = ReconciliationEngine::new().reconcile(
            &mut state,
            at(date(2024, 7, 6), 9),
            &mut Vec::new(),
        );
        assert_eq!(summary.month_archived.as_deref(), Some("2024-06"));
        assert_eq!(state.monthly_history.len(), 1);
        assert_eq!(state.monthly_reports.len(), 1);
        assert_eq!(state.monthly_rewards.len(), 1);
    }

    #[test]
    fn shadow_tasks_are_never_missed() {
        let mut state = settled_state();
        let mut shadow = day_task("shadow", Some(DayOfWeek::Saturday), 0);
        shadow.is_shadow = true;
        state.tasks = vec![shadow];
        let summary = ReconciliationEngine::new().reconcile(
            &mut state,
            at(date(2024, 6, 5), 12),
            &mut Vec::new(),
        );
        assert_eq!(summary.missed_tasks, 0);
    }
}
