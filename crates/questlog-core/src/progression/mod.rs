//! Progression calculator.
//!
//! Pure arithmetic over the character sheet: XP gain with level rollover,
//! capped XP loss, clamped energy deltas, fraction-preserving regeneration
//! and streak transitions. Functions take a borrowed [`UserStats`] and return
//! the new values; callers decide when to commit them.

use chrono::NaiveDate;

use crate::calendar::yesterday;
use crate::economy::{percent_of, BASE_XP_PER_LEVEL, XP_SCALING_FACTOR};
use crate::random::RandomSource;
use crate::stats::UserStats;

const MILLIS_PER_HOUR: i64 = 3_600_000;

/// XP required to leave `level`: `floor(300 * 1.25^(level - 1))`.
pub fn max_xp_for_level(level: u32) -> u32 {
    let exponent = level.saturating_sub(1).min(i32::MAX as u32) as i32;
    let raw = (f64::from(BASE_XP_PER_LEVEL) * XP_SCALING_FACTOR.powi(exponent)).floor();
    if raw >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        (raw as u32).max(1)
    }
}

/// Result of [`apply_xp_gain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpGain {
    pub current_xp: u32,
    pub level: u32,
    pub max_xp: u32,
    pub levels_gained: u32,
}

impl XpGain {
    pub fn leveled_up(&self) -> bool {
        self.levels_gained > 0
    }

    /// Write the new level, XP and curve position into `stats`.
    pub fn commit(&self, stats: &mut UserStats) {
        stats.current_xp = self.current_xp;
        stats.level = self.level;
        stats.max_xp = self.max_xp;
    }
}

/// Add `amount` XP, rolling over as many levels as it covers.
pub fn apply_xp_gain(stats: &UserStats, amount: u32) -> XpGain {
    let mut level = stats.level.max(1);
    let mut max_xp = if stats.max_xp == 0 {
        max_xp_for_level(level)
    } else {
        stats.max_xp
    };
    let mut current = u64::from(stats.current_xp) + u64::from(amount);
    let mut levels_gained = 0;

    while current >= u64::from(max_xp) {
        current -= u64::from(max_xp);
        level = level.saturating_add(1);
        levels_gained += 1;
        max_xp = max_xp_for_level(level);
    }

    XpGain {
        current_xp: current as u32,
        level,
        max_xp,
        levels_gained,
    }
}

/// Result of [`apply_xp_loss`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpLoss {
    pub current_xp: u32,
    pub actual_loss: u32,
}

/// Remove up to `amount` XP, never more than `max_loss_percent` of the
/// current XP. Levels never drop.
pub fn apply_xp_loss(stats: &UserStats, amount: u32, max_loss_percent: u32) -> XpLoss {
    let cap = percent_of(stats.current_xp, max_loss_percent.min(100));
    let actual_loss = amount.min(cap);
    XpLoss {
        current_xp: stats.current_xp - actual_loss,
        actual_loss,
    }
}

/// Energy after applying `delta`, clamped to `[0, max_energy]`.
pub fn apply_energy_delta(stats: &UserStats, delta: i32) -> u32 {
    let next = i64::from(stats.energy) + i64::from(delta);
    next.clamp(0, i64::from(stats.max_energy)) as u32
}

/// Whole energy units accrued between two checkpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnergyRecovery {
    pub amount: u32,
    /// Checkpoint advanced only by the time the recovered units account for.
    pub checkpoint_ms: i64,
}

/// Regeneration between `last_update_ms` and `now_ms` at `rate_per_hour`.
///
/// The unconsumed fraction of an hour stays behind the checkpoint, so
/// frequent ticks recover exactly as much as one long gap.
pub fn compute_energy_recovered(last_update_ms: i64, now_ms: i64, rate_per_hour: u32) -> EnergyRecovery {
    let elapsed = now_ms.saturating_sub(last_update_ms);
    if elapsed <= 0 || rate_per_hour == 0 {
        return EnergyRecovery {
            amount: 0,
            checkpoint_ms: last_update_ms,
        };
    }

    let rate = i64::from(rate_per_hour);
    let amount = elapsed.saturating_mul(rate) / MILLIS_PER_HOUR;
    let amount = amount.min(i64::from(u32::MAX));
    let consumed = amount * MILLIS_PER_HOUR / rate;

    EnergyRecovery {
        amount: amount as u32,
        checkpoint_ms: last_update_ms + consumed,
    }
}

/// Advance regeneration to `now_ms`. Returns the energy actually gained.
///
/// A missing checkpoint starts counting at `now_ms`. At full energy the
/// checkpoint snaps to `now_ms` so no regeneration is banked.
pub fn recover_energy(stats: &mut UserStats, now_ms: i64, rate_per_hour: u32) -> u32 {
    let last = match stats.last_energy_update {
        Some(last) if last <= now_ms => last,
        _ => {
            stats.last_energy_update = Some(now_ms);
            return 0;
        }
    };

    if stats.is_energy_full() {
        stats.last_energy_update = Some(now_ms);
        return 0;
    }

    let recovery = compute_energy_recovered(last, now_ms, rate_per_hour);
    if recovery.amount == 0 {
        return 0;
    }

    let before = stats.energy;
    stats.energy = apply_energy_delta(stats, recovery.amount.min(i32::MAX as u32) as i32);
    stats.last_energy_update = Some(if stats.is_energy_full() {
        now_ms
    } else {
        recovery.checkpoint_ms
    });
    stats.energy - before
}

/// How a streak moves relative to the last completion date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakChange {
    /// Already counted today.
    Unchanged,
    /// Last completion was yesterday.
    Extended,
    /// Gap of more than a day.
    Reset,
}

/// Result of [`update_streak`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakUpdate {
    pub streak: u32,
    pub change: StreakChange,
    /// A positive streak was lost.
    pub broken: bool,
}

impl StreakUpdate {
    /// Streak after a completion today: a reset restarts at 1.
    pub fn after_completion(&self) -> u32 {
        self.streak.max(1)
    }
}

pub fn update_streak(streak: u32, last_completion: Option<NaiveDate>, today: NaiveDate) -> StreakUpdate {
    match last_completion {
        Some(last) if last == today => StreakUpdate {
            streak,
            change: StreakChange::Unchanged,
            broken: false,
        },
        Some(last) if last == yesterday(today) => StreakUpdate {
            streak: streak.saturating_add(1),
            change: StreakChange::Extended,
            broken: false,
        },
        _ => StreakUpdate {
            streak: 0,
            change: StreakChange::Reset,
            broken: streak > 0,
        },
    }
}

/// Roll for a critical hit.
pub fn roll_critical(rng: &mut dyn RandomSource, chance: f64) -> bool {
    chance > 0.0 && rng.next_f64() < chance
}
