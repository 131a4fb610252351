//! Period scoring.
//!
//! Two scalars describe a closed period:
//!
//! ```text
//! rank    = floor(xp*0.4 + tasks*10*0.3 + streak_max*10*0.2 + min(exercise*20, 100)*0.1)
//! balance = clamp(100 * (1 - cv / 2.5), 0, 100)    cv = stddev / mean over pillar counts
//! ```
//!
//! Rank weights are expressed in tenths so the score is exact.

/// Weight of period XP, in tenths.
pub const RANK_XP_WEIGHT: u64 = 4;
/// Weight of completed tasks (already scaled by 10), in tenths.
pub const RANK_TASK_WEIGHT: u64 = 30;
/// Weight of the best streak (already scaled by 10), in tenths.
pub const RANK_STREAK_WEIGHT: u64 = 20;
/// Per-session exercise points, capped at [`RANK_EXERCISE_CAP`].
pub const RANK_EXERCISE_POINTS: u64 = 20;
pub const RANK_EXERCISE_CAP: u64 = 100;
/// Coefficient of variation at which balance reaches zero.
pub const BALANCE_CV_CEILING: f64 = 2.5;

/// Weighted productivity scalar used to compare periods.
pub fn rank_score(xp: u32, tasks: u32, streak_max: u32, exercise_count: u32) -> u32 {
    let exercise = (u64::from(exercise_count) * RANK_EXERCISE_POINTS).min(RANK_EXERCISE_CAP);
    let tenths = u64::from(xp) * RANK_XP_WEIGHT
        + u64::from(tasks) * RANK_TASK_WEIGHT
        + u64::from(streak_max) * RANK_STREAK_WEIGHT
        + exercise;
    (tenths / 10).min(u64::from(u32::MAX)) as u32
}

/// Evenness of effort across pillars, 0..=100. Zero when nothing was done.
pub fn balance_score(counts: &[u32]) -> u32 {
    let total: u64 = counts.iter().map(|&c| u64::from(c)).sum();
    if total == 0 || counts.is_empty() {
        return 0;
    }

    let n = counts.len() as f64;
    let mean = total as f64 / n;
    let variance = counts
        .iter()
        .map(|&c| (f64::from(c) - mean).powi(2))
        .sum::<f64>()
        / n;
    let cv = variance.sqrt() / mean;

    (100.0 * (1.0 - cv / BALANCE_CV_CEILING)).clamp(0.0, 100.0).round() as u32
}
