//! Reward generator.
//!
//! Each report yields exactly one reward, chosen by rating from a fixed
//! table. No randomness is involved.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::report::{MonthlyRating, MonthlyReport, WeeklyRating, WeeklyReport};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BadgeTier {
    Legendary,
    Gold,
    Silver,
    Bronze,
    Gray,
}

/// Presentation hint carried alongside a reward.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisualCue {
    UpArrow,
    RightArrow,
    Warning,
    Dash,
    StarGold,
    StarSilver,
    StarBronze,
    GrayIcon,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReward {
    pub id: String,
    /// Week id of the report this reward belongs to
    pub report_id: String,
    pub xp_bonus: u32,
    pub badge: BadgeTier,
    pub visual_cue: VisualCue,
    pub message: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReward {
    pub id: String,
    /// Month id of the report this reward belongs to
    pub report_id: String,
    pub xp_bonus: u32,
    pub badge: BadgeTier,
    pub visual_cue: VisualCue,
    pub message: String,
    pub created_at: i64,
}

pub fn generate_weekly_reward(report: &WeeklyReport, now_ms: i64) -> WeeklyReward {
    let (xp_bonus, badge, visual_cue, message) = match report.rating {
        WeeklyRating::Excellent => (500, BadgeTier::Gold, VisualCue::UpArrow, "Excellent work! A gold reward."),
        WeeklyRating::Consistent => (200, BadgeTier::Silver, VisualCue::RightArrow, "Good consistency, keep this pace."),
        WeeklyRating::Unstable => (50, BadgeTier::Bronze, VisualCue::Warning, "An unsteady week, try to focus more."),
        WeeklyRating::Lazy => (0, BadgeTier::Gray, VisualCue::Dash, "Don't give up, next week is a fresh start."),
    };

    WeeklyReward {
        id: Uuid::new_v4().to_string(),
        report_id: report.week_id.clone(),
        xp_bonus,
        badge,
        visual_cue,
        message: message.to_string(),
        created_at: now_ms,
    }
}

pub fn generate_monthly_reward(report: &MonthlyReport, now_ms: i64) -> MonthlyReward {
    let (xp_bonus, badge, visual_cue, message) = match report.month_rating {
        MonthlyRating::Legend => (2000, BadgeTier::Legendary, VisualCue::StarGold, "Legendary performance! You are at the top."),
        MonthlyRating::Grinder => (1000, BadgeTier::Gold, VisualCue::StarSilver, "Tremendous effort, a rare reward."),
        MonthlyRating::Survivor => (300, BadgeTier::Silver, VisualCue::StarBronze, "You made it through this month, keep going."),
        MonthlyRating::Falling => (0, BadgeTier::Gray, VisualCue::GrayIcon, "Review your plans, next month will be better."),
    };

    MonthlyReward {
        id: Uuid::new_v4().to_string(),
        report_id: report.month_id.clone(),
        xp_bonus,
        badge,
        visual_cue,
        message: message.to_string(),
        created_at: now_ms,
    }
}
