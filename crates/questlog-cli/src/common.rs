//! Session setup and output helpers shared by every command.

use chrono::{Local, NaiveDateTime};
use questlog_core::{Config, CoreError, Database, Event, PcgRandom, Session};
use serde::Serialize;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Open the game in the data directory, reconciled against the wall clock.
pub fn open_session() -> Result<Session<Database>, CoreError> {
    let db = Database::open()?;
    let config = Config::load_or_default();
    Session::open(db, config, Box::new(PcgRandom::from_entropy()), now())
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print pending notifications to stderr so stdout stays parseable.
pub fn flush_events(session: &mut Session<Database>) {
    for event in session.drain_events() {
        eprintln!("{}", describe(&event));
    }
}

pub fn describe(event: &Event) -> String {
    match event {
        Event::TaskCompleted {
            xp_gained,
            energy_spent,
            critical,
            ..
        } => {
            let crit = if *critical { " CRITICAL!" } else { "" };
            if *energy_spent >= 0 {
                format!("Task completed: +{xp_gained} XP, -{energy_spent} energy.{crit}")
            } else {
                format!("Task completed: +{xp_gained} XP, +{} energy.{crit}", -energy_spent)
            }
        }
        Event::LevelUp { level, .. } => format!("Level up! You are now level {level}."),
        Event::StreakBroken { previous, .. } => {
            format!("Streak broken after {previous} day(s).")
        }
        Event::TasksMissed { count, xp_lost, .. } => {
            format!("{count} task(s) missed, -{xp_lost} XP.")
        }
        Event::EnergyRestored { amount, energy, .. } => {
            format!("+{amount} energy recovered ({energy}).")
        }
        Event::EnergyCritical { energy, .. } => format!("Energy critical: {energy}."),
        Event::ShadowTaskSpawned {
            title,
            energy_restore,
            ..
        } => format!("Shadow quest: {title} (+{energy_restore} energy)."),
        Event::ShadowTasksCleared { count, .. } => {
            format!("{count} shadow quest(s) dismissed, energy recovered.")
        }
        Event::ShadowTaskConsumed {
            energy_restored, ..
        } => format!("Rested: +{energy_restored} energy."),
        Event::WeekArchived {
            week_id,
            rank_score,
            ..
        } => format!("Week {week_id} archived, rank score {rank_score}."),
        Event::MonthArchived {
            month_id, total_xp, ..
        } => format!("Month {month_id} archived, {total_xp} XP total."),
        Event::ReportsGenerated {
            weekly_rating,
            monthly_rating,
            xp_bonus,
            ..
        } => {
            let mut parts = Vec::new();
            if let Some(rating) = weekly_rating {
                parts.push(format!("week rated {rating}"));
            }
            if let Some(rating) = monthly_rating {
                parts.push(format!("month rated {rating}"));
            }
            if *xp_bonus > 0 {
                parts.push(format!("+{xp_bonus} bonus XP"));
            }
            format!("Reports ready: {}.", parts.join(", "))
        }
        Event::ChallengeCompleted { xp_bonus, .. } => {
            format!("Weekly challenge complete: +{xp_bonus} XP.")
        }
        Event::DailyQuestCompleted { xp_bonus, .. } => {
            format!("Daily quest complete: energy refilled, +{xp_bonus} XP.")
        }
    }
}
