//! Weekly challenge.

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use super::{UserStats, WeeklyChallenge};
use crate::calendar::start_of_week;
use crate::economy::{percent_of, WEEKLY_CHALLENGE_BONUS_PERCENT};
use crate::error::ValidationError;
use crate::events::{Event, EventSink};
use crate::progression::apply_xp_gain;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeOutcome {
    pub xp_bonus: u32,
    pub levels_gained: u32,
}

/// Replace the current week's challenge.
pub fn set_weekly_challenge<'a>(
    stats: &'a mut UserStats,
    title: &str,
    today: NaiveDate,
) -> Result<&'a WeeklyChallenge, ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "title".into(),
            message: "must not be empty".into(),
        });
    }
    let week_start = stats
        .current_week_start
        .unwrap_or_else(|| start_of_week(today));
    Ok(stats.weekly_challenge.insert(WeeklyChallenge {
        id: Uuid::new_v4().to_string(),
        title: title.to_string(),
        week_start,
        completed: false,
    }))
}

/// Complete the active challenge for 25% of the level's XP requirement.
///
/// The bonus counts toward the week's accumulated XP.
pub fn complete_weekly_challenge(
    stats: &mut UserStats,
    now: NaiveDateTime,
    events: &mut dyn EventSink,
) -> Result<ChallengeOutcome, ValidationError> {
    let challenge_id = match &stats.weekly_challenge {
        Some(challenge) if !challenge.completed => challenge.id.clone(),
        _ => return Err(ValidationError::NoActiveChallenge),
    };

    let xp_bonus = percent_of(stats.max_xp, WEEKLY_CHALLENGE_BONUS_PERCENT);
    let gain = apply_xp_gain(stats, xp_bonus);
    gain.commit(stats);
    stats.weekly_xp_accumulated = stats.weekly_xp_accumulated.saturating_add(xp_bonus);
    if let Some(challenge) = stats.weekly_challenge.as_mut() {
        challenge.completed = true;
    }
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

    events.emit(Event::ChallengeCompleted {
        challenge_id,
        xp_bonus,
        at: now,
    });
    Ok(ChallengeOutcome {
        xp_bonus,
        levels_gained: gain.levels_gained,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 5).unwrap()
    }

    fn now() -> NaiveDateTime {
        today().and_hms_opt(18, 0, 0).unwrap()
    }

    #[test]
    fn set_uses_current_week_start() {
        let mut stats = UserStats::default();
        let challenge = set_weekly_challenge(&mut stats, " Read 3 books ", today()).unwrap();
        assert_eq!(challenge.title, "Read 3 books");
        assert_eq!(challenge.week_start, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert!(set_weekly_challenge(&mut stats, "", today()).is_err());
    }

    #[test]
    fn completion_grants_quarter_level_once() {
        let mut stats = UserStats {
            current_xp: 250,
            ..UserStats::default()
        };
        set_weekly_challenge(&mut stats, "No sugar", today()).unwrap();
        let mut events: Vec<Event> = Vec::new();

        let outcome = complete_weekly_challenge(&mut stats, now(), &mut events).unwrap();
        // 25% of 300 = 75; 250 + 75 rolls into level 2
        assert_eq!(
            outcome,
            ChallengeOutcome {
                xp_bonus: 75,
                levels_gained: 1
            }
        );
        assert_eq!(stats.level, 2);
        assert_eq!(stats.current_xp, 25);
        assert_eq!(stats.weekly_xp_accumulated, 75);
        assert_eq!(stats.hunter_attributes.sense, 11.0);
        assert_eq!(events.len(), 2);

        assert_eq!(
            complete_weekly_challenge(&mut stats, now(), &mut events),
            Err(ValidationError::NoActiveChallenge)
        );
    }

    #[test]
    fn no_challenge_is_an_error() {
        let mut stats = UserStats::default();
        assert_eq!(
            complete_weekly_challenge(&mut stats, now(), &mut Vec::new()),
            Err(ValidationError::NoActiveChallenge)
        );
    }
}
