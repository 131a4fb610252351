//! Character overview.

use questlog_core::scoring::rank_score;
use serde_json::json;

use crate::common::{flush_events, open_session, print_json, CmdResult};

pub fn run(json: bool) -> CmdResult {
    let mut session = open_session()?;
    flush_events(&mut session);

    let Some(profile) = session.profile() else {
        return Err("no profile; run `questlog profile create <name>`".into());
    };
    let stats = session.stats();
    let week_score = rank_score(
        stats.weekly_xp_accumulated,
        stats.weekly_tasks_completed,
        stats.weekly_max_streak,
        stats.weekly_exercise_count,
    );
    let open_tasks = session.tasks().iter().filter(|t| t.is_open()).count();

    if json {
        return print_json(&json!({
            "name": profile.name,
            "level": stats.level,
            "currentXp": stats.current_xp,
            "maxXp": stats.max_xp,
            "energy": stats.energy,
            "maxEnergy": stats.max_energy,
            "streak": stats.streak,
            "weekStart": stats.current_week_start,
            "weeklyXp": stats.weekly_xp_accumulated,
            "weeklyTasksCompleted": stats.weekly_tasks_completed,
            "weeklyMissedTasks": stats.weekly_missed_tasks,
            "weekRankScore": week_score,
            "openTasks": open_tasks,
            "dailyQuest": stats.daily_quest,
            "weeklyChallenge": stats.weekly_challenge,
            "attributes": stats.hunter_attributes,
        }));
    }

    println!("{}  Lv.{}", profile.name, stats.level);
    println!("XP      {}/{}", stats.current_xp, stats.max_xp);
    println!(
        "Energy  {}/{} ({}%)",
        stats.energy,
        stats.max_energy,
        stats.energy_percent()
    );
    println!("Streak  {} day(s)", stats.streak);
    if let Some(start) = stats.current_week_start {
        println!(
            "Week of {}: {} XP, {} done, {} missed, score {}",
            start,
            stats.weekly_xp_accumulated,
            stats.weekly_tasks_completed,
            stats.weekly_missed_tasks,
            week_score
        );
    }
    println!("Open tasks: {open_tasks}");

    let quest = &stats.daily_quest;
    let state = if quest.is_completed { "done" } else { "open" };
    println!(
        "Daily quest ({state}): push-ups {}/100, sit-ups {}/100, squats {}/100, run {}/10 km",
        quest.pushups, quest.situps, quest.squats, quest.run
    );
    if let Some(challenge) = &stats.weekly_challenge {
        let mark = if challenge.completed { "x" } else { " " };
        println!("Challenge [{mark}] {}", challenge.title);
    }
    Ok(())
}
