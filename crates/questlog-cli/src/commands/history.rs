//! Read-only views over archived periods.

use clap::Subcommand;

use crate::common::{flush_events, open_session, print_json, CmdResult};

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Archived weeks
    Weeks,
    /// Archived months
    Months,
    /// Weekly and monthly reports
    Reports,
    /// Weekly and monthly rewards
    Rewards,
}

pub fn run(action: HistoryAction, json: bool) -> CmdResult {
    let mut session = open_session()?;
    flush_events(&mut session);
    let state = session.state();

    match action {
        HistoryAction::Weeks if json => print_json(&state.weekly_history)?,
        HistoryAction::Weeks => {
            for week in &state.weekly_history {
                println!(
                    "{}  {}..{}  {} XP  {} done  {} missed  balance {}  score {}",
                    week.week_id,
                    week.start_date,
                    week.end_date,
                    week.total_xp,
                    week.tasks_completed,
                    week.missed_tasks_count,
                    week.balance_score,
                    week.rank_score
                );
            }
        }
        HistoryAction::Months if json => print_json(&state.monthly_history)?,
        HistoryAction::Months => {
            for month in &state.monthly_history {
                println!(
                    "{}  {} week(s)  {} XP  rank {:?}  best {}",
                    month.month_id,
                    month.weeks_included.len(),
                    month.total_xp,
                    month.month_rank,
                    month.best_week_id
                );
            }
        }
        HistoryAction::Reports if json => print_json(&serde_json::json!({
            "weekly": state.weekly_reports,
            "monthly": state.monthly_reports,
        }))?,
        HistoryAction::Reports => {
            for report in &state.weekly_reports {
                println!("{} [{}] {}", report.week_id, report.rating, report.summary_text);
            }
            for report in &state.monthly_reports {
                println!(
                    "{} [{}] {}",
                    report.month_id, report.month_rating, report.summary_text
                );
            }
        }
        HistoryAction::Rewards if json => print_json(&serde_json::json!({
            "weekly": state.weekly_rewards,
            "monthly": state.monthly_rewards,
        }))?,
        HistoryAction::Rewards => {
            for reward in &state.weekly_rewards {
                println!(
                    "{} {:?} +{} XP  {}",
                    reward.report_id, reward.badge, reward.xp_bonus, reward.message
                );
            }
            for reward in &state.monthly_rewards {
                println!(
                    "{} {:?} +{} XP  {}",
                    reward.report_id, reward.badge, reward.xp_bonus, reward.message
                );
            }
        }
    }
    Ok(())
}
