use clap::Subcommand;
use questlog_core::stats::DailyQuestOutcome;
use questlog_core::QuestExercise;

use crate::common::{flush_events, now, open_session, print_json, CmdResult};

#[derive(Subcommand)]
pub enum QuestAction {
    /// Record today's total for one exercise
    Update {
        /// pushups, situps, squats or run
        exercise: QuestExercise,
        /// Repetitions, or kilometres for the run
        amount: f64,
    },
}

pub fn run(action: QuestAction, json: bool) -> CmdResult {
    let mut session = open_session()?;
    flush_events(&mut session);

    match action {
        QuestAction::Update { exercise, amount } => {
            let outcome = session.update_daily_quest(exercise, amount, now())?;
            let quest = &session.stats().daily_quest;
            if json {
                print_json(quest)?;
            } else {
                match outcome {
                    DailyQuestOutcome::AlreadyCompleted => {
                        println!("Today's quest is already complete.")
                    }
                    DailyQuestOutcome::Progressed => println!(
                        "push-ups {}/100, sit-ups {}/100, squats {}/100, run {}/10 km",
                        quest.pushups, quest.situps, quest.squats, quest.run
                    ),
                    DailyQuestOutcome::Completed { xp_bonus, .. } => {
                        println!("Quest complete: +{xp_bonus} XP")
                    }
                }
            }
        }
    }

    flush_events(&mut session);
    Ok(())
}
