use clap::Subcommand;

use crate::common::{flush_events, now, open_session, CmdResult};

#[derive(Subcommand)]
pub enum ChallengeAction {
    /// Set this week's challenge
    Set {
        /// Challenge title
        title: String,
    },
    /// Mark this week's challenge complete
    Complete,
}

pub fn run(action: ChallengeAction) -> CmdResult {
    let mut session = open_session()?;
    flush_events(&mut session);

    match action {
        ChallengeAction::Set { title } => {
            session.set_weekly_challenge(&title, now())?;
            println!("Challenge set: {}", title.trim());
        }
        ChallengeAction::Complete => {
            let outcome = session.complete_weekly_challenge(now())?;
            println!("+{} XP", outcome.xp_bonus);
        }
    }

    flush_events(&mut session);
    Ok(())
}
