//! Profile commands.

use clap::Subcommand;
use questlog_core::{PlayerProfile, ProfileUpdate};

use crate::common::{flush_events, now, open_session, print_json, CmdResult};

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Start a new character (erases any existing progress)
    Create {
        /// Display name
        name: String,
        #[arg(long, default_value_t = 0)]
        age: u32,
        /// Height in centimetres
        #[arg(long, default_value_t = 0.0)]
        height: f64,
        /// Weight in kilograms
        #[arg(long, default_value_t = 0.0)]
        weight: f64,
        /// Replace an existing profile
        #[arg(long)]
        force: bool,
    },
    /// Show the current profile
    Show,
    /// Change profile fields
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        height: Option<f64>,
        #[arg(long)]
        weight: Option<f64>,
    },
}

pub fn run(action: ProfileAction, json: bool) -> CmdResult {
    let mut session = open_session()?;
    flush_events(&mut session);

    match action {
        ProfileAction::Create {
            name,
            age,
            height,
            weight,
            force,
        } => {
            if session.profile().is_some() && !force {
                return Err("a profile already exists; pass --force to start over".into());
            }
            let profile = PlayerProfile::new(&name, age, height, weight)?;
            session.create_profile(profile, now())?;
            println!("Profile created: {}", name.trim());
        }
        ProfileAction::Show => {
            let Some(profile) = session.profile() else {
                return Err("no profile; run `questlog profile create <name>`".into());
            };
            if json {
                print_json(profile)?;
            } else {
                println!("Name:   {}", profile.name);
                println!("Age:    {}", profile.age);
                println!("Height: {} cm", profile.height);
                println!("Weight: {} kg", profile.weight);
                if let Some(created) = profile.created_at {
                    println!("Since:  {}", created.format("%Y-%m-%d"));
                }
            }
        }
        ProfileAction::Update {
            name,
            age,
            height,
            weight,
        } => {
            session.update_profile(ProfileUpdate {
                name,
                age,
                height,
                weight,
            })?;
            println!("ok");
        }
    }
    Ok(())
}
