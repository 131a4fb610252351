use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use clap::Subcommand;

use crate::common::{flush_events, now, open_session, CmdResult};

#[derive(Subcommand)]
pub enum BackupAction {
    /// Write every slot to a JSON bundle
    Export {
        /// Output file (stdout when omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Replace all data with a JSON bundle
    Import {
        /// Bundle file
        path: PathBuf,
    },
}

pub fn run(action: BackupAction) -> CmdResult {
    let mut session = open_session()?;
    flush_events(&mut session);

    match action {
        BackupAction::Export { output } => {
            let bundle = session.export_backup(Utc::now())?;
            match output {
                Some(path) => {
                    fs::write(&path, bundle)?;
                    eprintln!("Backup written to {}", path.display());
                }
                None => println!("{bundle}"),
            }
        }
        BackupAction::Import { path } => {
            let bundle = fs::read_to_string(&path)?;
            session.import_backup(&bundle, now())?;
            println!("Backup restored.");
        }
    }

    flush_events(&mut session);
    Ok(())
}
