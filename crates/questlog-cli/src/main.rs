use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod common;

#[derive(Parser)]
#[command(name = "questlog", version, about = "Questlog CLI")]
struct Cli {
    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Player profile
    Profile {
        #[command(subcommand)]
        action: commands::profile::ProfileAction,
    },
    /// Level, energy, streak and this week's progress
    Status,
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Weekly challenge
    Challenge {
        #[command(subcommand)]
        action: commands::challenge::ChallengeAction,
    },
    /// Daily exercise quest
    Quest {
        #[command(subcommand)]
        action: commands::quest::QuestAction,
    },
    /// Archived weeks and months, reports and rewards
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
    /// Export or import a backup bundle
    Backup {
        #[command(subcommand)]
        action: commands::backup::BackupAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Erase all progress
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("QUESTLOG_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let json = cli.json;
    let result = match cli.command {
        Commands::Profile { action } => commands::profile::run(action, json),
        Commands::Status => commands::status::run(json),
        Commands::Task { action } => commands::task::run(action, json),
        Commands::Challenge { action } => commands::challenge::run(action),
        Commands::Quest { action } => commands::quest::run(action, json),
        Commands::History { action } => commands::history::run(action, json),
        Commands::Backup { action } => commands::backup::run(action),
        Commands::Config { action } => commands::config::run(action, json),
        Commands::Reset { yes } => commands::reset::run(yes),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
