//! Task management commands for CLI.

use chrono::NaiveDate;
use clap::{Subcommand, ValueEnum};
use questlog_core::{
    CompletionOutcome, DayOfWeek, Difficulty, MoveDirection, NewTask, Pillar, Task, TaskUpdate,
};

use crate::common::{flush_events, now, open_session, print_json, CmdResult};

#[derive(Clone, Copy, ValueEnum)]
pub enum Direction {
    Up,
    Down,
}

impl From<Direction> for MoveDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => MoveDirection::Up,
            Direction::Down => MoveDirection::Down,
        }
    }
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task
    Add {
        /// Task title
        title: String,
        /// learning, studying, exercise, work, entertainment or quran
        #[arg(long, short)]
        pillar: Pillar,
        /// E, D, C, B, A or S
        #[arg(long, short)]
        difficulty: Option<Difficulty>,
        #[arg(long)]
        description: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
        /// Plan the task for a day of the current week
        #[arg(long)]
        day: Option<DayOfWeek>,
        /// Pages to read (Quran tasks)
        #[arg(long)]
        pages: Option<u32>,
    },
    /// List tasks
    List {
        /// Include completed and missed tasks
        #[arg(long)]
        all: bool,
    },
    /// Edit a task
    Edit {
        /// Task ID
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        pillar: Option<Pillar>,
        #[arg(long)]
        difficulty: Option<Difficulty>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<NaiveDate>,
        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
        #[arg(long, conflicts_with = "clear_day")]
        day: Option<DayOfWeek>,
        /// Move the task back to the backlog
        #[arg(long)]
        clear_day: bool,
        #[arg(long)]
        pages: Option<u32>,
    },
    /// Complete a task
    Complete {
        /// Task ID
        id: String,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
    /// Move a task one place up or down
    Move {
        /// Task ID
        id: String,
        #[arg(value_enum)]
        direction: Direction,
    },
    /// Set the order of every non-shadow task
    Reorder {
        /// Task IDs, first to last
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },
}

/// `Some(None)` when cleared, `Some(Some(v))` when set, `None` when untouched.
fn optional_edit<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}

fn print_task_line(task: &Task) {
    let mark = if task.completed {
        "x"
    } else if task.is_missed {
        "-"
    } else {
        " "
    };
    let shadow = if task.is_shadow { " (shadow)" } else { "" };
    let planned = task
        .day
        .map(|d| format!(" @{d}"))
        .unwrap_or_default();
    println!(
        "[{mark}] {}  {}  {} {}  {:+} energy  {} XP{planned}{shadow}",
        task.id,
        task.title,
        task.pillar,
        task.difficulty,
        -task.energy_cost,
        task.xp_reward,
    );
}

pub fn run(action: TaskAction, json: bool) -> CmdResult {
    let mut session = open_session()?;
    flush_events(&mut session);

    match action {
        TaskAction::Add {
            title,
            pillar,
            difficulty,
            description,
            due,
            day,
            pages,
        } => {
            let mut new = NewTask::new(title, pillar);
            if let Some(difficulty) = difficulty {
                new.difficulty = difficulty;
            }
            new.description = description.unwrap_or_default();
            new.due_date = due;
            new.day = day;
            new.pages = pages;
            let id = session.add_task(new, now())?;
            println!("Task created: {id}");
        }
        TaskAction::List { all } => {
            let tasks: Vec<&Task> = session
                .tasks()
                .iter()
                .filter(|t| all || t.is_open())
                .collect();
            if json {
                print_json(&tasks)?;
            } else if tasks.is_empty() {
                println!("No tasks.");
            } else {
                tasks.into_iter().for_each(print_task_line);
            }
        }
        TaskAction::Edit {
            id,
            title,
            description,
            pillar,
            difficulty,
            due,
            clear_due,
            day,
            clear_day,
            pages,
        } => {
            let update = TaskUpdate {
                title,
                description,
                pillar,
                difficulty,
                due_date: optional_edit(due, clear_due),
                day: optional_edit(day, clear_day),
                pages: pages.map(Some),
            };
            session.edit_task(&id, update, now())?;
            println!("ok");
        }
        TaskAction::Complete { id } => match session.complete_task(&id, now())? {
            CompletionOutcome::Ignored => println!("Task is already closed."),
            CompletionOutcome::ShadowConsumed { energy_restored } => {
                println!("Rested: +{energy_restored} energy.");
            }
            CompletionOutcome::Completed(report) => {
                if json {
                    print_json(&serde_json::json!({
                        "xpGained": report.xp_gained,
                        "energyDelta": report.energy_delta,
                        "critical": report.critical,
                        "levelsGained": report.levels_gained,
                        "streak": report.streak,
                    }))?;
                } else {
                    println!("Done. Streak: {} day(s).", report.streak);
                }
            }
        },
        TaskAction::Delete { id } => {
            let task = session.delete_task(&id, now())?;
            println!("Deleted: {}", task.title);
        }
        TaskAction::Move { id, direction } => {
            if session.move_task(&id, direction.into(), now())? {
                println!("ok");
            } else {
                println!("Task cannot move further.");
            }
        }
        TaskAction::Reorder { ids } => {
            session.reorder_tasks(&ids, now())?;
            println!("ok");
        }
    }

    flush_events(&mut session);
    Ok(())
}
