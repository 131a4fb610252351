//! Task lifecycle: creation, edits, ordering and completion.
//!
//! Every function takes the explicit [`GameState`] and the current local
//! time. Validation failures return a [`ValidationError`] and leave the
//! state untouched.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use uuid::Uuid;

use super::{sort_tasks, Task};
use crate::calendar::{epoch_millis, DayOfWeek};
use crate::economy::{ceil_div, modified_economy, Difficulty, Pillar, ATTRIBUTE_GAIN_PER_TASK};
use crate::error::ValidationError;
use crate::events::{Event, EventSink};
use crate::progression::{apply_energy_delta, apply_xp_gain, roll_critical, update_streak};
use crate::random::RandomSource;
use crate::state::GameState;
use crate::storage::Config;

/// Fields for a new task. Economy values are derived, never supplied.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub pillar: Pillar,
    pub difficulty: Difficulty,
    pub due_date: Option<NaiveDate>,
    pub day: Option<DayOfWeek>,
    pub pages: Option<u32>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, pillar: Pillar) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            pillar,
            difficulty: Difficulty::default(),
            due_date: None,
            day: None,
            pages: None,
        }
    }
}

/// Partial edit. `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub pillar: Option<Pillar>,
    pub difficulty: Option<Difficulty>,
    pub due_date: Option<Option<NaiveDate>>,
    pub day: Option<Option<DayOfWeek>>,
    pub pages: Option<Option<u32>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// What a completion request did.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// Task was already completed or missed.
    Ignored,
    /// A shadow task was consumed and removed.
    ShadowConsumed { energy_restored: u32 },
    Completed(CompletionReport),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionReport {
    pub xp_gained: u32,
    /// Signed energy change actually applied.
    pub energy_delta: i32,
    pub critical: bool,
    pub levels_gained: u32,
    pub streak: u32,
}

fn validate_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "title".into(),
            message: "must not be empty".into(),
        });
    }
    Ok(trimmed.to_string())
}

fn position(state: &GameState, id: &str) -> Result<usize, ValidationError> {
    state
        .tasks
        .iter()
        .position(|t| t.id == id)
        .ok_or_else(|| ValidationError::TaskNotFound(id.to_string()))
}

/// Create a task at the bottom of the list. Returns its id.
pub fn add_task(
    state: &mut GameState,
    new: NewTask,
    now: NaiveDateTime,
) -> Result<String, ValidationError> {
    let title = validate_title(&new.title)?;
    let order = state
        .tasks
        .iter()
        .filter(|t| !t.is_shadow)
        .map(|t| t.order)
        .max()
        .map_or(0, |max| max + 1);

    let mut task = Task {
        id: Uuid::new_v4().to_string(),
        title,
        description: new.description,
        pillar: new.pillar,
        completed: false,
        energy_cost: 0,
        xp_reward: 0,
        difficulty: new.difficulty,
        due_date: new.due_date,
        day: new.day,
        created_at: epoch_millis(now),
        order,
        pages: new.pages,
        is_shadow: false,
        is_missed: false,
    };
    task.refresh_economy();

    let id = task.id.clone();
    tracing::debug!(task_id = %id, pillar = %task.pillar, "added task");
    state.tasks.push(task);
    sort_tasks(&mut state.tasks);
    Ok(id)
}

/// Apply a partial edit and recompute the task's economy.
pub fn edit_task(
    state: &mut GameState,
    id: &str,
    update: TaskUpdate,
) -> Result<(), ValidationError> {
    let idx = position(state, id)?;
    if state.tasks[idx].is_shadow {
        return Err(ValidationError::InvalidValue {
            field: "id".into(),
            message: "shadow tasks cannot be edited".into(),
        });
    }
    let title = update.title.as_deref().map(validate_title).transpose()?;

    let task = &mut state.tasks[idx];
    if let Some(title) = title {
        task.title = title;
    }
    if let Some(description) = update.description {
        task.description = description;
    }
    if let Some(pillar) = update.pillar {
        task.pillar = pillar;
    }
    if let Some(difficulty) = update.difficulty {
        task.difficulty = difficulty;
    }
    if let Some(due_date) = update.due_date {
        task.due_date = due_date;
    }
    if let Some(day) = update.day {
        task.day = day;
    }
    if let Some(pages) = update.pages {
        task.pages = pages;
    }
    task.refresh_economy();
    Ok(())
}

/// Remove a task and return it.
pub fn delete_task(state: &mut GameState, id: &str) -> Result<Task, ValidationError> {
    let idx = position(state, id)?;
    Ok(state.tasks.remove(idx))
}

/// Swap a task with its neighbour in display order.
///
/// Returns `false` when the task is already at the edge, or when either
/// side is a pinned shadow task.
pub fn move_task(
    state: &mut GameState,
    id: &str,
    direction: MoveDirection,
) -> Result<bool, ValidationError> {
    sort_tasks(&mut state.tasks);
    let idx = position(state, id)?;
    let neighbour = match direction {
        MoveDirection::Up if idx > 0 => idx - 1,
        MoveDirection::Down if idx + 1 < state.tasks.len() => idx + 1,
        _ => return Ok(false),
    };
    if state.tasks[idx].is_shadow || state.tasks[neighbour].is_shadow {
        return Ok(false);
    }

    if state.tasks[idx].order == state.tasks[neighbour].order {
        for (i, task) in state.tasks.iter_mut().enumerate() {
            if !task.is_shadow {
                task.order = i as i64;
            }
        }
    }

    let order = state.tasks[idx].order;
    state.tasks[idx].order = state.tasks[neighbour].order;
    state.tasks[neighbour].order = order;
    sort_tasks(&mut state.tasks);
    Ok(true)
}

/// Assign display order by position in `ids`.
///
/// `ids` must name every non-shadow task exactly once. Shadow tasks stay
/// pinned at the top.
pub fn reorder_tasks(state: &mut GameState, ids: &[String]) -> Result<(), ValidationError> {
    let mut expected: Vec<&str> = state
        .tasks
        .iter()
        .filter(|t| !t.is_shadow)
        .map(|t| t.id.as_str())
        .collect();
    let mut given: Vec<&str> = ids.iter().map(String::as_str).collect();
    expected.sort_unstable();
    given.sort_unstable();
    if expected != given {
        return Err(ValidationError::InvalidOrder(format!(
            "expected {} task ids, got {} (or unknown/duplicate ids)",
            expected.len(),
            ids.len()
        )));
    }

    for (order, id) in ids.iter().enumerate() {
        if let Some(task) = state.tasks.iter_mut().find(|t| &t.id == id) {
            task.order = order as i64;
        }
    }
    sort_tasks(&mut state.tasks);
    Ok(())
}

/// Complete a task, applying its economy to the character.
///
/// # Errors
/// `TaskNotFound` for an unknown id, `InsufficientEnergy` when the
/// (time-modified) cost exceeds current energy. Quran tasks are exempt
/// from the energy check.
pub fn complete_task(
    state: &mut GameState,
    id: &str,
    now: NaiveDateTime,
    config: &Config,
    rng: &mut dyn RandomSource,
    events: &mut dyn EventSink,
) -> Result<CompletionOutcome, ValidationError> {
    let idx = position(state, id)?;
    let now_ms = epoch_millis(now);
    let task = &state.tasks[idx];
    if !task.is_open() {
        return Ok(CompletionOutcome::Ignored);
    }

    if task.is_shadow {
        let restore = task.energy_cost.unsigned_abs();
        let stats = &mut state.stats;
        if stats.is_energy_full() {
            stats.last_energy_update = Some(now_ms);
        }
        let before = stats.energy;
        stats.energy = apply_energy_delta(stats, restore.min(i32::MAX as u32) as i32);
        let energy_restored = stats.energy - before;

        let task = state.tasks.remove(idx);
        events.emit(Event::ShadowTaskConsumed {
            task_id: task.id,
            energy_restored,
            at: now,
        });
        return Ok(CompletionOutcome::ShadowConsumed { energy_restored });
    }

    let pillar = task.pillar;
    let difficulty = task.difficulty;
    let pages = task.pages.unwrap_or(1).max(1);
    let modifier = config.time_modifiers.modifier_at(now.hour());
    let econ = modified_economy(pillar, difficulty, modifier);

    if pillar != Pillar::Quran && econ.energy_cost > 0 {
        let required = econ.energy_cost as u32;
        if required > state.stats.energy {
            return Err(ValidationError::InsufficientEnergy {
                required,
                available: state.stats.energy,
            });
        }
    }

    let critical = pillar != Pillar::Quran && roll_critical(rng, config.critical.chance);
    let today = now.date();
    let stats = &mut state.stats;
    if stats.is_energy_full() {
        stats.last_energy_update = Some(now_ms);
    }
    let energy_before = stats.energy;

    let mut xp_gained = 0;
    let mut levels_gained = 0;
    if pillar == Pillar::Quran {
        stats.quran_pages_read = stats.quran_pages_read.saturating_add(pages);
        let gain = pages.saturating_mul(config.economy.energy_per_quran_page);
        stats.energy = apply_energy_delta(stats, gain.min(i32::MAX as u32) as i32);
    } else {
        stats.energy = apply_energy_delta(stats, -econ.energy_cost);
        xp_gained = if critical {
            ceil_div(
                i64::from(econ.xp_reward) * i64::from(config.critical.multiplier_percent),
                100,
            ) as u32
        } else {
            econ.xp_reward
        };
        if critical {
            stats.energy = apply_energy_delta(stats, config.critical.energy_refund as i32);
        }

        let gain = apply_xp_gain(stats, xp_gained);
        gain.commit(stats);
        levels_gained = gain.levels_gained;
        stats.weekly_xp_accumulated = stats.weekly_xp_accumulated.saturating_add(xp_gained);
    }

    let streak = update_streak(stats.streak, stats.last_task_completion_date, today);
    if streak.broken {
        events.emit(Event::StreakBroken {
            previous: stats.streak,
            at: now,
        });
    }
    stats.streak = streak.after_completion();
    stats.last_task_completion_date = Some(today);
    stats.weekly_tasks_completed += 1;
    stats.weekly_max_streak = stats.weekly_max_streak.max(stats.streak);
    if pillar == Pillar::Exercise {
        stats.weekly_exercise_count += 1;
    }

    stats
        .hunter_attributes
        .train(pillar, ATTRIBUTE_GAIN_PER_TASK * difficulty.multiplier());
    if levels_gained > 0 {
        stats.hunter_attributes.raise_all(f64::from(levels_gained));
    }

    let energy_delta = stats.energy as i32 - energy_before as i32;
    let report = CompletionReport {
        xp_gained,
        energy_delta,
        critical,
        levels_gained,
        streak: stats.streak,
    };
    let level = stats.level;
    state.tasks[idx].completed = true;

    events.emit(Event::TaskCompleted {
        task_id: id.to_string(),
        pillar,
        xp_gained,
        energy_spent: -energy_delta,
        critical,
        at: now,
    });
    if levels_gained > 0 {
        events.emit(Event::LevelUp {
            level,
            levels_gained,
            at: now,
        });
    }
    tracing::debug!(task_id = id, xp_gained, critical, "completed task");

    Ok(CompletionOutcome::Completed(report))
}
