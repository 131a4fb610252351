//! Shadow task reaction.
//!
//! When energy drops to the critical threshold a recovery quest from the
//! catalogue is injected at the top of the board. Once energy climbs back
//! above the clear threshold, unconsumed shadow tasks are removed.

use chrono::NaiveDateTime;
use uuid::Uuid;

use super::Task;
use crate::calendar::epoch_millis;
use crate::economy::{Difficulty, Pillar, ShadowQuest, SHADOW_QUESTS};
use crate::events::{Event, EventSink};
use crate::random::RandomSource;
use crate::state::GameState;
use crate::storage::ShadowConfig;

/// Order that keeps shadow tasks above everything else.
pub const SHADOW_TASK_ORDER: i64 = -999;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShadowReaction {
    Unchanged,
    Spawned { task_id: String },
    Cleared { count: u32 },
}

fn shadow_task(quest: &ShadowQuest, now_ms: i64) -> Task {
    Task {
        id: Uuid::new_v4().to_string(),
        title: format!("⚠ {}", quest.title),
        description: quest.description.to_string(),
        pillar: Pillar::Entertainment,
        completed: false,
        energy_cost: -(quest.energy_restore as i32),
        xp_reward: 0,
        difficulty: Difficulty::E,
        due_date: None,
        day: None,
        created_at: now_ms,
        order: SHADOW_TASK_ORDER,
        pages: None,
        is_shadow: true,
        is_missed: false,
    }
}

/// Spawn or clear shadow tasks for the current energy level.
pub fn react_to_energy(
    state: &mut GameState,
    config: &ShadowConfig,
    rng: &mut dyn RandomSource,
    now: NaiveDateTime,
    events: &mut dyn EventSink,
) -> ShadowReaction {
    let energy = u64::from(state.stats.energy);
    let max = u64::from(state.stats.max_energy);

    if energy * 100 <= u64::from(config.spawn_at_percent) * max {
        if state.has_active_shadow() {
            return ShadowReaction::Unchanged;
        }
        let quest = &SHADOW_QUESTS[rng.next_index(SHADOW_QUESTS.len())];
        let task = shadow_task(quest, epoch_millis(now));
        let task_id = task.id.clone();

        events.emit(Event::EnergyCritical {
            energy: state.stats.energy,
            at: now,
        });
        events.emit(Event::ShadowTaskSpawned {
            task_id: task_id.clone(),
            title: task.title.clone(),
            energy_restore: quest.energy_restore,
            at: now,
        });
        tracing::debug!(quest = quest.id, "spawned shadow task");
        state.tasks.insert(0, task);
        return ShadowReaction::Spawned { task_id };
    }

    if energy * 100 > u64::from(config.clear_above_percent) * max {
        let before = state.tasks.len();
        state.tasks.retain(|t| !t.is_active_shadow());
        let count = (before - state.tasks.len()) as u32;
        if count > 0 {
            events.emit(Event::ShadowTasksCleared { count, at: now });
            tracing::debug!(count, "cleared shadow tasks");
            return ShadowReaction::Cleared { count };
        }
    }

    ShadowReaction::Unchanged
}
