//! Session: the owner of a loaded game.
//!
//! Opening a session migrates the store, loads every slot and reconciles
//! against the given time before returning, so no operation can observe
//! stale state. Every mutating operation first advances energy to `now`,
//! applies its change, re-evaluates shadow tasks and persists.
//!
//! Persistence is fire-and-forget: a failed write is logged and retried on
//! the next save; the in-memory transition stands.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::calendar::epoch_millis;
use crate::error::{CoreError, ValidationError};
use crate::events::{Event, EventSink};
use crate::progression::recover_energy;
use crate::random::RandomSource;
use crate::reconciliation::{ReconciliationEngine, ReconciliationSummary};
use crate::state::{GameState, PlayerProfile, ProfileUpdate};
use crate::stats::{
    complete_weekly_challenge, set_weekly_challenge, update_daily_quest, ChallengeOutcome,
    DailyQuestOutcome, QuestExercise, UserStats,
};
use crate::storage::migrations::set_schema_version;
use crate::storage::{create_backup, migrate, restore_backup, Config, SlotStore, CURRENT_SCHEMA_VERSION};
use crate::task::lifecycle::{self, CompletionOutcome, MoveDirection, NewTask, TaskUpdate};
use crate::task::shadow::{react_to_energy, ShadowReaction};
use crate::task::Task;

pub struct Session<S: SlotStore> {
    store: S,
    config: Config,
    engine: ReconciliationEngine,
    rng: Box<dyn RandomSource>,
    state: GameState,
    events: Vec<Event>,
    last_reconciliation: ReconciliationSummary,
}

impl<S: SlotStore> Session<S> {
    /// Migrate, load and reconcile.
    ///
    /// # Errors
    /// Returns an error only if the schema migration cannot read or write
    /// the store. Malformed slots load as defaults.
    pub fn open(
        mut store: S,
        config: Config,
        rng: Box<dyn RandomSource>,
        now: NaiveDateTime,
    ) -> Result<Self, CoreError> {
        migrate(&mut store)?;
        let state = GameState::load(&store);
        let mut session = Self {
            store,
            engine: ReconciliationEngine::with_config(&config),
            config,
            rng,
            state,
            events: Vec::new(),
            last_reconciliation: ReconciliationSummary::default(),
        };
        session.reconcile(now);
        Ok(session)
    }

    /// Reconcile and persist. A store without a profile is left alone.
    fn reconcile(&mut self, now: NaiveDateTime) {
        if self.state.profile.is_none() {
            return;
        }
        self.last_reconciliation = self.engine.reconcile(&mut self.state, now, &mut self.events);
        self.react_to_energy(now);
        self.save();
    }

    fn react_to_energy(&mut self, now: NaiveDateTime) -> ShadowReaction {
        react_to_energy(
            &mut self.state,
            &self.config.shadow,
            self.rng.as_mut(),
            now,
            &mut self.events,
        )
    }

    /// Advance regeneration to `now`. Crossing midnight runs a full
    /// reconciliation instead.
    fn advance(&mut self, now: NaiveDateTime) {
        if self.state.stats.last_login_date != Some(now.date()) {
            self.last_reconciliation =
                self.engine.reconcile(&mut self.state, now, &mut self.events);
            return;
        }
        let gained = recover_energy(
            &mut self.state.stats,
            epoch_millis(now),
            self.config.economy.energy_recovery_rate,
        );
        if gained > 0 {
            self.events.emit(Event::EnergyRestored {
                amount: gained,
                energy: self.state.stats.energy,
                at: now,
            });
        }
    }

    fn require_profile(&self) -> Result<(), ValidationError> {
        if self.state.profile.is_none() {
            return Err(ValidationError::NoProfile);
        }
        Ok(())
    }

    /// Advance, run `op`, then react to energy and persist.
    fn mutate<T>(
        &mut self,
        now: NaiveDateTime,
        op: impl FnOnce(&mut Self) -> Result<T, ValidationError>,
    ) -> Result<T, CoreError> {
        self.require_profile()?;
        self.advance(now);
        let result = op(self);
        self.react_to_energy(now);
        self.save();
        Ok(result?)
    }

    /// Write every slot; failures are logged, never returned.
    pub fn save(&mut self) -> bool {
        let ok = self.state.save(&mut self.store);
        if !ok {
            tracing::warn!("some slots failed to save; they will be retried on the next save");
        }
        ok
    }

    /// Periodic heartbeat. Returns the energy regained.
    pub fn tick(&mut self, now: NaiveDateTime) -> u32 {
        if self.state.profile.is_none() {
            return 0;
        }
        let before = self.state.stats.energy;
        self.advance(now);
        self.react_to_energy(now);
        self.save();
        self.state.stats.energy.saturating_sub(before)
    }

    pub fn add_task(&mut self, new: NewTask, now: NaiveDateTime) -> Result<String, CoreError> {
        self.mutate(now, |s| lifecycle::add_task(&mut s.state, new, now))
    }

    pub fn edit_task(
        &mut self,
        id: &str,
        update: TaskUpdate,
        now: NaiveDateTime,
    ) -> Result<(), CoreError> {
        self.mutate(now, |s| lifecycle::edit_task(&mut s.state, id, update))
    }

    pub fn delete_task(&mut self, id: &str, now: NaiveDateTime) -> Result<Task, CoreError> {
        self.mutate(now, |s| lifecycle::delete_task(&mut s.state, id))
    }

    pub fn move_task(
        &mut self,
        id: &str,
        direction: MoveDirection,
        now: NaiveDateTime,
    ) -> Result<bool, CoreError> {
        self.mutate(now, |s| lifecycle::move_task(&mut s.state, id, direction))
    }

    pub fn reorder_tasks(&mut self, ids: &[String], now: NaiveDateTime) -> Result<(), CoreError> {
        self.mutate(now, |s| lifecycle::reorder_tasks(&mut s.state, ids))
    }

    pub fn complete_task(
        &mut self,
        id: &str,
        now: NaiveDateTime,
    ) -> Result<CompletionOutcome, CoreError> {
        self.mutate(now, |s| {
            lifecycle::complete_task(
                &mut s.state,
                id,
                now,
                &s.config,
                s.rng.as_mut(),
                &mut s.events,
            )
        })
    }

    pub fn set_weekly_challenge(&mut self, title: &str, now: NaiveDateTime) -> Result<(), CoreError> {
        self.mutate(now, |s| {
            set_weekly_challenge(&mut s.state.stats, title, now.date()).map(|_| ())
        })
    }

    pub fn complete_weekly_challenge(
        &mut self,
        now: NaiveDateTime,
    ) -> Result<ChallengeOutcome, CoreError> {
        self.mutate(now, |s| {
            complete_weekly_challenge(&mut s.state.stats, now, &mut s.events)
        })
    }

    pub fn update_daily_quest(
        &mut self,
        exercise: QuestExercise,
        amount: f64,
        now: NaiveDateTime,
    ) -> Result<DailyQuestOutcome, CoreError> {
        self.mutate(now, |s| {
            Ok(update_daily_quest(
                &mut s.state.stats,
                exercise,
                amount,
                now,
                &mut s.events,
            ))
        })
    }

    /// Start a new character. Every slot is cleared first; settings carry
    /// over.
    pub fn create_profile(
        &mut self,
        mut profile: PlayerProfile,
        now: NaiveDateTime,
    ) -> Result<(), CoreError> {
        if profile.created_at.is_none() {
            profile.created_at = Some(now);
        }
        self.store.clear_all()?;
        set_schema_version(&mut self.store, CURRENT_SCHEMA_VERSION)?;

        let settings = std::mem::take(&mut self.state.settings);
        self.state = GameState {
            profile: Some(profile),
            stats: UserStats::new_character(now.date(), epoch_millis(now)),
            settings,
            ..GameState::default()
        };
        self.last_reconciliation = ReconciliationSummary::default();
        tracing::info!("created new profile");
        self.save();
        Ok(())
    }

    pub fn update_profile(&mut self, update: ProfileUpdate) -> Result<(), CoreError> {
        let profile = self
            .state
            .profile
            .as_mut()
            .ok_or(ValidationError::NoProfile)?;
        profile.apply(update)?;
        self.save();
        Ok(())
    }

    /// Erase every slot and return to the no-profile state.
    pub fn reset_progress(&mut self) -> Result<(), CoreError> {
        self.store.clear_all()?;
        self.state = GameState::default();
        self.last_reconciliation = ReconciliationSummary::default();
        tracing::info!("progress reset");
        Ok(())
    }

    /// Persist, then serialize every slot into a backup bundle.
    pub fn export_backup(&mut self, created_at: DateTime<Utc>) -> Result<String, CoreError> {
        self.save();
        create_backup(&self.store, created_at)
    }

    /// Replace the store with a backup bundle, then reload and reconcile.
    pub fn import_backup(&mut self, json: &str, now: NaiveDateTime) -> Result<(), CoreError> {
        restore_backup(&mut self.store, json)?;
        migrate(&mut self.store)?;
        self.state = GameState::load(&self.store);
        self.last_reconciliation = ReconciliationSummary::default();
        self.reconcile(now);
        Ok(())
    }

    /// Take every event emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn stats(&self) -> &UserStats {
        &self.state.stats
    }

    pub fn tasks(&self) -> &[Task] {
        &self.state.tasks
    }

    pub fn profile(&self) -> Option<&PlayerProfile> {
        self.state.profile.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Summary of the reconciliation run when the session opened (or the
    /// last one triggered by crossing midnight).
    pub fn last_reconciliation(&self) -> &ReconciliationSummary {
        &self.last_reconciliation
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::Pillar;
    use crate::random::ScriptedRandom;
    use crate::storage::{MemoryStore, Slot};
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 5)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn open(store: MemoryStore, now: NaiveDateTime) -> Session<MemoryStore> {
        Session::open(
            store,
            Config::default(),
            Box::new(ScriptedRandom::never()),
            now,
        )
        .unwrap()
    }

    fn with_profile() -> Session<MemoryStore> {
        let mut session = open(MemoryStore::new(), at(8, 0));
        let profile = PlayerProfile::new("Jin", 24, 180.0, 75.0).unwrap();
        session.create_profile(profile, at(8, 0)).unwrap();
        session
    }

    #[test]
    fn operations_require_profile() {
        let mut session = open(MemoryStore::new(), at(8, 0));
        let err = session
            .add_task(NewTask::new("Read", Pillar::Learning), at(8, 5))
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::NoProfile)));
        assert!(session.store().read(Slot::Stats.key()).unwrap().is_none());
    }

    #[test]
    fn create_profile_persists_fresh_character() {
        let session = with_profile();
        let store = session.into_store();
        assert!(store.read(Slot::Profile.key()).unwrap().is_some());
        assert_eq!(store.read(Slot::SchemaVersion.key()).unwrap().as_deref(), Some("2"));

        let reopened = open(store, at(9, 0));
        assert_eq!(reopened.profile().unwrap().name, "Jin");
        assert_eq!(
            reopened.stats().current_week_start,
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
    }

    #[test]
    fn tick_recovers_energy() {
        let mut session = with_profile();
        let id = session
            .add_task(NewTask::new("Run", Pillar::Exercise), at(8, 0))
            .unwrap();
        session.complete_task(&id, at(12, 0)).unwrap();
        assert_eq!(session.stats().energy, 88);

        // 90 minutes at 8/h
        assert_eq!(session.tick(at(13, 30)), 12);
        assert_eq!(session.stats().energy, 100);
    }

    #[test]
    fn low_energy_spawns_shadow_after_completion() {
        let mut session = with_profile();
        let id = session
            .add_task(NewTask::new("Work", Pillar::Work), at(12, 0))
            .unwrap();
        session.state.stats.energy = 25;
        session.complete_task(&id, at(12, 0)).unwrap();

        assert_eq!(session.stats().energy, 15);
        assert!(session.state().has_active_shadow());
        assert!(session.tasks()[0].is_shadow);
        let events = session.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::ShadowTaskSpawned { .. })));
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn write_failures_do_not_roll_back() {
        let mut session = with_profile();
        let mut store = MemoryStore::new();
        store.set_read_only(true);
        session.store = store;

        let id = session
            .add_task(NewTask::new("Read", Pillar::Learning), at(9, 0))
            .unwrap();
        assert!(session.state().find_task(&id).is_some());
        assert!(!session.save());
    }

    #[test]
    fn reset_clears_everything() {
        let mut session = with_profile();
        session
            .add_task(NewTask::new("Read", Pillar::Learning), at(9, 0))
            .unwrap();
        session.reset_progress().unwrap();
        assert!(session.profile().is_none());
        assert!(session.tasks().is_empty());
        assert!(session.store().is_empty());
    }

    #[test]
    fn update_profile_keeps_created_at() {
        let mut session = with_profile();
        session
            .update_profile(ProfileUpdate {
                weight: Some(72.5),
                ..ProfileUpdate::default()
            })
            .unwrap();
        let profile = session.profile().unwrap();
        assert_eq!(profile.weight, 72.5);
        assert_eq!(profile.created_at, Some(at(8, 0)));
    }
}
