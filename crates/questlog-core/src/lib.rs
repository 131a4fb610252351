//! # Questlog Core Library
//!
//! Progression and history-archival engine for the Questlog gamified task
//! tracker. Tasks across six life pillars earn XP and spend or regain
//! energy; a persistent character levels up; closed weeks and months are
//! archived with comparative reports and rewards.
//!
//! ## Architecture
//!
//! - **Session**: owns the loaded [`GameState`], reconciles it against the
//!   wall clock on open and persists after every operation
//! - **Reconciliation**: missed tasks, energy regeneration, daily resets and
//!   period rollover, run on every activation
//! - **Progression**: pure XP, energy and streak arithmetic
//! - **History / Report / Reward**: immutable period snapshots and their
//!   derived reports
//! - **Storage**: slot-based persistence over SQLite, schema migrations,
//!   backups and TOML configuration
//!
//! Time is always passed in explicitly as a local `NaiveDateTime`; randomness
//! comes from an injectable [`RandomSource`].

pub mod calendar;
pub mod economy;
pub mod error;
pub mod events;
pub mod history;
pub mod progression;
pub mod random;
pub mod reconciliation;
pub mod report;
pub mod reward;
pub mod scoring;
pub mod session;
pub mod state;
pub mod stats;
pub mod storage;
pub mod task;

pub use calendar::DayOfWeek;
pub use economy::{Difficulty, Pillar};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::{Event, EventSink};
pub use history::{MonthlyHistory, WeeklyHistory};
pub use random::{PcgRandom, RandomSource, ScriptedRandom};
pub use reconciliation::{ReconciliationEngine, ReconciliationSummary};
pub use report::{MonthlyReport, MonthlyRating, WeeklyRating, WeeklyReport};
pub use reward::{MonthlyReward, WeeklyReward};
pub use session::Session;
pub use state::{GameState, PlayerProfile, ProfileUpdate};
pub use stats::{QuestExercise, UserStats};
pub use storage::{Config, Database, MemoryStore, Slot, SlotStore};
pub use task::lifecycle::{CompletionOutcome, MoveDirection, NewTask, TaskUpdate};
pub use task::Task;
