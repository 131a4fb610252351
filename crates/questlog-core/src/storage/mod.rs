//! Persistence for Questlog.
//!
//! State lives in named JSON slots behind the [`SlotStore`] trait. The
//! SQLite [`Database`] is the on-disk medium; [`MemoryStore`] backs tests.

pub mod backup;
mod config;
pub mod database;
pub mod migrations;
pub mod slots;

pub use backup::{create_backup, restore_backup};
pub use config::{
    Config, CriticalConfig, EconomyConfig, RewardsConfig, ShadowConfig, TimeModifiersConfig,
    TimeWindow,
};
pub use database::Database;
pub use migrations::{migrate, CURRENT_SCHEMA_VERSION};
pub use slots::{load_slot, save_slot, MemoryStore, Slot, SlotStore, LEGACY_PILLARS_KEY};

use std::path::PathBuf;

use crate::error::StorageError;

/// Returns `~/.config/questlog[-dev]/` based on QUESTLOG_ENV.
///
/// Set QUESTLOG_ENV=dev to use development data directory. QUESTLOG_HOME
/// replaces the directory entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("QUESTLOG_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("QUESTLOG_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("questlog-dev")
            } else {
                base_dir.join("questlog")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
