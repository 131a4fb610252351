//! TOML-based application configuration.
//!
//! Holds the tunable economy:
//! - Energy recovery and missed-task penalties
//! - Critical hit odds and payout
//! - Time-of-day modifiers
//! - Shadow task thresholds
//! - Reward payout switch
//!
//! Configuration is stored at `~/.config/questlog/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::economy::{
    TimeModifier, CRITICAL_ENERGY_REFUND, CRITICAL_HIT_CHANCE, CRITICAL_HIT_MULTIPLIER_PERCENT,
    ENERGY_PER_QURAN_PAGE, ENERGY_RECOVERY_RATE, MAX_DAILY_XP_LOSS_PERCENT, XP_PENALTY_PERCENT,
};
use crate::error::ConfigError;

/// Energy and penalty tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EconomyConfig {
    /// Energy units regenerated per hour.
    #[serde(default = "default_recovery_rate")]
    pub energy_recovery_rate: u32,
    /// Share of a missed task's XP taken as penalty.
    #[serde(default = "default_penalty_percent")]
    pub xp_penalty_percent: u32,
    /// Cap on XP lost per reconciliation, as a share of current XP.
    #[serde(default = "default_max_loss_percent")]
    pub max_daily_xp_loss_percent: u32,
    #[serde(default = "default_quran_page_energy")]
    pub energy_per_quran_page: u32,
}

/// Critical hit tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CriticalConfig {
    /// Probability in `[0, 1]`.
    #[serde(default = "default_critical_chance")]
    pub chance: f64,
    #[serde(default = "default_critical_multiplier")]
    pub multiplier_percent: u32,
    #[serde(default = "default_critical_refund")]
    pub energy_refund: u32,
}

/// An hour window with its modifier. `start_hour > end_hour` wraps midnight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeWindow {
    pub start_hour: u32,
    pub end_hour: u32,
    pub xp_percent: u32,
    pub energy_percent: u32,
}

impl TimeWindow {
    pub fn contains(&self, hour: u32) -> bool {
        if self.start_hour <= self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }

    pub fn modifier(&self) -> TimeModifier {
        TimeModifier {
            xp_percent: self.xp_percent,
            energy_percent: self.energy_percent,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeModifiersConfig {
    #[serde(default = "default_morning")]
    pub morning: TimeWindow,
    #[serde(default = "default_night")]
    pub night: TimeWindow,
}

impl TimeModifiersConfig {
    /// Modifier for a local hour; neutral outside both windows.
    pub fn modifier_at(&self, hour: u32) -> TimeModifier {
        if self.morning.contains(hour) {
            self.morning.modifier()
        } else if self.night.contains(hour) {
            self.night.modifier()
        } else {
            TimeModifier::NEUTRAL
        }
    }
}

/// Shadow task thresholds, as percent of max energy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShadowConfig {
    #[serde(default = "default_spawn_percent")]
    pub spawn_at_percent: u32,
    #[serde(default = "default_clear_percent")]
    pub clear_above_percent: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RewardsConfig {
    /// Credit report rewards as XP when a period closes.
    #[serde(default = "default_true")]
    pub grant_xp_bonus: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/questlog/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub economy: EconomyConfig,
    #[serde(default)]
    pub critical: CriticalConfig,
    #[serde(default)]
    pub time_modifiers: TimeModifiersConfig,
    #[serde(default)]
    pub shadow: ShadowConfig,
    #[serde(default)]
    pub rewards: RewardsConfig,
}

// Default functions
fn default_recovery_rate() -> u32 {
    ENERGY_RECOVERY_RATE
}
fn default_penalty_percent() -> u32 {
    XP_PENALTY_PERCENT
}
fn default_max_loss_percent() -> u32 {
    MAX_DAILY_XP_LOSS_PERCENT
}
fn default_quran_page_energy() -> u32 {
    ENERGY_PER_QURAN_PAGE
}
fn default_critical_chance() -> f64 {
    CRITICAL_HIT_CHANCE
}
fn default_critical_multiplier() -> u32 {
    CRITICAL_HIT_MULTIPLIER_PERCENT
}
fn default_critical_refund() -> u32 {
    CRITICAL_ENERGY_REFUND
}
fn default_morning() -> TimeWindow {
    TimeWindow {
        start_hour: 6,
        end_hour: 10,
        xp_percent: 115,
        energy_percent: 85,
    }
}
fn default_night() -> TimeWindow {
    TimeWindow {
        start_hour: 22,
        end_hour: 4,
        xp_percent: 85,
        energy_percent: 115,
    }
}
fn default_spawn_percent() -> u32 {
    20
}
fn default_clear_percent() -> u32 {
    40
}
fn default_true() -> bool {
    true
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            energy_recovery_rate: default_recovery_rate(),
            xp_penalty_percent: default_penalty_percent(),
            max_daily_xp_loss_percent: default_max_loss_percent(),
            energy_per_quran_page: default_quran_page_energy(),
        }
    }
}

impl Default for CriticalConfig {
    fn default() -> Self {
        Self {
            chance: default_critical_chance(),
            multiplier_percent: default_critical_multiplier(),
            energy_refund: default_critical_refund(),
        }
    }
}

impl Default for TimeModifiersConfig {
    fn default() -> Self {
        Self {
            morning: default_morning(),
            night: default_night(),
        }
    }
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            spawn_at_percent: 20,
            clear_above_percent: 40,
        }
    }
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            grant_xp_bonus: true,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(ConfigError::UnknownKey(key.to_string()));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    /// `<data dir>/config.toml`.
    pub fn path() -> Result<PathBuf, ConfigError> {
        data_dir()
            .map(|dir| dir.join("config.toml"))
            .map_err(|e| ConfigError::LoadFailed {
                path: PathBuf::from("config.toml"),
                message: e.to_string(),
            })
    }

    /// Load from `path`, writing defaults there when the file is absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Load from the data directory or return default.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Persist to the data directory.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("using default configuration: {e}");
                Self::default()
            }
        }
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Leaf keys in dot form with their current values.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out
    }

    /// Set a value in memory by dot-separated key.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a value by key and persist. Returns error if key is unknown.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.set_value(key, value)?;
        self.save()
    }

    /// Reject values outside their meaningful range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.to_string(),
        };

        if !(0.0..=1.0).contains(&self.critical.chance) {
            return Err(invalid("critical.chance", "must be between 0 and 1"));
        }
        if self.economy.xp_penalty_percent > 100 {
            return Err(invalid("economy.xp_penalty_percent", "must be at most 100"));
        }
        if self.economy.max_daily_xp_loss_percent > 100 {
            return Err(invalid(
                "economy.max_daily_xp_loss_percent",
                "must be at most 100",
            ));
        }
        if self.shadow.clear_above_percent < self.shadow.spawn_at_percent {
            return Err(invalid(
                "shadow.clear_above_percent",
                "must not be below shadow.spawn_at_percent",
            ));
        }
        for (key, window) in [
            ("time_modifiers.morning", &self.time_modifiers.morning),
            ("time_modifiers.night", &self.time_modifiers.night),
        ] {
            if window.start_hour > 23 || window.end_hour > 24 {
                return Err(invalid(key, "hours must be within 0-24"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.economy.energy_recovery_rate, 8);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[economy]\nenergy_recovery_rate = 12\n").unwrap();
        assert_eq!(parsed.economy.energy_recovery_rate, 12);
        assert_eq!(parsed.economy.xp_penalty_percent, 30);
        assert_eq!(parsed.shadow.spawn_at_percent, 20);
        assert!(parsed.rewards.grant_xp_bonus);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("economy.energy_recovery_rate").as_deref(), Some("8"));
        assert_eq!(cfg.get("rewards.grant_xp_bonus").as_deref(), Some("true"));
        assert_eq!(cfg.get("time_modifiers.morning.xp_percent").as_deref(), Some("115"));
        assert!(cfg.get("economy.missing_key").is_none());
    }

    #[test]
    fn set_value_updates_numbers_and_bools() {
        let mut cfg = Config::default();
        cfg.set_value("economy.energy_recovery_rate", "10").unwrap();
        cfg.set_value("rewards.grant_xp_bonus", "false").unwrap();
        cfg.set_value("critical.chance", "0.25").unwrap();
        assert_eq!(cfg.economy.energy_recovery_rate, 10);
        assert!(!cfg.rewards.grant_xp_bonus);
        assert_eq!(cfg.critical.chance, 0.25);
    }

    #[test]
    fn set_value_rejects_unknown_key() {
        let mut cfg = Config::default();
        let err = cfg.set_value("economy.nonexistent", "1").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey(_)));
    }

    #[test]
    fn set_value_rejects_invalid_type() {
        let mut cfg = Config::default();
        let result = cfg.set_value("rewards.grant_xp_bonus", "not_a_bool");
        assert!(result.is_err());
        assert!(cfg.rewards.grant_xp_bonus);
    }

    #[test]
    fn set_value_rejects_out_of_range() {
        let mut cfg = Config::default();
        assert!(cfg.set_value("critical.chance", "1.5").is_err());
        assert!(cfg.set_value("shadow.clear_above_percent", "10").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn time_windows_wrap_midnight() {
        let tm = TimeModifiersConfig::default();
        assert_eq!(tm.modifier_at(6).xp_percent, 115);
        assert_eq!(tm.modifier_at(9).xp_percent, 115);
        assert_eq!(tm.modifier_at(10), TimeModifier::NEUTRAL);
        assert_eq!(tm.modifier_at(23).energy_percent, 115);
        assert_eq!(tm.modifier_at(3).energy_percent, 115);
        assert_eq!(tm.modifier_at(4), TimeModifier::NEUTRAL);
    }

    #[test]
    fn load_from_writes_defaults_when_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn entries_flatten_sections() {
        let entries = Config::default().entries();
        assert!(entries
            .iter()
            .any(|(k, v)| k == "shadow.spawn_at_percent" && v == "20"));
        assert!(entries.iter().any(|(k, _)| k == "time_modifiers.night.start_hour"));
    }
}
