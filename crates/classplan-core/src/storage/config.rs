//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Scheduler heuristics (day window, horizon, priority and slot weights)
//! - Reminder thresholds
//! - The owner the planner acts for
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::scheduler::SchedulerConfig;

/// Longest auto-scheduling horizon (days).
pub const MAX_HORIZON_DAYS: i64 = 366;
/// Longest class reminder lead time (one day, in minutes).
pub const MAX_CLASS_REMINDER_MINUTES: i64 = 1440;
/// Longest task due-soon window (one year, in hours).
pub const MAX_TASK_REMINDER_HOURS: i64 = 8784;
/// Longest upcoming-deadline look-ahead (days).
pub const MAX_DEADLINE_DAYS: i64 = 3660;

/// Reminder and summary configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Lead time for class reminders (minutes)
    #[serde(default = "default_class_reminder_minutes")]
    pub class_reminder_minutes: i64,
    /// Tasks due within this many hours get a due-soon reminder
    #[serde(default = "default_task_reminder_hours")]
    pub task_reminder_hours: i64,
    /// Look-ahead for the upcoming deadline list (days)
    #[serde(default = "default_deadline_days")]
    pub deadline_days: i64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Owner id stamped on every class, task and notification.
    #[serde(default = "default_owner_id")]
    pub owner_id: i64,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

fn default_true() -> bool {
    true
}
fn default_class_reminder_minutes() -> i64 {
    15
}
fn default_task_reminder_hours() -> i64 {
    24
}
fn default_deadline_days() -> i64 {
    7
}
fn default_owner_id() -> i64 {
    1
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            class_reminder_minutes: default_class_reminder_minutes(),
            task_reminder_hours: default_task_reminder_hours(),
            deadline_days: default_deadline_days(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            owner_id: default_owner_id(),
            scheduler: SchedulerConfig::default(),
            notifications: NotificationsConfig::default(),
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
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<i64>() {
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
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location of the config file.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be prepared.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// default config cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// default config cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Self = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
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

    /// Persist to the default location.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
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

    /// Set a config value by dot-separated key without saving.
    ///
    /// # Errors
    /// Returns an error if the key is unknown or the value does not fit the
    /// field's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Check day, hour and minute counts against their allowed ranges.
    ///
    /// # Errors
    /// Returns `InvalidValue` naming the first out-of-range key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("scheduler.horizon_days", self.scheduler.horizon_days, MAX_HORIZON_DAYS),
            (
                "notifications.class_reminder_minutes",
                self.notifications.class_reminder_minutes,
                MAX_CLASS_REMINDER_MINUTES,
            ),
            (
                "notifications.task_reminder_hours",
                self.notifications.task_reminder_hours,
                MAX_TASK_REMINDER_HOURS,
            ),
            ("notifications.deadline_days", self.notifications.deadline_days, MAX_DEADLINE_DAYS),
        ];
        for (key, value, max) in checks {
            if !(0..=max).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("{value} is outside 0..={max}"),
                });
            }
        }
        Ok(())
    }
}
