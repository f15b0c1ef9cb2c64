mod config;
pub mod migrations;
pub mod schedule_db;
mod store;

pub use config::{Config, NotificationsConfig};
pub use schedule_db::{ScheduleDb, DEFAULT_NOTIFICATION_LIMIT};
pub use store::PlannerStore;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `CLASSPLAN_DATA_DIR` overrides the location entirely. Otherwise the
/// directory is `~/.config/classplan/`, or `~/.config/classplan-dev/` when
/// `CLASSPLAN_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("CLASSPLAN_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env =
                std::env::var("CLASSPLAN_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("classplan-dev")
            } else {
                base_dir.join("classplan")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
