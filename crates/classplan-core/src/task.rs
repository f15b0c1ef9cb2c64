//! Ad-hoc task types.
//!
//! Tasks carry a priority label, an optional due timestamp and an estimated
//! duration. The auto-scheduler fills in the scheduling fields; the user
//! completes or deletes tasks.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Estimated duration used when a task does not carry one.
pub const DEFAULT_TASK_MINUTES: u32 = 60;

/// Default color for scheduled tasks on the agenda.
pub const DEFAULT_TASK_COLOR: &str = "#e74c3c";

/// Task priority, ordered `Low < Medium < High < Urgent`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Urgent => "Urgent",
        }
    }

    /// Parse a priority label. Unknown labels carry the lowest weight.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "urgent" => Priority::Urgent,
            "high" => Priority::High,
            "medium" => Priority::Medium,
            _ => Priority::Low,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task in the planner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDateTime>,
    pub priority: Priority,
    /// Estimated duration in minutes. `None` means "use the default".
    pub estimated_minutes: Option<u32>,
    pub is_completed: bool,
    pub completed_at: Option<NaiveDateTime>,
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_start: Option<NaiveTime>,
    pub scheduled_end: Option<NaiveTime>,
    /// Stored but never expanded into occurrences.
    pub is_recurring: bool,
    pub created_at: NaiveDateTime,
}

impl Task {
    /// Whether the task already carries a scheduling assignment.
    pub fn is_scheduled(&self) -> bool {
        self.scheduled_date.is_some()
    }

    /// Candidate for auto-scheduling: not completed and not yet placed.
    pub fn is_pending(&self) -> bool {
        !self.is_completed && !self.is_scheduled()
    }

    /// Estimated duration, falling back to `default` when unset or zero.
    pub fn duration_or(&self, default: u32) -> u32 {
        self.estimated_minutes
            .filter(|minutes| *minutes > 0)
            .unwrap_or(default)
    }

    /// Clear the scheduling assignment.
    pub fn unschedule(&mut self) {
        self.scheduled_date = None;
        self.scheduled_start = None;
        self.scheduled_end = None;
    }
}

/// Input for creating a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub estimated_minutes: Option<u32>,
    #[serde(default)]
    pub is_recurring: bool,
}

impl NewTask {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            description: None,
            due_date: None,
            priority: Priority::default(),
            estimated_minutes: Some(DEFAULT_TASK_MINUTES),
            is_recurring: false,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_due(mut self, due: NaiveDateTime) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn with_minutes(mut self, minutes: u32) -> Self {
        self.estimated_minutes = Some(minutes);
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// # Errors
    /// Returns a [`ValidationError`] for an empty title or a zero duration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_task_fields(&self.title, self.estimated_minutes)
    }
}

/// Shared checks for task creation and edits.
///
/// # Errors
/// Returns a [`ValidationError`] for an empty title or a zero duration.
pub fn validate_task_fields(title: &str, minutes: Option<u32>) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::invalid("title", "must not be empty"));
    }
    if minutes == Some(0) {
        return Err(ValidationError::invalid(
            "estimated_minutes",
            "must be greater than zero",
        ));
    }
    Ok(())
}
