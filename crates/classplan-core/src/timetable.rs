//! Weekly class timetable types.
//!
//! A [`ClassSession`] recurs every week on one day. Soft deletion
//! (`is_active`) and cancellation (`is_cancelled`) are independent flags:
//! a class can be cancelled and later reinstated without ever being deleted,
//! and a deleted class keeps its cancellation state when restored.

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Day names indexed by day-of-week (0 = Monday).
pub const DAYS_OF_WEEK: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Day-of-week index for a calendar date (0 = Monday ... 6 = Sunday).
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_monday() as u8
}

/// Human-readable name for a day-of-week index.
pub fn day_name(day: u8) -> &'static str {
    DAYS_OF_WEEK.get(day as usize).copied().unwrap_or("Unknown")
}

/// Kind of class session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ClassType {
    #[default]
    Lecture,
    Lab,
    Tutorial,
    Seminar,
    Workshop,
}

impl ClassType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassType::Lecture => "Lecture",
            ClassType::Lab => "Lab",
            ClassType::Tutorial => "Tutorial",
            ClassType::Seminar => "Seminar",
            ClassType::Workshop => "Workshop",
        }
    }

    /// Parse a stored label; unknown labels fall back to `Lecture`.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "lab" => ClassType::Lab,
            "tutorial" => ClassType::Tutorial,
            "seminar" => ClassType::Seminar,
            "workshop" => ClassType::Workshop,
            _ => ClassType::Lecture,
        }
    }
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default color for classes without an explicit one.
pub const DEFAULT_CLASS_COLOR: &str = "#3498db";

/// A weekly-recurring class in the timetable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassSession {
    pub id: i64,
    pub owner_id: i64,
    /// 0 = Monday ... 6 = Sunday
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub subject: String,
    pub class_type: ClassType,
    pub location: String,
    pub instructor: String,
    pub color: String,
    pub is_cancelled: bool,
    pub is_active: bool,
}

impl ClassSession {
    /// Length of the class in minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }

    /// Whether the class takes part in scheduling (active and not cancelled).
    pub fn is_scheduled(&self) -> bool {
        self.is_active && !self.is_cancelled
    }

    pub fn day_name(&self) -> &'static str {
        day_name(self.day_of_week)
    }
}

/// Input for creating or replacing a class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClass {
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub subject: String,
    #[serde(default)]
    pub class_type: ClassType,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub instructor: String,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    DEFAULT_CLASS_COLOR.to_string()
}

impl NewClass {
    pub fn new(day_of_week: u8, start_time: NaiveTime, end_time: NaiveTime, subject: &str) -> Self {
        Self {
            day_of_week,
            start_time,
            end_time,
            subject: subject.to_string(),
            class_type: ClassType::default(),
            location: String::new(),
            instructor: String::new(),
            color: default_color(),
        }
    }

    pub fn with_type(mut self, class_type: ClassType) -> Self {
        self.class_type = class_type;
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = location.to_string();
        self
    }

    pub fn with_instructor(mut self, instructor: &str) -> Self {
        self.instructor = instructor.to_string();
        self
    }

    /// Reject malformed classes before they reach storage.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] for an out-of-range day, an empty
    /// subject, or an interval whose end is not after its start.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_slot(self.day_of_week, self.start_time, self.end_time)?;
        if self.subject.trim().is_empty() {
            return Err(ValidationError::invalid("subject", "must not be empty"));
        }
        Ok(())
    }
}

/// Validate a weekly slot: day in 0..=6 and `start < end`.
///
/// # Errors
/// Returns a [`ValidationError`] describing the first problem found.
pub fn validate_slot(day: u8, start: NaiveTime, end: NaiveTime) -> Result<(), ValidationError> {
    if day > 6 {
        return Err(ValidationError::InvalidDay(day));
    }
    if end <= start {
        return Err(ValidationError::InvalidTimeRange { start, end });
    }
    Ok(())
}
