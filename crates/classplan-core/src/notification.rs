//! Notification records produced as side effects of scheduling.
//!
//! The core only builds notification payloads ([`NewNotification`]) and
//! hands them to the store; delivery and display belong to the front end.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::task::Task;
use crate::timetable::ClassSession;

/// Closed set of notification kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ClassReminder,
    ClassCancelled,
    ClassRescheduled,
    TaskDueSoon,
    TaskOverdue,
    ScheduleConflict,
    DailySummary,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::ClassReminder => "class_reminder",
            NotificationKind::ClassCancelled => "class_cancelled",
            NotificationKind::ClassRescheduled => "class_rescheduled",
            NotificationKind::TaskDueSoon => "task_due_soon",
            NotificationKind::TaskOverdue => "task_overdue",
            NotificationKind::ScheduleConflict => "schedule_conflict",
            NotificationKind::DailySummary => "daily_summary",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "class_reminder" => Some(NotificationKind::ClassReminder),
            "class_cancelled" => Some(NotificationKind::ClassCancelled),
            "class_rescheduled" => Some(NotificationKind::ClassRescheduled),
            "task_due_soon" => Some(NotificationKind::TaskDueSoon),
            "task_overdue" => Some(NotificationKind::TaskOverdue),
            "schedule_conflict" => Some(NotificationKind::ScheduleConflict),
            "daily_summary" => Some(NotificationKind::DailySummary),
            _ => None,
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: i64,
    pub owner_id: i64,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub class_id: Option<i64>,
    pub task_id: Option<i64>,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

/// Notification payload handed to the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewNotification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub class_id: Option<i64>,
    pub task_id: Option<i64>,
}

impl NewNotification {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            class_id: None,
            task_id: None,
        }
    }

    pub fn for_class(mut self, class_id: i64) -> Self {
        self.class_id = Some(class_id);
        self
    }

    pub fn for_task(mut self, task_id: i64) -> Self {
        self.task_id = Some(task_id);
        self
    }

    /// A task could not be placed anywhere in its horizon.
    pub fn unschedulable_task(task: &Task) -> Self {
        Self::new(
            NotificationKind::ScheduleConflict,
            "Task Scheduling Issue",
            format!(
                "Could not find a suitable time slot for task: {}",
                task.title
            ),
        )
        .for_task(task.id)
    }

    /// Two classes overlap on the same weekday.
    pub fn class_overlap(day: &str, first: &ClassSession, second: &ClassSession) -> Self {
        Self::new(
            NotificationKind::ScheduleConflict,
            "Scheduling Conflict Detected",
            format!(
                "Conflict on {day}: {} overlaps with {}",
                first.subject, second.subject
            ),
        )
    }

    pub fn class_cancelled(class_id: i64) -> Self {
        Self::new(
            NotificationKind::ClassCancelled,
            "Class Cancelled",
            "A class has been cancelled. Check your schedule for updates.",
        )
        .for_class(class_id)
    }

    pub fn class_rescheduled(class_id: i64) -> Self {
        Self::new(
            NotificationKind::ClassRescheduled,
            "Class Rescheduled",
            "A class has been rescheduled to a new time.",
        )
        .for_class(class_id)
    }
}
