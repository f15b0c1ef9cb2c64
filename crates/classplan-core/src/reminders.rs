//! Reminder and deadline generation.
//!
//! Everything here is a pure function of the records passed in and an
//! injected `now`; persisting the resulting notifications is the caller's job.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::notification::{NewNotification, NotificationKind};
use crate::storage::NotificationsConfig;
use crate::task::Task;
use crate::timetable::{weekday_index, ClassSession};

/// Reminders for today's classes starting within the configured lead time.
///
/// A class qualifies when `0 < minutes_until_start <= class_reminder_minutes`.
/// Cancelled and inactive classes never do.
pub fn class_reminders(
    classes: &[ClassSession],
    now: NaiveDateTime,
    config: &NotificationsConfig,
) -> Vec<NewNotification> {
    let today = weekday_index(now.date());
    let lead_seconds = config.class_reminder_minutes.saturating_mul(60);

    classes
        .iter()
        .filter(|class| class.day_of_week == today && class.is_scheduled())
        .filter_map(|class| {
            let until = (now.date().and_time(class.start_time) - now).num_seconds();
            (until > 0 && until <= lead_seconds).then(|| {
                NewNotification::new(
                    NotificationKind::ClassReminder,
                    format!("Class Starting Soon: {}", class.subject),
                    format!(
                        "{} at {} starts in {} minutes",
                        class.class_type,
                        class.location,
                        until / 60
                    ),
                )
                .for_class(class.id)
            })
        })
        .collect()
}

/// Overdue and due-soon reminders for incomplete tasks with a due date.
pub fn task_reminders(
    tasks: &[Task],
    now: NaiveDateTime,
    config: &NotificationsConfig,
) -> Vec<NewNotification> {
    let window_seconds = config.task_reminder_hours.saturating_mul(3600);

    tasks
        .iter()
        .filter(|task| !task.is_completed)
        .filter_map(|task| {
            let due = task.due_date?;
            let until = (due - now).num_seconds();
            if until < 0 {
                Some(
                    NewNotification::new(
                        NotificationKind::TaskOverdue,
                        format!("Overdue: {}", task.title),
                        format!("This task was due on {}", due.format("%Y-%m-%d %H:%M")),
                    )
                    .for_task(task.id),
                )
            } else if until > 0 && until <= window_seconds {
                Some(
                    NewNotification::new(
                        NotificationKind::TaskDueSoon,
                        format!("Due Soon: {}", task.title),
                        format!("This task is due in {} hours", until / 3600),
                    )
                    .for_task(task.id),
                )
            } else {
                None
            }
        })
        .collect()
}

/// A task whose due date falls inside the look-ahead window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingDeadline {
    pub task: Task,
    pub due_date: NaiveDateTime,
    /// Whole days left, rounded down.
    pub days_until: i64,
}

/// Incomplete tasks due within `[now, now + days]`, earliest first.
///
/// A window reaching past the last representable timestamp has no upper bound.
pub fn upcoming_deadlines(tasks: &[Task], now: NaiveDateTime, days: i64) -> Vec<UpcomingDeadline> {
    if days < 0 {
        return Vec::new();
    }
    let limit = Duration::try_days(days)
        .and_then(|span| now.checked_add_signed(span))
        .unwrap_or(NaiveDateTime::MAX);
    let mut upcoming: Vec<UpcomingDeadline> = tasks
        .iter()
        .filter(|task| !task.is_completed)
        .filter_map(|task| {
            let due = task.due_date?;
            (now <= due && due <= limit).then(|| UpcomingDeadline {
                task: task.clone(),
                due_date: due,
                days_until: (due - now).num_days(),
            })
        })
        .collect();
    upcoming.sort_by_key(|d| d.due_date);
    upcoming
}
