//! Storage collaborator seen by the scheduling core.

use chrono::{NaiveDate, NaiveTime};

use crate::error::Result;
use crate::notification::NewNotification;
use crate::task::Task;
use crate::timetable::ClassSession;

/// Everything the scheduling core reads from and writes to storage.
///
/// Calls are synchronous; any error aborts the current core operation and
/// is returned to the caller unchanged.
pub trait PlannerStore {
    /// Active, non-cancelled classes on `day_of_week`, ordered by start time.
    fn fetch_classes(&self, day_of_week: u8) -> Result<Vec<ClassSession>>;

    /// Active classes on `day_of_week` including cancelled ones.
    fn fetch_timetable(&self, day_of_week: u8) -> Result<Vec<ClassSession>> {
        self.fetch_classes(day_of_week)
    }

    /// Incomplete tasks without a scheduling assignment.
    fn fetch_unscheduled_tasks(&self) -> Result<Vec<Task>>;

    /// Every incomplete task, scheduled or not.
    fn fetch_open_tasks(&self) -> Result<Vec<Task>>;

    /// Tasks scheduled on `date`.
    fn fetch_tasks_on(&self, date: NaiveDate) -> Result<Vec<Task>>;

    /// Write a scheduling assignment back onto a task.
    fn commit_assignment(
        &self,
        task_id: i64,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<()>;

    /// Persist a notification, returning its id.
    fn emit_notification(&self, notification: &NewNotification) -> Result<i64>;
}
