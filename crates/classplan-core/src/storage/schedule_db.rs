//! SQLite-based storage for the timetable, tasks and notifications.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::debug;

use super::data_dir;
use super::migrations;
use super::store::PlannerStore;
use crate::error::{CoreError, DatabaseError, Result};
use crate::notification::{NewNotification, Notification, NotificationKind};
use crate::task::{validate_task_fields, NewTask, Priority, Task};
use crate::timetable::{validate_slot, ClassSession, ClassType, NewClass};

const TIME_FORMAT: &str = "%H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Default page size for notification listings.
pub const DEFAULT_NOTIFICATION_LIMIT: usize = 50;

const CLASS_COLUMNS: &str = "id, owner_id, day_of_week, start_time, end_time, subject, \
     class_type, location, instructor, color, is_cancelled, is_active";

const TASK_COLUMNS: &str = "id, owner_id, title, description, due_date, priority, \
     estimated_minutes, is_completed, completed_at, scheduled_date, scheduled_start, \
     scheduled_end, is_recurring, created_at";

const NOTIFICATION_COLUMNS: &str =
    "id, owner_id, kind, title, message, class_id, task_id, is_read, created_at";

// === Helper Functions ===

fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn format_datetime(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn time_column(row: &Row, idx: usize) -> rusqlite::Result<NaiveTime> {
    let raw: String = row.get(idx)?;
    NaiveTime::parse_from_str(&raw, TIME_FORMAT).map_err(|e| conversion_error(idx, e))
}

fn optional_time_column(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveTime>> {
    row.get::<_, Option<String>>(idx)?
        .map(|raw| NaiveTime::parse_from_str(&raw, TIME_FORMAT).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn optional_date_column(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    row.get::<_, Option<String>>(idx)?
        .map(|raw| NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn datetime_column(row: &Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, DATETIME_FORMAT).map_err(|e| conversion_error(idx, e))
}

fn optional_datetime_column(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDateTime>> {
    row.get::<_, Option<String>>(idx)?
        .map(|raw| {
            NaiveDateTime::parse_from_str(&raw, DATETIME_FORMAT).map_err(|e| conversion_error(idx, e))
        })
        .transpose()
}

/// Build a ClassSession from a row selected with `CLASS_COLUMNS`
fn row_to_class(row: &Row) -> rusqlite::Result<ClassSession> {
    let class_type: String = row.get(6)?;
    Ok(ClassSession {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        day_of_week: row.get(2)?,
        start_time: time_column(row, 3)?,
        end_time: time_column(row, 4)?,
        subject: row.get(5)?,
        class_type: ClassType::parse(&class_type),
        location: row.get(7)?,
        instructor: row.get(8)?,
        color: row.get(9)?,
        is_cancelled: row.get(10)?,
        is_active: row.get(11)?,
    })
}

/// Build a Task from a row selected with `TASK_COLUMNS`
fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    let priority: String = row.get(5)?;
    Ok(Task {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        due_date: optional_datetime_column(row, 4)?,
        priority: Priority::parse(&priority),
        estimated_minutes: row.get(6)?,
        is_completed: row.get(7)?,
        completed_at: optional_datetime_column(row, 8)?,
        scheduled_date: optional_date_column(row, 9)?,
        scheduled_start: optional_time_column(row, 10)?,
        scheduled_end: optional_time_column(row, 11)?,
        is_recurring: row.get(12)?,
        created_at: datetime_column(row, 13)?,
    })
}

/// Build a Notification from a row selected with `NOTIFICATION_COLUMNS`
fn row_to_notification(row: &Row) -> rusqlite::Result<Notification> {
    let kind: String = row.get(2)?;
    let kind = NotificationKind::parse(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            Type::Text,
            format!("unknown notification kind '{kind}'").into(),
        )
    })?;
    Ok(Notification {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        kind,
        title: row.get(3)?,
        message: row.get(4)?,
        class_id: row.get(5)?,
        task_id: row.get(6)?,
        is_read: row.get(7)?,
        created_at: datetime_column(row, 8)?,
    })
}

fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

/// SQLite database for the planner.
///
/// Stores classes, tasks and notifications for one owner.
pub struct ScheduleDb {
    conn: Connection,
    owner_id: i64,
}

impl ScheduleDb {
    /// Open the planner database at `<data_dir>/classplan.db`.
    ///
    /// Creates tables if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("classplan.db");
        Self::open_at(&path)
    }

    /// Open (or create) the database file at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| DatabaseError::OpenFailed {
            path: ":memory:".into(),
            source,
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn, owner_id: 1 })
    }

    /// Scope every query to `owner_id`.
    pub fn with_owner(mut self, owner_id: i64) -> Self {
        self.owner_id = owner_id;
        self
    }

    pub fn owner_id(&self) -> i64 {
        self.owner_id
    }

    // === Class CRUD ===

    fn query_classes(&self, filter: &str, day: Option<u8>) -> Result<Vec<ClassSession>> {
        let sql = format!(
            "SELECT {CLASS_COLUMNS} FROM classes
             WHERE owner_id = ?1 AND (?2 IS NULL OR day_of_week = ?2) {filter}
             ORDER BY day_of_week ASC, start_time ASC, id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![self.owner_id, day], row_to_class)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Get a class by id, including inactive ones.
    pub fn get_class(&self, id: i64) -> Result<Option<ClassSession>> {
        let sql = format!("SELECT {CLASS_COLUMNS} FROM classes WHERE id = ?1 AND owner_id = ?2");
        Ok(self
            .conn
            .query_row(&sql, params![id, self.owner_id], row_to_class)
            .optional()?)
    }

    fn require_class(&self, id: i64) -> Result<ClassSession> {
        self.get_class(id)?
            .ok_or(CoreError::NotFound { entity: "class", id })
    }

    /// Active classes ordered by day and start time.
    ///
    /// Cancelled classes are included only when `include_cancelled` is set.
    pub fn list_classes(&self, include_cancelled: bool) -> Result<Vec<ClassSession>> {
        let filter = if include_cancelled {
            "AND is_active = 1"
        } else {
            "AND is_active = 1 AND is_cancelled = 0"
        };
        self.query_classes(filter, None)
    }

    /// Add a class after validating it.
    pub fn add_class(&self, class: &NewClass) -> Result<ClassSession> {
        class.validate()?;
        self.conn.execute(
            "INSERT INTO classes (owner_id, day_of_week, start_time, end_time, subject,
                                  class_type, location, instructor, color)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                self.owner_id,
                class.day_of_week,
                format_time(class.start_time),
                format_time(class.end_time),
                class.subject,
                class.class_type.as_str(),
                class.location,
                class.instructor,
                class.color,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(class_id = id, subject = %class.subject, "class added");
        self.require_class(id)
    }

    /// Replace every editable field of a class.
    pub fn update_class(&self, id: i64, class: &NewClass) -> Result<ClassSession> {
        class.validate()?;
        let changed = self.conn.execute(
            "UPDATE classes
             SET day_of_week = ?1, start_time = ?2, end_time = ?3, subject = ?4,
                 class_type = ?5, location = ?6, instructor = ?7, color = ?8
             WHERE id = ?9 AND owner_id = ?10",
            params![
                class.day_of_week,
                format_time(class.start_time),
                format_time(class.end_time),
                class.subject,
                class.class_type.as_str(),
                class.location,
                class.instructor,
                class.color,
                id,
                self.owner_id,
            ],
        )?;
        self.ensure_changed(changed, "class", id)?;
        self.require_class(id)
    }

    fn set_class_flag(&self, id: i64, column: &str, value: bool) -> Result<ClassSession> {
        let sql = format!("UPDATE classes SET {column} = ?1 WHERE id = ?2 AND owner_id = ?3");
        let changed = self.conn.execute(&sql, params![value, id, self.owner_id])?;
        self.ensure_changed(changed, "class", id)?;
        self.require_class(id)
    }

    /// Soft delete: the class stays in the database but leaves the timetable.
    pub fn delete_class(&self, id: i64) -> Result<ClassSession> {
        self.set_class_flag(id, "is_active", false)
    }

    /// Undo a soft delete.
    pub fn restore_class(&self, id: i64) -> Result<ClassSession> {
        self.set_class_flag(id, "is_active", true)
    }

    /// Mark a class cancelled and emit a `class_cancelled` notification.
    ///
    /// Cancelling a class that is already cancelled changes nothing.
    pub fn cancel_class(&self, id: i64) -> Result<ClassSession> {
        let current = self.require_class(id)?;
        if current.is_cancelled {
            return Ok(current);
        }
        let class = self.set_class_flag(id, "is_cancelled", true)?;
        self.create_notification(&NewNotification::class_cancelled(id))?;
        Ok(class)
    }

    pub fn uncancel_class(&self, id: i64) -> Result<ClassSession> {
        self.set_class_flag(id, "is_cancelled", false)
    }

    /// Move a class to a new weekly slot, clearing any cancellation, and emit
    /// a `class_rescheduled` notification.
    pub fn reschedule_class(
        &self,
        id: i64,
        day_of_week: u8,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<ClassSession> {
        validate_slot(day_of_week, start, end)?;
        let changed = self.conn.execute(
            "UPDATE classes
             SET day_of_week = ?1, start_time = ?2, end_time = ?3, is_cancelled = 0
             WHERE id = ?4 AND owner_id = ?5",
            params![
                day_of_week,
                format_time(start),
                format_time(end),
                id,
                self.owner_id
            ],
        )?;
        self.ensure_changed(changed, "class", id)?;
        self.create_notification(&NewNotification::class_rescheduled(id))?;
        self.require_class(id)
    }

    /// Active, non-cancelled classes on `day_of_week` overlapping `[start, end)`.
    ///
    /// `exclude_id` skips the class being edited.
    pub fn check_time_conflict(
        &self,
        day_of_week: u8,
        start: NaiveTime,
        end: NaiveTime,
        exclude_id: Option<i64>,
    ) -> Result<Vec<ClassSession>> {
        validate_slot(day_of_week, start, end)?;
        Ok(self
            .query_classes("AND is_active = 1 AND is_cancelled = 0", Some(day_of_week))?
            .into_iter()
            .filter(|c| Some(c.id) != exclude_id)
            .filter(|c| c.start_time < end && c.end_time > start)
            .collect())
    }

    // === Task CRUD ===

    fn query_tasks(&self, filter: &str, order: &str, param: Option<String>) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE owner_id = ?1 {filter}
             ORDER BY {order}"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = match param {
            Some(p) => stmt.query_map(params![self.owner_id, p], row_to_task)?,
            None => stmt.query_map(params![self.owner_id], row_to_task)?,
        };
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Get a task by id.
    pub fn get_task(&self, id: i64) -> Result<Option<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1 AND owner_id = ?2");
        Ok(self
            .conn
            .query_row(&sql, params![id, self.owner_id], row_to_task)
            .optional()?)
    }

    fn require_task(&self, id: i64) -> Result<Task> {
        self.get_task(id)?
            .ok_or(CoreError::NotFound { entity: "task", id })
    }

    /// Tasks ordered by due date (undated last), then creation order.
    pub fn list_tasks(&self, include_completed: bool) -> Result<Vec<Task>> {
        let filter = if include_completed { "" } else { "AND is_completed = 0" };
        self.query_tasks(filter, "due_date IS NULL, due_date ASC, id ASC", None)
    }

    /// Incomplete tasks whose due date is before `now`.
    pub fn overdue_tasks(&self, now: NaiveDateTime) -> Result<Vec<Task>> {
        self.query_tasks(
            "AND is_completed = 0 AND due_date IS NOT NULL AND due_date < ?2",
            "due_date ASC, id ASC",
            Some(format_datetime(now)),
        )
    }

    /// Add a task after validating it.
    pub fn add_task(&self, task: &NewTask) -> Result<Task> {
        task.validate()?;
        self.conn.execute(
            "INSERT INTO tasks (owner_id, title, description, due_date, priority,
                                estimated_minutes, is_recurring, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                self.owner_id,
                task.title,
                task.description,
                task.due_date.map(format_datetime),
                task.priority.as_str(),
                task.estimated_minutes,
                task.is_recurring,
                format_datetime(now_local()),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(task_id = id, title = %task.title, "task added");
        self.require_task(id)
    }

    /// Replace the editable fields of a task. Scheduling is left untouched.
    pub fn update_task(&self, id: i64, task: &NewTask) -> Result<Task> {
        validate_task_fields(&task.title, task.estimated_minutes)?;
        let changed = self.conn.execute(
            "UPDATE tasks
             SET title = ?1, description = ?2, due_date = ?3, priority = ?4,
                 estimated_minutes = ?5, is_recurring = ?6
             WHERE id = ?7 AND owner_id = ?8",
            params![
                task.title,
                task.description,
                task.due_date.map(format_datetime),
                task.priority.as_str(),
                task.estimated_minutes,
                task.is_recurring,
                id,
                self.owner_id,
            ],
        )?;
        self.ensure_changed(changed, "task", id)?;
        self.require_task(id)
    }

    /// Mark a task completed, stamping `completed_at` once.
    pub fn complete_task(&self, id: i64) -> Result<Task> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET is_completed = 1, completed_at = COALESCE(completed_at, ?1)
             WHERE id = ?2 AND owner_id = ?3",
            params![format_datetime(now_local()), id, self.owner_id],
        )?;
        self.ensure_changed(changed, "task", id)?;
        self.require_task(id)
    }

    /// Clear a task's assignment so the next auto-schedule pass reconsiders it.
    pub fn unschedule_task(&self, id: i64) -> Result<Task> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET scheduled_date = NULL, scheduled_start = NULL, scheduled_end = NULL
             WHERE id = ?1 AND owner_id = ?2",
            params![id, self.owner_id],
        )?;
        self.ensure_changed(changed, "task", id)?;
        self.require_task(id)
    }

    /// Hard delete.
    pub fn delete_task(&self, id: i64) -> Result<()> {
        let changed = self.conn.execute(
            "DELETE FROM tasks WHERE id = ?1 AND owner_id = ?2",
            params![id, self.owner_id],
        )?;
        self.ensure_changed(changed, "task", id)
    }

    // === Notifications ===

    /// Persist a notification and return its id.
    pub fn create_notification(&self, notification: &NewNotification) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO notifications (owner_id, kind, title, message, class_id, task_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                self.owner_id,
                notification.kind.as_str(),
                notification.title,
                notification.message,
                notification.class_id,
                notification.task_id,
                format_datetime(now_local()),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(notification_id = id, kind = %notification.kind, "notification stored");
        Ok(id)
    }

    fn query_notifications(&self, filter: &str, limit: usize) -> Result<Vec<Notification>> {
        let sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications
             WHERE owner_id = ?1 {filter}
             ORDER BY created_at DESC, id DESC
             LIMIT ?2"
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![self.owner_id, limit], row_to_notification)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Most recent notifications first.
    pub fn list_notifications(&self, limit: usize) -> Result<Vec<Notification>> {
        self.query_notifications("", limit)
    }

    pub fn unread_notifications(&self) -> Result<Vec<Notification>> {
        self.query_notifications("AND is_read = 0", usize::MAX)
    }

    pub fn mark_notification_read(&self, id: i64) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND owner_id = ?2",
            params![id, self.owner_id],
        )?;
        self.ensure_changed(changed, "notification", id)
    }

    fn ensure_changed(&self, changed: usize, entity: &'static str, id: i64) -> Result<()> {
        if changed == 0 {
            return Err(CoreError::NotFound { entity, id });
        }
        Ok(())
    }
}

impl PlannerStore for ScheduleDb {
    fn fetch_classes(&self, day_of_week: u8) -> Result<Vec<ClassSession>> {
        self.query_classes("AND is_active = 1 AND is_cancelled = 0", Some(day_of_week))
    }

    fn fetch_timetable(&self, day_of_week: u8) -> Result<Vec<ClassSession>> {
        self.query_classes("AND is_active = 1", Some(day_of_week))
    }

    fn fetch_unscheduled_tasks(&self) -> Result<Vec<Task>> {
        self.query_tasks(
            "AND is_completed = 0 AND scheduled_date IS NULL",
            "id ASC",
            None,
        )
    }

    fn fetch_open_tasks(&self) -> Result<Vec<Task>> {
        self.list_tasks(false)
    }

    fn fetch_tasks_on(&self, date: NaiveDate) -> Result<Vec<Task>> {
        self.query_tasks(
            "AND scheduled_date = ?2",
            "scheduled_start IS NULL, scheduled_start ASC, id ASC",
            Some(format_date(date)),
        )
    }

    fn commit_assignment(
        &self,
        task_id: i64,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET scheduled_date = ?1, scheduled_start = ?2, scheduled_end = ?3
             WHERE id = ?4 AND owner_id = ?5",
            params![
                format_date(date),
                format_time(start),
                format_time(end),
                task_id,
                self.owner_id
            ],
        )?;
        self.ensure_changed(changed, "task", task_id)
    }

    fn emit_notification(&self, notification: &NewNotification) -> Result<i64> {
        self.create_notification(notification)
    }
}
