//! Database schema migrations for classplan.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};
use tracing::{debug, warn};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Create the schema_version table if it doesn't exist.
fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    debug!(version, "schema version set");
    Ok(())
}

/// Migration v1: classes, tasks and notifications.
///
/// Times are stored as `HH:MM:SS`, dates as `YYYY-MM-DD` and timestamps as
/// `YYYY-MM-DDTHH:MM:SS`, so text order matches chronological order.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS classes (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id     INTEGER NOT NULL,
            day_of_week  INTEGER NOT NULL CHECK (day_of_week BETWEEN 0 AND 6),
            start_time   TEXT NOT NULL,
            end_time     TEXT NOT NULL,
            subject      TEXT NOT NULL,
            class_type   TEXT NOT NULL DEFAULT 'Lecture',
            location     TEXT NOT NULL DEFAULT '',
            instructor   TEXT NOT NULL DEFAULT '',
            color        TEXT NOT NULL DEFAULT '#3498db',
            is_cancelled INTEGER NOT NULL DEFAULT 0,
            is_active    INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id          INTEGER NOT NULL,
            title             TEXT NOT NULL,
            description       TEXT,
            due_date          TEXT,
            priority          TEXT NOT NULL DEFAULT 'Medium',
            estimated_minutes INTEGER,
            is_completed      INTEGER NOT NULL DEFAULT 0,
            completed_at      TEXT,
            scheduled_date    TEXT,
            scheduled_start   TEXT,
            scheduled_end     TEXT,
            is_recurring      INTEGER NOT NULL DEFAULT 0,
            created_at        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS notifications (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id   INTEGER NOT NULL,
            kind       TEXT NOT NULL,
            title      TEXT NOT NULL,
            message    TEXT NOT NULL,
            class_id   INTEGER,
            task_id    INTEGER,
            is_read    INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()?;
    Ok(())
}

/// Migration v2: lookup indexes for the scheduler's per-day queries.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_classes_owner_day
            ON classes(owner_id, day_of_week, start_time);
         CREATE INDEX IF NOT EXISTS idx_tasks_owner_scheduled
            ON tasks(owner_id, scheduled_date);
         CREATE INDEX IF NOT EXISTS idx_notifications_owner_read
            ON notifications(owner_id, is_read);",
    )?;

    set_schema_version(&tx, 2)?;
    tx.commit()?;
    Ok(())
}
