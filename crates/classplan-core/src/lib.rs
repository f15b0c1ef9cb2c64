//! # Classplan Core Library
//!
//! This library provides the scheduling core of the classplan academic planner.
//! All operations are available through the standalone `classplan-cli` binary,
//! which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Timetable & Tasks**: weekly-recurring classes and one-off tasks
//! - **Timeline**: free-slot detection, priority scoring and slot ranking
//! - **Scheduler**: greedy auto-scheduling and class conflict detection
//! - **Agenda & Reminders**: daily agenda, summaries, reminders and deadlines
//! - **Storage**: SQLite persistence and TOML configuration
//!
//! ## Key Components
//!
//! - [`Planner`]: facade exposing every scheduling operation
//! - [`PlannerStore`]: storage collaborator used by the core
//! - [`ScheduleDb`]: SQLite implementation of [`PlannerStore`]
//! - [`Config`]: application configuration management

pub mod agenda;
pub mod error;
pub mod notification;
pub mod planner;
pub mod reminders;
pub mod scheduler;
pub mod storage;
pub mod task;
pub mod timeline;
pub mod timetable;

pub use agenda::{compute_daily_agenda, AgendaEntry, AgendaItem, DailySummary};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use notification::{NewNotification, Notification, NotificationKind};
pub use planner::{OptimizationSummary, Planner, SlotSuggestion, WeekOptimization};
pub use reminders::UpcomingDeadline;
pub use scheduler::{
    AutoScheduler, ClassConflict, ConflictDetector, ScheduleAssignment, ScheduleRun,
    SchedulerConfig,
};
pub use storage::{Config, NotificationsConfig, PlannerStore, ScheduleDb};
pub use task::{NewTask, Priority, Task};
pub use timeline::{calculate_priority_score, detect_free_slots, BusyInterval, DayWindow, FreeSlot};
pub use timetable::{ClassSession, ClassType, NewClass};
