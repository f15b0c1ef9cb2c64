//! Planner facade over a [`PlannerStore`].
//!
//! Bundles the scheduler, conflict detector, agenda and reminder logic behind
//! one type configured from [`Config`]. Every time-dependent operation takes
//! `now` (or a date) from the caller.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::agenda::{self, AgendaEntry, DailySummary};
use crate::error::Result;
use crate::notification::{NewNotification, NotificationKind};
use crate::reminders::{self, UpcomingDeadline};
use crate::scheduler::{AutoScheduler, ClassConflict, ConflictDetector, ScheduleAssignment, ScheduleRun};
use crate::storage::{Config, PlannerStore};
use crate::task::{Priority, Task};
use crate::timeline::{BusyInterval, FreeSlot};
use crate::timetable::{day_name, weekday_index, ClassSession};

/// Slots offered when a class is cancelled.
const SUGGESTED_SLOTS: usize = 3;
/// Tasks proposed for each suggested slot.
const SUGGESTED_TASKS: usize = 3;

/// A free slot on a cancelled class's weekday with tasks that could use it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotSuggestion {
    pub day: String,
    pub slot: FreeSlot,
    pub suggested_tasks: Vec<Task>,
}

/// Counts reported after a weekly optimize pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationSummary {
    /// Incomplete tasks before the pass.
    pub total_tasks: usize,
    /// Incomplete tasks holding an assignment after the pass.
    pub scheduled: usize,
    /// Tasks the pass could not place.
    pub unscheduled: usize,
    pub conflicts_found: usize,
}

/// Result of [`Planner::optimize_week`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekOptimization {
    pub scheduled_tasks: Vec<ScheduleAssignment>,
    pub conflicts: Vec<ClassConflict>,
    pub summary: OptimizationSummary,
}

/// Scheduling operations bound to one store and configuration.
pub struct Planner<S: PlannerStore> {
    store: S,
    config: Config,
    scheduler: AutoScheduler,
    detector: ConflictDetector,
}

impl<S: PlannerStore> Planner<S> {
    pub fn new(store: S, config: Config) -> Self {
        Self {
            scheduler: AutoScheduler::with_config(config.scheduler.clone()),
            detector: ConflictDetector::new(),
            store,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Place every pending task, returning the committed assignments.
    ///
    /// # Errors
    /// Returns the first storage error.
    pub fn run_auto_schedule(&self, now: NaiveDateTime) -> Result<Vec<ScheduleAssignment>> {
        Ok(self.auto_schedule(now)?.assignments)
    }

    /// Like [`Self::run_auto_schedule`] but also reports the tasks left over.
    ///
    /// # Errors
    /// Returns the first storage error.
    pub fn auto_schedule(&self, now: NaiveDateTime) -> Result<ScheduleRun> {
        self.scheduler.run(&self.store, now)
    }

    /// Detect overlapping classes and emit one notification per overlap.
    ///
    /// # Errors
    /// Returns the first storage error.
    pub fn find_conflicts(&self) -> Result<Vec<ClassConflict>> {
        self.detector.find_conflicts(&self.store)
    }

    /// Classes and tasks for `date`, ordered by start time.
    ///
    /// # Errors
    /// Returns the first storage error.
    pub fn compute_daily_agenda(&self, date: NaiveDate) -> Result<Vec<AgendaEntry>> {
        agenda::compute_daily_agenda(&self.store, date)
    }

    /// # Errors
    /// Returns the first storage error.
    pub fn daily_summary(&self, date: NaiveDate) -> Result<DailySummary> {
        Ok(DailySummary::from_agenda(date, self.compute_daily_agenda(date)?))
    }

    /// Build the summary for `date` and store it as a `daily_summary`
    /// notification, returning the summary and the notification id.
    ///
    /// # Errors
    /// Returns the first storage error.
    pub fn send_daily_summary(&self, date: NaiveDate) -> Result<(DailySummary, i64)> {
        let summary = self.daily_summary(date)?;
        let id = self.store.emit_notification(&NewNotification::new(
            NotificationKind::DailySummary,
            summary.title(),
            summary.message.clone(),
        ))?;
        Ok((summary, id))
    }

    /// Emit class and task reminders due at `now`.
    ///
    /// Returns the notifications that were stored; nothing is generated when
    /// notifications are disabled.
    ///
    /// # Errors
    /// Returns the first storage error.
    pub fn generate_reminders(&self, now: NaiveDateTime) -> Result<Vec<NewNotification>> {
        let settings = &self.config.notifications;
        if !settings.enabled {
            debug!("notifications disabled, skipping reminders");
            return Ok(Vec::new());
        }

        let classes = self.store.fetch_classes(weekday_index(now.date()))?;
        let tasks = self.store.fetch_open_tasks()?;

        let mut generated = reminders::class_reminders(&classes, now, settings);
        generated.extend(reminders::task_reminders(&tasks, now, settings));
        for notification in &generated {
            self.store.emit_notification(notification)?;
        }

        info!(count = generated.len(), "reminders generated");
        Ok(generated)
    }

    /// Incomplete tasks due within the configured number of days.
    ///
    /// # Errors
    /// Returns the first storage error.
    pub fn upcoming_deadlines(&self, now: NaiveDateTime) -> Result<Vec<UpcomingDeadline>> {
        self.upcoming_deadlines_within(now, self.config.notifications.deadline_days)
    }

    /// # Errors
    /// Returns the first storage error.
    pub fn upcoming_deadlines_within(
        &self,
        now: NaiveDateTime,
        days: i64,
    ) -> Result<Vec<UpcomingDeadline>> {
        let tasks = self.store.fetch_open_tasks()?;
        Ok(reminders::upcoming_deadlines(&tasks, now, days))
    }

    /// Free slots as long as `class` on its weekday, each paired with the most
    /// pressing High/Urgent unscheduled tasks.
    ///
    /// The weekday's remaining classes are treated as busy; `class` itself is
    /// expected to be cancelled and therefore ignored.
    ///
    /// # Errors
    /// Returns the first storage error.
    pub fn suggest_alternatives(
        &self,
        class: &ClassSession,
        now: NaiveDateTime,
    ) -> Result<Vec<SlotSuggestion>> {
        let busy: Vec<BusyInterval> = self
            .store
            .fetch_classes(class.day_of_week)?
            .iter()
            .filter(|other| other.id != class.id && other.is_scheduled())
            .map(BusyInterval::from)
            .collect();
        let slots = self
            .scheduler
            .finder()
            .find_slots(&busy, class.duration_minutes());

        let mut candidates: Vec<Task> = self
            .store
            .fetch_unscheduled_tasks()?
            .into_iter()
            .filter(|task| task.is_pending() && task.priority >= Priority::High)
            .collect();
        self.scheduler.scorer().rank(&mut candidates, now);
        candidates.truncate(SUGGESTED_TASKS);

        Ok(slots
            .into_iter()
            .take(SUGGESTED_SLOTS)
            .map(|slot| SlotSuggestion {
                day: day_name(class.day_of_week).to_string(),
                slot,
                suggested_tasks: candidates.clone(),
            })
            .collect())
    }

    /// Auto-schedule, then scan for class conflicts, then summarize.
    ///
    /// # Errors
    /// Returns the first storage error.
    pub fn optimize_week(&self, now: NaiveDateTime) -> Result<WeekOptimization> {
        let total_tasks = self.store.fetch_open_tasks()?.len();
        let run = self.auto_schedule(now)?;
        let conflicts = self.find_conflicts()?;
        let scheduled = self
            .store
            .fetch_open_tasks()?
            .iter()
            .filter(|task| task.is_scheduled())
            .count();

        let summary = OptimizationSummary {
            total_tasks,
            scheduled,
            unscheduled: run.unscheduled_task_ids.len(),
            conflicts_found: conflicts.len(),
        };
        info!(
            total = summary.total_tasks,
            scheduled = summary.scheduled,
            unscheduled = summary.unscheduled,
            conflicts = summary.conflicts_found,
            "weekly optimize finished"
        );

        Ok(WeekOptimization {
            scheduled_tasks: run.assignments,
            conflicts,
            summary,
        })
    }
}
