//! Automatic scheduler for pending tasks.
//!
//! This module places unscheduled tasks into free time around classes:
//! - Orders pending tasks by priority score (stable on ties)
//! - Searches each task's horizon day by day, starting today
//! - Ranks the free slots of each day and commits the first day that has one
//! - Reports tasks that fit nowhere as `schedule_conflict` notifications

mod conflict;

pub use conflict::{ClassConflict, ConflictDetector};

use chrono::{Days, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::notification::NewNotification;
use crate::storage::PlannerStore;
use crate::task::{Task, DEFAULT_TASK_MINUTES};
use crate::timeline::{
    BusyInterval, DayWindow, FreeSlotFinder, PriorityScorer, PriorityWeights, SlotRanker,
    SlotWeights,
};
use crate::timetable::weekday_index;

/// A task placed on a concrete date and time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleAssignment {
    pub task_id: i64,
    pub task_title: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl ScheduleAssignment {
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }

    fn busy_interval(&self) -> BusyInterval {
        BusyInterval::new(self.start_time, self.end_time)
    }
}

/// Outcome of one auto-scheduling pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRun {
    pub assignments: Vec<ScheduleAssignment>,
    /// Tasks no day of their horizon could hold, in processing order.
    pub unscheduled_task_ids: Vec<i64>,
}

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Part of each day tasks may be placed in
    #[serde(default)]
    pub window: DayWindow,
    /// Days after today searched for tasks without an earlier due date
    #[serde(default = "default_horizon_days")]
    pub horizon_days: i64,
    /// Duration for tasks without an estimate (minutes)
    #[serde(default = "default_task_minutes")]
    pub default_task_minutes: u32,
    #[serde(default)]
    pub priority: PriorityWeights,
    #[serde(default)]
    pub slots: SlotWeights,
}

fn default_horizon_days() -> i64 {
    7
}
fn default_task_minutes() -> u32 {
    DEFAULT_TASK_MINUTES
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            window: DayWindow::default(),
            horizon_days: default_horizon_days(),
            default_task_minutes: default_task_minutes(),
            priority: PriorityWeights::default(),
            slots: SlotWeights::default(),
        }
    }
}

/// Automatic scheduler for pending tasks
pub struct AutoScheduler {
    config: SchedulerConfig,
    finder: FreeSlotFinder,
    scorer: PriorityScorer,
    ranker: SlotRanker,
}

impl AutoScheduler {
    /// Create a new scheduler with default config
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    /// Create with custom config
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            finder: FreeSlotFinder::new(config.window),
            scorer: PriorityScorer::new(config.priority.clone()),
            ranker: SlotRanker::new(config.slots.clone()),
            config,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn scorer(&self) -> &PriorityScorer {
        &self.scorer
    }

    pub fn finder(&self) -> &FreeSlotFinder {
        &self.finder
    }

    /// Last day offset (inclusive) searched for `task`.
    ///
    /// Negative when the task's due date is already behind `today`, which
    /// leaves nothing to search.
    /// A horizon reaching past the last representable date stops there.
    pub fn horizon_offset(&self, task: &Task, today: NaiveDate) -> i64 {
        let limit = Duration::try_days(self.config.horizon_days.max(0))
            .and_then(|span| today.checked_add_signed(span))
            .unwrap_or(NaiveDate::MAX);
        let last_day = match task.due_date {
            Some(due) => due.date().min(limit),
            None => limit,
        };
        (last_day - today).num_days()
    }

    /// Place every pending task the store knows about.
    ///
    /// Tasks are processed in descending priority order. Each committed
    /// assignment blocks its interval for the tasks after it. A task that fits
    /// nowhere produces a `schedule_conflict` notification and the pass moves on.
    ///
    /// # Errors
    /// Returns the first storage error. Assignments committed before the
    /// failure stay committed.
    pub fn run<S: PlannerStore + ?Sized>(&self, store: &S, now: NaiveDateTime) -> Result<ScheduleRun> {
        let mut tasks: Vec<Task> = store
            .fetch_unscheduled_tasks()?
            .into_iter()
            .filter(Task::is_pending)
            .collect();
        self.scorer.rank(&mut tasks, now);

        let today = now.date();
        let mut run = ScheduleRun::default();

        for task in &tasks {
            match self.find_placement(store, task, today, &run.assignments)? {
                Some(assignment) => {
                    store.commit_assignment(
                        assignment.task_id,
                        assignment.date,
                        assignment.start_time,
                        assignment.end_time,
                    )?;
                    debug!(
                        task_id = task.id,
                        date = %assignment.date,
                        start = %assignment.start_time,
                        end = %assignment.end_time,
                        "task placed"
                    );
                    run.assignments.push(assignment);
                }
                None => {
                    warn!(task_id = task.id, title = %task.title, "no free slot within horizon");
                    store.emit_notification(&NewNotification::unschedulable_task(task))?;
                    run.unscheduled_task_ids.push(task.id);
                }
            }
        }

        info!(
            considered = tasks.len(),
            scheduled = run.assignments.len(),
            unscheduled = run.unscheduled_task_ids.len(),
            "auto-schedule pass finished"
        );
        Ok(run)
    }

    /// Find the first day in the task's horizon with a usable slot.
    ///
    /// `placed` holds assignments made earlier in the same pass.
    ///
    /// # Errors
    /// Returns any storage error raised while reading classes or tasks.
    pub fn find_placement<S: PlannerStore + ?Sized>(
        &self,
        store: &S,
        task: &Task,
        today: NaiveDate,
        placed: &[ScheduleAssignment],
    ) -> Result<Option<ScheduleAssignment>> {
        let duration = i64::from(task.duration_or(self.config.default_task_minutes));

        for offset in 0..=self.horizon_offset(task, today) {
            let Some(date) = today.checked_add_days(Days::new(offset.unsigned_abs())) else {
                break;
            };
            let busy = self.busy_intervals(store, date, placed)?;
            let slots = self.finder.find_slots(&busy, duration);

            if let Some(best) = self.ranker.best_slot(&slots, duration) {
                let start_time = best.slot.start_time;
                return Ok(Some(ScheduleAssignment {
                    task_id: task.id,
                    task_title: task.title.clone(),
                    date,
                    start_time,
                    end_time: start_time + Duration::minutes(duration),
                }));
            }
        }

        Ok(None)
    }

    /// Classes of the date's weekday plus tasks already placed on the date.
    fn busy_intervals<S: PlannerStore + ?Sized>(
        &self,
        store: &S,
        date: NaiveDate,
        placed: &[ScheduleAssignment],
    ) -> Result<Vec<BusyInterval>> {
        let mut busy: Vec<BusyInterval> = store
            .fetch_classes(weekday_index(date))?
            .iter()
            .filter(|class| class.is_scheduled())
            .map(BusyInterval::from)
            .collect();

        let run_on_date: Vec<&ScheduleAssignment> =
            placed.iter().filter(|a| a.date == date).collect();

        busy.extend(
            store
                .fetch_tasks_on(date)?
                .iter()
                .filter(|task| !task.is_completed)
                .filter(|task| !run_on_date.iter().any(|a| a.task_id == task.id))
                .filter_map(BusyInterval::from_task),
        );
        busy.extend(run_on_date.iter().map(|a| a.busy_interval()));

        Ok(busy)
    }
}

impl Default for AutoScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::{CoreError, DatabaseError};
    use crate::notification::NotificationKind;
    use crate::task::Priority;
    use crate::timetable::{ClassSession, ClassType};
    use std::cell::RefCell;

    /// In-memory store that records every write.
    #[derive(Default)]
    pub(crate) struct FakeStore {
        pub classes: Vec<ClassSession>,
        pub tasks: RefCell<Vec<Task>>,
        pub notifications: RefCell<Vec<NewNotification>>,
        pub fail_commits: bool,
    }

    impl PlannerStore for FakeStore {
        fn fetch_classes(&self, day_of_week: u8) -> Result<Vec<ClassSession>> {
            let mut classes: Vec<_> = self
                .classes
                .iter()
                .filter(|c| c.day_of_week == day_of_week && c.is_scheduled())
                .cloned()
                .collect();
            classes.sort_by_key(|c| c.start_time);
            Ok(classes)
        }

        fn fetch_timetable(&self, day_of_week: u8) -> Result<Vec<ClassSession>> {
            let mut classes: Vec<_> = self
                .classes
                .iter()
                .filter(|c| c.day_of_week == day_of_week && c.is_active)
                .cloned()
                .collect();
            classes.sort_by_key(|c| c.start_time);
            Ok(classes)
        }

        fn fetch_unscheduled_tasks(&self) -> Result<Vec<Task>> {
            Ok(self
                .tasks
                .borrow()
                .iter()
                .filter(|t| t.is_pending())
                .cloned()
                .collect())
        }

        fn fetch_open_tasks(&self) -> Result<Vec<Task>> {
            Ok(self
                .tasks
                .borrow()
                .iter()
                .filter(|t| !t.is_completed)
                .cloned()
                .collect())
        }

        fn fetch_tasks_on(&self, date: NaiveDate) -> Result<Vec<Task>> {
            Ok(self
                .tasks
                .borrow()
                .iter()
                .filter(|t| t.scheduled_date == Some(date))
                .cloned()
                .collect())
        }

        fn commit_assignment(
            &self,
            task_id: i64,
            date: NaiveDate,
            start: NaiveTime,
            end: NaiveTime,
        ) -> Result<()> {
            if self.fail_commits {
                return Err(CoreError::Database(DatabaseError::Locked));
            }
            let mut tasks = self.tasks.borrow_mut();
            if let Some(task) = tasks.iter_mut().find(|t| t.id == task_id) {
                task.scheduled_date = Some(date);
                task.scheduled_start = Some(start);
                task.scheduled_end = Some(end);
            }
            Ok(())
        }

        fn emit_notification(&self, notification: &NewNotification) -> Result<i64> {
            let mut notifications = self.notifications.borrow_mut();
            notifications.push(notification.clone());
            Ok(notifications.len() as i64)
        }
    }

    pub(crate) fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    /// 2024-03-04 is a Monday.
    pub(crate) fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    pub(crate) fn class(id: i64, day: u8, start: NaiveTime, end: NaiveTime) -> ClassSession {
        ClassSession {
            id,
            owner_id: 1,
            day_of_week: day,
            start_time: start,
            end_time: end,
            subject: format!("Class {id}"),
            class_type: ClassType::Lecture,
            location: "Room 1".into(),
            instructor: String::new(),
            color: "#3498db".into(),
            is_cancelled: false,
            is_active: true,
        }
    }

    pub(crate) fn task(id: i64, priority: Priority, due: Option<NaiveDateTime>, minutes: u32) -> Task {
        Task {
            id,
            owner_id: 1,
            title: format!("Task {id}"),
            description: None,
            due_date: due,
            priority,
            estimated_minutes: Some(minutes),
            is_completed: false,
            completed_at: None,
            scheduled_date: None,
            scheduled_start: None,
            scheduled_end: None,
            is_recurring: false,
            created_at: monday().and_hms_opt(7, 0, 0).unwrap(),
        }
    }

    /// Every weekday blocked except 14:00-15:00.
    fn one_hour_per_day() -> Vec<ClassSession> {
        let mut classes = Vec::new();
        for day in 0..7u8 {
            let base = i64::from(day) * 10;
            classes.push(class(base + 1, day, t(8, 0), t(14, 0)));
            classes.push(class(base + 2, day, t(15, 0), t(21, 0)));
        }
        classes
    }

    #[test]
    fn urgent_task_is_placed_before_low_task() {
        let now = monday().and_hms_opt(9, 0, 0).unwrap();
        let store = FakeStore {
            classes: one_hour_per_day(),
            tasks: RefCell::new(vec![
                task(1, Priority::Low, None, 60),
                task(2, Priority::Urgent, Some(monday().and_hms_opt(23, 0, 0).unwrap()), 60),
            ]),
            ..FakeStore::default()
        };

        let run = AutoScheduler::new().run(&store, now).unwrap();

        assert_eq!(run.assignments.len(), 2);
        assert_eq!(run.assignments[0].task_id, 2);
        assert_eq!(run.assignments[0].date, monday());
        assert_eq!(run.assignments[0].start_time, t(14, 0));
        // The only slot of Monday is taken, so the low task moves to Tuesday.
        assert_eq!(run.assignments[1].task_id, 1);
        assert_eq!(run.assignments[1].date, monday() + Duration::days(1));
        assert!(store.notifications.borrow().is_empty());
    }

    #[test]
    fn exhausted_horizon_emits_conflict() {
        let now = monday().and_hms_opt(9, 0, 0).unwrap();
        let due_today = monday().and_hms_opt(23, 0, 0).unwrap();
        let store = FakeStore {
            classes: one_hour_per_day(),
            tasks: RefCell::new(vec![
                task(1, Priority::Low, Some(due_today), 60),
                task(2, Priority::Urgent, Some(due_today), 60),
            ]),
            ..FakeStore::default()
        };

        let run = AutoScheduler::new().run(&store, now).unwrap();

        assert_eq!(run.assignments.len(), 1);
        assert_eq!(run.assignments[0].task_id, 2);
        assert_eq!(run.unscheduled_task_ids, vec![1]);

        let notifications = store.notifications.borrow();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::ScheduleConflict);
        assert_eq!(notifications[0].task_id, Some(1));
        assert!(notifications[0].message.contains("Task 1"));
    }

    #[test]
    fn empty_day_places_task_on_day_zero() {
        let now = monday().and_hms_opt(9, 0, 0).unwrap();
        let store = FakeStore {
            tasks: RefCell::new(vec![task(1, Priority::Medium, None, 90)]),
            ..FakeStore::default()
        };

        let run = AutoScheduler::new().run(&store, now).unwrap();
        let a = &run.assignments[0];
        assert_eq!(a.date, monday());
        // Single 08:00-21:00 slot: its start is 08:00.
        assert_eq!(a.start_time, t(8, 0));
        assert_eq!(a.end_time, t(9, 30));
        assert_eq!(a.duration_minutes(), 90);

        let stored = store.tasks.borrow();
        assert_eq!(stored[0].scheduled_date, Some(monday()));
        assert_eq!(stored[0].scheduled_start, Some(t(8, 0)));
    }

    #[test]
    fn assignment_avoids_classes_and_stays_in_window() {
        let now = monday().and_hms_opt(6, 0, 0).unwrap();
        let store = FakeStore {
            classes: vec![class(1, 0, t(9, 0), t(10, 30)), class(2, 0, t(13, 0), t(14, 0))],
            tasks: RefCell::new(vec![task(1, Priority::High, None, 60)]),
            ..FakeStore::default()
        };

        let run = AutoScheduler::new().run(&store, now).unwrap();
        let a = &run.assignments[0];
        assert_eq!(a.date, monday());
        assert_eq!((a.start_time, a.end_time), (t(10, 30), t(11, 30)));
        assert!(DayWindow::default().contains(a.start_time, a.end_time));
        for c in &store.classes {
            assert!(!crate::timeline::overlaps(a.start_time, a.end_time, c.start_time, c.end_time));
        }
    }

    #[test]
    fn cancelled_classes_free_their_time() {
        let now = monday().and_hms_opt(6, 0, 0).unwrap();
        let mut blocking = class(1, 0, t(8, 0), t(21, 0));
        blocking.is_cancelled = true;
        let store = FakeStore {
            classes: vec![blocking],
            tasks: RefCell::new(vec![task(1, Priority::High, None, 60)]),
            ..FakeStore::default()
        };

        let run = AutoScheduler::new().run(&store, now).unwrap();
        assert_eq!(run.assignments[0].date, monday());
    }

    #[test]
    fn horizon_without_due_date_ignores_time_of_day() {
        let scheduler = AutoScheduler::new();
        let early = task(1, Priority::Low, None, 60);
        assert_eq!(scheduler.horizon_offset(&early, monday()), 7);
        let late_now = monday().and_hms_opt(23, 59, 0).unwrap();
        assert_eq!(scheduler.horizon_offset(&early, late_now.date()), 7);
    }

    #[test]
    fn horizon_is_capped_by_due_date() {
        let scheduler = AutoScheduler::new();
        let due_in_two = task(1, Priority::Low, Some((monday() + Duration::days(2)).and_hms_opt(9, 0, 0).unwrap()), 60);
        assert_eq!(scheduler.horizon_offset(&due_in_two, monday()), 2);
        let due_far = task(2, Priority::Low, Some((monday() + Duration::days(30)).and_hms_opt(9, 0, 0).unwrap()), 60);
        assert_eq!(scheduler.horizon_offset(&due_far, monday()), 7);
        let overdue = task(3, Priority::Low, Some((monday() - Duration::days(1)).and_hms_opt(9, 0, 0).unwrap()), 60);
        assert_eq!(scheduler.horizon_offset(&overdue, monday()), -1);
    }

    #[test]
    fn overdue_task_is_reported_not_placed() {
        let now = monday().and_hms_opt(9, 0, 0).unwrap();
        let store = FakeStore {
            tasks: RefCell::new(vec![task(
                1,
                Priority::Urgent,
                Some(now - Duration::days(2)),
                60,
            )]),
            ..FakeStore::default()
        };
        let run = AutoScheduler::new().run(&store, now).unwrap();
        assert!(run.assignments.is_empty());
        assert_eq!(run.unscheduled_task_ids, vec![1]);
    }

    #[test]
    fn existing_assignments_block_their_interval() {
        let now = monday().and_hms_opt(6, 0, 0).unwrap();
        let mut placed = task(1, Priority::Low, None, 60);
        placed.scheduled_date = Some(monday());
        placed.scheduled_start = Some(t(8, 0));
        placed.scheduled_end = Some(t(21, 0));
        let store = FakeStore {
            tasks: RefCell::new(vec![placed, task(2, Priority::High, None, 60)]),
            ..FakeStore::default()
        };

        let run = AutoScheduler::new().run(&store, now).unwrap();
        assert_eq!(run.assignments.len(), 1);
        assert_eq!(run.assignments[0].task_id, 2);
        assert_eq!(run.assignments[0].date, monday() + Duration::days(1));
    }

    #[test]
    fn runs_are_deterministic() {
        let now = monday().and_hms_opt(9, 0, 0).unwrap();
        let build = || FakeStore {
            classes: vec![class(1, 0, t(9, 0), t(10, 30)), class(2, 1, t(13, 0), t(17, 0))],
            tasks: RefCell::new(vec![
                task(1, Priority::Medium, None, 45),
                task(2, Priority::Medium, None, 120),
                task(3, Priority::High, Some(now + Duration::days(1)), 30),
            ]),
            ..FakeStore::default()
        };

        let first = AutoScheduler::new().run(&build(), now).unwrap();
        let second = AutoScheduler::new().run(&build(), now).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.assignments[0].task_id, 3);
    }

    #[test]
    fn storage_failure_propagates() {
        let now = monday().and_hms_opt(9, 0, 0).unwrap();
        let store = FakeStore {
            tasks: RefCell::new(vec![task(1, Priority::Medium, None, 60)]),
            fail_commits: true,
            ..FakeStore::default()
        };
        let result = AutoScheduler::new().run(&store, now);
        assert!(matches!(result, Err(CoreError::Database(DatabaseError::Locked))));
    }

    #[test]
    fn unset_duration_uses_default() {
        let now = monday().and_hms_opt(9, 0, 0).unwrap();
        let mut t1 = task(1, Priority::Medium, None, 60);
        t1.estimated_minutes = None;
        let store = FakeStore {
            tasks: RefCell::new(vec![t1]),
            ..FakeStore::default()
        };
        let config = SchedulerConfig {
            default_task_minutes: 30,
            ..SchedulerConfig::default()
        };
        let run = AutoScheduler::with_config(config).run(&store, now).unwrap();
        assert_eq!(run.assignments[0].duration_minutes(), 30);
    }

    #[test]
    fn horizon_past_last_date_stops_at_max_date() {
        let scheduler = AutoScheduler::with_config(SchedulerConfig {
            horizon_days: 100_000_000,
            ..SchedulerConfig::default()
        });
        let open_ended = task(1, Priority::Low, None, 60);
        let expected = (NaiveDate::MAX - monday()).num_days();
        assert_eq!(scheduler.horizon_offset(&open_ended, monday()), expected);

        let store = FakeStore {
            tasks: RefCell::new(vec![open_ended]),
            ..FakeStore::default()
        };
        let run = scheduler.run(&store, monday().and_hms_opt(9, 0, 0).unwrap()).unwrap();
        assert_eq!(run.assignments[0].date, monday());
    }

    #[test]
    fn completed_task_frees_its_old_slot() {
        let now = monday().and_hms_opt(9, 0, 0).unwrap();
        let mut done = task(2, Priority::Low, None, 780);
        done.is_completed = true;
        done.scheduled_date = Some(monday());
        done.scheduled_start = Some(t(8, 0));
        done.scheduled_end = Some(t(21, 0));
        let store = FakeStore {
            tasks: RefCell::new(vec![task(1, Priority::Medium, None, 60), done]),
            ..FakeStore::default()
        };

        let run = AutoScheduler::new().run(&store, now).unwrap();
        assert_eq!(run.assignments[0].task_id, 1);
        assert_eq!(run.assignments[0].date, monday());
    }
}
