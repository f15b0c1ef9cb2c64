//! Integration tests for the planner over the SQLite store.
//!
//! Covers the full workflow from timetable entry through auto-scheduling,
//! conflict detection, the daily agenda and reminders.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use classplan_core::{
    AgendaItem, ClassType, Config, CoreError, NewClass, NewTask, NotificationKind, Planner,
    PlannerStore, Priority, ScheduleDb,
};

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// 2024-03-04 is a Monday.
fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
}

fn at(date: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
    date.and_time(t(h, m))
}

fn planner() -> Planner<ScheduleDb> {
    Planner::new(ScheduleDb::open_memory().unwrap(), Config::default())
}

#[test]
fn test_auto_schedule_around_classes() {
    let planner = planner();
    let db = planner.store();
    db.add_class(&NewClass::new(0, t(9, 0), t(10, 30), "Calculus")).unwrap();
    db.add_class(&NewClass::new(0, t(13, 0), t(14, 0), "Physics").with_type(ClassType::Lab))
        .unwrap();
    let task = db
        .add_task(&NewTask::new("Problem set").with_priority(Priority::High).with_minutes(60))
        .unwrap();

    let assignments = planner.run_auto_schedule(at(monday(), 7, 0)).unwrap();

    assert_eq!(assignments.len(), 1);
    let a = &assignments[0];
    assert_eq!(a.task_id, task.id);
    assert_eq!(a.date, monday());
    // 10:30 slot scores 8 (morning) + 7 (fit) against 14:00's 10 + 0.
    assert_eq!((a.start_time, a.end_time), (t(10, 30), t(11, 30)));

    let stored = db.get_task(task.id).unwrap().unwrap();
    assert_eq!(stored.scheduled_date, Some(monday()));
    assert_eq!(stored.scheduled_start, Some(t(10, 30)));
    assert!(db.fetch_unscheduled_tasks().unwrap().is_empty());
}

#[test]
fn test_second_run_leaves_placed_tasks_alone() {
    let planner = planner();
    let db = planner.store();
    db.add_task(&NewTask::new("Reading").with_minutes(45)).unwrap();

    let now = at(monday(), 7, 0);
    assert_eq!(planner.run_auto_schedule(now).unwrap().len(), 1);
    assert!(planner.run_auto_schedule(now).unwrap().is_empty());

    db.add_task(&NewTask::new("Lab report").with_minutes(60)).unwrap();
    let second = planner.run_auto_schedule(now).unwrap();
    assert_eq!(second.len(), 1);
    // The first task holds 08:00-08:45, so the new one starts after it.
    assert_eq!(second[0].start_time, t(8, 45));
}

#[test]
fn test_unplaceable_task_becomes_notification() {
    let planner = planner();
    let db = planner.store();
    db.add_class(&NewClass::new(0, t(8, 0), t(21, 0), "Field trip")).unwrap();
    let task = db
        .add_task(
            &NewTask::new("Due tonight")
                .with_priority(Priority::Urgent)
                .with_due(at(monday(), 23, 0)),
        )
        .unwrap();

    let run = planner.auto_schedule(at(monday(), 7, 0)).unwrap();
    assert!(run.assignments.is_empty());
    assert_eq!(run.unscheduled_task_ids, vec![task.id]);

    let unread = db.unread_notifications().unwrap();
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0].kind, NotificationKind::ScheduleConflict);
    assert_eq!(unread[0].task_id, Some(task.id));
    assert_eq!(
        unread[0].message,
        "Could not find a suitable time slot for task: Due tonight"
    );
}

#[test]
fn test_conflict_detection_workflow() {
    let planner = planner();
    let db = planner.store();
    let a = db.add_class(&NewClass::new(0, t(9, 0), t(10, 0), "A")).unwrap();
    let b = db.add_class(&NewClass::new(0, t(9, 30), t(10, 30), "B")).unwrap();

    let conflicts = planner.find_conflicts().unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].day, "Monday");
    assert_eq!((conflicts[0].class_a.id, conflicts[0].class_b.id), (a.id, b.id));

    // Cancelling one side resolves the overlap.
    db.cancel_class(b.id).unwrap();
    assert!(planner.find_conflicts().unwrap().is_empty());
}

#[test]
fn test_daily_agenda_and_summary() {
    let planner = planner();
    let db = planner.store();
    db.add_class(&NewClass::new(0, t(13, 0), t(14, 0), "Chemistry")).unwrap();
    let cancelled = db.add_class(&NewClass::new(0, t(9, 0), t(10, 0), "Biology")).unwrap();
    db.cancel_class(cancelled.id).unwrap();
    db.add_class(&NewClass::new(1, t(9, 0), t(10, 0), "Tuesday only")).unwrap();
    let task = db.add_task(&NewTask::new("Flashcards").with_minutes(30)).unwrap();
    db.commit_assignment(task.id, monday(), t(11, 0), t(11, 30)).unwrap();

    let agenda = planner.compute_daily_agenda(monday()).unwrap();
    let titles: Vec<_> = agenda.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Biology", "Flashcards", "Chemistry"]);
    assert!(matches!(agenda[0].item, AgendaItem::Class { is_cancelled: true, .. }));
    assert!(matches!(agenda[1].item, AgendaItem::Task { .. }));

    let (summary, id) = planner.send_daily_summary(monday()).unwrap();
    assert_eq!(summary.classes, 2);
    assert_eq!(summary.tasks, 1);
    assert_eq!(summary.cancelled_classes, 1);
    let stored = db.list_notifications(10).unwrap();
    let daily = stored.iter().find(|n| n.id == id).unwrap();
    assert_eq!(daily.kind, NotificationKind::DailySummary);
}

#[test]
fn test_reminders_and_deadlines() {
    let planner = planner();
    let db = planner.store();
    db.add_class(&NewClass::new(0, t(10, 0), t(11, 0), "Statistics").with_location("Hall 2"))
        .unwrap();
    let now = at(monday(), 9, 50);
    db.add_task(&NewTask::new("Late essay").with_due(now - Duration::hours(2))).unwrap();
    db.add_task(&NewTask::new("Quiz prep").with_due(now + Duration::hours(5))).unwrap();
    db.add_task(&NewTask::new("Project").with_due(now + Duration::days(4))).unwrap();

    let reminders = planner.generate_reminders(now).unwrap();
    let kinds: Vec<_> = reminders.iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NotificationKind::ClassReminder,
            NotificationKind::TaskOverdue,
            NotificationKind::TaskDueSoon,
        ]
    );
    assert_eq!(reminders[0].message, "Lecture at Hall 2 starts in 10 minutes");
    assert_eq!(db.unread_notifications().unwrap().len(), 3);

    let deadlines = planner.upcoming_deadlines(now).unwrap();
    let titles: Vec<_> = deadlines.iter().map(|d| d.task.title.as_str()).collect();
    assert_eq!(titles, vec!["Quiz prep", "Project"]);
    assert_eq!(deadlines[1].days_until, 4);
}

#[test]
fn test_oversized_day_counts_are_refused_or_bounded() {
    let mut config = Config::default();
    assert!(config.set("scheduler.horizon_days", "100000000").is_err());
    assert!(config.set("notifications.deadline_days", "1000000000").is_err());
    assert_eq!(config, Config::default());

    let planner = Planner::new(ScheduleDb::open_memory().unwrap(), config);
    let now = at(monday(), 9, 0);
    planner
        .store()
        .add_task(&NewTask::new("Capstone").with_due(now + Duration::days(900)))
        .unwrap();

    assert_eq!(planner.run_auto_schedule(now).unwrap().len(), 1);
    let deadlines = planner.upcoming_deadlines_within(now, 1_000_000_000).unwrap();
    assert_eq!(deadlines.len(), 1);
    assert_eq!(deadlines[0].days_until, 900);
}

#[test]
fn test_cancelled_class_suggestions() {
    let planner = planner();
    let db = planner.store();
    let class = db.add_class(&NewClass::new(2, t(10, 0), t(12, 0), "Seminar")).unwrap();
    db.add_class(&NewClass::new(2, t(13, 0), t(15, 0), "Workshop")).unwrap();
    db.add_task(&NewTask::new("Thesis").with_priority(Priority::Urgent)).unwrap();
    db.add_task(&NewTask::new("Chores").with_priority(Priority::Low)).unwrap();
    let cancelled = db.cancel_class(class.id).unwrap();

    let suggestions = planner.suggest_alternatives(&cancelled, at(monday(), 8, 0)).unwrap();
    let starts: Vec<_> = suggestions.iter().map(|s| s.slot.start_time).collect();
    assert_eq!(starts, vec![t(8, 0), t(15, 0)]);
    assert!(suggestions.iter().all(|s| s.day == "Wednesday"));
    assert_eq!(suggestions[0].suggested_tasks.len(), 1);
    assert_eq!(suggestions[0].suggested_tasks[0].title, "Thesis");
}

#[test]
fn test_optimize_week() {
    let planner = planner();
    let db = planner.store();
    db.add_class(&NewClass::new(4, t(9, 0), t(11, 0), "Art")).unwrap();
    db.add_class(&NewClass::new(4, t(10, 0), t(12, 0), "Music")).unwrap();
    db.add_task(&NewTask::new("Sketch").with_minutes(120)).unwrap();
    db.add_task(&NewTask::new("Practice").with_minutes(30)).unwrap();

    let result = planner.optimize_week(at(monday(), 7, 0)).unwrap();
    assert_eq!(result.scheduled_tasks.len(), 2);
    assert_eq!(result.conflicts.len(), 1);
    assert_eq!(result.summary.total_tasks, 2);
    assert_eq!(result.summary.scheduled, 2);
    assert_eq!(result.summary.unscheduled, 0);
    assert_eq!(result.summary.conflicts_found, 1);
}

#[test]
fn test_missing_entities_surface_as_not_found() {
    let planner = planner();
    let result = planner.store().reschedule_class(42, 0, t(9, 0), t(10, 0));
    assert!(matches!(result, Err(CoreError::NotFound { entity: "class", id: 42 })));
}
