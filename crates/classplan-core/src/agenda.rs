//! Daily agenda: classes and scheduled tasks for one date.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::PlannerStore;
use crate::task::{Priority, Task, DEFAULT_TASK_COLOR};
use crate::timetable::{weekday_index, ClassSession};

/// Number of events listed in a summary message.
const SUMMARY_EVENT_LIMIT: usize = 5;

/// What an agenda entry refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgendaItem {
    Class {
        class_id: i64,
        class_type: String,
        location: String,
        instructor: String,
        is_cancelled: bool,
    },
    Task {
        task_id: i64,
        description: String,
        priority: Priority,
        is_completed: bool,
    },
}

/// One line of the agenda.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgendaEntry {
    pub title: String,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub color: String,
    #[serde(flatten)]
    pub item: AgendaItem,
}

impl AgendaEntry {
    pub fn from_class(class: &ClassSession) -> Self {
        Self {
            title: class.subject.clone(),
            start_time: Some(class.start_time),
            end_time: Some(class.end_time),
            color: class.color.clone(),
            item: AgendaItem::Class {
                class_id: class.id,
                class_type: class.class_type.to_string(),
                location: class.location.clone(),
                instructor: class.instructor.clone(),
                is_cancelled: class.is_cancelled,
            },
        }
    }

    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            start_time: task.scheduled_start,
            end_time: task.scheduled_end,
            color: DEFAULT_TASK_COLOR.to_string(),
            item: AgendaItem::Task {
                task_id: task.id,
                description: task.description.clone().unwrap_or_default(),
                priority: task.priority,
                is_completed: task.is_completed,
            },
        }
    }

    pub fn is_class(&self) -> bool {
        matches!(self.item, AgendaItem::Class { .. })
    }

    pub fn is_cancelled_class(&self) -> bool {
        matches!(self.item, AgendaItem::Class { is_cancelled: true, .. })
    }
}

/// Merge classes and tasks into one list ordered by start time.
///
/// Entries without a start time go last; equal starts keep classes before
/// tasks and otherwise preserve input order.
pub fn merge_agenda(classes: &[ClassSession], tasks: &[Task]) -> Vec<AgendaEntry> {
    let mut entries: Vec<AgendaEntry> = classes
        .iter()
        .map(AgendaEntry::from_class)
        .chain(tasks.iter().map(AgendaEntry::from_task))
        .collect();
    entries.sort_by_key(|entry| (entry.start_time.is_none(), entry.start_time));
    entries
}

/// Agenda for `date`: the weekday's classes (cancelled ones flagged) plus the
/// tasks scheduled on that date.
///
/// # Errors
/// Returns the first storage error.
pub fn compute_daily_agenda<S: PlannerStore + ?Sized>(
    store: &S,
    date: NaiveDate,
) -> Result<Vec<AgendaEntry>> {
    let classes = store.fetch_timetable(weekday_index(date))?;
    let tasks = store.fetch_tasks_on(date)?;
    Ok(merge_agenda(&classes, &tasks))
}

/// Counts and a short text overview of one day's agenda.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_events: usize,
    pub classes: usize,
    pub tasks: usize,
    pub cancelled_classes: usize,
    pub message: String,
    pub schedule: Vec<AgendaEntry>,
}

impl DailySummary {
    pub fn from_agenda(date: NaiveDate, schedule: Vec<AgendaEntry>) -> Self {
        let classes = schedule.iter().filter(|e| e.is_class()).count();
        let cancelled_classes = schedule.iter().filter(|e| e.is_cancelled_class()).count();
        let tasks = schedule.len() - classes;
        let message = summary_message(date, &schedule, classes, tasks, cancelled_classes);

        Self {
            date,
            total_events: schedule.len(),
            classes,
            tasks,
            cancelled_classes,
            message,
            schedule,
        }
    }

    pub fn title(&self) -> String {
        format!("Daily Summary - {}", self.date.format("%A, %B %d"))
    }
}

fn summary_message(
    date: NaiveDate,
    schedule: &[AgendaEntry],
    classes: usize,
    tasks: usize,
    cancelled: usize,
) -> String {
    if schedule.is_empty() {
        return "No classes or tasks scheduled for today!".to_string();
    }

    let mut lines = vec![
        format!("Schedule for {}", date.format("%A, %B %d, %Y")),
        String::new(),
        format!("{classes} class(es)"),
        format!("{tasks} task(s)"),
    ];
    if cancelled > 0 {
        lines.push(format!("{cancelled} cancelled class(es)"));
    }
    lines.push(String::new());
    lines.push("Events:".to_string());

    for entry in schedule.iter().take(SUMMARY_EVENT_LIMIT) {
        let kind = if entry.is_class() { "Class" } else { "Task" };
        let time = entry
            .start_time
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_else(|| "--:--".to_string());
        let status = if entry.is_cancelled_class() { " (Cancelled)" } else { "" };
        lines.push(format!("[{kind}] {time} - {}{status}", entry.title));
    }
    if schedule.len() > SUMMARY_EVENT_LIMIT {
        lines.push(format!(
            "... and {} more events",
            schedule.len() - SUMMARY_EVENT_LIMIT
        ));
    }

    lines.join("\n")
}
