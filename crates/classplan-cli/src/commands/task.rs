//! Task management commands for CLI.

use chrono::NaiveDateTime;
use clap::Subcommand;
use classplan_core::{NewTask, Priority};

use super::{open_planner, parse_datetime, parse_priority, print_json, CmdResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Add {
        /// Task title
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Due date (YYYY-MM-DD HH:MM, or YYYY-MM-DD for end of day)
        #[arg(long, value_parser = parse_datetime)]
        due: Option<NaiveDateTime>,
        /// low, medium, high or urgent
        #[arg(long, value_parser = parse_priority, default_value = "medium")]
        priority: Priority,
        /// Estimated duration in minutes
        #[arg(long, default_value_t = 60)]
        minutes: u32,
        /// Mark as recurring
        #[arg(long)]
        recurring: bool,
    },
    /// List tasks
    List {
        /// Include completed tasks
        #[arg(long)]
        all: bool,
    },
    /// Get task details
    Get {
        /// Task ID
        id: i64,
    },
    /// Update a task
    Update {
        /// Task ID
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = parse_datetime, conflicts_with = "clear_due")]
        due: Option<NaiveDateTime>,
        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,
        #[arg(long)]
        minutes: Option<u32>,
        #[arg(long)]
        recurring: Option<bool>,
    },
    /// Mark a task completed
    Complete {
        /// Task ID
        id: i64,
    },
    /// Clear a task's time slot so auto-scheduling picks it up again
    Unschedule {
        /// Task ID
        id: i64,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: i64,
    },
}

pub fn run(action: TaskAction) -> CmdResult {
    let planner = open_planner()?;
    let db = planner.store();

    match action {
        TaskAction::Add {
            title,
            description,
            due,
            priority,
            minutes,
            recurring,
        } => {
            let task = NewTask {
                title,
                description,
                due_date: due,
                priority,
                estimated_minutes: Some(minutes),
                is_recurring: recurring,
            };
            print_json(&db.add_task(&task)?)?;
        }
        TaskAction::List { all } => {
            print_json(&db.list_tasks(all)?)?;
        }
        TaskAction::Get { id } => {
            let task = db.get_task(id)?.ok_or_else(|| format!("task not found: {id}"))?;
            print_json(&task)?;
        }
        TaskAction::Update {
            id,
            title,
            description,
            due,
            clear_due,
            priority,
            minutes,
            recurring,
        } => {
            let current = db.get_task(id)?.ok_or_else(|| format!("task not found: {id}"))?;
            let due_date = if clear_due { None } else { due.or(current.due_date) };
            let updated = NewTask {
                title: title.unwrap_or(current.title),
                description: description.or(current.description),
                due_date,
                priority: priority.unwrap_or(current.priority),
                estimated_minutes: minutes.or(current.estimated_minutes),
                is_recurring: recurring.unwrap_or(current.is_recurring),
            };
            print_json(&db.update_task(id, &updated)?)?;
        }
        TaskAction::Complete { id } => {
            print_json(&db.complete_task(id)?)?;
        }
        TaskAction::Unschedule { id } => {
            print_json(&db.unschedule_task(id)?)?;
        }
        TaskAction::Delete { id } => {
            db.delete_task(id)?;
            println!("Task deleted: {id}");
        }
    }
    Ok(())
}
