//! Timetable commands for CLI.

use chrono::{NaiveDateTime, NaiveTime};
use clap::Subcommand;
use classplan_core::{ClassSession, ClassType, NewClass};
use serde_json::json;

use super::{
    open_planner, parse_class_type, parse_datetime, parse_day, parse_time, print_json,
    resolve_now, CmdResult,
};

#[derive(Subcommand)]
pub enum ClassAction {
    /// Add a weekly class
    Add {
        /// Subject name
        subject: String,
        /// Weekday: 0-6 (Monday = 0) or a name
        #[arg(long, value_parser = parse_day)]
        day: u8,
        /// Start time (HH:MM)
        #[arg(long, value_parser = parse_time)]
        start: NaiveTime,
        /// End time (HH:MM)
        #[arg(long, value_parser = parse_time)]
        end: NaiveTime,
        /// lecture, lab, tutorial, seminar or workshop
        #[arg(long = "type", value_parser = parse_class_type, default_value = "lecture")]
        class_type: ClassType,
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long, default_value = "")]
        instructor: String,
        /// Display color (hex)
        #[arg(long)]
        color: Option<String>,
        /// Add even if the slot overlaps another class
        #[arg(long)]
        force: bool,
    },
    /// List classes
    List {
        /// Include cancelled classes
        #[arg(long)]
        all: bool,
    },
    /// Update a class
    Update {
        /// Class ID
        id: i64,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long, value_parser = parse_day)]
        day: Option<u8>,
        #[arg(long, value_parser = parse_time)]
        start: Option<NaiveTime>,
        #[arg(long, value_parser = parse_time)]
        end: Option<NaiveTime>,
        #[arg(long = "type", value_parser = parse_class_type)]
        class_type: Option<ClassType>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        instructor: Option<String>,
        #[arg(long)]
        color: Option<String>,
        /// Keep the change even if the slot overlaps another class
        #[arg(long)]
        force: bool,
    },
    /// Remove a class from the timetable (soft delete)
    Delete {
        /// Class ID
        id: i64,
    },
    /// Bring back a deleted class
    Restore {
        /// Class ID
        id: i64,
    },
    /// Cancel a class and suggest what to do with the freed time
    Cancel {
        /// Class ID
        id: i64,
        /// Reference time for task suggestions (YYYY-MM-DD HH:MM)
        #[arg(long, value_parser = parse_datetime)]
        now: Option<NaiveDateTime>,
    },
    /// Undo a cancellation
    Uncancel {
        /// Class ID
        id: i64,
    },
    /// Move a class to a new weekly slot
    Reschedule {
        /// Class ID
        id: i64,
        #[arg(long, value_parser = parse_day)]
        day: u8,
        #[arg(long, value_parser = parse_time)]
        start: NaiveTime,
        #[arg(long, value_parser = parse_time)]
        end: NaiveTime,
        /// Move even if the new slot overlaps another class
        #[arg(long)]
        force: bool,
    },
}

fn conflict_error(conflicts: &[ClassSession]) -> Box<dyn std::error::Error> {
    let names: Vec<String> = conflicts
        .iter()
        .map(|c| {
            format!(
                "{} ({} {}-{})",
                c.subject,
                c.day_name(),
                c.start_time.format("%H:%M"),
                c.end_time.format("%H:%M")
            )
        })
        .collect();
    format!(
        "time conflict with {}; use --force to keep both",
        names.join(", ")
    )
    .into()
}

pub fn run(action: ClassAction) -> CmdResult {
    let planner = open_planner()?;
    let db = planner.store();

    match action {
        ClassAction::Add {
            subject,
            day,
            start,
            end,
            class_type,
            location,
            instructor,
            color,
            force,
        } => {
            let mut class = NewClass::new(day, start, end, &subject)
                .with_type(class_type)
                .with_location(&location)
                .with_instructor(&instructor);
            if let Some(color) = color {
                class.color = color;
            }
            class.validate()?;

            let conflicts = db.check_time_conflict(day, start, end, None)?;
            if !conflicts.is_empty() && !force {
                return Err(conflict_error(&conflicts));
            }
            print_json(&db.add_class(&class)?)?;
        }
        ClassAction::List { all } => {
            print_json(&db.list_classes(all)?)?;
        }
        ClassAction::Update {
            id,
            subject,
            day,
            start,
            end,
            class_type,
            location,
            instructor,
            color,
            force,
        } => {
            let current = db
                .get_class(id)?
                .ok_or_else(|| format!("class not found: {id}"))?;
            let updated = NewClass {
                day_of_week: day.unwrap_or(current.day_of_week),
                start_time: start.unwrap_or(current.start_time),
                end_time: end.unwrap_or(current.end_time),
                subject: subject.unwrap_or(current.subject),
                class_type: class_type.unwrap_or(current.class_type),
                location: location.unwrap_or(current.location),
                instructor: instructor.unwrap_or(current.instructor),
                color: color.unwrap_or(current.color),
            };
            updated.validate()?;

            let conflicts = db.check_time_conflict(
                updated.day_of_week,
                updated.start_time,
                updated.end_time,
                Some(id),
            )?;
            if !conflicts.is_empty() && !force {
                return Err(conflict_error(&conflicts));
            }
            print_json(&db.update_class(id, &updated)?)?;
        }
        ClassAction::Delete { id } => {
            print_json(&db.delete_class(id)?)?;
        }
        ClassAction::Restore { id } => {
            print_json(&db.restore_class(id)?)?;
        }
        ClassAction::Cancel { id, now } => {
            let class = db.cancel_class(id)?;
            let suggestions = planner.suggest_alternatives(&class, resolve_now(now))?;
            print_json(&json!({
                "class": class,
                "suggestions": suggestions,
            }))?;
        }
        ClassAction::Uncancel { id } => {
            print_json(&db.uncancel_class(id)?)?;
        }
        ClassAction::Reschedule {
            id,
            day,
            start,
            end,
            force,
        } => {
            let conflicts = db.check_time_conflict(day, start, end, Some(id))?;
            if !conflicts.is_empty() && !force {
                return Err(conflict_error(&conflicts));
            }
            print_json(&db.reschedule_class(id, day, start, end)?)?;
        }
    }
    Ok(())
}
