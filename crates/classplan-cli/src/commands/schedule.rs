//! Scheduling commands for CLI.

use chrono::{NaiveDate, NaiveDateTime};
use clap::Subcommand;
use serde_json::json;

use super::{open_planner, parse_date, parse_datetime, print_json, resolve_now, CmdResult};

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Place every pending task into free time
    Auto {
        /// Reference time (YYYY-MM-DD HH:MM), defaults to now
        #[arg(long, value_parser = parse_datetime)]
        now: Option<NaiveDateTime>,
    },
    /// Report overlapping classes
    Conflicts,
    /// Show classes and tasks for one day
    Agenda {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Auto-schedule, then check conflicts, then summarize
    Optimize {
        #[arg(long, value_parser = parse_datetime)]
        now: Option<NaiveDateTime>,
    },
    /// Suggest uses for the time of a cancelled class
    Suggest {
        /// Class ID
        class_id: i64,
        #[arg(long, value_parser = parse_datetime)]
        now: Option<NaiveDateTime>,
    },
}

pub fn run(action: ScheduleAction) -> CmdResult {
    let planner = open_planner()?;

    match action {
        ScheduleAction::Auto { now } => {
            let run = planner.auto_schedule(resolve_now(now))?;
            print_json(&json!({
                "scheduled": run.assignments,
                "unscheduled_task_ids": run.unscheduled_task_ids,
            }))?;
        }
        ScheduleAction::Conflicts => {
            print_json(&planner.find_conflicts()?)?;
        }
        ScheduleAction::Agenda { date } => {
            let date = date.unwrap_or_else(|| resolve_now(None).date());
            print_json(&planner.compute_daily_agenda(date)?)?;
        }
        ScheduleAction::Optimize { now } => {
            print_json(&planner.optimize_week(resolve_now(now))?)?;
        }
        ScheduleAction::Suggest { class_id, now } => {
            let class = planner
                .store()
                .get_class(class_id)?
                .ok_or_else(|| format!("class not found: {class_id}"))?;
            print_json(&planner.suggest_alternatives(&class, resolve_now(now))?)?;
        }
    }
    Ok(())
}
