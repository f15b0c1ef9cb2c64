//! Notification commands for CLI.

use chrono::{NaiveDate, NaiveDateTime};
use clap::Subcommand;
use classplan_core::storage::DEFAULT_NOTIFICATION_LIMIT;
use serde_json::json;

use super::{open_planner, parse_date, parse_datetime, print_json, resolve_now, CmdResult};

#[derive(Subcommand)]
pub enum NotifyAction {
    /// List recent notifications
    List {
        #[arg(long, default_value_t = DEFAULT_NOTIFICATION_LIMIT)]
        limit: usize,
    },
    /// List unread notifications
    Unread,
    /// Mark a notification as read
    Read {
        /// Notification ID
        id: i64,
    },
    /// Generate class and task reminders
    Reminders {
        #[arg(long, value_parser = parse_datetime)]
        now: Option<NaiveDateTime>,
    },
    /// Summarize one day
    Summary {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Also store the summary as a notification
        #[arg(long)]
        send: bool,
    },
    /// List upcoming deadlines
    Deadlines {
        /// Look-ahead in days, defaults to the configured value
        #[arg(long)]
        days: Option<i64>,
        #[arg(long, value_parser = parse_datetime)]
        now: Option<NaiveDateTime>,
    },
}

pub fn run(action: NotifyAction) -> CmdResult {
    let planner = open_planner()?;
    let db = planner.store();

    match action {
        NotifyAction::List { limit } => {
            print_json(&db.list_notifications(limit)?)?;
        }
        NotifyAction::Unread => {
            print_json(&db.unread_notifications()?)?;
        }
        NotifyAction::Read { id } => {
            db.mark_notification_read(id)?;
            println!("Notification marked read: {id}");
        }
        NotifyAction::Reminders { now } => {
            print_json(&planner.generate_reminders(resolve_now(now))?)?;
        }
        NotifyAction::Summary { date, send } => {
            let date = date.unwrap_or_else(|| resolve_now(None).date());
            if send {
                let (summary, id) = planner.send_daily_summary(date)?;
                print_json(&json!({ "notification_id": id, "summary": summary }))?;
            } else {
                print_json(&planner.daily_summary(date)?)?;
            }
        }
        NotifyAction::Deadlines { days, now } => {
            let now = resolve_now(now);
            let deadlines = match days {
                Some(days) => planner.upcoming_deadlines_within(now, days)?,
                None => planner.upcoming_deadlines(now)?,
            };
            print_json(&deadlines)?;
        }
    }
    Ok(())
}
