//! Subcommands and the argument parsers they share.

pub mod class;
pub mod config;
pub mod notify;
pub mod schedule;
pub mod task;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use classplan_core::timetable::DAYS_OF_WEEK;
use classplan_core::{ClassType, Config, Planner, Priority, ScheduleDb};
use serde::Serialize;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Open the database for the configured owner and wrap it in a planner.
pub fn open_planner() -> Result<Planner<ScheduleDb>, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = ScheduleDb::open()?.with_owner(config.owner_id);
    Ok(Planner::new(db, config))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `now` from `--now`, or the local wall clock.
pub fn resolve_now(now: Option<NaiveDateTime>) -> NaiveDateTime {
    now.unwrap_or_else(|| Local::now().naive_local())
}

/// `HH:MM` or `HH:MM:SS`.
pub fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| format!("invalid time '{s}', expected HH:MM"))
}

/// `YYYY-MM-DD`.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{s}', expected YYYY-MM-DD"))
}

/// `YYYY-MM-DD HH:MM`, `YYYY-MM-DDTHH:MM[:SS]`, or a bare date meaning 23:59.
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime, String> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%dT%H:%M:%S",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(23, 59, 0))
        })
        .ok_or_else(|| format!("invalid datetime '{s}', expected YYYY-MM-DD HH:MM"))
}

/// A weekday index (0 = Monday) or a day name such as `tue`.
pub fn parse_day(s: &str) -> Result<u8, String> {
    if let Ok(index) = s.parse::<u8>() {
        return if index < 7 {
            Ok(index)
        } else {
            Err(format!("invalid day '{s}', expected 0-6"))
        };
    }
    let lower = s.to_ascii_lowercase();
    DAYS_OF_WEEK
        .iter()
        .position(|name| {
            let name = name.to_ascii_lowercase();
            lower.len() >= 3 && name.starts_with(&lower)
        })
        .map(|index| index as u8)
        .ok_or_else(|| format!("invalid day '{s}'"))
}

pub fn parse_priority(s: &str) -> Result<Priority, String> {
    Priority::ALL
        .into_iter()
        .find(|p| p.as_str().eq_ignore_ascii_case(s))
        .ok_or_else(|| format!("invalid priority '{s}', expected low|medium|high|urgent"))
}

pub fn parse_class_type(s: &str) -> Result<ClassType, String> {
    match s.to_ascii_lowercase().as_str() {
        "lecture" | "lab" | "tutorial" | "seminar" | "workshop" => Ok(ClassType::parse(s)),
        _ => Err(format!(
            "invalid class type '{s}', expected lecture|lab|tutorial|seminar|workshop"
        )),
    }
}
