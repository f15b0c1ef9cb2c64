//! Task priority scoring.
//!
//! A task's score is a base weight for its priority label plus an urgency
//! bonus from due-date proximity:
//! - Overdue: +50
//! - Due today (0 whole days left): +40
//! - Due tomorrow: +30
//! - Due within 3 days: +20
//! - Due within 7 days: +10
//! - Later or no due date: +0
//!
//! Day counts are truncated, never rounded. The current time is always
//! passed in, so scores are deterministic.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::task::{Priority, Task};

/// Priority scoring weights
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityWeights {
    #[serde(default = "default_urgent")]
    pub urgent: i64,
    #[serde(default = "default_high")]
    pub high: i64,
    #[serde(default = "default_medium")]
    pub medium: i64,
    /// Also used for unrecognized priority labels.
    #[serde(default = "default_low")]
    pub low: i64,
    #[serde(default = "default_overdue_bonus")]
    pub overdue_bonus: i64,
    #[serde(default = "default_due_today_bonus")]
    pub due_today_bonus: i64,
    #[serde(default = "default_due_tomorrow_bonus")]
    pub due_tomorrow_bonus: i64,
    #[serde(default = "default_due_within_3_days_bonus")]
    pub due_within_3_days_bonus: i64,
    #[serde(default = "default_due_within_week_bonus")]
    pub due_within_week_bonus: i64,
}

fn default_urgent() -> i64 {
    100
}
fn default_high() -> i64 {
    75
}
fn default_medium() -> i64 {
    50
}
fn default_low() -> i64 {
    25
}
fn default_overdue_bonus() -> i64 {
    50
}
fn default_due_today_bonus() -> i64 {
    40
}
fn default_due_tomorrow_bonus() -> i64 {
    30
}
fn default_due_within_3_days_bonus() -> i64 {
    20
}
fn default_due_within_week_bonus() -> i64 {
    10
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            urgent: default_urgent(),
            high: default_high(),
            medium: default_medium(),
            low: default_low(),
            overdue_bonus: default_overdue_bonus(),
            due_today_bonus: default_due_today_bonus(),
            due_tomorrow_bonus: default_due_tomorrow_bonus(),
            due_within_3_days_bonus: default_due_within_3_days_bonus(),
            due_within_week_bonus: default_due_within_week_bonus(),
        }
    }
}

impl PriorityWeights {
    /// Base weight for a priority label.
    pub fn base(&self, priority: Priority) -> i64 {
        match priority {
            Priority::Urgent => self.urgent,
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }
}

/// Priority scorer for tasks
#[derive(Debug, Clone, Default)]
pub struct PriorityScorer {
    weights: PriorityWeights,
}

impl PriorityScorer {
    pub fn new(weights: PriorityWeights) -> Self {
        Self { weights }
    }

    /// Score a task at `now`. Higher scores are scheduled first.
    pub fn score(&self, task: &Task, now: NaiveDateTime) -> i64 {
        self.weights.base(task.priority) + self.urgency_bonus(task.due_date, now)
    }

    /// Bonus for due-date proximity.
    pub fn urgency_bonus(&self, due: Option<NaiveDateTime>, now: NaiveDateTime) -> i64 {
        let Some(due) = due else {
            return 0;
        };

        if due < now {
            return self.weights.overdue_bonus;
        }

        match (due - now).num_days() {
            0 => self.weights.due_today_bonus,
            1 => self.weights.due_tomorrow_bonus,
            2..=3 => self.weights.due_within_3_days_bonus,
            4..=7 => self.weights.due_within_week_bonus,
            _ => 0,
        }
    }

    /// Sort tasks by descending score, keeping input order on ties.
    pub fn rank(&self, tasks: &mut [Task], now: NaiveDateTime) {
        tasks.sort_by_cached_key(|task| std::cmp::Reverse(self.score(task, now)));
    }
}

/// Convenience function to score with default weights
pub fn calculate_priority_score(task: &Task, now: NaiveDateTime) -> i64 {
    PriorityScorer::default().score(task, now)
}
