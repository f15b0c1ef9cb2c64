//! Free-slot ranking for a single task.
//!
//! Each candidate slot scores a time-of-day desirability (afternoons first,
//! then mornings, lunch time, evenings, and anything else last) plus a
//! duration fit that loses one point per 30 minutes of mismatch between the
//! slot and the task.

use chrono::Timelike;
use serde::{Deserialize, Serialize};

use super::gap::FreeSlot;

/// Score for slots whose start hour falls in `[start_hour, end_hour)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeOfDayBand {
    pub start_hour: u32,
    pub end_hour: u32,
    pub score: f64,
}

impl TimeOfDayBand {
    pub fn new(start_hour: u32, end_hour: u32, score: f64) -> Self {
        Self {
            start_hour,
            end_hour,
            score,
        }
    }

    fn contains(&self, hour: u32) -> bool {
        hour >= self.start_hour && hour < self.end_hour
    }
}

/// Slot ranking weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotWeights {
    /// Checked in order; the first band containing the start hour wins.
    #[serde(default = "default_bands")]
    pub bands: Vec<TimeOfDayBand>,
    /// Score for start hours outside every band.
    #[serde(default = "default_fallback_score")]
    pub fallback_score: f64,
    /// Score of a slot whose length matches the task exactly.
    #[serde(default = "default_fit_ceiling")]
    pub fit_ceiling: f64,
    /// Minutes of mismatch that cost one fit point.
    #[serde(default = "default_fit_step_minutes")]
    pub fit_step_minutes: f64,
}

fn default_bands() -> Vec<TimeOfDayBand> {
    vec![
        TimeOfDayBand::new(14, 18, 10.0),
        TimeOfDayBand::new(9, 12, 8.0),
        TimeOfDayBand::new(12, 14, 6.0),
        TimeOfDayBand::new(18, 21, 5.0),
    ]
}
fn default_fallback_score() -> f64 {
    2.0
}
fn default_fit_ceiling() -> f64 {
    10.0
}
fn default_fit_step_minutes() -> f64 {
    30.0
}

impl Default for SlotWeights {
    fn default() -> Self {
        Self {
            bands: default_bands(),
            fallback_score: default_fallback_score(),
            fit_ceiling: default_fit_ceiling(),
            fit_step_minutes: default_fit_step_minutes(),
        }
    }
}

/// A slot together with its score for one task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedSlot {
    pub slot: FreeSlot,
    pub time_score: f64,
    pub fit_score: f64,
    pub score: f64,
}

/// Ranks candidate slots for a task
#[derive(Debug, Clone, Default)]
pub struct SlotRanker {
    weights: SlotWeights,
}

impl SlotRanker {
    pub fn new(weights: SlotWeights) -> Self {
        Self { weights }
    }

    /// Time-of-day desirability for a slot starting at `hour`.
    pub fn time_score(&self, hour: u32) -> f64 {
        self.weights
            .bands
            .iter()
            .find(|band| band.contains(hour))
            .map(|band| band.score)
            .unwrap_or(self.weights.fallback_score)
    }

    /// Duration fit: full marks for an exact match, never below zero.
    pub fn fit_score(&self, slot_minutes: i64, task_minutes: i64) -> f64 {
        let ceiling = self.weights.fit_ceiling;
        let step = self.weights.fit_step_minutes.max(f64::EPSILON);
        let mismatch = (slot_minutes - task_minutes).abs() as f64 / step;
        ceiling - mismatch.min(ceiling)
    }

    /// Score every slot, preserving input order.
    pub fn rank(&self, slots: &[FreeSlot], task_minutes: i64) -> Vec<RankedSlot> {
        slots
            .iter()
            .map(|slot| {
                let time_score = self.time_score(slot.start_time.hour());
                let fit_score = self.fit_score(slot.duration_minutes, task_minutes);
                RankedSlot {
                    slot: *slot,
                    time_score,
                    fit_score,
                    score: time_score + fit_score,
                }
            })
            .collect()
    }

    /// Highest-scoring slot; the first one wins a tie. `None` when empty.
    pub fn best_slot(&self, slots: &[FreeSlot], task_minutes: i64) -> Option<RankedSlot> {
        let mut best: Option<RankedSlot> = None;
        for ranked in self.rank(slots, task_minutes) {
            match best {
                Some(current) if ranked.score <= current.score => {}
                _ => best = Some(ranked),
            }
        }
        best
    }
}
