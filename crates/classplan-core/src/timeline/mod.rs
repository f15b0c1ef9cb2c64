//! Day timeline analysis for task placement.
//!
//! This module provides:
//! - Interval geometry and free-slot detection around busy intervals
//! - Priority scoring of tasks
//! - Ranking of candidate slots for a task

mod gap;
mod priority;
mod ranker;

pub use gap::{
    detect_free_slots, gap_minutes, overlaps, BusyInterval, DayWindow, FreeSlot, FreeSlotFinder,
};
pub use priority::{calculate_priority_score, PriorityScorer, PriorityWeights};
pub use ranker::{RankedSlot, SlotRanker, SlotWeights, TimeOfDayBand};
