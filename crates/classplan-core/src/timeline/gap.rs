//! Interval geometry and free-slot detection within a day.
//!
//! Finds the free intervals between a day's busy intervals (classes and
//! already-placed tasks) that are long enough for a task.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::task::Task;
use crate::timetable::ClassSession;

/// Half-open interval overlap: `[a_start, a_end)` and `[b_start, b_end)`
/// overlap iff `a_start < b_end && b_start < a_end`.
pub fn overlaps<T: PartialOrd>(a_start: T, a_end: T, b_start: T, b_end: T) -> bool {
    a_start < b_end && b_start < a_end
}

/// Minutes between `prev_end` and `next_start`, clamped to zero.
pub fn gap_minutes(prev_end: NaiveTime, next_start: NaiveTime) -> i64 {
    if next_start <= prev_end {
        return 0;
    }
    (next_start - prev_end).num_minutes()
}

/// The part of each day available for placing tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl DayWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Whether `[start, end)` lies inside the window.
    pub fn contains(&self, start: NaiveTime, end: NaiveTime) -> bool {
        start >= self.start && end <= self.end && start < end
    }
}

impl Default for DayWindow {
    /// 08:00 to 21:00
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
            end: NaiveTime::from_hms_opt(21, 0, 0).unwrap_or_default(),
        }
    }
}

/// Simplified busy interval for gap detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusyInterval {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl BusyInterval {
    pub fn new(start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            start_time,
            end_time,
        }
    }

    /// Busy interval of a task that already has a start and end time.
    pub fn from_task(task: &Task) -> Option<Self> {
        match (task.scheduled_start, task.scheduled_end) {
            (Some(start), Some(end)) => Some(Self::new(start, end)),
            _ => None,
        }
    }
}

impl From<&ClassSession> for BusyInterval {
    fn from(class: &ClassSession) -> Self {
        Self::new(class.start_time, class.end_time)
    }
}

/// A free interval within the day window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeSlot {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_minutes: i64,
}

impl FreeSlot {
    pub fn new(start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            start_time,
            end_time,
            duration_minutes: gap_minutes(start_time, end_time),
        }
    }
}

/// Finder for free slots in one day
#[derive(Debug, Clone, Default)]
pub struct FreeSlotFinder {
    window: DayWindow,
}

impl FreeSlotFinder {
    pub fn new(window: DayWindow) -> Self {
        Self { window }
    }

    pub fn window(&self) -> DayWindow {
        self.window
    }

    /// Find free slots of at least `duration_minutes` between busy intervals.
    ///
    /// The cursor starts at the window start and only ever moves forward, so
    /// an interval starting before the cursor contributes no gap. Slot ends
    /// are clamped to the window end. Slots are disjoint from every busy
    /// interval as long as the busy intervals do not overlap each other.
    ///
    /// # Returns
    /// Free slots sorted by start time, possibly empty.
    pub fn find_slots(&self, busy: &[BusyInterval], duration_minutes: i64) -> Vec<FreeSlot> {
        let mut sorted: Vec<_> = busy.to_vec();
        sorted.sort_by_key(|b| b.start_time);

        let mut slots = Vec::new();
        let mut cursor = self.window.start;

        for interval in &sorted {
            let slot_end = interval.start_time.min(self.window.end);
            self.push_if_fits(&mut slots, cursor, slot_end, duration_minutes);

            if interval.end_time > cursor {
                cursor = interval.end_time;
            }
        }

        self.push_if_fits(&mut slots, cursor, self.window.end, duration_minutes);
        slots
    }

    fn push_if_fits(
        &self,
        slots: &mut Vec<FreeSlot>,
        start: NaiveTime,
        end: NaiveTime,
        duration_minutes: i64,
    ) {
        let available = gap_minutes(start, end);
        if available > 0 && available >= duration_minutes {
            slots.push(FreeSlot::new(start, end));
        }
    }
}

/// Convenience function to find free slots in the default 08:00-21:00 window
pub fn detect_free_slots(busy: &[BusyInterval], duration_minutes: i64) -> Vec<FreeSlot> {
    FreeSlotFinder::default().find_slots(busy, duration_minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn busy(sh: u32, sm: u32, eh: u32, em: u32) -> BusyInterval {
        BusyInterval::new(t(sh, sm), t(eh, em))
    }

    #[test]
    fn overlap_is_half_open() {
        assert!(overlaps(t(9, 0), t(10, 0), t(9, 30), t(10, 30)));
        assert!(!overlaps(t(9, 0), t(10, 0), t(10, 0), t(11, 0)));
        assert!(overlaps(t(9, 0), t(12, 0), t(10, 0), t(11, 0)));
    }

    #[test]
    fn gap_is_clamped_to_zero() {
        assert_eq!(gap_minutes(t(9, 0), t(10, 30)), 90);
        assert_eq!(gap_minutes(t(10, 0), t(10, 0)), 0);
        assert_eq!(gap_minutes(t(11, 0), t(10, 0)), 0);
    }

    #[test]
    fn finds_slots_around_two_classes() {
        let classes = vec![busy(9, 0, 10, 30), busy(13, 0, 14, 0)];
        let slots = detect_free_slots(&classes, 60);

        assert_eq!(
            slots,
            vec![
                FreeSlot::new(t(8, 0), t(9, 0)),
                FreeSlot::new(t(10, 30), t(13, 0)),
                FreeSlot::new(t(14, 0), t(21, 0)),
            ]
        );
        assert_eq!(
            slots.iter().map(|s| s.duration_minutes).collect::<Vec<_>>(),
            vec![60, 150, 420]
        );
    }

    #[test]
    fn empty_day_is_one_window_slot() {
        let slots = detect_free_slots(&[], 60);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].duration_minutes, 13 * 60);
    }

    #[test]
    fn short_gaps_are_skipped() {
        let classes = vec![busy(8, 30, 10, 0), busy(10, 45, 20, 30)];
        let slots = detect_free_slots(&classes, 60);
        assert!(slots.is_empty());

        let slots = detect_free_slots(&classes, 30);
        assert_eq!(
            slots,
            vec![
                FreeSlot::new(t(8, 0), t(8, 30)),
                FreeSlot::new(t(10, 0), t(10, 45)),
                FreeSlot::new(t(20, 30), t(21, 0)),
            ]
        );
    }

    #[test]
    fn cursor_never_moves_backwards() {
        // A long class swallows a shorter one nested inside it.
        let classes = vec![busy(9, 0, 15, 0), busy(10, 0, 11, 0)];
        let slots = detect_free_slots(&classes, 60);
        assert_eq!(
            slots,
            vec![
                FreeSlot::new(t(8, 0), t(9, 0)),
                FreeSlot::new(t(15, 0), t(21, 0)),
            ]
        );
    }

    #[test]
    fn classes_outside_window_are_clamped() {
        let classes = vec![busy(7, 0, 9, 0), busy(22, 0, 23, 0)];
        let slots = detect_free_slots(&classes, 60);
        assert_eq!(slots, vec![FreeSlot::new(t(9, 0), t(21, 0))]);
    }

    #[test]
    fn unsorted_input_is_sorted_first() {
        let classes = vec![busy(13, 0, 14, 0), busy(9, 0, 10, 30)];
        let slots = detect_free_slots(&classes, 60);
        assert_eq!(slots.len(), 3);
        assert_eq!(slots[1].start_time, t(10, 30));
    }

    #[test]
    fn custom_window() {
        let finder = FreeSlotFinder::new(DayWindow::new(t(10, 0), t(12, 0)));
        let slots = finder.find_slots(&[busy(10, 30, 11, 0)], 30);
        assert_eq!(
            slots,
            vec![
                FreeSlot::new(t(10, 0), t(10, 30)),
                FreeSlot::new(t(11, 0), t(12, 0)),
            ]
        );
        assert!(finder.window().contains(t(11, 0), t(12, 0)));
        assert!(!finder.window().contains(t(11, 30), t(12, 30)));
    }
}
