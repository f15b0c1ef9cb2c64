//! Detection of overlapping classes in the weekly timetable.
//!
//! Only neighbours in start-time order are compared. A class that starts
//! early and runs past two later classes is reported against the first of
//! them only; the later pair is checked on its own merits.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::notification::NewNotification;
use crate::storage::PlannerStore;
use crate::timetable::{day_name, ClassSession};

/// Two classes on the same weekday whose intervals overlap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassConflict {
    pub day_of_week: u8,
    pub day: String,
    pub class_a: ClassSession,
    pub class_b: ClassSession,
}

impl ClassConflict {
    /// Minutes the two classes share.
    pub fn overlap_minutes(&self) -> i64 {
        let start = self.class_a.start_time.max(self.class_b.start_time);
        let end = self.class_a.end_time.min(self.class_b.end_time);
        (end - start).num_minutes().max(0)
    }
}

/// Scans the timetable for overlapping classes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictDetector;

impl ConflictDetector {
    pub fn new() -> Self {
        Self
    }

    /// Conflicts among one day's classes.
    ///
    /// Inactive and cancelled classes are ignored. The rest are sorted by
    /// start time (stable) and each adjacent pair with `a.end > b.start` is
    /// reported once.
    pub fn detect_day(&self, day_of_week: u8, classes: &[ClassSession]) -> Vec<ClassConflict> {
        let mut sorted: Vec<&ClassSession> =
            classes.iter().filter(|c| c.is_scheduled()).collect();
        sorted.sort_by_key(|c| c.start_time);

        sorted
            .windows(2)
            .filter(|pair| pair[0].end_time > pair[1].start_time)
            .map(|pair| ClassConflict {
                day_of_week,
                day: day_name(day_of_week).to_string(),
                class_a: pair[0].clone(),
                class_b: pair[1].clone(),
            })
            .collect()
    }

    /// Conflicts across all seven weekdays, without side effects.
    ///
    /// # Errors
    /// Returns the first storage error.
    pub fn scan<S: PlannerStore + ?Sized>(&self, store: &S) -> Result<Vec<ClassConflict>> {
        let mut conflicts = Vec::new();
        for day in 0..7u8 {
            let classes = store.fetch_classes(day)?;
            conflicts.extend(self.detect_day(day, &classes));
        }
        Ok(conflicts)
    }

    /// Scan every weekday and emit one `schedule_conflict` per overlap.
    ///
    /// # Errors
    /// Returns the first storage error.
    pub fn find_conflicts<S: PlannerStore + ?Sized>(&self, store: &S) -> Result<Vec<ClassConflict>> {
        let conflicts = self.scan(store)?;
        for conflict in &conflicts {
            warn!(
                day = %conflict.day,
                class_a = conflict.class_a.id,
                class_b = conflict.class_b.id,
                "overlapping classes"
            );
            store.emit_notification(&NewNotification::class_overlap(
                &conflict.day,
                &conflict.class_a,
                &conflict.class_b,
            ))?;
        }
        Ok(conflicts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationKind;
    use crate::scheduler::tests::{class, t, FakeStore};

    #[test]
    fn overlapping_pair_reported_once() {
        let classes = vec![class(1, 0, t(9, 0), t(10, 0)), class(2, 0, t(9, 30), t(10, 30))];
        let conflicts = ConflictDetector::new().detect_day(0, &classes);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].day, "Monday");
        assert_eq!(conflicts[0].class_a.id, 1);
        assert_eq!(conflicts[0].class_b.id, 2);
        assert_eq!(conflicts[0].overlap_minutes(), 30);
    }

    #[test]
    fn touching_classes_do_not_conflict() {
        let classes = vec![class(1, 0, t(9, 0), t(10, 0)), class(2, 0, t(10, 0), t(11, 0))];
        assert!(ConflictDetector::new().detect_day(0, &classes).is_empty());
    }

    #[test]
    fn input_order_does_not_matter() {
        let classes = vec![class(2, 0, t(9, 30), t(10, 30)), class(1, 0, t(9, 0), t(10, 0))];
        let conflicts = ConflictDetector::new().detect_day(0, &classes);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].class_a.id, 1);
    }

    #[test]
    fn only_adjacent_pairs_are_compared() {
        // A overlaps both B and C, but only A-B are neighbours after
        // sorting, so the A-C overlap goes unreported.
        let classes = vec![
            class(1, 2, t(9, 0), t(12, 0)),
            class(2, 2, t(9, 30), t(10, 0)),
            class(3, 2, t(11, 0), t(11, 30)),
        ];
        let conflicts = ConflictDetector::new().detect_day(2, &classes);
        assert_eq!(conflicts.len(), 1);
        assert_eq!((conflicts[0].class_a.id, conflicts[0].class_b.id), (1, 2));
    }

    #[test]
    fn cancelled_and_inactive_classes_are_ignored() {
        let mut cancelled = class(2, 0, t(9, 30), t(10, 30));
        cancelled.is_cancelled = true;
        let mut deleted = class(3, 0, t(9, 15), t(9, 45));
        deleted.is_active = false;
        let classes = vec![class(1, 0, t(9, 0), t(10, 0)), cancelled, deleted];
        assert!(ConflictDetector::new().detect_day(0, &classes).is_empty());
    }

    #[test]
    fn find_conflicts_emits_notifications_and_is_idempotent() {
        let store = FakeStore {
            classes: vec![
                class(1, 0, t(9, 0), t(10, 0)),
                class(2, 0, t(9, 30), t(10, 30)),
                class(3, 4, t(14, 0), t(16, 0)),
                class(4, 4, t(15, 0), t(17, 0)),
            ],
            ..FakeStore::default()
        };
        let detector = ConflictDetector::new();

        let first = detector.find_conflicts(&store).unwrap();
        let second = detector.find_conflicts(&store).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].day, "Monday");
        assert_eq!(first[1].day, "Friday");

        let notifications = store.notifications.borrow();
        assert_eq!(notifications.len(), 4);
        assert!(notifications
            .iter()
            .all(|n| n.kind == NotificationKind::ScheduleConflict));
        assert_eq!(
            notifications[0].message,
            "Conflict on Monday: Class 1 overlaps with Class 2"
        );
    }
}
