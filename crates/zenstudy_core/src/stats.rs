//! crates/zenstudy_core/src/stats.rs
//!
//! The stats updater: folds one day's earned points into a student's
//! total/streak/medal rollup. The streak math is a pure function; the async
//! wrapper does one read and one upsert against the storage port.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::StudentStats;
use crate::ports::{AttendanceStore, PortResult};
use crate::scoring::{medal_for_streak, previous_day};

/// Computes the next stats row from the current one (if any), the points
/// earned today, and today's date.
///
/// Same-day re-entry returns the current row untouched: the check-in
/// operation already prevents duplicate records, but if the updater is ever
/// invoked twice for one day it must not double-count points or streak.
pub fn next_stats(
    current: Option<&StudentStats>,
    student_id: Uuid,
    points_earned: i32,
    today: NaiveDate,
) -> StudentStats {
    let Some(current) = current else {
        // First-ever check-in.
        return StudentStats {
            student_id,
            total_points: points_earned,
            current_streak: 1,
            best_streak: 1,
            last_checkin_date: Some(today),
            medal_level: medal_for_streak(1),
        };
    };

    if current.last_checkin_date == Some(today) {
        return current.clone();
    }

    let current_streak = if current.last_checkin_date == Some(previous_day(today)) {
        current.current_streak + 1
    } else {
        // Streak broken (or never started).
        1
    };

    StudentStats {
        student_id,
        total_points: current.total_points + points_earned,
        current_streak,
        best_streak: current_streak.max(current.best_streak),
        last_checkin_date: Some(today),
        medal_level: medal_for_streak(current_streak),
    }
}

/// Reads the student's stats, computes the next row, and upserts it.
///
/// Atomicity is delegated to the store's upsert; a failed read or write
/// aborts the whole update with no partial state.
pub async fn update_stats(
    store: &dyn AttendanceStore,
    student_id: Uuid,
    points_earned: i32,
    today: NaiveDate,
) -> PortResult<StudentStats> {
    let current = store.get_stats(student_id).await?;
    let next = next_stats(current.as_ref(), student_id, points_earned, today);
    store.upsert_stats(&next).await
}
