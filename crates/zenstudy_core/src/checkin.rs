//! crates/zenstudy_core/src/checkin.rs
//!
//! The check-in operation: one attendance record per student per day,
//! with rank and points finalized in a retryable second step and the
//! stats rollup applied last.

use chrono::{DateTime, FixedOffset, NaiveTime};
use uuid::Uuid;

use crate::domain::AttendanceRecord;
use crate::ports::{AttendanceStore, PortError, PortResult};
use crate::scoring::points_for_checkin;
use crate::stats::update_stats;

/// A time-of-day range during which check-in is disallowed. Start is
/// inclusive, end exclusive; a window with `start > end` wraps past
/// midnight. This is a policy guard, not a correctness invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlackoutWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl BlackoutWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= time && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }
}

impl Default for BlackoutWindow {
    /// The observed default: check-in disallowed from midnight to 03:00.
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(0, 0, 0).expect("valid time"),
            end: NaiveTime::from_hms_opt(3, 0, 0).expect("valid time"),
        }
    }
}

/// Errors surfaced by the check-in operation. Duplicate same-day check-in
/// is not an error; it resolves to `CheckInOutcome::AlreadyCheckedIn`.
#[derive(Debug, thiserror::Error)]
pub enum CheckInError {
    #[error("check-in is not allowed between {start} and {end}")]
    OutsideWindow { start: NaiveTime, end: NaiveTime },
    #[error(transparent)]
    Storage(#[from] PortError),
}

/// The result of a successful check-in call.
#[derive(Debug, Clone)]
pub enum CheckInOutcome {
    /// A new record was created and finalized.
    CheckedIn(AttendanceRecord),
    /// A record for (student, today) already existed; it is returned as-is
    /// (after resuming finalization if an earlier attempt was interrupted).
    AlreadyCheckedIn(AttendanceRecord),
}

impl CheckInOutcome {
    pub fn record(&self) -> &AttendanceRecord {
        match self {
            CheckInOutcome::CheckedIn(r) | CheckInOutcome::AlreadyCheckedIn(r) => r,
        }
    }
}

/// Records today's check-in for `student_id`.
///
/// `now` carries the institution-local offset; "today" and the blackout
/// guard are derived from it, and the same offset converts the stored
/// check-in timestamp back to a local time-of-day for scoring.
///
/// Idempotency: an existing record for (student, today) short-circuits to
/// `AlreadyCheckedIn`, and a storage-level uniqueness conflict on insert
/// (the concurrent-duplicate race) is recovered the same way. If an earlier
/// attempt inserted a row but failed before writing rank/points, or failed
/// between that write and the stats upsert, this call resumes from where it
/// stopped; the stats updater's same-day guard keeps the retry from
/// double-counting.
pub async fn check_in(
    store: &dyn AttendanceStore,
    blackout: &BlackoutWindow,
    student_id: Uuid,
    now: DateTime<FixedOffset>,
) -> Result<CheckInOutcome, CheckInError> {
    let today = now.date_naive();
    let offset = *now.offset();

    if let Some(existing) = store.get_attendance(student_id, today).await? {
        let record = ensure_finalized(store, existing, offset).await?;
        return Ok(CheckInOutcome::AlreadyCheckedIn(record));
    }

    if blackout.contains(now.time()) {
        return Err(CheckInError::OutsideWindow {
            start: blackout.start,
            end: blackout.end,
        });
    }

    let inserted = match store.insert_attendance(student_id, today).await {
        Ok(record) => record,
        Err(PortError::Conflict(_)) => {
            // A concurrent check-in won the insert; treat as already
            // checked in rather than surfacing an error.
            let existing = store.get_attendance(student_id, today).await?.ok_or_else(|| {
                PortError::Unexpected(format!(
                    "attendance insert for student {student_id} conflicted but no row found"
                ))
            })?;
            let record = ensure_finalized(store, existing, offset).await?;
            return Ok(CheckInOutcome::AlreadyCheckedIn(record));
        }
        Err(e) => return Err(e.into()),
    };

    let record = finalize(store, inserted, offset).await?;
    Ok(CheckInOutcome::CheckedIn(record))
}

/// Brings an existing record (and its stats) fully up to date.
///
/// An unfinalized record resumes the rank/points/stats sequence. A finalized
/// record still re-runs the stats updater: an earlier attempt may have failed
/// between the rank/points write and the stats upsert, and the updater is a
/// same-day no-op when stats were already applied.
async fn ensure_finalized(
    store: &dyn AttendanceStore,
    record: AttendanceRecord,
    offset: FixedOffset,
) -> PortResult<AttendanceRecord> {
    match record.points {
        Some(points) if record.rank_today.is_some() => {
            update_stats(store, record.student_id, points, record.date).await?;
            Ok(record)
        }
        _ => finalize(store, record, offset).await,
    }
}

/// Back-fills rank and points onto a freshly inserted (or previously
/// interrupted) record, then applies the stats rollup.
///
/// Rank is fixed at this point as 1 + the count of same-day rows with a
/// strictly earlier check-in time. Timestamps are assigned by the storage
/// layer at insert time, so commit order and timestamp order agree; rank is
/// never revised afterwards.
async fn finalize(
    store: &dyn AttendanceStore,
    record: AttendanceRecord,
    offset: FixedOffset,
) -> PortResult<AttendanceRecord> {
    let earlier = store
        .count_attendance_before(record.date, record.checkin_time)
        .await?;
    let rank = earlier as i32 + 1;

    let local_time = record.checkin_time.with_timezone(&offset).time();
    let points = points_for_checkin(local_time);

    let updated = store.update_attendance(record.id, points, rank).await?;
    update_stats(store, record.student_id, points, record.date).await?;
    Ok(updated)
}
