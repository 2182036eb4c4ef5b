//! crates/zenstudy_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like databases.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{AttendanceRecord, Batch, LeaderboardEntry, Student, StudentStats};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A uniqueness violation. The storage layer must raise this (and only
    /// this) when an insert collides with an existing (student, date) row,
    /// so the check-in operation can recover instead of failing.
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Storage Port (Trait)
//=========================================================================================

/// The storage collaborator for students, attendance, and stats.
///
/// Implementations must enforce a unique constraint on (student_id, date)
/// for attendance rows, and their `upsert_stats` must be a single atomic
/// write (the stats updater relies on that for its no-partial-write rule).
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    // --- Roster ---
    async fn create_student(&self, name: &str, batch: Batch) -> PortResult<Student>;

    async fn get_student(&self, id: Uuid) -> PortResult<Student>;

    async fn list_students(&self) -> PortResult<Vec<Student>>;

    // --- Attendance ---
    /// Single-or-none lookup for a student's record on a given date.
    async fn get_attendance(
        &self,
        student_id: Uuid,
        date: NaiveDate,
    ) -> PortResult<Option<AttendanceRecord>>;

    /// Inserts a bare attendance row (no points, no rank yet). The check-in
    /// timestamp is assigned by the storage layer at insert time. Returns
    /// `PortError::Conflict` if a row for (student_id, date) already exists.
    async fn insert_attendance(
        &self,
        student_id: Uuid,
        date: NaiveDate,
    ) -> PortResult<AttendanceRecord>;

    /// Counts same-day records with a check-in time strictly earlier than
    /// `checkin_time`. Must observe all previously committed inserts for the
    /// day (read-committed is sufficient).
    async fn count_attendance_before(
        &self,
        date: NaiveDate,
        checkin_time: DateTime<Utc>,
    ) -> PortResult<i64>;

    /// Writes rank and points back onto a record in a single update.
    async fn update_attendance(
        &self,
        id: Uuid,
        points: i32,
        rank_today: i32,
    ) -> PortResult<AttendanceRecord>;

    /// Finalized rows for a date joined with student name/batch, ordered by
    /// rank ascending. `limit` of `None` returns the whole day.
    async fn list_attendance_for_date(
        &self,
        date: NaiveDate,
        limit: Option<i64>,
    ) -> PortResult<Vec<LeaderboardEntry>>;

    // --- Stats ---
    async fn create_stats(&self, student_id: Uuid) -> PortResult<StudentStats>;

    async fn get_stats(&self, student_id: Uuid) -> PortResult<Option<StudentStats>>;

    /// Insert-or-replace keyed by student_id; the one atomic write of the
    /// stats updater.
    async fn upsert_stats(&self, stats: &StudentStats) -> PortResult<StudentStats>;

    // --- Admin ---
    /// Deletes all attendance, stats, and students in one transaction.
    async fn reset_all(&self) -> PortResult<()>;
}
