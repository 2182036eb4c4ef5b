//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `AttendanceStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use zenstudy_core::domain::{AttendanceRecord, Batch, LeaderboardEntry, Student, StudentStats};
use zenstudy_core::ports::{AttendanceStore, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `AttendanceStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Maps a sqlx error, turning a unique-constraint violation (SQLSTATE 23505)
/// into the distinguishable `Conflict` the check-in operation recovers from.
fn map_db_error(e: sqlx::Error) -> PortError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.code().as_deref() == Some("23505") {
            return PortError::Conflict(db_err.to_string());
        }
    }
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct StudentRecord {
    id: Uuid,
    name: String,
    batch: String,
    created_at: DateTime<Utc>,
}
impl StudentRecord {
    fn to_domain(self) -> PortResult<Student> {
        let batch: Batch = self
            .batch
            .parse()
            .map_err(|e: zenstudy_core::UnknownBatch| PortError::Unexpected(e.to_string()))?;
        Ok(Student {
            id: self.id,
            name: self.name,
            batch,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct AttendanceRow {
    id: Uuid,
    student_id: Uuid,
    date: NaiveDate,
    checkin_time: DateTime<Utc>,
    points: Option<i32>,
    rank_today: Option<i32>,
}
impl AttendanceRow {
    fn to_domain(self) -> AttendanceRecord {
        AttendanceRecord {
            id: self.id,
            student_id: self.student_id,
            date: self.date,
            checkin_time: self.checkin_time,
            points: self.points,
            rank_today: self.rank_today,
        }
    }
}

#[derive(FromRow)]
struct StatsRecord {
    student_id: Uuid,
    total_points: i32,
    current_streak: i32,
    best_streak: i32,
    last_checkin_date: Option<NaiveDate>,
    medal_level: String,
}
impl StatsRecord {
    fn to_domain(self) -> PortResult<StudentStats> {
        let medal = self
            .medal_level
            .parse()
            .map_err(|e: zenstudy_core::domain::UnknownMedal| PortError::Unexpected(e.to_string()))?;
        Ok(StudentStats {
            student_id: self.student_id,
            total_points: self.total_points,
            current_streak: self.current_streak,
            best_streak: self.best_streak,
            last_checkin_date: self.last_checkin_date,
            medal_level: medal,
        })
    }
}

#[derive(FromRow)]
struct LeaderboardRow {
    student_id: Uuid,
    student_name: String,
    batch: String,
    rank_today: i32,
    checkin_time: DateTime<Utc>,
    points: i32,
}
impl LeaderboardRow {
    fn to_domain(self) -> PortResult<LeaderboardEntry> {
        let batch: Batch = self
            .batch
            .parse()
            .map_err(|e: zenstudy_core::UnknownBatch| PortError::Unexpected(e.to_string()))?;
        Ok(LeaderboardEntry {
            student_id: self.student_id,
            student_name: self.student_name,
            batch,
            rank: self.rank_today,
            checkin_time: self.checkin_time,
            points: self.points,
        })
    }
}

//=========================================================================================
// `AttendanceStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl AttendanceStore for DbAdapter {
    async fn create_student(&self, name: &str, batch: Batch) -> PortResult<Student> {
        let record = sqlx::query_as::<_, StudentRecord>(
            "INSERT INTO students (name, batch) VALUES ($1, $2)
             RETURNING id, name, batch, created_at",
        )
        .bind(name)
        .bind(batch.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        record.to_domain()
    }

    async fn get_student(&self, id: Uuid) -> PortResult<Student> {
        let record = sqlx::query_as::<_, StudentRecord>(
            "SELECT id, name, batch, created_at FROM students WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Student {} not found", id)),
            _ => map_db_error(e),
        })?;
        record.to_domain()
    }

    async fn list_students(&self) -> PortResult<Vec<Student>> {
        let records = sqlx::query_as::<_, StudentRecord>(
            "SELECT id, name, batch, created_at FROM students ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn get_attendance(
        &self,
        student_id: Uuid,
        date: NaiveDate,
    ) -> PortResult<Option<AttendanceRecord>> {
        let record = sqlx::query_as::<_, AttendanceRow>(
            "SELECT id, student_id, date, checkin_time, points, rank_today
             FROM attendance WHERE student_id = $1 AND date = $2",
        )
        .bind(student_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn insert_attendance(
        &self,
        student_id: Uuid,
        date: NaiveDate,
    ) -> PortResult<AttendanceRecord> {
        // checkin_time is server-assigned (DEFAULT now()); the unique
        // constraint on (student_id, date) raises 23505 -> Conflict.
        let record = sqlx::query_as::<_, AttendanceRow>(
            "INSERT INTO attendance (student_id, date) VALUES ($1, $2)
             RETURNING id, student_id, date, checkin_time, points, rank_today",
        )
        .bind(student_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(record.to_domain())
    }

    async fn count_attendance_before(
        &self,
        date: NaiveDate,
        checkin_time: DateTime<Utc>,
    ) -> PortResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM attendance WHERE date = $1 AND checkin_time < $2",
        )
        .bind(date)
        .bind(checkin_time)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(count)
    }

    async fn update_attendance(
        &self,
        id: Uuid,
        points: i32,
        rank_today: i32,
    ) -> PortResult<AttendanceRecord> {
        let record = sqlx::query_as::<_, AttendanceRow>(
            "UPDATE attendance SET points = $1, rank_today = $2 WHERE id = $3
             RETURNING id, student_id, date, checkin_time, points, rank_today",
        )
        .bind(points)
        .bind(rank_today)
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Attendance {} not found", id))
            }
            _ => map_db_error(e),
        })?;
        Ok(record.to_domain())
    }

    async fn list_attendance_for_date(
        &self,
        date: NaiveDate,
        limit: Option<i64>,
    ) -> PortResult<Vec<LeaderboardEntry>> {
        // LIMIT NULL is "no limit" in Postgres.
        let records = sqlx::query_as::<_, LeaderboardRow>(
            "SELECT a.student_id, s.name AS student_name, s.batch, a.rank_today,
                    a.checkin_time, a.points
             FROM attendance a
             JOIN students s ON s.id = a.student_id
             WHERE a.date = $1 AND a.rank_today IS NOT NULL AND a.points IS NOT NULL
             ORDER BY a.rank_today ASC
             LIMIT $2",
        )
        .bind(date)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn create_stats(&self, student_id: Uuid) -> PortResult<StudentStats> {
        let record = sqlx::query_as::<_, StatsRecord>(
            "INSERT INTO student_stats (student_id) VALUES ($1)
             RETURNING student_id, total_points, current_streak, best_streak,
                       last_checkin_date, medal_level",
        )
        .bind(student_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        record.to_domain()
    }

    async fn get_stats(&self, student_id: Uuid) -> PortResult<Option<StudentStats>> {
        let record = sqlx::query_as::<_, StatsRecord>(
            "SELECT student_id, total_points, current_streak, best_streak,
                    last_checkin_date, medal_level
             FROM student_stats WHERE student_id = $1",
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;
        record.map(|r| r.to_domain()).transpose()
    }

    async fn upsert_stats(&self, stats: &StudentStats) -> PortResult<StudentStats> {
        let record = sqlx::query_as::<_, StatsRecord>(
            "INSERT INTO student_stats
                 (student_id, total_points, current_streak, best_streak,
                  last_checkin_date, medal_level)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (student_id) DO UPDATE SET
                 total_points = EXCLUDED.total_points,
                 current_streak = EXCLUDED.current_streak,
                 best_streak = EXCLUDED.best_streak,
                 last_checkin_date = EXCLUDED.last_checkin_date,
                 medal_level = EXCLUDED.medal_level
             RETURNING student_id, total_points, current_streak, best_streak,
                       last_checkin_date, medal_level",
        )
        .bind(stats.student_id)
        .bind(stats.total_points)
        .bind(stats.current_streak)
        .bind(stats.best_streak)
        .bind(stats.last_checkin_date)
        .bind(stats.medal_level.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        record.to_domain()
    }

    async fn reset_all(&self) -> PortResult<()> {
        // One transaction so a partial reset cannot leave orphaned rows.
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        sqlx::query("DELETE FROM attendance")
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        sqlx::query("DELETE FROM student_stats")
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        sqlx::query("DELETE FROM students")
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }
}
