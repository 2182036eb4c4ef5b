//! crates/zenstudy_core/src/testutil.rs
//!
//! An in-memory `AttendanceStore` for unit tests, with a programmable clock
//! and two fault knobs for exercising the check-in race and retry paths.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{AttendanceRecord, Batch, LeaderboardEntry, Student, StudentStats};
use crate::ports::{AttendanceStore, PortError, PortResult};

#[derive(Default)]
struct Inner {
    students: Vec<Student>,
    attendance: Vec<AttendanceRecord>,
    stats: HashMap<Uuid, StudentStats>,
    clock: Option<DateTime<Utc>>,
    miss_next_attendance_read: bool,
    fail_next_attendance_update: bool,
    fail_next_stats_upsert: bool,
}

pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Sets the timestamp the next inserts will be stamped with.
    pub fn set_clock(&self, now: DateTime<Utc>) {
        self.inner.lock().unwrap().clock = Some(now);
    }

    /// Makes the next `get_attendance` call return `None` regardless of
    /// state, simulating the read-then-insert race window.
    pub fn miss_next_attendance_read(&self) {
        self.inner.lock().unwrap().miss_next_attendance_read = true;
    }

    /// Makes the next `update_attendance` call fail, simulating a storage
    /// error between insert and finalization.
    pub fn fail_next_attendance_update(&self) {
        self.inner.lock().unwrap().fail_next_attendance_update = true;
    }

    /// Makes the next `upsert_stats` call fail, simulating a storage error
    /// between finalization and the stats write.
    pub fn fail_next_stats_upsert(&self) {
        self.inner.lock().unwrap().fail_next_stats_upsert = true;
    }

    pub async fn attendance_count(&self) -> usize {
        self.inner.lock().unwrap().attendance.len()
    }

    fn now(inner: &Inner) -> DateTime<Utc> {
        inner.clock.unwrap_or_else(Utc::now)
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn create_student(&self, name: &str, batch: Batch) -> PortResult<Student> {
        let mut inner = self.inner.lock().unwrap();
        let student = Student {
            id: Uuid::new_v4(),
            name: name.to_string(),
            batch,
            created_at: Self::now(&inner),
        };
        inner.students.push(student.clone());
        Ok(student)
    }

    async fn get_student(&self, id: Uuid) -> PortResult<Student> {
        let inner = self.inner.lock().unwrap();
        inner
            .students
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("student {id}")))
    }

    async fn list_students(&self) -> PortResult<Vec<Student>> {
        Ok(self.inner.lock().unwrap().students.clone())
    }

    async fn get_attendance(
        &self,
        student_id: Uuid,
        date: NaiveDate,
    ) -> PortResult<Option<AttendanceRecord>> {
        let mut inner = self.inner.lock().unwrap();
        if inner.miss_next_attendance_read {
            inner.miss_next_attendance_read = false;
            return Ok(None);
        }
        Ok(inner
            .attendance
            .iter()
            .find(|a| a.student_id == student_id && a.date == date)
            .cloned())
    }

    async fn insert_attendance(
        &self,
        student_id: Uuid,
        date: NaiveDate,
    ) -> PortResult<AttendanceRecord> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .attendance
            .iter()
            .any(|a| a.student_id == student_id && a.date == date)
        {
            return Err(PortError::Conflict(format!(
                "attendance exists for ({student_id}, {date})"
            )));
        }
        let record = AttendanceRecord {
            id: Uuid::new_v4(),
            student_id,
            date,
            checkin_time: Self::now(&inner),
            points: None,
            rank_today: None,
        };
        inner.attendance.push(record.clone());
        Ok(record)
    }

    async fn count_attendance_before(
        &self,
        date: NaiveDate,
        checkin_time: DateTime<Utc>,
    ) -> PortResult<i64> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .attendance
            .iter()
            .filter(|a| a.date == date && a.checkin_time < checkin_time)
            .count() as i64)
    }

    async fn update_attendance(
        &self,
        id: Uuid,
        points: i32,
        rank_today: i32,
    ) -> PortResult<AttendanceRecord> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_next_attendance_update {
            inner.fail_next_attendance_update = false;
            return Err(PortError::Unexpected("injected update failure".to_string()));
        }
        let record = inner
            .attendance
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| PortError::NotFound(format!("attendance {id}")))?;
        record.points = Some(points);
        record.rank_today = Some(rank_today);
        Ok(record.clone())
    }

    async fn list_attendance_for_date(
        &self,
        date: NaiveDate,
        limit: Option<i64>,
    ) -> PortResult<Vec<LeaderboardEntry>> {
        let inner = self.inner.lock().unwrap();
        let mut entries: Vec<LeaderboardEntry> = inner
            .attendance
            .iter()
            .filter(|a| a.date == date && a.is_finalized())
            .filter_map(|a| {
                let student = inner.students.iter().find(|s| s.id == a.student_id)?;
                Some(LeaderboardEntry {
                    student_id: a.student_id,
                    student_name: student.name.clone(),
                    batch: student.batch,
                    rank: a.rank_today.unwrap(),
                    checkin_time: a.checkin_time,
                    points: a.points.unwrap(),
                })
            })
            .collect();
        entries.sort_by_key(|e| e.rank);
        if let Some(limit) = limit {
            entries.truncate(limit as usize);
        }
        Ok(entries)
    }

    async fn create_stats(&self, student_id: Uuid) -> PortResult<StudentStats> {
        let mut inner = self.inner.lock().unwrap();
        if inner.stats.contains_key(&student_id) {
            return Err(PortError::Conflict(format!("stats exist for {student_id}")));
        }
        let stats = StudentStats::initial(student_id);
        inner.stats.insert(student_id, stats.clone());
        Ok(stats)
    }

    async fn get_stats(&self, student_id: Uuid) -> PortResult<Option<StudentStats>> {
        Ok(self.inner.lock().unwrap().stats.get(&student_id).cloned())
    }

    async fn upsert_stats(&self, stats: &StudentStats) -> PortResult<StudentStats> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_next_stats_upsert {
            inner.fail_next_stats_upsert = false;
            return Err(PortError::Unexpected("injected upsert failure".to_string()));
        }
        inner.stats.insert(stats.student_id, stats.clone());
        Ok(stats.clone())
    }

    async fn reset_all(&self) -> PortResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.attendance.clear();
        inner.stats.clear();
        inner.students.clear();
        Ok(())
    }
}
