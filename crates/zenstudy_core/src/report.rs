//! crates/zenstudy_core/src/report.rs
//!
//! Read-only views: the daily leaderboard query and the pure derivations
//! the admin screen computes over an already-fetched roster and day of
//! attendance (toppers, late comers, absentees, free-text search).

use chrono::NaiveDate;

use crate::domain::{LeaderboardEntry, Student};
use crate::ports::{AttendanceStore, PortResult};

/// Today's top `n` check-ins, rank ascending. An empty result is a valid
/// state ("no one has checked in yet"), not an error.
pub async fn top_n(
    store: &dyn AttendanceStore,
    date: NaiveDate,
    n: i64,
) -> PortResult<Vec<LeaderboardEntry>> {
    store.list_attendance_for_date(date, Some(n)).await
}

/// The first `k` entries by rank. `entries` must already be rank-ascending,
/// as `list_attendance_for_date` returns them.
pub fn top_k(entries: &[LeaderboardEntry], k: usize) -> &[LeaderboardEntry] {
    &entries[..entries.len().min(k)]
}

/// Everyone below the top `k`, still rank ascending.
pub fn bottom_after_k(entries: &[LeaderboardEntry], k: usize) -> &[LeaderboardEntry] {
    &entries[entries.len().min(k)..]
}

/// Roster members with no attendance row today.
pub fn absentees<'a>(
    roster: &'a [Student],
    attendance: &[LeaderboardEntry],
) -> Vec<&'a Student> {
    roster
        .iter()
        .filter(|s| !attendance.iter().any(|a| a.student_id == s.id))
        .collect()
}

/// Case-insensitive substring filter over name and batch label.
pub fn search<'a>(roster: &'a [Student], query: &str) -> Vec<&'a Student> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return roster.iter().collect();
    }
    roster
        .iter()
        .filter(|s| {
            s.name.to_lowercase().contains(&query)
                || s.batch.as_str().to_lowercase().contains(&query)
        })
        .collect()
}

/// The admin's one-day rollup: who came, who led, who stayed in bed.
#[derive(Debug, Clone)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub total_students: usize,
    pub present: usize,
    pub absent: usize,
    pub toppers: Vec<LeaderboardEntry>,
    pub late_comers: Vec<LeaderboardEntry>,
    pub absentees: Vec<Student>,
}

/// How many ranks count as "toppers" in the daily review.
pub const TOPPER_COUNT: usize = 5;

/// Builds the daily review from the full roster and the day's attendance
/// (rank ascending). Pure; the caller fetches both collections.
pub fn daily_report(
    date: NaiveDate,
    roster: &[Student],
    attendance: &[LeaderboardEntry],
) -> DailyReport {
    let absentees = absentees(roster, attendance)
        .into_iter()
        .cloned()
        .collect::<Vec<_>>();
    DailyReport {
        date,
        total_students: roster.len(),
        present: attendance.len(),
        absent: roster.len().saturating_sub(attendance.len()),
        toppers: top_k(attendance, TOPPER_COUNT).to_vec(),
        late_comers: bottom_after_k(attendance, TOPPER_COUNT).to_vec(),
        absentees,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Batch;
    use crate::testutil::MemoryStore;
    use crate::{checkin, ports::AttendanceStore};
    use chrono::{FixedOffset, TimeZone, Utc};
    use uuid::Uuid;

    fn entry(student_id: Uuid, name: &str, rank: i32) -> LeaderboardEntry {
        LeaderboardEntry {
            student_id,
            student_name: name.to_string(),
            batch: Batch::S1,
            rank,
            checkin_time: Utc::now(),
            points: 10,
        }
    }

    fn student(name: &str, batch: Batch) -> Student {
        Student {
            id: Uuid::new_v4(),
            name: name.to_string(),
            batch,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn report_splits_toppers_and_late_comers() {
        let roster: Vec<Student> = (0..8).map(|i| student(&format!("S{i}"), Batch::S1)).collect();
        let attendance: Vec<LeaderboardEntry> = roster
            .iter()
            .take(7)
            .enumerate()
            .map(|(i, s)| entry(s.id, &s.name, i as i32 + 1))
            .collect();

        let report = daily_report(attendance[0].checkin_time.date_naive(), &roster, &attendance);
        assert_eq!(report.total_students, 8);
        assert_eq!(report.present, 7);
        assert_eq!(report.absent, 1);
        assert_eq!(report.toppers.len(), 5);
        assert_eq!(report.late_comers.len(), 2);
        assert_eq!(report.toppers[0].rank, 1);
        assert_eq!(report.late_comers[0].rank, 6);
        assert_eq!(report.absentees.len(), 1);
        assert_eq!(report.absentees[0].id, roster[7].id);
    }

    #[test]
    fn report_handles_empty_day() {
        let roster = vec![student("A", Batch::S1)];
        let report = daily_report(
            chrono::NaiveDate::from_ymd_opt(2026, 8, 10).unwrap(),
            &roster,
            &[],
        );
        assert_eq!(report.present, 0);
        assert_eq!(report.absent, 1);
        assert!(report.toppers.is_empty());
        assert!(report.late_comers.is_empty());
    }

    #[test]
    fn search_matches_name_and_batch_case_insensitive() {
        let roster = vec![
            student("ANJALI", Batch::S1),
            student("RAHUL", Batch::S2),
            student("FARHAN", Batch::S3),
        ];
        let by_name = search(&roster, "rah");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].name, "RAHUL");
        let by_substring = search(&roster, "an");
        assert_eq!(by_substring.len(), 2); // ANJALI and FARHAN
        let by_batch = search(&roster, "s2");
        assert_eq!(by_batch.len(), 1);
        assert_eq!(by_batch[0].name, "RAHUL");
        assert_eq!(search(&roster, "  ").len(), 3);
        assert!(search(&roster, "zzz").is_empty());
    }

    #[tokio::test]
    async fn top_n_returns_rank_order_and_respects_limit() {
        let store = MemoryStore::new();
        let offset = FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap();
        let window = checkin::BlackoutWindow::default();

        let mut ids = Vec::new();
        for (i, name) in ["A", "B", "C"].iter().enumerate() {
            let s = store.create_student(name, Batch::S1).await.unwrap();
            store.create_stats(s.id).await.unwrap();
            let now = offset
                .with_ymd_and_hms(2026, 8, 10, 5, i as u32 * 10, 0)
                .single()
                .unwrap();
            store.set_clock(now.with_timezone(&Utc));
            checkin::check_in(&store, &window, s.id, now).await.unwrap();
            ids.push(s.id);
        }

        let date = chrono::NaiveDate::from_ymd_opt(2026, 8, 10).unwrap();
        let top = top_n(&store, date, 2).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].rank, 1);
        assert_eq!(top[0].student_id, ids[0]);
        assert_eq!(top[1].rank, 2);

        let empty = top_n(&store, previous(date), 10).await.unwrap();
        assert!(empty.is_empty());
    }

    fn previous(date: chrono::NaiveDate) -> chrono::NaiveDate {
        crate::scoring::previous_day(date)
    }
}
