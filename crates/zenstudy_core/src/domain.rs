//! crates/zenstudy_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A registered student. Created once at setup, immutable afterwards
/// except for the administrator bulk reset.
#[derive(Debug, Clone)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub batch: Batch,
    pub created_at: DateTime<Utc>,
}

/// The fixed set of batch labels a student can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Batch {
    S1,
    S2,
    S3,
}

impl Batch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Batch::S1 => "S1",
            Batch::S2 => "S2",
            Batch::S3 => "S3",
        }
    }
}

impl fmt::Display for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Batch {
    type Err = UnknownBatch;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "S1" => Ok(Batch::S1),
            "S2" => Ok(Batch::S2),
            "S3" => Ok(Batch::S3),
            other => Err(UnknownBatch(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown batch label: {0}")]
pub struct UnknownBatch(pub String);

/// One check-in per (student, calendar date).
///
/// `points` and `rank_today` are `None` between the initial insert and the
/// finalization step of the check-in operation; once set they are never
/// revised.
#[derive(Debug, Clone)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub checkin_time: DateTime<Utc>,
    pub points: Option<i32>,
    pub rank_today: Option<i32>,
}

impl AttendanceRecord {
    /// A record is finalized once rank and points have been written back.
    pub fn is_finalized(&self) -> bool {
        self.points.is_some() && self.rank_today.is_some()
    }
}

/// Per-student rollup, mutated at most once per day by the stats updater.
#[derive(Debug, Clone)]
pub struct StudentStats {
    pub student_id: Uuid,
    pub total_points: i32,
    pub current_streak: i32,
    pub best_streak: i32,
    pub last_checkin_date: Option<NaiveDate>,
    pub medal_level: Medal,
}

impl StudentStats {
    /// The zeroed stats row created at registration.
    pub fn initial(student_id: Uuid) -> Self {
        Self {
            student_id,
            total_points: 0,
            current_streak: 0,
            best_streak: 0,
            last_checkin_date: None,
            medal_level: Medal::Seeker,
        }
    }
}

/// Medal tiers, derived purely from the current streak length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Medal {
    Seeker,
    Bronze,
    Silver,
    Gold,
    Champion,
}

impl Medal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Medal::Seeker => "Seeker",
            Medal::Bronze => "Bronze",
            Medal::Silver => "Silver",
            Medal::Gold => "Gold",
            Medal::Champion => "Champion",
        }
    }
}

impl fmt::Display for Medal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Medal {
    type Err = UnknownMedal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Seeker" => Ok(Medal::Seeker),
            "Bronze" => Ok(Medal::Bronze),
            "Silver" => Ok(Medal::Silver),
            "Gold" => Ok(Medal::Gold),
            "Champion" => Ok(Medal::Champion),
            other => Err(UnknownMedal(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown medal level: {0}")]
pub struct UnknownMedal(pub String);

/// A finalized attendance row joined with the student's name and batch,
/// as served by the leaderboard and the admin report.
#[derive(Debug, Clone)]
pub struct LeaderboardEntry {
    pub student_id: Uuid,
    pub student_name: String,
    pub batch: Batch,
    pub rank: i32,
    pub checkin_time: DateTime<Utc>,
    pub points: i32,
}
