pub mod checkin;
pub mod domain;
pub mod ports;
pub mod register;
pub mod report;
pub mod scoring;
pub mod stats;

#[cfg(test)]
pub(crate) mod testutil;

pub use checkin::{check_in, BlackoutWindow, CheckInError, CheckInOutcome};
pub use domain::{
    AttendanceRecord, Batch, LeaderboardEntry, Medal, Student, StudentStats, UnknownBatch,
};
pub use ports::{AttendanceStore, PortError, PortResult};
pub use register::{register_student, RegisterError};
pub use report::{daily_report, top_n, DailyReport};
pub use scoring::{medal_for_streak, ordinal, points_for_checkin, previous_day};
pub use stats::{next_stats, update_stats};
