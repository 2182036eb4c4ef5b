//! crates/zenstudy_core/src/scoring.rs
//!
//! Pure time and scoring utilities: the points step function, medal tier
//! lookup, and small date/rank display helpers. No storage, no clock.

use chrono::{NaiveDate, NaiveTime, Timelike};

use crate::domain::Medal;

/// Points earned for a check-in, as a step function of minutes since
/// midnight (institution-local). Boundaries are inclusive on the lower
/// bound, exclusive on the upper.
pub fn points_for_checkin(time: NaiveTime) -> i32 {
    let minutes = time.hour() * 60 + time.minute();

    if minutes < 5 * 60 {
        50 // before 5:00
    } else if minutes < 5 * 60 + 30 {
        40 // 5:00 - 5:30
    } else if minutes < 6 * 60 {
        30 // 5:30 - 6:00
    } else if minutes < 6 * 60 + 30 {
        20 // 6:00 - 6:30
    } else {
        10 // after 6:30
    }
}

/// Medal tier for a streak length. Thresholds are inclusive lower bounds,
/// evaluated from highest to lowest.
pub fn medal_for_streak(streak: i32) -> Medal {
    if streak >= 30 {
        Medal::Champion
    } else if streak >= 15 {
        Medal::Gold
    } else if streak >= 7 {
        Medal::Silver
    } else if streak >= 3 {
        Medal::Bronze
    } else {
        Medal::Seeker
    }
}

/// The calendar day before `date`, used to test streak continuity.
pub fn previous_day(date: NaiveDate) -> NaiveDate {
    date.pred_opt().expect("date is not the minimum representable day")
}

/// English ordinal for rank display: 1st, 2nd, 3rd, 4th, ... with the
/// 11th/12th/13th special case.
pub fn ordinal(n: i32) -> String {
    let suffix = match n % 100 {
        11..=13 => "th",
        _ => match n % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    };
    format!("{n}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn points_step_boundaries() {
        assert_eq!(points_for_checkin(at(0, 0)), 50);
        assert_eq!(points_for_checkin(at(4, 59)), 50);
        assert_eq!(points_for_checkin(at(5, 0)), 40);
        assert_eq!(points_for_checkin(at(5, 29)), 40);
        assert_eq!(points_for_checkin(at(5, 30)), 30);
        assert_eq!(points_for_checkin(at(5, 59)), 30);
        assert_eq!(points_for_checkin(at(6, 0)), 20);
        assert_eq!(points_for_checkin(at(6, 29)), 20);
        assert_eq!(points_for_checkin(at(6, 30)), 10);
        assert_eq!(points_for_checkin(at(23, 59)), 10);
    }

    #[test]
    fn points_ignore_seconds() {
        let t = NaiveTime::from_hms_opt(5, 29, 59).unwrap();
        assert_eq!(points_for_checkin(t), 40);
    }

    #[test]
    fn medal_thresholds() {
        assert_eq!(medal_for_streak(0), Medal::Seeker);
        assert_eq!(medal_for_streak(1), Medal::Seeker);
        assert_eq!(medal_for_streak(2), Medal::Seeker);
        assert_eq!(medal_for_streak(3), Medal::Bronze);
        assert_eq!(medal_for_streak(6), Medal::Bronze);
        assert_eq!(medal_for_streak(7), Medal::Silver);
        assert_eq!(medal_for_streak(14), Medal::Silver);
        assert_eq!(medal_for_streak(15), Medal::Gold);
        assert_eq!(medal_for_streak(29), Medal::Gold);
        assert_eq!(medal_for_streak(30), Medal::Champion);
        assert_eq!(medal_for_streak(365), Medal::Champion);
    }

    #[test]
    fn medal_is_monotone_in_streak() {
        let mut last = Medal::Seeker;
        for s in 0..40 {
            let m = medal_for_streak(s);
            assert!(m >= last, "medal regressed at streak {s}");
            last = m;
        }
    }

    #[test]
    fn previous_day_crosses_month_boundary() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(previous_day(d), NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
    }

    #[test]
    fn ordinal_suffixes() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(4), "4th");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(12), "12th");
        assert_eq!(ordinal(13), "13th");
        assert_eq!(ordinal(21), "21st");
        assert_eq!(ordinal(22), "22nd");
        assert_eq!(ordinal(103), "103rd");
        assert_eq!(ordinal(111), "111th");
    }
}
