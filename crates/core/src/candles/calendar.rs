//! Frame-boundary arithmetic.
//!
//! Fixed-duration frames (minutes, hours, day) floor to a multiple of
//! their duration. Calendar frames align to the ISO week (Monday
//! 00:00:00.000 UTC) or the first of the month (00:00:00.000 UTC).
//! All math is UTC; timestamps are epoch milliseconds.

use chrono::{Datelike, NaiveDate};

use super::constants::DAY_MS;
use barvault_connectors::models::TimeFrame;

/// `NaiveDate::num_days_from_ce()` for 1970-01-01.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Fixed frame duration in milliseconds; `None` for week/month.
pub fn frame_duration_ms(interval: TimeFrame) -> Option<i64> {
    interval.fixed_duration_ms()
}

/// Start of the UTC day containing `t`.
pub fn round_day(t: i64) -> i64 {
    t.div_euclid(DAY_MS) * DAY_MS
}

fn utc_date(t: i64) -> NaiveDate {
    let days = t.div_euclid(DAY_MS);
    NaiveDate::from_num_days_from_ce_opt(days as i32 + EPOCH_DAYS_FROM_CE)
        .unwrap_or(NaiveDate::MIN)
}

fn date_start_ms(date: NaiveDate) -> i64 {
    (date.num_days_from_ce() - EPOCH_DAYS_FROM_CE) as i64 * DAY_MS
}

fn iso_week_start(t: i64) -> i64 {
    let day_index = t.div_euclid(DAY_MS);
    // 1970-01-01 was a Thursday; shift so 0 = Monday.
    let days_from_monday = (day_index + 3).rem_euclid(7);
    (day_index - days_from_monday) * DAY_MS
}

fn month_start(t: i64) -> i64 {
    let date = utc_date(t);
    let first = date.with_day(1).unwrap_or(date);
    date_start_ms(first)
}

/// Exact start of the frame containing `t` at `interval`.
pub fn frame_start(t: i64, interval: TimeFrame) -> i64 {
    match interval.fixed_duration_ms() {
        Some(duration) => t.div_euclid(duration) * duration,
        None => match interval {
            TimeFrame::Week => iso_week_start(t),
            TimeFrame::Month => month_start(t),
            _ => unreachable!("non-calendar frames have a fixed duration"),
        },
    }
}

/// The finer timeframe a calendar aggregate is derived from.
///
/// Week/month roll up from day bars; every other frame is served
/// pre-aggregated by upstreams and maps to itself.
pub fn base_interval(interval: TimeFrame) -> TimeFrame {
    match interval {
        TimeFrame::Week | TimeFrame::Month => TimeFrame::Day,
        other => other,
    }
}

/// True iff `t` falls inside the frame of `interval` that is currently
/// open at `now` (for week/month the frame runs to the next calendar
/// boundary rather than a fixed duration).
pub fn is_current_open_frame(t: i64, now: i64, interval: TimeFrame) -> bool {
    frame_start(t, interval) == frame_start(now, interval)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    const MIN: i64 = 60_000;
    const HOUR: i64 = 60 * MIN;

    // 2025-01-01 00:00:00 UTC
    const JAN_2025: i64 = 1_735_689_600_000;

    #[test]
    fn fixed_frames_floor_to_duration_multiples() {
        let t = JAN_2025 + 2 * HOUR + 17 * MIN + 12_345;
        assert_eq!(frame_start(t, TimeFrame::Min1), JAN_2025 + 2 * HOUR + 17 * MIN);
        assert_eq!(frame_start(t, TimeFrame::Min15), JAN_2025 + 2 * HOUR + 15 * MIN);
        assert_eq!(frame_start(t, TimeFrame::H1), JAN_2025 + 2 * HOUR);
        assert_eq!(frame_start(t, TimeFrame::H4), JAN_2025);
        assert_eq!(frame_start(t, TimeFrame::Day), JAN_2025);
    }

    #[test]
    fn week_start_is_always_a_monday_at_midnight() {
        // Walk a year of days, covering the Sunday->Monday rollover
        // and the year boundary.
        for offset in 0..366 {
            let t = JAN_2025 + offset * DAY_MS + 11 * HOUR;
            let start = frame_start(t, TimeFrame::Week);
            assert_eq!(start % DAY_MS, 0);
            assert_eq!(utc_date(start).weekday(), Weekday::Mon);
            assert!(start <= t && t < start + 7 * DAY_MS);
        }
    }

    #[test]
    fn week_containing_new_year_2025_starts_in_2024() {
        // 2025-01-05 was a Sunday; its ISO week began Monday 2024-12-30.
        let sunday = JAN_2025 + 4 * DAY_MS + 15 * HOUR;
        assert_eq!(frame_start(sunday, TimeFrame::Week), JAN_2025 - 2 * DAY_MS);
    }

    #[test]
    fn month_start_is_first_of_month_at_midnight() {
        let t = JAN_2025 + 20 * DAY_MS + 7 * HOUR;
        assert_eq!(frame_start(t, TimeFrame::Month), JAN_2025);

        // Leap February 2024: the 29th still belongs to Feb 1.
        let feb_2024 = 1_706_745_600_000; // 2024-02-01 00:00:00 UTC
        let leap_day = feb_2024 + 28 * DAY_MS + 12 * HOUR;
        assert_eq!(frame_start(leap_day, TimeFrame::Month), feb_2024);
        // ...and March starts a new bucket.
        assert_eq!(
            frame_start(feb_2024 + 29 * DAY_MS, TimeFrame::Month),
            feb_2024 + 29 * DAY_MS
        );
    }

    #[test]
    fn boundary_instants_start_their_own_frame() {
        let monday = JAN_2025 + 5 * DAY_MS; // 2025-01-06, a Monday
        assert_eq!(utc_date(monday).weekday(), Weekday::Mon);
        assert_eq!(frame_start(monday, TimeFrame::Week), monday);
        assert_eq!(frame_start(JAN_2025, TimeFrame::Month), JAN_2025);
    }

    #[test]
    fn base_interval_reduces_calendar_frames_to_day() {
        assert_eq!(base_interval(TimeFrame::Week), TimeFrame::Day);
        assert_eq!(base_interval(TimeFrame::Month), TimeFrame::Day);
        for tf in [TimeFrame::Min1, TimeFrame::Min30, TimeFrame::H4, TimeFrame::Day] {
            assert_eq!(base_interval(tf), tf);
        }
    }

    #[test]
    fn open_frame_test_compares_buckets() {
        let now = JAN_2025 + 10 * DAY_MS + 3 * HOUR;
        assert!(is_current_open_frame(now - 5 * MIN, now, TimeFrame::H4));
        assert!(!is_current_open_frame(now - 4 * HOUR, now, TimeFrame::H4));
        assert!(is_current_open_frame(now - 2 * DAY_MS, now, TimeFrame::Month));
        assert!(!is_current_open_frame(now - 11 * DAY_MS, now, TimeFrame::Month));
    }
}
