//! Period calculator for cadence-bearing tasks
//!
//! Pure, deterministic date math: no I/O, no state, safe to call
//! concurrently. Periods are anchored to the task's creation date, not to
//! a fixed epoch, so two "every 3 days" tasks created on different days
//! have different period boundaries.
//!
//! Week boundaries use Monday as day 0 (ISO week start) regardless of
//! locale. Month and year stepping always lands on the 1st of a month /
//! January 1st, never mid-month.

use chrono::{DateTime, Datelike, Days, Local, NaiveDate, Utc};

use crate::types::{Cadence, RepeatCadence};

/// Timezone-local calendar date for a UTC instant.
///
/// All period computations run on local dates so the "new day" boundary is
/// the user's midnight, not UTC midnight.
pub fn local_today(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&Local).date_naive()
}

fn monday_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(date.weekday().num_days_from_monday() as u64)
}

fn month_index(date: NaiveDate) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}

fn first_of_month_index(idx: i64) -> NaiveDate {
    let year = idx.div_euclid(12) as i32;
    let month = idx.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).expect("month index in range")
}

/// Start of the period containing `today`, aligned to the anchor's
/// calendar unit and stepped by `every` whole units from the anchor.
///
/// A missing cadence degrades to a single-day period at `today`; real
/// dailies never take that path.
pub fn period_start(
    anchor: NaiveDate,
    cadence: Option<RepeatCadence>,
    every: u32,
    today: NaiveDate,
) -> NaiveDate {
    let interval = every.max(1) as i64;
    match cadence {
        Some(RepeatCadence::Day) => {
            let days_diff = (today - anchor).num_days().max(0);
            anchor + Days::new(((days_diff / interval) * interval) as u64)
        }
        Some(RepeatCadence::Week) => {
            let anchor_start = monday_start(anchor);
            let weeks_diff = ((monday_start(today) - anchor_start).num_days() / 7).max(0);
            anchor_start + Days::new(((weeks_diff / interval) * interval * 7) as u64)
        }
        Some(RepeatCadence::Month) => {
            let months_diff = (month_index(today) - month_index(anchor)).max(0);
            first_of_month_index(month_index(anchor) + (months_diff / interval) * interval)
        }
        Some(RepeatCadence::Year) => {
            let years_diff = (today.year() as i64 - anchor.year() as i64).max(0);
            let year = anchor.year() as i64 + (years_diff / interval) * interval;
            NaiveDate::from_ymd_opt(year as i32, 1, 1).expect("year in range")
        }
        None => today,
    }
}

/// Last day of the current period: the next block's start minus one day.
/// This is the human-readable "due by" date.
pub fn period_end(
    anchor: NaiveDate,
    cadence: Option<RepeatCadence>,
    every: u32,
    today: NaiveDate,
) -> NaiveDate {
    let start = period_start(anchor, cadence, every, today);
    next_period_start(start, cadence, every) - Days::new(1)
}

/// Start of the block immediately after `current`.
pub fn next_period_start(current: NaiveDate, cadence: Option<RepeatCadence>, every: u32) -> NaiveDate {
    let interval = every.max(1) as i64;
    match cadence {
        Some(RepeatCadence::Day) => current + Days::new(interval as u64),
        Some(RepeatCadence::Week) => current + Days::new((7 * interval) as u64),
        Some(RepeatCadence::Month) => first_of_month_index(month_index(current) + interval),
        Some(RepeatCadence::Year) => {
            NaiveDate::from_ymd_opt(current.year() + interval as i32, 1, 1).expect("year in range")
        }
        None => current + Days::new(1),
    }
}

/// Start of the block immediately before `current`.
///
/// Direct one-block subtraction; exactly equals what [`period_start`]
/// returns for an instant one unit earlier.
pub fn previous_period_start(
    current: NaiveDate,
    cadence: Option<RepeatCadence>,
    every: u32,
) -> NaiveDate {
    let interval = every.max(1) as i64;
    match cadence {
        Some(RepeatCadence::Day) => current - Days::new(interval as u64),
        Some(RepeatCadence::Week) => current - Days::new((7 * interval) as u64),
        Some(RepeatCadence::Month) => first_of_month_index(month_index(current) - interval),
        Some(RepeatCadence::Year) => {
            NaiveDate::from_ymd_opt(current.year() - interval as i32, 1, 1).expect("year in range")
        }
        None => current,
    }
}

/// Calendar-aligned reset bucket for habit counters.
///
/// Unlike daily periods this is not anchored to the task: a weekly reset
/// bucket is simply the current ISO week, a monthly one the current month.
pub fn habit_reset_period_start(today: NaiveDate, cadence: Cadence) -> NaiveDate {
    match cadence {
        Cadence::Never => today,
        Cadence::Day => today,
        Cadence::Week => monday_start(today),
        Cadence::Month => NaiveDate::from_ymd_opt(today.year(), today.month(), 1).expect("valid"),
        Cadence::Year => NaiveDate::from_ymd_opt(today.year(), 1, 1).expect("valid"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_day_period_anchored_to_creation() {
        // Every 3 days, anchored 2026-02-01: blocks start 1st, 4th, 7th...
        let anchor = d(2026, 2, 1);
        let cad = Some(RepeatCadence::Day);
        assert_eq!(period_start(anchor, cad, 3, d(2026, 2, 1)), d(2026, 2, 1));
        assert_eq!(period_start(anchor, cad, 3, d(2026, 2, 3)), d(2026, 2, 1));
        assert_eq!(period_start(anchor, cad, 3, d(2026, 2, 4)), d(2026, 2, 4));
        assert_eq!(period_start(anchor, cad, 3, d(2026, 2, 9)), d(2026, 2, 7));

        // Same cadence, different anchor: different boundaries.
        let other = d(2026, 2, 2);
        assert_eq!(period_start(other, cad, 3, d(2026, 2, 4)), d(2026, 2, 2));
    }

    #[test]
    fn test_period_start_idempotent() {
        let anchor = d(2026, 1, 15);
        for cad in [
            RepeatCadence::Day,
            RepeatCadence::Week,
            RepeatCadence::Month,
            RepeatCadence::Year,
        ] {
            let today = d(2026, 3, 9);
            let start = period_start(anchor, Some(cad), 2, today);
            assert_eq!(period_start(anchor, Some(cad), 2, start), start);
        }
    }

    #[test]
    fn test_week_period_uses_monday_start() {
        // 2026-02-04 is a Wednesday; its ISO week starts Monday 2026-02-02.
        let anchor = d(2026, 2, 4);
        let start = period_start(anchor, Some(RepeatCadence::Week), 1, d(2026, 2, 6));
        assert_eq!(start, d(2026, 2, 2));
    }

    #[test]
    fn test_biweekly_period_end_is_thirteen_days_out() {
        // Weekly, every 2, created on a Wednesday: the period runs two full
        // 7-day blocks from the anchor week's Monday, ending 13 days later.
        let anchor = d(2026, 2, 4); // Wednesday
        let end = period_end(anchor, Some(RepeatCadence::Week), 2, d(2026, 2, 4));
        assert_eq!(end, d(2026, 2, 2) + Days::new(13));
        assert_eq!(end, d(2026, 2, 15));
    }

    #[test]
    fn test_month_period_lands_on_first() {
        let anchor = d(2025, 11, 20);
        let cad = Some(RepeatCadence::Month);
        assert_eq!(period_start(anchor, cad, 1, d(2026, 2, 14)), d(2026, 2, 1));
        // Every 2 months from November: Nov, Jan, Mar...
        assert_eq!(period_start(anchor, cad, 2, d(2026, 2, 14)), d(2026, 1, 1));
        assert_eq!(previous_period_start(d(2026, 1, 1), cad, 2), d(2025, 11, 1));
    }

    #[test]
    fn test_year_period_lands_on_january_first() {
        let anchor = d(2024, 6, 1);
        let cad = Some(RepeatCadence::Year);
        assert_eq!(period_start(anchor, cad, 1, d(2026, 3, 3)), d(2026, 1, 1));
        assert_eq!(period_start(anchor, cad, 3, d(2026, 3, 3)), d(2024, 1, 1));
        assert_eq!(previous_period_start(d(2024, 1, 1), cad, 3), d(2021, 1, 1));
    }

    #[test]
    fn test_previous_matches_recomputation() {
        // previousPeriodStart(periodStart(now)) == periodStart(now - 1 unit)
        let anchor = d(2026, 2, 1);
        let cad = Some(RepeatCadence::Day);
        let today = d(2026, 2, 9);
        let cur = period_start(anchor, cad, 3, today);
        let prev = previous_period_start(cur, cad, 3);
        assert_eq!(prev, period_start(anchor, cad, 3, cur - Days::new(1)));
    }

    #[test]
    fn test_zero_every_treated_as_one() {
        let anchor = d(2026, 2, 1);
        assert_eq!(
            period_start(anchor, Some(RepeatCadence::Day), 0, d(2026, 2, 5)),
            d(2026, 2, 5)
        );
    }

    #[test]
    fn test_missing_cadence_degrades_to_today() {
        let today = d(2026, 2, 5);
        assert_eq!(period_start(d(2026, 1, 1), None, 1, today), today);
        assert_eq!(previous_period_start(today, None, 1), today);
    }

    #[test]
    fn test_habit_reset_buckets() {
        let today = d(2026, 2, 18); // Wednesday
        assert_eq!(habit_reset_period_start(today, Cadence::Day), today);
        assert_eq!(habit_reset_period_start(today, Cadence::Week), d(2026, 2, 16));
        assert_eq!(habit_reset_period_start(today, Cadence::Month), d(2026, 2, 1));
        assert_eq!(habit_reset_period_start(today, Cadence::Year), d(2026, 1, 1));
    }
}
