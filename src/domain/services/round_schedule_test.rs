// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::*;
use chrono::Timelike;

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

#[test]
fn test_parse_weekday_variants() {
    assert_eq!(parse_weekday("Monday").unwrap(), Weekday::Mon);
    assert_eq!(parse_weekday("tue").unwrap(), Weekday::Tue);
    assert_eq!(parse_weekday("Tues").unwrap(), Weekday::Tue);
    assert_eq!(parse_weekday("THURS").unwrap(), Weekday::Thu);
    assert_eq!(parse_weekday("sun").unwrap(), Weekday::Sun);
    assert!(parse_weekday("someday").is_err());
}

#[test]
fn test_first_round_never_returns_now() {
    // 2024-01-01 is a Monday
    let now = at(2024, 1, 1, 10);
    let first = first_round(now, Weekday::Mon, 10).unwrap();

    assert_ne!(first, now);
    assert_eq!(first, at(2024, 1, 8, 10));
}

#[test]
fn test_first_round_later_in_week() {
    let now = at(2024, 1, 1, 10);
    assert_eq!(first_round(now, Weekday::Wed, 9).unwrap(), at(2024, 1, 3, 9));
    assert_eq!(first_round(now, Weekday::Sun, 23).unwrap(), at(2024, 1, 7, 23));
}

#[test]
fn test_first_round_wraps_week() {
    // 2024-01-05 is a Friday
    let now = at(2024, 1, 5, 18);
    assert_eq!(first_round(now, Weekday::Tue, 12).unwrap(), at(2024, 1, 9, 12));
}

#[test]
fn test_first_round_rejects_invalid_hour() {
    assert!(first_round(at(2024, 1, 1, 0), Weekday::Mon, 24).is_err());
}

#[test]
fn test_next_round_biweekly_is_additive() {
    let t = at(2024, 3, 4, 12);
    let mut current = t;
    for step in 1..=3 {
        current = next_round(current, RoundInterval::Biweekly).unwrap();
        assert_eq!(current, t + Duration::days(14 * step));
    }
}

#[test]
fn test_next_round_fixed_intervals() {
    let t = at(2024, 3, 4, 12);
    assert_eq!(next_round(t, RoundInterval::Weekly).unwrap(), t + Duration::days(7));
    assert_eq!(next_round(t, RoundInterval::Triweekly).unwrap(), t + Duration::days(21));
    assert_eq!(next_round(t, RoundInterval::Quadweekly).unwrap(), t + Duration::days(28));
}

#[test]
fn test_next_round_monthly_same_ordinal() {
    // second Monday of January -> second Monday of February
    let t = at(2024, 1, 8, 12);
    assert_eq!(next_round(t, RoundInterval::Monthly).unwrap(), at(2024, 2, 12, 12));
}

#[test]
fn test_next_round_monthly_fourth_becomes_fifth() {
    // fourth Thursday of January 2024; February 2024 has five Thursdays
    let t = at(2024, 1, 25, 9);
    assert_eq!(next_round(t, RoundInterval::Monthly).unwrap(), at(2024, 2, 29, 9));
}

#[test]
fn test_next_round_monthly_crosses_year() {
    let t = at(2024, 12, 2, 15);
    let next = next_round(t, RoundInterval::Monthly).unwrap();
    assert_eq!(next, at(2025, 1, 6, 15));
    assert_eq!(next.hour(), 15);
}

#[test]
fn test_midpoint() {
    let start = at(2024, 1, 1, 0);
    let end = at(2024, 1, 15, 0);
    assert_eq!(midpoint(start, end).unwrap(), at(2024, 1, 8, 0));
}

#[test]
fn test_midpoint_rejects_non_increasing_range() {
    let t = at(2024, 1, 1, 0);
    assert_eq!(midpoint(t, t), Err(DomainError::InvalidTimeRange));
    assert_eq!(
        midpoint(t, t - Duration::hours(1)),
        Err(DomainError::InvalidTimeRange)
    );
}

#[test]
fn test_round_plan_offsets() {
    let current = at(2024, 1, 1, 12);
    let plan = RoundPlan::from_current(current, RoundInterval::Biweekly).unwrap();

    assert_eq!(plan.started_at, current);
    assert_eq!(plan.next_round, at(2024, 1, 15, 12));
    assert_eq!(plan.end_round_at, at(2024, 1, 15, 8));
    assert_eq!(plan.report_stats_at, plan.end_round_at);
}
