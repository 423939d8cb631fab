// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::channel::RoundInterval;
use crate::domain::models::job::DomainError;
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone, Utc, Weekday};

/// 轮次结束（以及统计报告）相对下一轮开始的提前量
pub const ROUND_END_OFFSET: Duration = Duration::hours(4);

/// 轮末见面确认相对下一轮开始的提前量
pub const FINAL_CHECK_OFFSET: Duration = Duration::hours(12);

/// 配对通知后发送破冰提醒的延迟
pub const KICKOFF_DELAY: Duration = Duration::hours(24);

/// 匹配结束后发送汇总报告的延迟
pub const REPORT_MATCHES_DELAY: Duration = Duration::minutes(5);

/// 成员重新激活后尝试迟到匹配的延迟
pub const LATE_MATCH_DELAY: Duration = Duration::minutes(10);

/// 一次“开始轮次”需要的全部时间点
///
/// 所有时间都从同一个 `next_round` 推导，即使某些作业被延迟执行，
/// 整条链仍保持一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundPlan {
    /// 本轮开始时间（推进前频道记录的下一轮时间）
    pub started_at: DateTime<Utc>,
    /// 推进后的下一轮开始时间
    pub next_round: DateTime<Utc>,
    /// 结束本轮的时间
    pub end_round_at: DateTime<Utc>,
    /// 发送统计报告的时间
    pub report_stats_at: DateTime<Utc>,
}

impl RoundPlan {
    /// 根据频道当前记录的下一轮时间生成计划
    pub fn from_current(current: DateTime<Utc>, interval: RoundInterval) -> Result<Self, DomainError> {
        let next_round = next_round(current, interval)?;
        let end_round_at = next_round - ROUND_END_OFFSET;
        Ok(Self {
            started_at: current,
            next_round,
            end_round_at,
            report_stats_at: end_round_at,
        })
    }
}

/// 解析星期名称
///
/// 支持完整名称（Monday）、三字母缩写（Mon）以及 Tues、Thurs，忽略大小写。
pub fn parse_weekday(value: &str) -> Result<Weekday, DomainError> {
    let weekday = match value.to_ascii_lowercase().as_str() {
        "monday" | "mon" => Weekday::Mon,
        "tuesday" | "tue" | "tues" => Weekday::Tue,
        "wednesday" | "wed" => Weekday::Wed,
        "thursday" | "thu" | "thurs" => Weekday::Thu,
        "friday" | "fri" => Weekday::Fri,
        "saturday" | "sat" => Weekday::Sat,
        "sunday" | "sun" => Weekday::Sun,
        _ => {
            return Err(DomainError::InvalidValue {
                kind: "weekday",
                value: value.to_string(),
            })
        }
    };
    Ok(weekday)
}

/// 计算首轮开始时间
///
/// 返回 `now` 之后下一个 `weekday` 的 `hour` 整点（UTC）。
/// `now` 与目标星期相同时推进一整周，因此永远不会返回 `now` 本身。
///
/// # 参数
///
/// * `now` - 当前时间
/// * `weekday` - 目标星期
/// * `hour` - 目标小时，0..=23
pub fn first_round(
    now: DateTime<Utc>,
    weekday: Weekday,
    hour: u32,
) -> Result<DateTime<Utc>, DomainError> {
    let target = i64::from(weekday.num_days_from_monday());
    let current = i64::from(now.weekday().num_days_from_monday());
    let diff = match (target - current).rem_euclid(7) {
        0 => 7,
        d => d,
    };

    let date = now
        .date_naive()
        .checked_add_signed(Duration::days(diff))
        .ok_or(DomainError::DateOutOfRange)?;
    let naive = date.and_hms_opt(hour, 0, 0).ok_or(DomainError::InvalidValue {
        kind: "hour",
        value: hour.to_string(),
    })?;

    Ok(Utc.from_utc_datetime(&naive))
}

/// 计算下一轮开始时间
///
/// 按周计的间隔直接累加天数；月度间隔取下个月中相同序数的同一星期，
/// 序数为4且下个月存在第5个该星期时取第5个。
pub fn next_round(t: DateTime<Utc>, interval: RoundInterval) -> Result<DateTime<Utc>, DomainError> {
    match interval {
        RoundInterval::Monthly => next_month(t),
        _ => t
            .checked_add_signed(Duration::days(interval.days()))
            .ok_or(DomainError::DateOutOfRange),
    }
}

fn next_month(t: DateTime<Utc>) -> Result<DateTime<Utc>, DomainError> {
    let weekday = t.weekday();
    let mut ordinal = (t.day() - 1) / 7 + 1;

    let first_of_month = NaiveDate::from_ymd_opt(t.year(), t.month(), 1)
        .and_then(|d| d.checked_add_months(Months::new(1)))
        .ok_or(DomainError::DateOutOfRange)?;

    let offset = (i64::from(weekday.num_days_from_monday())
        - i64::from(first_of_month.weekday().num_days_from_monday()))
    .rem_euclid(7);
    let first_weekday = first_of_month + Duration::days(offset);

    let has_fifth = (first_weekday + Duration::days(28)).month() == first_weekday.month();
    match ordinal {
        4 if has_fifth => ordinal = 5,
        5 if !has_fifth => ordinal = 4,
        _ => {}
    }

    let date = first_weekday + Duration::days(i64::from(ordinal - 1) * 7);
    Ok(Utc.from_utc_datetime(&date.and_time(t.time())))
}

/// 计算两个时间点的中点
///
/// `end` 不晚于 `start` 时返回错误，不做截断。
pub fn midpoint(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<DateTime<Utc>, DomainError> {
    if end <= start {
        return Err(DomainError::InvalidTimeRange);
    }
    Ok(start + (end - start) / 2)
}

#[cfg(test)]
#[path = "round_schedule_test.rs"]
mod tests;
