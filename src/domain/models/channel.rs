// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::DomainError;
use crate::domain::models::member::ConnectionMode;
use chrono::{DateTime, FixedOffset, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 频道实体
///
/// 启用了 chat-roulette 的群组频道，保存轮次的周期配置
/// 以及下一轮的开始时间。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// 平台上的频道ID
    pub channel_id: String,
    /// 启用该频道的成员
    pub inviter: String,
    /// 频道默认的见面方式
    pub connection_mode: ConnectionMode,
    /// 轮次间隔
    pub interval: RoundInterval,
    /// 轮次开始的星期
    pub weekday: Weekday,
    /// 轮次开始的小时（UTC）
    pub hour: u32,
    /// 下一轮的开始时间
    pub next_round: DateTime<FixedOffset>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

/// 轮次间隔枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoundInterval {
    Weekly,
    #[default]
    Biweekly,
    Triweekly,
    Quadweekly,
    Monthly,
}

impl RoundInterval {
    /// 间隔对应的天数
    ///
    /// 月度间隔的实际推进按日历规则计算，这里的30天只用于估算。
    pub fn days(&self) -> i64 {
        match self {
            RoundInterval::Weekly => 7,
            RoundInterval::Biweekly => 14,
            RoundInterval::Triweekly => 21,
            RoundInterval::Quadweekly => 28,
            RoundInterval::Monthly => 30,
        }
    }
}

impl fmt::Display for RoundInterval {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RoundInterval::Weekly => write!(f, "weekly"),
            RoundInterval::Biweekly => write!(f, "biweekly"),
            RoundInterval::Triweekly => write!(f, "triweekly"),
            RoundInterval::Quadweekly => write!(f, "quadweekly"),
            RoundInterval::Monthly => write!(f, "monthly"),
        }
    }
}

impl FromStr for RoundInterval {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(RoundInterval::Weekly),
            "biweekly" => Ok(RoundInterval::Biweekly),
            "triweekly" => Ok(RoundInterval::Triweekly),
            "quadweekly" => Ok(RoundInterval::Quadweekly),
            "monthly" => Ok(RoundInterval::Monthly),
            _ => Err(DomainError::InvalidValue {
                kind: "interval",
                value: s.to_string(),
            }),
        }
    }
}
