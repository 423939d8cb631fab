// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 匹配实体
///
/// 一轮中产生的一次配对，恰好被两条 Pairing 引用。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: Uuid,
    pub round_id: Uuid,
    /// 为这对成员创建的群组会话ID
    pub mpim_id: Option<String>,
    pub has_met: bool,
    pub was_notified: bool,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

/// 配对关联，把一个成员挂到一次匹配上
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pairing {
    pub match_id: Uuid,
    pub member_id: Uuid,
    pub round_id: Uuid,
    pub created_at: DateTime<FixedOffset>,
}

/// 候选配对 (participant, partner)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidatePair {
    pub participant: String,
    pub partner: String,
}

impl CandidatePair {
    pub fn new(participant: impl Into<String>, partner: impl Into<String>) -> Self {
        Self {
            participant: participant.into(),
            partner: partner.into(),
        }
    }
}

/// 分组匹配的结果
///
/// `participants`、`pairs` 与 `unmatched` 的数量是报告所依赖的契约。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingOutcome {
    /// 参与匹配的全部成员
    pub participants: Vec<String>,
    /// 形成的配对，按参与者排序
    pub pairs: Vec<CandidatePair>,
    /// 未能配对的成员
    pub unmatched: Vec<String>,
}

impl MatchingOutcome {
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    pub fn unmatched_count(&self) -> usize {
        self.unmatched.len()
    }
}
