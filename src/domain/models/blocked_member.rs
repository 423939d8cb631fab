// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 屏蔽关系
///
/// (channel, user, member) 表示 user 在该频道内不希望与 member 匹配。
/// 匹配时按双向处理。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedMember {
    pub id: Uuid,
    pub channel_id: String,
    pub user_id: String,
    pub member_id: String,
    pub created_at: DateTime<FixedOffset>,
}

impl BlockedMember {
    /// 该屏蔽关系是否排除 a 与 b 的配对（不区分方向）
    pub fn excludes(&self, a: &str, b: &str) -> bool {
        (self.user_id == a && self.member_id == b) || (self.user_id == b && self.member_id == a)
    }
}
