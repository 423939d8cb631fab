// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 轮次实体
///
/// 每个频道同一时间最多只有一个 has_ended = false 的轮次。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub id: Uuid,
    pub channel_id: String,
    pub has_ended: bool,
    /// 本轮被标记为不活跃的参与者数量
    pub inactive_users: i32,
    /// 本轮计划的开始时间
    pub started_at: DateTime<FixedOffset>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}
