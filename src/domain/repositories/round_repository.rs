// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::round::Round;
use crate::domain::repositories::job_repository::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 轮次仓库特质
#[async_trait]
pub trait RoundRepository: Send + Sync {
    /// 为频道创建活跃轮次，已有活跃轮次时返回它与 false
    async fn insert_or_fetch_active(
        &self,
        channel_id: &str,
        started_at: DateTime<Utc>,
    ) -> Result<(Round, bool), RepositoryError>;
    /// 频道当前的活跃轮次
    async fn find_active(&self, channel_id: &str) -> Result<Option<Round>, RepositoryError>;
    /// 频道最近一次开始的轮次（无论是否结束）
    async fn find_latest(&self, channel_id: &str) -> Result<Option<Round>, RepositoryError>;
    /// 结束频道的活跃轮次
    async fn end_active(&self, channel_id: &str) -> Result<u64, RepositoryError>;
    /// 增加本轮不活跃人数
    async fn increment_inactive(&self, round_id: Uuid, by: i32) -> Result<(), RepositoryError>;
}
