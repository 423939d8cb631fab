// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::matching::Match;
use crate::domain::repositories::job_repository::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 轮次统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundStats {
    /// 匹配总数
    pub total: u64,
    /// 已见面的匹配数
    pub met: u64,
}

impl RoundStats {
    /// 见面比例（百分比，保留整数）
    pub fn percent(&self) -> u64 {
        if self.total == 0 {
            0
        } else {
            self.met * 100 / self.total
        }
    }
}

/// 匹配仓库特质
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// 为轮次创建一条匹配
    async fn create(&self, round_id: Uuid) -> Result<Match, RepositoryError>;
    /// 根据ID查找匹配
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Match>, RepositoryError>;
    /// 记录群组会话ID
    async fn set_conversation(&self, id: Uuid, mpim_id: &str) -> Result<(), RepositoryError>;
    /// 标记已通知
    async fn mark_notified(&self, id: Uuid) -> Result<(), RepositoryError>;
    /// 设置是否见面
    async fn set_has_met(&self, id: Uuid, has_met: bool) -> Result<u64, RepositoryError>;
    /// 为匹配写入配对行
    ///
    /// 在同一事务内写入；任一成员本轮已配对时不写入任何行并返回 false。
    async fn create_pairings(
        &self,
        match_id: Uuid,
        round_id: Uuid,
        member_ids: &[Uuid],
    ) -> Result<bool, RepositoryError>;
    /// 匹配涉及的用户ID
    async fn participants(&self, match_id: Uuid) -> Result<Vec<String>, RepositoryError>;
    /// 轮次统计
    async fn round_stats(&self, round_id: Uuid) -> Result<RoundStats, RepositoryError>;
}
