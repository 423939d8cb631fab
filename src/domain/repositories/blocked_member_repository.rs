// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::blocked_member::BlockedMember;
use crate::domain::repositories::job_repository::RepositoryError;
use async_trait::async_trait;

/// 屏蔽关系仓库特质
#[async_trait]
pub trait BlockedMemberRepository: Send + Sync {
    /// 写入屏蔽关系；重复时返回 false
    async fn insert(
        &self,
        channel_id: &str,
        user_id: &str,
        member_id: &str,
    ) -> Result<bool, RepositoryError>;
    /// 删除用户对某成员的全部屏蔽关系
    async fn delete(&self, user_id: &str, member_id: &str) -> Result<u64, RepositoryError>;
    /// 频道内的全部屏蔽关系
    async fn list_for_channel(&self, channel_id: &str)
        -> Result<Vec<BlockedMember>, RepositoryError>;
}
