// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::member::Member;
use crate::domain::repositories::job_repository::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 成员仓库特质
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// 插入成员，(channel_id, user_id) 已存在时返回现有记录与 false
    async fn insert_or_fetch(&self, member: &Member) -> Result<(Member, bool), RepositoryError>;
    /// 查找频道内的成员
    async fn find(&self, channel_id: &str, user_id: &str)
        -> Result<Option<Member>, RepositoryError>;
    /// 频道内全部成员的用户ID
    async fn list_user_ids(&self, channel_id: &str) -> Result<Vec<String>, RepositoryError>;
    /// 频道内全部活跃成员
    async fn list_active(&self, channel_id: &str) -> Result<Vec<Member>, RepositoryError>;
    /// 频道内本轮尚未配对的活跃成员
    async fn list_unpaired_active(
        &self,
        channel_id: &str,
        round_id: Uuid,
    ) -> Result<Vec<Member>, RepositoryError>;
    /// 用户所属的全部频道
    async fn channels_of_user(&self, user_id: &str) -> Result<Vec<String>, RepositoryError>;
    /// 更新成员
    async fn update(&self, member: &Member) -> Result<Member, RepositoryError>;
    /// 设置活跃标记，返回实际发生变化的行数
    async fn set_active(
        &self,
        channel_id: &str,
        user_id: &str,
        is_active: bool,
    ) -> Result<u64, RepositoryError>;
    /// 删除成员
    async fn delete(&self, channel_id: &str, user_id: &str) -> Result<u64, RepositoryError>;
}
