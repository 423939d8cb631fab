// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::channel::Channel;
use crate::domain::repositories::job_repository::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// 频道仓库特质
#[async_trait]
pub trait ChannelRepository: Send + Sync {
    /// 插入频道，已存在时返回现有记录
    ///
    /// # 返回值
    ///
    /// * `Ok((Channel, true))` - 新建
    /// * `Ok((Channel, false))` - 已存在
    async fn insert_or_fetch(&self, channel: &Channel) -> Result<(Channel, bool), RepositoryError>;
    /// 根据ID查找频道
    async fn find_by_id(&self, channel_id: &str) -> Result<Option<Channel>, RepositoryError>;
    /// 频道是否存在
    async fn exists(&self, channel_id: &str) -> Result<bool, RepositoryError>;
    /// 全部频道ID
    async fn list_ids(&self) -> Result<Vec<String>, RepositoryError>;
    /// 更新频道设置
    async fn update(&self, channel: &Channel) -> Result<Channel, RepositoryError>;
    /// 更新下一轮开始时间
    async fn update_next_round(
        &self,
        channel_id: &str,
        next_round: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
    /// 删除频道
    async fn delete(&self, channel_id: &str) -> Result<u64, RepositoryError>;
}
