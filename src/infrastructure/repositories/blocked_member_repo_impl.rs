// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::blocked_member::BlockedMember;
use crate::domain::repositories::blocked_member_repository::BlockedMemberRepository;
use crate::domain::repositories::job_repository::RepositoryError;
use crate::infrastructure::database::entities::blocked_member as blocked_entity;
use crate::infrastructure::repositories::channel_repo_impl::is_unique_violation;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use uuid::Uuid;

/// 屏蔽关系仓库实现
#[derive(Clone)]
pub struct BlockedMemberRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl BlockedMemberRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<blocked_entity::Model> for BlockedMember {
    fn from(model: blocked_entity::Model) -> Self {
        Self {
            id: model.id,
            channel_id: model.channel_id,
            user_id: model.user_id,
            member_id: model.member_id,
            created_at: model.created_at,
        }
    }
}

#[async_trait]
impl BlockedMemberRepository for BlockedMemberRepositoryImpl {
    async fn insert(
        &self,
        channel_id: &str,
        user_id: &str,
        member_id: &str,
    ) -> Result<bool, RepositoryError> {
        let model = blocked_entity::ActiveModel {
            id: Set(Uuid::new_v4()),
            channel_id: Set(channel_id.to_string()),
            user_id: Set(user_id.to_string()),
            member_id: Set(member_id.to_string()),
            created_at: Set(Utc::now().into()),
        };

        match model.insert(self.db.as_ref()).await {
            Ok(_) => Ok(true),
            Err(err) if is_unique_violation(&err) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, user_id: &str, member_id: &str) -> Result<u64, RepositoryError> {
        let result = blocked_entity::Entity::delete_many()
            .filter(blocked_entity::Column::UserId.eq(user_id))
            .filter(blocked_entity::Column::MemberId.eq(member_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }

    async fn list_for_channel(
        &self,
        channel_id: &str,
    ) -> Result<Vec<BlockedMember>, RepositoryError> {
        let models = blocked_entity::Entity::find()
            .filter(blocked_entity::Column::ChannelId.eq(channel_id))
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }
}
