// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::round::Round;
use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::repositories::round_repository::RoundRepository;
use crate::infrastructure::database::entities::round as round_entity;
use crate::infrastructure::repositories::channel_repo_impl::is_unique_violation;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 轮次仓库实现
///
/// 活跃轮次的唯一性由部分唯一索引保证，
/// 并发创建时落败的一方会读到胜出方的记录。
#[derive(Clone)]
pub struct RoundRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl RoundRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<round_entity::Model> for Round {
    fn from(model: round_entity::Model) -> Self {
        Self {
            id: model.id,
            channel_id: model.channel_id,
            has_ended: model.has_ended,
            inactive_users: model.inactive_users,
            started_at: model.started_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[async_trait]
impl RoundRepository for RoundRepositoryImpl {
    async fn insert_or_fetch_active(
        &self,
        channel_id: &str,
        started_at: DateTime<Utc>,
    ) -> Result<(Round, bool), RepositoryError> {
        let now: DateTime<FixedOffset> = Utc::now().into();
        let model = round_entity::ActiveModel {
            id: Set(Uuid::new_v4()),
            channel_id: Set(channel_id.to_string()),
            has_ended: Set(false),
            inactive_users: Set(0),
            started_at: Set(started_at.into()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match model.insert(self.db.as_ref()).await {
            Ok(inserted) => Ok((inserted.into(), true)),
            Err(err) if is_unique_violation(&err) => {
                let existing = self
                    .find_active(channel_id)
                    .await?
                    .ok_or(RepositoryError::NotFound)?;
                Ok((existing, false))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_active(&self, channel_id: &str) -> Result<Option<Round>, RepositoryError> {
        let model = round_entity::Entity::find()
            .filter(round_entity::Column::ChannelId.eq(channel_id))
            .filter(round_entity::Column::HasEnded.eq(false))
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn find_latest(&self, channel_id: &str) -> Result<Option<Round>, RepositoryError> {
        let model = round_entity::Entity::find()
            .filter(round_entity::Column::ChannelId.eq(channel_id))
            .order_by_desc(round_entity::Column::StartedAt)
            .order_by_desc(round_entity::Column::CreatedAt)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn end_active(&self, channel_id: &str) -> Result<u64, RepositoryError> {
        let now: DateTime<FixedOffset> = Utc::now().into();

        let result = round_entity::Entity::update_many()
            .col_expr(round_entity::Column::HasEnded, Expr::value(true))
            .col_expr(round_entity::Column::UpdatedAt, Expr::value(now))
            .filter(round_entity::Column::ChannelId.eq(channel_id))
            .filter(round_entity::Column::HasEnded.eq(false))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected)
    }

    async fn increment_inactive(&self, round_id: Uuid, by: i32) -> Result<(), RepositoryError> {
        let now: DateTime<FixedOffset> = Utc::now().into();

        round_entity::Entity::update_many()
            .col_expr(
                round_entity::Column::InactiveUsers,
                Expr::col(round_entity::Column::InactiveUsers).add(by),
            )
            .col_expr(round_entity::Column::UpdatedAt, Expr::value(now))
            .filter(round_entity::Column::Id.eq(round_id))
            .exec(self.db.as_ref())
            .await?;

        Ok(())
    }
}
