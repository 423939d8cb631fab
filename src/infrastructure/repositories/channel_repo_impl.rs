// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::channel::Channel;
use crate::domain::repositories::channel_repository::ChannelRepository;
use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::services::round_schedule::parse_weekday;
use crate::infrastructure::database::entities::channel as channel_entity;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use std::sync::Arc;

/// 频道仓库实现
#[derive(Clone)]
pub struct ChannelRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl ChannelRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl TryFrom<channel_entity::Model> for Channel {
    type Error = RepositoryError;

    fn try_from(model: channel_entity::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            channel_id: model.channel_id,
            inviter: model.inviter,
            connection_mode: model.connection_mode.parse()?,
            interval: model.interval.parse()?,
            weekday: parse_weekday(&model.weekday)?,
            hour: u32::try_from(model.hour)
                .map_err(|_| RepositoryError::Corrupt(format!("hour {}", model.hour)))?,
            next_round: model.next_round,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl From<Channel> for channel_entity::ActiveModel {
    fn from(channel: Channel) -> Self {
        Self {
            channel_id: Set(channel.channel_id),
            inviter: Set(channel.inviter),
            connection_mode: Set(channel.connection_mode.to_string()),
            interval: Set(channel.interval.to_string()),
            weekday: Set(channel.weekday.to_string()),
            hour: Set(channel.hour as i32),
            next_round: Set(channel.next_round),
            created_at: Set(channel.created_at),
            updated_at: Set(channel.updated_at),
        }
    }
}

/// 插入冲突判断
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[async_trait]
impl ChannelRepository for ChannelRepositoryImpl {
    async fn insert_or_fetch(&self, channel: &Channel) -> Result<(Channel, bool), RepositoryError> {
        let model: channel_entity::ActiveModel = channel.clone().into();

        match model.insert(self.db.as_ref()).await {
            Ok(inserted) => Ok((inserted.try_into()?, true)),
            Err(err) if is_unique_violation(&err) => {
                let existing = self
                    .find_by_id(&channel.channel_id)
                    .await?
                    .ok_or(RepositoryError::NotFound)?;
                Ok((existing, false))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_id(&self, channel_id: &str) -> Result<Option<Channel>, RepositoryError> {
        let model = channel_entity::Entity::find_by_id(channel_id.to_string())
            .one(self.db.as_ref())
            .await?;

        model.map(Channel::try_from).transpose()
    }

    async fn exists(&self, channel_id: &str) -> Result<bool, RepositoryError> {
        let count = channel_entity::Entity::find()
            .filter(channel_entity::Column::ChannelId.eq(channel_id))
            .count(self.db.as_ref())
            .await?;
        Ok(count > 0)
    }

    async fn list_ids(&self) -> Result<Vec<String>, RepositoryError> {
        let ids = channel_entity::Entity::find()
            .select_only()
            .column(channel_entity::Column::ChannelId)
            .order_by_asc(channel_entity::Column::ChannelId)
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await?;
        Ok(ids)
    }

    async fn update(&self, channel: &Channel) -> Result<Channel, RepositoryError> {
        let mut model: channel_entity::ActiveModel = channel.clone().into();
        model.updated_at = Set(Utc::now().into());

        match model.update(self.db.as_ref()).await {
            Ok(updated) => updated.try_into(),
            Err(DbErr::RecordNotUpdated) => Err(RepositoryError::NotFound),
            Err(err) => Err(err.into()),
        }
    }

    async fn update_next_round(
        &self,
        channel_id: &str,
        next_round: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let next_round: DateTime<FixedOffset> = next_round.into();
        let now: DateTime<FixedOffset> = Utc::now().into();

        let result = channel_entity::Entity::update_many()
            .col_expr(channel_entity::Column::NextRound, Expr::value(next_round))
            .col_expr(channel_entity::Column::UpdatedAt, Expr::value(now))
            .filter(channel_entity::Column::ChannelId.eq(channel_id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, channel_id: &str) -> Result<u64, RepositoryError> {
        let result = channel_entity::Entity::delete_many()
            .filter(channel_entity::Column::ChannelId.eq(channel_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }
}
