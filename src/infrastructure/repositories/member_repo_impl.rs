// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::member::Member;
use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::repositories::member_repository::MemberRepository;
use crate::infrastructure::database::entities::{member as member_entity, pairing};
use crate::infrastructure::repositories::channel_repo_impl::is_unique_violation;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::{Expr, Query},
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 成员仓库实现
#[derive(Clone)]
pub struct MemberRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl MemberRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl TryFrom<member_entity::Model> for Member {
    type Error = RepositoryError;

    fn try_from(model: member_entity::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            channel_id: model.channel_id,
            user_id: model.user_id,
            gender: model.gender.parse()?,
            has_gender_preference: model.has_gender_preference,
            connection_mode: model.connection_mode.parse()?,
            is_active: model.is_active,
            profile: model.profile,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl From<Member> for member_entity::ActiveModel {
    fn from(member: Member) -> Self {
        Self {
            id: Set(member.id),
            channel_id: Set(member.channel_id),
            user_id: Set(member.user_id),
            gender: Set(member.gender.to_string()),
            has_gender_preference: Set(member.has_gender_preference),
            connection_mode: Set(member.connection_mode.to_string()),
            is_active: Set(member.is_active),
            profile: Set(member.profile),
            created_at: Set(member.created_at),
            updated_at: Set(member.updated_at),
        }
    }
}

fn to_members(models: Vec<member_entity::Model>) -> Result<Vec<Member>, RepositoryError> {
    models.into_iter().map(Member::try_from).collect()
}

#[async_trait]
impl MemberRepository for MemberRepositoryImpl {
    async fn insert_or_fetch(&self, member: &Member) -> Result<(Member, bool), RepositoryError> {
        let model: member_entity::ActiveModel = member.clone().into();

        match model.insert(self.db.as_ref()).await {
            Ok(inserted) => Ok((inserted.try_into()?, true)),
            Err(err) if is_unique_violation(&err) => {
                let existing = self
                    .find(&member.channel_id, &member.user_id)
                    .await?
                    .ok_or(RepositoryError::NotFound)?;
                Ok((existing, false))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find(&self, channel_id: &str, user_id: &str) -> Result<Option<Member>, RepositoryError> {
        let model = member_entity::Entity::find()
            .filter(member_entity::Column::ChannelId.eq(channel_id))
            .filter(member_entity::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await?;

        model.map(Member::try_from).transpose()
    }

    async fn list_user_ids(&self, channel_id: &str) -> Result<Vec<String>, RepositoryError> {
        let ids = member_entity::Entity::find()
            .select_only()
            .column(member_entity::Column::UserId)
            .filter(member_entity::Column::ChannelId.eq(channel_id))
            .order_by_asc(member_entity::Column::UserId)
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await?;
        Ok(ids)
    }

    async fn list_active(&self, channel_id: &str) -> Result<Vec<Member>, RepositoryError> {
        let models = member_entity::Entity::find()
            .filter(member_entity::Column::ChannelId.eq(channel_id))
            .filter(member_entity::Column::IsActive.eq(true))
            .order_by_asc(member_entity::Column::UserId)
            .all(self.db.as_ref())
            .await?;

        to_members(models)
    }

    async fn list_unpaired_active(
        &self,
        channel_id: &str,
        round_id: Uuid,
    ) -> Result<Vec<Member>, RepositoryError> {
        let paired = Query::select()
            .column(pairing::Column::MemberId)
            .from(pairing::Entity)
            .and_where(pairing::Column::RoundId.eq(round_id))
            .to_owned();

        let models = member_entity::Entity::find()
            .filter(member_entity::Column::ChannelId.eq(channel_id))
            .filter(member_entity::Column::IsActive.eq(true))
            .filter(member_entity::Column::Id.not_in_subquery(paired))
            .order_by_asc(member_entity::Column::UserId)
            .all(self.db.as_ref())
            .await?;

        to_members(models)
    }

    async fn channels_of_user(&self, user_id: &str) -> Result<Vec<String>, RepositoryError> {
        let ids = member_entity::Entity::find()
            .select_only()
            .column(member_entity::Column::ChannelId)
            .filter(member_entity::Column::UserId.eq(user_id))
            .order_by_asc(member_entity::Column::ChannelId)
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await?;
        Ok(ids)
    }

    async fn update(&self, member: &Member) -> Result<Member, RepositoryError> {
        let mut model: member_entity::ActiveModel = member.clone().into();
        model.updated_at = Set(Utc::now().into());

        match model.update(self.db.as_ref()).await {
            Ok(updated) => updated.try_into(),
            Err(DbErr::RecordNotUpdated) => Err(RepositoryError::NotFound),
            Err(err) => Err(err.into()),
        }
    }

    async fn set_active(
        &self,
        channel_id: &str,
        user_id: &str,
        is_active: bool,
    ) -> Result<u64, RepositoryError> {
        let now: DateTime<FixedOffset> = Utc::now().into();

        let result = member_entity::Entity::update_many()
            .col_expr(member_entity::Column::IsActive, Expr::value(is_active))
            .col_expr(member_entity::Column::UpdatedAt, Expr::value(now))
            .filter(member_entity::Column::ChannelId.eq(channel_id))
            .filter(member_entity::Column::UserId.eq(user_id))
            .filter(member_entity::Column::IsActive.ne(is_active))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected)
    }

    async fn delete(&self, channel_id: &str, user_id: &str) -> Result<u64, RepositoryError> {
        let result = member_entity::Entity::delete_many()
            .filter(member_entity::Column::ChannelId.eq(channel_id))
            .filter(member_entity::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }
}
