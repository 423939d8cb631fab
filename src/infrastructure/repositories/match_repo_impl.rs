// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::matching::Match;
use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::repositories::match_repository::{MatchRepository, RoundStats};
use crate::infrastructure::database::entities::{matches as match_entity, member, pairing};
use crate::infrastructure::repositories::channel_repo_impl::is_unique_violation;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::{Expr, SimpleExpr},
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

/// 匹配仓库实现
#[derive(Clone)]
pub struct MatchRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl MatchRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn update_column(
        &self,
        id: Uuid,
        column: match_entity::Column,
        value: SimpleExpr,
    ) -> Result<u64, RepositoryError> {
        let now: DateTime<FixedOffset> = Utc::now().into();

        let result = match_entity::Entity::update_many()
            .col_expr(column, value)
            .col_expr(match_entity::Column::UpdatedAt, Expr::value(now))
            .filter(match_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected)
    }
}

impl From<match_entity::Model> for Match {
    fn from(model: match_entity::Model) -> Self {
        Self {
            id: model.id,
            round_id: model.round_id,
            mpim_id: model.mpim_id,
            has_met: model.has_met,
            was_notified: model.was_notified,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[async_trait]
impl MatchRepository for MatchRepositoryImpl {
    async fn create(&self, round_id: Uuid) -> Result<Match, RepositoryError> {
        let now: DateTime<FixedOffset> = Utc::now().into();
        let model = match_entity::ActiveModel {
            id: Set(Uuid::new_v4()),
            round_id: Set(round_id),
            mpim_id: Set(None),
            has_met: Set(false),
            was_notified: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = model.insert(self.db.as_ref()).await?;
        Ok(inserted.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Match>, RepositoryError> {
        let model = match_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn set_conversation(&self, id: Uuid, mpim_id: &str) -> Result<(), RepositoryError> {
        let rows = self
            .update_column(
                id,
                match_entity::Column::MpimId,
                Expr::value(Some(mpim_id.to_string())),
            )
            .await?;
        if rows == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn mark_notified(&self, id: Uuid) -> Result<(), RepositoryError> {
        let rows = self
            .update_column(id, match_entity::Column::WasNotified, Expr::value(true))
            .await?;
        if rows == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn set_has_met(&self, id: Uuid, has_met: bool) -> Result<u64, RepositoryError> {
        self.update_column(id, match_entity::Column::HasMet, Expr::value(has_met))
            .await
    }

    async fn create_pairings(
        &self,
        match_id: Uuid,
        round_id: Uuid,
        member_ids: &[Uuid],
    ) -> Result<bool, RepositoryError> {
        let now: DateTime<FixedOffset> = Utc::now().into();
        let txn = self.db.begin().await?;

        for member_id in member_ids {
            let model = pairing::ActiveModel {
                match_id: Set(match_id),
                member_id: Set(*member_id),
                round_id: Set(round_id),
                created_at: Set(now),
            };

            match pairing::Entity::insert(model).exec(&txn).await {
                Ok(_) => {}
                Err(err) if is_unique_violation(&err) => {
                    txn.rollback().await?;
                    return Ok(false);
                }
                Err(err) => return Err(err.into()),
            }
        }

        txn.commit().await?;
        Ok(true)
    }

    async fn participants(&self, match_id: Uuid) -> Result<Vec<String>, RepositoryError> {
        let user_ids = member::Entity::find()
            .inner_join(pairing::Entity)
            .filter(pairing::Column::MatchId.eq(match_id))
            .select_only()
            .column(member::Column::UserId)
            .order_by_asc(member::Column::UserId)
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await?;
        Ok(user_ids)
    }

    async fn round_stats(&self, round_id: Uuid) -> Result<RoundStats, RepositoryError> {
        let total = match_entity::Entity::find()
            .filter(match_entity::Column::RoundId.eq(round_id))
            .count(self.db.as_ref())
            .await?;
        let met = match_entity::Entity::find()
            .filter(match_entity::Column::RoundId.eq(round_id))
            .filter(match_entity::Column::HasMet.eq(true))
            .count(self.db.as_ref())
            .await?;

        Ok(RoundStats { total, met })
    }
}
