// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::job::{Job, JobStatus};
use crate::domain::repositories::job_repository::{JobFilter, JobRepository, RepositoryError};
use crate::infrastructure::database::entities::job as job_entity;
use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use sea_orm::{
    sea_query::{Expr, LockBehavior, LockType, SimpleExpr},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

/// 作业仓库实现
///
/// 基于SeaORM实现的作业数据访问层
#[derive(Clone)]
pub struct JobRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl JobRepositoryImpl {
    /// 创建新的作业仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    ///
    /// # 返回值
    ///
    /// 返回新的作业仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl TryFrom<job_entity::Model> for Job {
    type Error = RepositoryError;

    fn try_from(model: job_entity::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            job_type: model.job_type.parse()?,
            priority: model.priority,
            status: model.status.parse()?,
            is_completed: model.is_completed,
            data: model.data,
            exec_at: model.exec_at,
            attempt_count: model.attempt_count,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl From<Job> for job_entity::ActiveModel {
    fn from(job: Job) -> Self {
        Self {
            id: Set(job.id),
            job_type: Set(job.job_type.to_string()),
            priority: Set(job.priority),
            status: Set(job.status.to_string()),
            is_completed: Set(job.is_completed),
            data: Set(job.data),
            exec_at: Set(job.exec_at),
            attempt_count: Set(job.attempt_count),
            created_at: Set(job.created_at),
            updated_at: Set(job.updated_at),
        }
    }
}

fn now_fixed() -> DateTime<FixedOffset> {
    Utc::now().into()
}

/// 负载字段相等条件
///
/// 字段名只来自代码中的常量，值通过参数绑定。
fn payload_field_eq(key: &'static str, value: &str) -> SimpleExpr {
    Expr::cust_with_values(format!("data->>'{}' = ?", key), vec![value.to_string()])
}

fn filter_condition(filter: &JobFilter) -> Condition {
    let mut condition = Condition::all();

    if !filter.job_types.is_empty() {
        condition = condition.add(
            job_entity::Column::JobType.is_in(filter.job_types.iter().map(|t| t.as_str())),
        );
    }

    if !filter.statuses.is_empty() {
        condition = condition.add(
            job_entity::Column::Status.is_in(filter.statuses.iter().map(|s| s.to_string())),
        );
    }

    if let Some(is_completed) = filter.is_completed {
        condition = condition.add(job_entity::Column::IsCompleted.eq(is_completed));
    }

    for (key, value) in &filter.payload_eq {
        condition = condition.add(payload_field_eq(*key, value));
    }

    if !filter.payload_any.is_empty() {
        let any = filter
            .payload_any
            .iter()
            .fold(Condition::any(), |any, (key, value)| {
                any.add(payload_field_eq(*key, value))
            });
        condition = condition.add(any);
    }

    if let Some(due_before) = filter.due_before {
        let due_before: DateTime<FixedOffset> = due_before.into();
        condition = condition.add(job_entity::Column::ExecAt.lte(due_before));
    }

    condition
}

#[async_trait]
impl JobRepository for JobRepositoryImpl {
    async fn create(&self, job: &Job) -> Result<Job, RepositoryError> {
        let model: job_entity::ActiveModel = job.clone().into();

        model.insert(self.db.as_ref()).await?;
        Ok(job.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>, RepositoryError> {
        let model = job_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        model.map(Job::try_from).transpose()
    }

    async fn update(&self, job: &Job) -> Result<Job, RepositoryError> {
        let mut model: job_entity::ActiveModel = job.clone().into();
        model.updated_at = Set(now_fixed());

        match model.update(self.db.as_ref()).await {
            Ok(updated) => updated.try_into(),
            Err(DbErr::RecordNotUpdated) => Err(RepositoryError::NotFound),
            Err(err) => Err(err.into()),
        }
    }

    async fn acquire_next(&self, lease: Duration) -> Result<Option<Job>, RepositoryError> {
        let txn = self.db.begin().await?;
        let now = Utc::now();

        let job = job_entity::Entity::find()
            .filter(job_entity::Column::IsCompleted.eq(false))
            .filter(job_entity::Column::Status.is_in([
                JobStatus::Pending.to_string(),
                JobStatus::Errored.to_string(),
            ]))
            .filter(job_entity::Column::ExecAt.lte(DateTime::<FixedOffset>::from(now)))
            .order_by_desc(job_entity::Column::Priority)
            .order_by_asc(job_entity::Column::ExecAt)
            .lock_with_behavior(LockType::Update, LockBehavior::SkipLocked)
            .one(&txn)
            .await?;

        let Some(job) = job else {
            txn.commit().await?;
            return Ok(None);
        };

        // Lease: push the job out of the due window so that other workers skip it
        // until the lease expires or the job settles.
        let mut active: job_entity::ActiveModel = job.into();
        let current_attempt = *active.attempt_count.as_ref();
        active.attempt_count = Set(current_attempt + 1);
        active.exec_at = Set((now + lease).into());
        active.updated_at = Set(now.into());

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        Ok(Some(updated.try_into()?))
    }

    async fn find(&self, filter: &JobFilter) -> Result<Vec<Job>, RepositoryError> {
        let models = job_entity::Entity::find()
            .filter(filter_condition(filter))
            .order_by_asc(job_entity::Column::ExecAt)
            .all(self.db.as_ref())
            .await?;

        models.into_iter().map(Job::try_from).collect()
    }

    async fn count(&self, filter: &JobFilter) -> Result<u64, RepositoryError> {
        let count = job_entity::Entity::find()
            .filter(filter_condition(filter))
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }

    async fn cancel_matching(&self, filter: &JobFilter) -> Result<u64, RepositoryError> {
        let result = job_entity::Entity::update_many()
            .col_expr(
                job_entity::Column::Status,
                Expr::value(JobStatus::Canceled.to_string()),
            )
            .col_expr(job_entity::Column::IsCompleted, Expr::value(true))
            .col_expr(job_entity::Column::UpdatedAt, Expr::value(now_fixed()))
            .filter(filter_condition(filter))
            .filter(job_entity::Column::IsCompleted.eq(false))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[path = "job_repo_impl_test.rs"]
mod tests;
