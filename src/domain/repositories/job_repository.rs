// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{DomainError, Job, JobStatus, JobType};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
    /// 存储中的值无法映射为领域类型
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl From<DomainError> for RepositoryError {
    fn from(err: DomainError) -> Self {
        RepositoryError::Corrupt(err.to_string())
    }
}

/// 作业查询条件
///
/// 所有条件按 AND 组合；`payload_any` 内部按 OR 组合。
#[derive(Debug, Default, Clone)]
pub struct JobFilter {
    pub job_types: Vec<JobType>,
    pub statuses: Vec<JobStatus>,
    pub is_completed: Option<bool>,
    /// 负载字段必须全部相等
    pub payload_eq: Vec<(&'static str, String)>,
    /// 负载字段至少一个相等
    pub payload_any: Vec<(&'static str, String)>,
    pub due_before: Option<DateTime<Utc>>,
}

impl JobFilter {
    /// 尚未完成的指定类型作业
    pub fn pending(job_types: impl IntoIterator<Item = JobType>) -> Self {
        Self {
            job_types: job_types.into_iter().collect(),
            is_completed: Some(false),
            ..Default::default()
        }
    }

    /// 追加一个负载字段相等条件
    pub fn with_payload(mut self, key: &'static str, value: impl ToString) -> Self {
        self.payload_eq.push((key, value.to_string()));
        self
    }

    /// 追加一个 OR 组内的负载字段条件
    pub fn with_any_payload(mut self, key: &'static str, value: impl ToString) -> Self {
        self.payload_any.push((key, value.to_string()));
        self
    }
}

/// 作业仓库特质
///
/// 定义作业数据访问接口
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// 创建新作业
    async fn create(&self, job: &Job) -> Result<Job, RepositoryError>;
    /// 根据ID查找作业
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>, RepositoryError>;
    /// 更新作业状态、完成标记与执行时间
    async fn update(&self, job: &Job) -> Result<Job, RepositoryError>;
    /// 获取下一个到期作业
    ///
    /// 按优先级降序、执行时间升序选取，并把执行时间推迟 `lease`，
    /// 使其他工作器在租约期内看不到它。
    async fn acquire_next(&self, lease: Duration) -> Result<Option<Job>, RepositoryError>;
    /// 按条件查找作业
    async fn find(&self, filter: &JobFilter) -> Result<Vec<Job>, RepositoryError>;
    /// 按条件统计作业
    async fn count(&self, filter: &JobFilter) -> Result<u64, RepositoryError>;
    /// 取消所有符合条件且未完成的作业
    async fn cancel_matching(&self, filter: &JobFilter) -> Result<u64, RepositoryError>;
}
