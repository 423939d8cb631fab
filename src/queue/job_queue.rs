// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{DomainError, Job, JobPriority, JobType};
use crate::domain::repositories::job_repository::{JobFilter, JobRepository, RepositoryError};
use crate::utils::errors::JobError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// 队列错误类型
#[derive(Error, Debug)]
pub enum QueueError {
    /// 参数序列化失败
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 仓库错误
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// 作业状态不允许该操作
    #[error("Invalid job state: {0}")]
    State(#[from] DomainError),
}

/// 作业参数
///
/// 每种作业类型对应一个参数结构，声明自己的类型、默认优先级，
/// 以及（如有）所属频道。分发器通过 `channel_id` 校验频道是否存在。
pub trait JobParams: Serialize + DeserializeOwned + Send + Sync + 'static {
    const JOB_TYPE: JobType;
    const PRIORITY: JobPriority;

    /// 参数所引用的频道
    fn channel_id(&self) -> Option<&str> {
        None
    }
}

/// 作业队列特质
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// 写入一个作业，返回其ID
    async fn enqueue_job(&self, job: Job) -> Result<Uuid, QueueError>;

    /// 取出下一个到期作业，并在 `lease` 内对其他工作器隐藏
    async fn dequeue(&self, lease: Duration) -> Result<Option<Job>, QueueError>;

    /// 标记成功
    async fn complete(&self, job: Job) -> Result<Job, QueueError>;

    /// 标记为不可重试的失败
    async fn fail(&self, job: Job) -> Result<Job, QueueError>;

    /// 取消单个作业
    async fn cancel(&self, job: Job) -> Result<Job, QueueError>;

    /// 标记为可重试的失败，在 `retry_at` 之后重新出队
    async fn retry(&self, job: Job, retry_at: DateTime<Utc>) -> Result<Job, QueueError>;

    /// 按条件查找作业
    async fn find(&self, filter: &JobFilter) -> Result<Vec<Job>, QueueError>;

    /// 按条件统计作业
    async fn count(&self, filter: &JobFilter) -> Result<u64, QueueError>;

    /// 取消所有符合条件的未完成作业，返回受影响的行数
    async fn cancel_matching(&self, filter: &JobFilter) -> Result<u64, QueueError>;
}

/// 基于数据库的作业队列实现
pub struct DatabaseJobQueue<R: JobRepository> {
    /// 作业仓库
    repository: Arc<R>,
}

impl<R: JobRepository> DatabaseJobQueue<R> {
    /// 创建新的作业队列实例
    ///
    /// # 参数
    ///
    /// * `repository` - 作业仓库
    ///
    /// # 返回值
    ///
    /// 返回新的作业队列实例
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R: JobRepository> JobQueue for DatabaseJobQueue<R> {
    /// 入队作业
    ///
    /// # 参数
    ///
    /// * `job` - 要入队的作业
    ///
    /// # 返回值
    ///
    /// * `Ok(Uuid)` - 作业ID
    /// * `Err(QueueError)` - 写入失败
    async fn enqueue_job(&self, job: Job) -> Result<Uuid, QueueError> {
        let created = self.repository.create(&job).await?;
        metrics::counter!("jobs_enqueued_total", "job_type" => created.job_type.as_str())
            .increment(1);
        Ok(created.id)
    }

    async fn dequeue(&self, lease: Duration) -> Result<Option<Job>, QueueError> {
        Ok(self.repository.acquire_next(lease).await?)
    }

    async fn complete(&self, job: Job) -> Result<Job, QueueError> {
        Ok(self.repository.update(&job.succeed()?).await?)
    }

    async fn fail(&self, job: Job) -> Result<Job, QueueError> {
        Ok(self.repository.update(&job.fail()?).await?)
    }

    async fn cancel(&self, job: Job) -> Result<Job, QueueError> {
        Ok(self.repository.update(&job.cancel()?).await?)
    }

    async fn retry(&self, job: Job, retry_at: DateTime<Utc>) -> Result<Job, QueueError> {
        Ok(self.repository.update(&job.errored(retry_at)?).await?)
    }

    async fn find(&self, filter: &JobFilter) -> Result<Vec<Job>, QueueError> {
        Ok(self.repository.find(filter).await?)
    }

    async fn count(&self, filter: &JobFilter) -> Result<u64, QueueError> {
        Ok(self.repository.count(filter).await?)
    }

    async fn cancel_matching(&self, filter: &JobFilter) -> Result<u64, QueueError> {
        let canceled = self.repository.cancel_matching(filter).await?;
        metrics::counter!("jobs_canceled_total").increment(canceled);
        Ok(canceled)
    }
}

#[async_trait]
impl<T: JobQueue + ?Sized> JobQueue for Arc<T> {
    async fn enqueue_job(&self, job: Job) -> Result<Uuid, QueueError> {
        (**self).enqueue_job(job).await
    }

    async fn dequeue(&self, lease: Duration) -> Result<Option<Job>, QueueError> {
        (**self).dequeue(lease).await
    }

    async fn complete(&self, job: Job) -> Result<Job, QueueError> {
        (**self).complete(job).await
    }

    async fn fail(&self, job: Job) -> Result<Job, QueueError> {
        (**self).fail(job).await
    }

    async fn cancel(&self, job: Job) -> Result<Job, QueueError> {
        (**self).cancel(job).await
    }

    async fn retry(&self, job: Job, retry_at: DateTime<Utc>) -> Result<Job, QueueError> {
        (**self).retry(job, retry_at).await
    }

    async fn find(&self, filter: &JobFilter) -> Result<Vec<Job>, QueueError> {
        (**self).find(filter).await
    }

    async fn count(&self, filter: &JobFilter) -> Result<u64, QueueError> {
        (**self).count(filter).await
    }

    async fn cancel_matching(&self, filter: &JobFilter) -> Result<u64, QueueError> {
        (**self).cancel_matching(filter).await
    }
}

/// 把作业负载解析为处理器期望的参数类型
///
/// 负载类型与作业类型不符或字段缺失时返回校验错误，不会重试。
pub fn decode<P: JobParams>(job: &Job) -> Result<P, JobError> {
    if job.job_type != P::JOB_TYPE {
        return Err(JobError::Validation(format!(
            "job {} has type {}, expected {}",
            job.id,
            job.job_type,
            P::JOB_TYPE
        )));
    }
    serde_json::from_value(job.data.clone())
        .map_err(|e| JobError::Validation(format!("{} payload: {}", P::JOB_TYPE, e)))
}

/// 执行作业处理器
///
/// 解析负载后在 `deadline` 内调用处理器，并原样返回处理器的结果。
/// 不修改作业状态，状态由分发器根据结果决定。
///
/// # 参数
///
/// * `job` - 待执行的作业
/// * `deadline` - 处理器的执行时限
/// * `handler` - 作业处理器
///
/// # 返回值
///
/// * `Ok(())` - 处理成功
/// * `Err(JobError::Validation)` - 负载无法解析
/// * `Err(JobError::Timeout)` - 超过时限
/// * `Err(JobError)` - 处理器返回的错误
pub async fn execute<P, F, Fut>(
    job: &Job,
    deadline: std::time::Duration,
    handler: F,
) -> Result<(), JobError>
where
    P: JobParams,
    F: FnOnce(P) -> Fut,
    Fut: Future<Output = Result<(), JobError>>,
{
    let params = decode::<P>(job)?;
    match tokio::time::timeout(deadline, handler(params)).await {
        Ok(result) => result,
        Err(_) => Err(JobError::Timeout {
            stage: "execute job",
            timeout_ms: deadline.as_millis() as u64,
        }),
    }
}

#[cfg(test)]
#[path = "job_queue_test.rs"]
mod tests;
