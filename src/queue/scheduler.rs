// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{Job, JobPriority};
use crate::queue::job_queue::{JobParams, JobQueue, QueueError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

/// 类型化的作业调度
///
/// 对任意 [`JobQueue`] 提供按参数类型入队的能力。
#[async_trait]
pub trait JobScheduler: JobQueue {
    /// 入队作业
    ///
    /// # 参数
    ///
    /// * `params` - 作业参数，决定作业类型
    /// * `priority` - 优先级，未指定时为 Standard
    /// * `exec_at` - 执行时间，未指定时为当前时间
    ///
    /// # 返回值
    ///
    /// * `Ok(Uuid)` - 作业ID
    /// * `Err(QueueError)` - 序列化或写入失败
    async fn enqueue<P: JobParams>(
        &self,
        params: &P,
        priority: Option<JobPriority>,
        exec_at: Option<DateTime<Utc>>,
    ) -> Result<Uuid, QueueError> {
        let data = serde_json::to_value(params)?;
        let exec_at = exec_at.unwrap_or_else(Utc::now);
        let job = Job::new(P::JOB_TYPE, priority.unwrap_or_default(), data, exec_at);
        let id = self.enqueue_job(job).await?;
        debug!(
            job_id = %id,
            job_type = %P::JOB_TYPE,
            channel_id = params.channel_id().unwrap_or(""),
            exec_at = %exec_at,
            "Job enqueued"
        );
        Ok(id)
    }

    /// 以作业类型的默认优先级立即入队
    async fn submit<P: JobParams>(&self, params: &P) -> Result<Uuid, QueueError> {
        self.enqueue(params, Some(P::PRIORITY), None).await
    }

    /// 以作业类型的默认优先级在指定时间入队
    async fn schedule<P: JobParams>(
        &self,
        params: &P,
        exec_at: DateTime<Utc>,
    ) -> Result<Uuid, QueueError> {
        self.enqueue(params, Some(P::PRIORITY), Some(exec_at)).await
    }
}

impl<T: JobQueue + ?Sized> JobScheduler for T {}
