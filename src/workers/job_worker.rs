// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::context::JobContext;
use crate::application::jobs::{channel, matches, member, pair, round};
use crate::config::settings::WorkerSettings;
use crate::domain::models::job::{Job, JobType};
use crate::queue::job_queue::{execute, JobParams};
use crate::utils::errors::{JobError, WorkerError};
use crate::utils::retry_policy::RetryPolicy;
use crate::workers::worker::Worker;
use async_trait::async_trait;
use chrono::Utc;
use metrics::{counter, histogram};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// 作业执行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded,
    Canceled,
    Retried,
    Failed,
}

impl JobOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobOutcome::Succeeded => "succeeded",
            JobOutcome::Canceled => "canceled",
            JobOutcome::Retried => "retried",
            JobOutcome::Failed => "failed",
        }
    }
}

/// 作业工作器
///
/// 从队列取出到期作业，按类型分派给处理函数，再根据结果更新作业状态：
/// 成功标记完成，频道已不存在时取消，可重试的错误按退避策略重新排期，
/// 其余标记失败。
pub struct JobWorker {
    ctx: JobContext,
    retry_policy: RetryPolicy,
    poll_interval: Duration,
    lease: chrono::Duration,
    worker_id: Uuid,
}

impl JobWorker {
    /// 创建新的作业工作器
    ///
    /// # 参数
    ///
    /// * `ctx` - 作业上下文
    /// * `settings` - 工作器配置
    pub fn new(ctx: JobContext, settings: &WorkerSettings) -> Self {
        Self {
            ctx,
            retry_policy: RetryPolicy::with_max_retries(settings.max_retries),
            poll_interval: settings.poll_interval(),
            lease: settings.lease(),
            worker_id: Uuid::new_v4(),
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// 处理下一个到期作业
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(JobOutcome))` - 处理了一个作业
    /// * `Ok(None)` - 当前没有到期作业
    /// * `Err(WorkerError)` - 出队或更新状态失败
    pub async fn process_next(&self) -> Result<Option<JobOutcome>, WorkerError> {
        let Some(job) = self.ctx.queue.dequeue(self.lease).await? else {
            return Ok(None);
        };
        Ok(Some(self.process(job).await?))
    }

    #[instrument(skip(self, job), fields(job_id = %job.id, job_type = %job.job_type, attempt = job.attempt_count))]
    async fn process(&self, job: Job) -> Result<JobOutcome, WorkerError> {
        debug!("Processing job");
        let started = Instant::now();
        let result = dispatch(&self.ctx, &job).await;
        histogram!("job_duration_seconds", "job_type" => job.job_type.as_str())
            .record(started.elapsed().as_secs_f64());

        let job_type = job.job_type;
        let outcome = self.settle(job, result).await?;
        counter!(
            "jobs_processed_total",
            "job_type" => job_type.as_str(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
        Ok(outcome)
    }

    async fn settle(&self, job: Job, result: Result<(), JobError>) -> Result<JobOutcome, WorkerError> {
        let attempt = job.attempt_count.max(0) as u32;

        match result {
            Ok(()) => {
                self.ctx.queue.complete(job).await?;
                info!("Job succeeded");
                Ok(JobOutcome::Succeeded)
            }
            Err(JobError::ChannelNotFound(channel_id)) => {
                warn!(channel_id = %channel_id, "Channel no longer exists, canceling job");
                self.ctx.queue.cancel(job).await?;
                Ok(JobOutcome::Canceled)
            }
            Err(e) if self.retry_policy.should_retry_job(attempt, &e) => {
                let retry_at = self.retry_policy.next_retry_time(attempt, Utc::now());
                warn!(error = %e, kind = e.kind(), retry_at = %retry_at, "Job failed, will retry");
                self.ctx.queue.retry(job, retry_at).await?;
                Ok(JobOutcome::Retried)
            }
            Err(e) => {
                error!(error = %e, kind = e.kind(), "Job failed");
                self.ctx.queue.fail(job).await?;
                Ok(JobOutcome::Failed)
            }
        }
    }
}

#[async_trait]
impl Worker for JobWorker {
    async fn run(&self) -> Result<(), WorkerError> {
        info!(worker_id = %self.worker_id, "Job worker started");

        loop {
            match self.process_next().await {
                Ok(Some(_)) => {}
                Ok(None) => sleep(self.poll_interval).await,
                Err(e) => {
                    error!(worker_id = %self.worker_id, error = %e, "Error processing job");
                    sleep(self.poll_interval).await;
                }
            }
        }
    }

    fn name(&self) -> &str {
        "job_worker"
    }
}

/// 按作业类型分派到处理函数
pub async fn dispatch(ctx: &JobContext, job: &Job) -> Result<(), JobError> {
    match job.job_type {
        JobType::AddChannel => run(ctx, job, channel::add_channel).await,
        JobType::GreetAdmin => run(ctx, job, channel::greet_admin).await,
        JobType::UpdateChannel => run(ctx, job, channel::update_channel).await,
        JobType::DeleteChannel => run(ctx, job, channel::delete_channel).await,
        JobType::SyncChannels => run(ctx, job, channel::sync_channels).await,
        JobType::AddMember => run(ctx, job, member::add_member).await,
        JobType::UpdateMember => run(ctx, job, member::update_member).await,
        JobType::GreetMember => run(ctx, job, member::greet_member).await,
        JobType::DeleteMember => run(ctx, job, member::delete_member).await,
        JobType::SyncMembers => run(ctx, job, member::sync_members).await,
        JobType::BlockMember => run(ctx, job, member::block_member).await,
        JobType::UnblockMember => run(ctx, job, member::unblock_member).await,
        JobType::CreateRound => run(ctx, job, round::create_round).await,
        JobType::EndRound => run(ctx, job, round::end_round).await,
        JobType::ReportStats => run(ctx, job, round::report_stats).await,
        JobType::CreateMatches => run(ctx, job, matches::create_matches).await,
        JobType::ReportMatches => run(ctx, job, matches::report_matches).await,
        JobType::CreateMatch => run(ctx, job, matches::create_match).await,
        JobType::UpdateMatch => run(ctx, job, matches::update_match).await,
        JobType::CreatePair => run(ctx, job, pair::create_pair).await,
        JobType::NotifyPair => run(ctx, job, pair::notify_pair).await,
        JobType::KickoffPair => run(ctx, job, pair::kickoff_pair).await,
        JobType::NotifyMember => run(ctx, job, pair::notify_member).await,
        JobType::CheckPair => run(ctx, job, pair::check_pair).await,
        JobType::MarkInactive => run(ctx, job, pair::mark_inactive).await,
    }
}

async fn run<'a, P, F, Fut>(ctx: &'a JobContext, job: &Job, handler: F) -> Result<(), JobError>
where
    P: JobParams,
    F: FnOnce(&'a JobContext, P) -> Fut,
    Fut: Future<Output = Result<(), JobError>> + 'a,
{
    execute(job, ctx.options.job_deadline, |params: P| async move {
        ctx.ensure_channel(&params).await?;
        handler(ctx, params).await
    })
    .await
}

#[cfg(test)]
#[path = "job_worker_test.rs"]
mod tests;
