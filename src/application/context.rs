// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::Settings;
use crate::domain::models::channel::RoundInterval;
use crate::domain::models::job::DomainError;
use crate::domain::models::member::ConnectionMode;
use crate::domain::platform::traits::{MembershipSource, NotificationSink};
use crate::domain::repositories::blocked_member_repository::BlockedMemberRepository;
use crate::domain::repositories::channel_repository::ChannelRepository;
use crate::domain::repositories::match_repository::MatchRepository;
use crate::domain::repositories::member_repository::MemberRepository;
use crate::domain::repositories::round_repository::RoundRepository;
use crate::domain::services::round_schedule::parse_weekday;
use crate::infrastructure::repositories::blocked_member_repo_impl::BlockedMemberRepositoryImpl;
use crate::infrastructure::repositories::channel_repo_impl::ChannelRepositoryImpl;
use crate::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use crate::infrastructure::repositories::match_repo_impl::MatchRepositoryImpl;
use crate::infrastructure::repositories::member_repo_impl::MemberRepositoryImpl;
use crate::infrastructure::repositories::round_repo_impl::RoundRepositoryImpl;
use crate::queue::barrier::MemberJobBarrier;
use crate::queue::job_queue::{DatabaseJobQueue, JobParams, JobQueue};
use crate::utils::errors::{IntoJobError, JobError};
use chrono::Weekday;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sea_orm::DatabaseConnection;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// 新频道的默认轮次设置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelDefaults {
    pub interval: RoundInterval,
    pub weekday: Weekday,
    pub hour: u32,
    pub connection_mode: ConnectionMode,
}

impl Default for ChannelDefaults {
    fn default() -> Self {
        Self {
            interval: RoundInterval::Biweekly,
            weekday: Weekday::Mon,
            hour: 12,
            connection_mode: ConnectionMode::Hybrid,
        }
    }
}

/// 作业处理器的运行选项
#[derive(Debug, Clone)]
pub struct JobOptions {
    /// 存储调用的超时
    pub store_timeout: Duration,
    /// 平台调用的超时
    pub platform_timeout: Duration,
    /// 单个作业的执行时限
    pub job_deadline: Duration,
    /// 匹配前的成员作业屏障
    pub barrier: MemberJobBarrier,
    /// 机器人在平台上的用户ID
    pub bot_user_id: String,
    pub defaults: ChannelDefaults,
    /// 固定随机种子，便于测试复现
    pub rng_seed: Option<u64>,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_millis(500),
            platform_timeout: Duration::from_secs(3),
            job_deadline: Duration::from_secs(60),
            barrier: MemberJobBarrier::default(),
            bot_user_id: String::new(),
            defaults: ChannelDefaults::default(),
            rng_seed: None,
        }
    }
}

impl JobOptions {
    /// 根据配置构建运行选项
    ///
    /// # 返回值
    ///
    /// * `Ok(JobOptions)` - 构建成功
    /// * `Err(DomainError)` - 默认轮次设置中的取值无效
    pub fn from_settings(settings: &Settings) -> Result<Self, DomainError> {
        let roulette = &settings.roulette;
        let defaults = ChannelDefaults {
            interval: roulette.interval.parse()?,
            weekday: parse_weekday(&roulette.weekday)?,
            hour: roulette.hour,
            connection_mode: roulette.connection_mode.parse()?,
        };

        Ok(Self {
            store_timeout: Duration::from_millis(settings.timeouts.store_ms),
            platform_timeout: Duration::from_millis(settings.timeouts.platform_ms),
            job_deadline: settings.worker.job_deadline(),
            barrier: MemberJobBarrier::new(
                Duration::from_millis(settings.barrier.poll_interval_ms),
                Duration::from_secs(settings.barrier.ceiling_secs),
            ),
            bot_user_id: settings.bot.user_id.clone(),
            defaults,
            rng_seed: None,
        })
    }
}

/// 作业处理器的依赖
///
/// 仓库、队列与平台都以特质对象持有，处理器不关心具体实现。
#[derive(Clone)]
pub struct JobContext {
    pub queue: Arc<dyn JobQueue>,
    pub channels: Arc<dyn ChannelRepository>,
    pub members: Arc<dyn MemberRepository>,
    pub rounds: Arc<dyn RoundRepository>,
    pub matches: Arc<dyn MatchRepository>,
    pub blocked: Arc<dyn BlockedMemberRepository>,
    pub membership: Arc<dyn MembershipSource>,
    pub notifier: Arc<dyn NotificationSink>,
    pub options: JobOptions,
}

impl JobContext {
    /// 基于数据库连接与平台实现组装上下文
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    /// * `platform` - 同时提供成员来源与通知出口的平台实现
    /// * `options` - 运行选项
    pub fn from_database<P>(db: Arc<DatabaseConnection>, platform: Arc<P>, options: JobOptions) -> Self
    where
        P: MembershipSource + NotificationSink + 'static,
    {
        let jobs = Arc::new(JobRepositoryImpl::new(db.clone()));
        Self {
            queue: Arc::new(DatabaseJobQueue::new(jobs)),
            channels: Arc::new(ChannelRepositoryImpl::new(db.clone())),
            members: Arc::new(MemberRepositoryImpl::new(db.clone())),
            rounds: Arc::new(RoundRepositoryImpl::new(db.clone())),
            matches: Arc::new(MatchRepositoryImpl::new(db.clone())),
            blocked: Arc::new(BlockedMemberRepositoryImpl::new(db)),
            membership: platform.clone(),
            notifier: platform,
            options,
        }
    }

    /// 在存储超时内执行一次存储调用，并标注阶段
    pub async fn store<T, E, Fut>(&self, stage: &'static str, fut: Fut) -> Result<T, JobError>
    where
        Fut: Future<Output = Result<T, E>>,
        E: IntoJobError,
    {
        with_timeout(self.options.store_timeout, stage, fut).await
    }

    /// 在平台超时内执行一次平台调用，并标注阶段
    pub async fn platform<T, E, Fut>(&self, stage: &'static str, fut: Fut) -> Result<T, JobError>
    where
        Fut: Future<Output = Result<T, E>>,
        E: IntoJobError,
    {
        with_timeout(self.options.platform_timeout, stage, fut).await
    }

    /// 确认作业引用的频道仍然存在
    ///
    /// 不需要频道的作业类型直接通过。
    pub async fn ensure_channel<P: JobParams>(&self, params: &P) -> Result<(), JobError> {
        if !P::JOB_TYPE.requires_channel() {
            return Ok(());
        }

        let channel_id = params.channel_id().ok_or(JobError::MissingChannelId)?;
        if self
            .store("failed to check channel exists", self.channels.exists(channel_id))
            .await?
        {
            Ok(())
        } else {
            Err(JobError::ChannelNotFound(channel_id.to_string()))
        }
    }

    /// 匹配与抽签使用的随机源
    pub fn rng(&self) -> StdRng {
        match self.options.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        }
    }
}

async fn with_timeout<T, E, Fut>(limit: Duration, stage: &'static str, fut: Fut) -> Result<T, JobError>
where
    Fut: Future<Output = Result<T, E>>,
    E: IntoJobError,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(|e| e.into_job_error(stage)),
        Err(_) => Err(JobError::Timeout {
            stage,
            timeout_ms: limit.as_millis() as u64,
        }),
    }
}
