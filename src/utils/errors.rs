// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::DomainError;
use crate::domain::platform::traits::PlatformError;
use crate::domain::repositories::job_repository::RepositoryError;
use crate::queue::job_queue::QueueError;
use thiserror::Error;

/// 作业处理错误
///
/// 每个依赖调用的错误都带有阶段描述，便于区分
/// "读取轮次失败"和"通知配对失败"。
#[derive(Error, Debug)]
pub enum JobError {
    /// 参数无效，不重试
    #[error("invalid job parameters: {0}")]
    Validation(String),

    #[error("{stage}: {source}")]
    Repository {
        stage: &'static str,
        #[source]
        source: RepositoryError,
    },

    #[error("{stage}: {source}")]
    Platform {
        stage: &'static str,
        #[source]
        source: PlatformError,
    },

    #[error("{stage}: {source}")]
    Queue {
        stage: &'static str,
        #[source]
        source: QueueError,
    },

    #[error("{stage}: {source}")]
    Domain {
        stage: &'static str,
        #[source]
        source: DomainError,
    },

    /// 依赖调用超时
    #[error("{stage}: timed out after {timeout_ms}ms")]
    Timeout { stage: &'static str, timeout_ms: u64 },

    /// 作业引用的频道已不存在
    #[error("channel {0} not found")]
    ChannelNotFound(String),

    /// 需要频道的作业缺少频道ID
    #[error("job parameters carry no channel id")]
    MissingChannelId,

    /// 扇出操作中至少一个分支失败
    #[error("fan-out failed: {0}")]
    Fanout(String),
}

impl JobError {
    /// 是否值得重试
    ///
    /// 参数、领域规则以及存储中无法解析的数据在重试后不会改变结果。
    pub fn is_retryable(&self) -> bool {
        match self {
            JobError::Validation(_)
            | JobError::Domain { .. }
            | JobError::MissingChannelId
            | JobError::ChannelNotFound(_) => false,
            JobError::Repository {
                source: RepositoryError::Corrupt(_),
                ..
            } => false,
            JobError::Queue {
                source: QueueError::Serialization(_),
                ..
            } => false,
            _ => true,
        }
    }

    /// 指标与日志使用的错误类别
    pub fn kind(&self) -> &'static str {
        match self {
            JobError::Validation(_) => "validation",
            JobError::Repository { .. } => "repository",
            JobError::Platform { .. } => "platform",
            JobError::Queue { .. } => "queue",
            JobError::Domain { .. } => "domain",
            JobError::Timeout { .. } => "timeout",
            JobError::ChannelNotFound(_) => "channel_not_found",
            JobError::MissingChannelId => "missing_channel_id",
            JobError::Fanout(_) => "fanout",
        }
    }
}

/// 把依赖错误包装为带阶段描述的 [`JobError`]
pub trait IntoJobError {
    fn into_job_error(self, stage: &'static str) -> JobError;
}

impl IntoJobError for RepositoryError {
    fn into_job_error(self, stage: &'static str) -> JobError {
        JobError::Repository { stage, source: self }
    }
}

impl IntoJobError for PlatformError {
    fn into_job_error(self, stage: &'static str) -> JobError {
        JobError::Platform { stage, source: self }
    }
}

impl IntoJobError for QueueError {
    fn into_job_error(self, stage: &'static str) -> JobError {
        JobError::Queue { stage, source: self }
    }
}

impl IntoJobError for DomainError {
    fn into_job_error(self, stage: &'static str) -> JobError {
        JobError::Domain { stage, source: self }
    }
}

impl IntoJobError for JobError {
    fn into_job_error(self, _stage: &'static str) -> JobError {
        self
    }
}

/// `Result` 上的阶段标注
pub trait StageExt<T> {
    fn stage(self, stage: &'static str) -> Result<T, JobError>;
}

impl<T, E: IntoJobError> StageExt<T> for Result<T, E> {
    fn stage(self, stage: &'static str) -> Result<T, JobError> {
        self.map_err(|e| e.into_job_error(stage))
    }
}

/// Worker错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("仓库错误: {0}")]
    RepositoryError(#[from] RepositoryError),

    #[error("队列错误: {0}")]
    QueueError(#[from] QueueError),

    #[error("领域错误: {0}")]
    DomainError(#[from] DomainError),

    #[error("内部错误: {0}")]
    InternalError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(!JobError::Validation("bad".into()).is_retryable());
        assert!(!JobError::MissingChannelId.is_retryable());
        assert!(!RepositoryError::Corrupt("x".into())
            .into_job_error("load channel")
            .is_retryable());
        assert!(RepositoryError::NotFound
            .into_job_error("load channel")
            .is_retryable());
        assert!(JobError::Timeout {
            stage: "post message",
            timeout_ms: 2000
        }
        .is_retryable());
        assert!(PlatformError::RateLimited
            .into_job_error("open conversation")
            .is_retryable());
    }

    #[test]
    fn test_stage_is_part_of_message() {
        let result: Result<(), PlatformError> =
            Err(PlatformError::RequestFailed("boom".into()));
        let err = result.stage("failed to notify pair").unwrap_err();
        assert_eq!(err.to_string(), "failed to notify pair: Request failed: boom");
        assert_eq!(err.kind(), "platform");
    }
}
