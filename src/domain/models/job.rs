// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// 作业实体
///
/// 表示队列中一个延迟执行的工作单元。每个作业对应一种处理器，
/// 参数以不透明的JSON负载保存，由作业类型决定其结构。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// 作业唯一标识符
    pub id: Uuid,
    /// 作业类型，决定由哪个处理器执行
    pub job_type: JobType,
    /// 优先级，数值越大越紧急
    pub priority: i32,
    /// 作业状态
    pub status: JobStatus,
    /// 终止标记，为true的作业不会被再次执行
    pub is_completed: bool,
    /// 作业参数负载
    pub data: serde_json::Value,
    /// 计划执行时间
    pub exec_at: DateTime<FixedOffset>,
    /// 已尝试执行的次数
    pub attempt_count: i32,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
    /// 更新时间
    pub updated_at: DateTime<FixedOffset>,
}

/// 作业类型枚举
///
/// 封闭集合，每个变体对应一个作业处理器。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    AddChannel,
    GreetAdmin,
    UpdateChannel,
    DeleteChannel,
    SyncChannels,
    AddMember,
    UpdateMember,
    GreetMember,
    DeleteMember,
    SyncMembers,
    CreateRound,
    EndRound,
    CreateMatches,
    ReportMatches,
    CreateMatch,
    UpdateMatch,
    CreatePair,
    NotifyPair,
    KickoffPair,
    NotifyMember,
    CheckPair,
    ReportStats,
    MarkInactive,
    BlockMember,
    UnblockMember,
}

impl JobType {
    /// 所有作业类型
    pub const ALL: [JobType; 25] = [
        JobType::AddChannel,
        JobType::GreetAdmin,
        JobType::UpdateChannel,
        JobType::DeleteChannel,
        JobType::SyncChannels,
        JobType::AddMember,
        JobType::UpdateMember,
        JobType::GreetMember,
        JobType::DeleteMember,
        JobType::SyncMembers,
        JobType::CreateRound,
        JobType::EndRound,
        JobType::CreateMatches,
        JobType::ReportMatches,
        JobType::CreateMatch,
        JobType::UpdateMatch,
        JobType::CreatePair,
        JobType::NotifyPair,
        JobType::KickoffPair,
        JobType::NotifyMember,
        JobType::CheckPair,
        JobType::ReportStats,
        JobType::MarkInactive,
        JobType::BlockMember,
        JobType::UnblockMember,
    ];

    /// 返回作业类型的字符串表示
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::AddChannel => "ADD_CHANNEL",
            JobType::GreetAdmin => "GREET_ADMIN",
            JobType::UpdateChannel => "UPDATE_CHANNEL",
            JobType::DeleteChannel => "DELETE_CHANNEL",
            JobType::SyncChannels => "SYNC_CHANNELS",
            JobType::AddMember => "ADD_MEMBER",
            JobType::UpdateMember => "UPDATE_MEMBER",
            JobType::GreetMember => "GREET_MEMBER",
            JobType::DeleteMember => "DELETE_MEMBER",
            JobType::SyncMembers => "SYNC_MEMBERS",
            JobType::CreateRound => "CREATE_ROUND",
            JobType::EndRound => "END_ROUND",
            JobType::CreateMatches => "CREATE_MATCHES",
            JobType::ReportMatches => "REPORT_MATCHES",
            JobType::CreateMatch => "CREATE_MATCH",
            JobType::UpdateMatch => "UPDATE_MATCH",
            JobType::CreatePair => "CREATE_PAIR",
            JobType::NotifyPair => "NOTIFY_PAIR",
            JobType::KickoffPair => "KICKOFF_PAIR",
            JobType::NotifyMember => "NOTIFY_MEMBER",
            JobType::CheckPair => "CHECK_PAIR",
            JobType::ReportStats => "REPORT_STATS",
            JobType::MarkInactive => "MARK_INACTIVE",
            JobType::BlockMember => "BLOCK_MEMBER",
            JobType::UnblockMember => "UNBLOCK_MEMBER",
        }
    }

    /// 该类型的作业是否必须引用一个已登记的频道
    ///
    /// 分发器在执行前会校验频道存在，不存在时直接取消作业。
    pub fn requires_channel(&self) -> bool {
        !matches!(
            self,
            JobType::SyncChannels
                | JobType::GreetAdmin
                | JobType::AddChannel
                | JobType::UpdateMatch
                | JobType::BlockMember
                | JobType::UnblockMember
        )
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobType::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| DomainError::InvalidValue {
                kind: "job type",
                value: s.to_string(),
            })
    }
}

/// 作业状态枚举
///
/// 状态转换遵循以下流程：
/// Pending → Succeeded/Errored/Canceled/Failed，Errored 可被重试策略重新执行
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// 等待执行
    #[default]
    Pending,
    /// 可重试的失败
    Errored,
    /// 被取代而取消
    Canceled,
    /// 不可重试的失败
    Failed,
    /// 执行成功
    Succeeded,
}

impl JobStatus {
    /// 终止状态会同时设置 is_completed
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Canceled | JobStatus::Failed | JobStatus::Succeeded
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "PENDING"),
            JobStatus::Errored => write!(f, "ERRORED"),
            JobStatus::Canceled => write!(f, "CANCELED"),
            JobStatus::Failed => write!(f, "FAILED"),
            JobStatus::Succeeded => write!(f, "SUCCEEDED"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(JobStatus::Pending),
            "ERRORED" => Ok(JobStatus::Errored),
            "CANCELED" => Ok(JobStatus::Canceled),
            "FAILED" => Ok(JobStatus::Failed),
            "SUCCEEDED" => Ok(JobStatus::Succeeded),
            _ => Err(DomainError::InvalidValue {
                kind: "job status",
                value: s.to_string(),
            }),
        }
    }
}

/// 作业优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum JobPriority {
    Lowest = 1,
    Low = 3,
    #[default]
    Standard = 5,
    High = 8,
    Highest = 10,
}

impl JobPriority {
    pub fn value(self) -> i32 {
        self as i32
    }
}

/// 领域错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// 无效的状态转换
    #[error("Invalid state transition from {0}")]
    InvalidStateTransition(JobStatus),

    /// 封闭枚举的取值无效
    #[error("invalid {kind}: {value:?}")]
    InvalidValue { kind: &'static str, value: String },

    /// 时间区间无效（结束时间不晚于开始时间）
    #[error("invalid time range: end must be after start")]
    InvalidTimeRange,

    /// 日期计算超出可表示范围
    #[error("date out of range")]
    DateOutOfRange,
}

impl Job {
    /// 创建一个新的待执行作业
    ///
    /// # 参数
    ///
    /// * `job_type` - 作业类型
    /// * `priority` - 优先级
    /// * `data` - 参数负载
    /// * `exec_at` - 计划执行时间
    ///
    /// # 返回值
    ///
    /// 返回状态为Pending且未完成的作业
    pub fn new(
        job_type: JobType,
        priority: JobPriority,
        data: serde_json::Value,
        exec_at: DateTime<Utc>,
    ) -> Self {
        let now: DateTime<FixedOffset> = Utc::now().into();
        Self {
            id: Uuid::new_v4(),
            job_type,
            priority: priority.value(),
            status: JobStatus::Pending,
            is_completed: false,
            data,
            exec_at: exec_at.into(),
            attempt_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn ensure_runnable(&self) -> Result<(), DomainError> {
        match self.status {
            JobStatus::Pending | JobStatus::Errored if !self.is_completed => Ok(()),
            other => Err(DomainError::InvalidStateTransition(other)),
        }
    }

    /// 标记作业成功
    pub fn succeed(mut self) -> Result<Self, DomainError> {
        self.ensure_runnable()?;
        self.status = JobStatus::Succeeded;
        self.is_completed = true;
        self.updated_at = Utc::now().into();
        Ok(self)
    }

    /// 标记作业为不可重试的失败
    pub fn fail(mut self) -> Result<Self, DomainError> {
        self.ensure_runnable()?;
        self.status = JobStatus::Failed;
        self.is_completed = true;
        self.updated_at = Utc::now().into();
        Ok(self)
    }

    /// 取消作业
    pub fn cancel(mut self) -> Result<Self, DomainError> {
        self.ensure_runnable()?;
        self.status = JobStatus::Canceled;
        self.is_completed = true;
        self.updated_at = Utc::now().into();
        Ok(self)
    }

    /// 标记作业为可重试的失败，并在 `retry_at` 重新参与出队
    pub fn errored(mut self, retry_at: DateTime<Utc>) -> Result<Self, DomainError> {
        self.ensure_runnable()?;
        self.status = JobStatus::Errored;
        self.exec_at = retry_at.into();
        self.updated_at = Utc::now().into();
        Ok(self)
    }
}
