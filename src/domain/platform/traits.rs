// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// 聊天平台错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(String),
    /// 目标不存在（频道、用户或会话）
    #[error("Not found: {0}")]
    NotFound(String),
    /// 平台限流
    #[error("Rate limited")]
    RateLimited,
}

/// 机器人所在的频道
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelListing {
    pub channel_id: String,
    /// 邀请机器人的用户
    pub inviter: String,
}

/// 成员列表的一页
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberPage {
    pub user_ids: Vec<String>,
    /// 下一页游标，为空表示没有更多
    pub next_cursor: Option<String>,
}

/// 会话中的一条消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub user_id: String,
    pub sent_at: DateTime<Utc>,
}

/// 发送给平台的通知
///
/// 只描述通知的语义和所需数据，渲染由平台客户端负责。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// 欢迎启用频道的管理员
    GreetAdmin { channel_id: String, user_id: String },
    /// 欢迎新成员并邀请其完善资料
    GreetMember { channel_id: String, user_id: String },
    /// 介绍一对新的匹配
    PairIntro {
        channel_id: String,
        participant: String,
        partner: String,
        next_round: DateTime<Utc>,
    },
    /// 两人尚未交流时的破冰提醒
    Kickoff { channel_id: String, volunteer: String },
    /// 询问是否已见面
    CheckPair {
        channel_id: String,
        match_id: Uuid,
        is_mid_round: bool,
    },
    /// 未能匹配时的致歉
    Unmatched {
        channel_id: String,
        user_id: String,
        next_round: DateTime<Utc>,
    },
    /// 本轮匹配汇总
    MatchesReport {
        channel_id: String,
        participants: usize,
        pairs: usize,
        unmatched: usize,
    },
    /// 本轮见面统计
    RoundStats {
        channel_id: String,
        total: u64,
        met: u64,
        percent: u64,
    },
    /// 通知成员已被标记为不活跃
    MarkedInactive {
        channel_id: String,
        user_id: String,
        next_round: DateTime<Utc>,
    },
}

/// 成员来源
///
/// 提供平台侧权威的频道与成员列表，作为对账的输入。
#[async_trait]
pub trait MembershipSource: Send + Sync {
    /// 机器人所在的全部频道
    async fn list_channels(&self, bot_user_id: &str) -> Result<Vec<ChannelListing>, PlatformError>;

    /// 分页列出频道成员
    async fn list_channel_members(
        &self,
        channel_id: &str,
        cursor: Option<String>,
    ) -> Result<MemberPage, PlatformError>;

    /// 机器人是否仍在频道中
    async fn is_bot_member(&self, channel_id: &str) -> Result<bool, PlatformError>;

    /// 用户是否为机器人
    async fn is_bot(&self, user_id: &str) -> Result<bool, PlatformError>;
}

/// 通知出口
///
/// 只关心调用成功与否，不关心消息内容的语义。
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// 与一个或多个用户打开会话，返回会话ID
    async fn open_conversation(&self, user_ids: &[String]) -> Result<String, PlatformError>;

    /// 向会话或频道发送通知
    async fn post_message(
        &self,
        conversation_id: &str,
        notification: &Notification,
    ) -> Result<(), PlatformError>;

    /// 会话自 `since` 以来的消息
    async fn conversation_history(
        &self,
        conversation_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<ConversationMessage>, PlatformError>;
}
