// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::platform::traits::{
    ChannelListing, ConversationMessage, MemberPage, MembershipSource, Notification,
    NotificationSink, PlatformError,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::info;

/// 已发送的一条通知
#[derive(Debug, Clone, PartialEq)]
pub struct PostedMessage {
    pub conversation_id: String,
    pub notification: Notification,
}

#[derive(Debug, Default)]
struct PlatformState {
    channels: BTreeMap<String, ChannelListing>,
    members: BTreeMap<String, Vec<String>>,
    bots: HashSet<String>,
    conversations: HashMap<String, Vec<String>>,
    history: HashMap<String, Vec<ConversationMessage>>,
    posted: Vec<PostedMessage>,
    failing_conversations: HashSet<String>,
}

/// 进程内聊天平台
///
/// 同时实现 [`MembershipSource`] 与 [`NotificationSink`]。
/// 会话ID是确定的：私聊为 `D<user>`，群聊为 `G<user>-<user>`（按用户ID排序），
/// 频道消息直接使用频道ID。
#[derive(Debug)]
pub struct InMemoryPlatform {
    state: RwLock<PlatformState>,
    page_size: usize,
}

impl Default for InMemoryPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPlatform {
    /// 创建空的平台，成员列表每页100条
    pub fn new() -> Self {
        Self::with_page_size(100)
    }

    /// 指定成员列表分页大小
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: RwLock::new(PlatformState::default()),
            page_size: page_size.max(1),
        }
    }

    /// 让机器人加入频道
    pub fn add_channel(&self, channel_id: &str, inviter: &str) {
        self.state.write().channels.insert(
            channel_id.to_string(),
            ChannelListing {
                channel_id: channel_id.to_string(),
                inviter: inviter.to_string(),
            },
        );
    }

    /// 机器人离开频道
    pub fn remove_channel(&self, channel_id: &str) {
        let mut state = self.state.write();
        state.channels.remove(channel_id);
        state.members.remove(channel_id);
    }

    /// 设置频道成员
    pub fn set_members(&self, channel_id: &str, user_ids: &[&str]) {
        self.state.write().members.insert(
            channel_id.to_string(),
            user_ids.iter().map(|id| id.to_string()).collect(),
        );
    }

    /// 把用户标记为机器人
    pub fn add_bot(&self, user_id: &str) {
        self.state.write().bots.insert(user_id.to_string());
    }

    /// 在会话中记录一条消息
    pub fn record_message(&self, conversation_id: &str, user_id: &str, sent_at: DateTime<Utc>) {
        self.state
            .write()
            .history
            .entry(conversation_id.to_string())
            .or_default()
            .push(ConversationMessage {
                user_id: user_id.to_string(),
                sent_at,
            });
    }

    /// 让发往某个会话的消息失败
    pub fn fail_posts_to(&self, conversation_id: &str) {
        self.state
            .write()
            .failing_conversations
            .insert(conversation_id.to_string());
    }

    /// 已发送的全部通知
    pub fn posted(&self) -> Vec<PostedMessage> {
        self.state.read().posted.clone()
    }

    /// 与用户私聊的会话ID
    pub fn direct_conversation_id(user_id: &str) -> String {
        format!("D{}", user_id)
    }

    fn conversation_id_for(user_ids: &[String]) -> String {
        match user_ids {
            [single] => Self::direct_conversation_id(single),
            many => {
                let mut sorted = many.to_vec();
                sorted.sort();
                format!("G{}", sorted.join("-"))
            }
        }
    }
}

#[async_trait]
impl MembershipSource for InMemoryPlatform {
    async fn list_channels(&self, _bot_user_id: &str) -> Result<Vec<ChannelListing>, PlatformError> {
        Ok(self.state.read().channels.values().cloned().collect())
    }

    async fn list_channel_members(
        &self,
        channel_id: &str,
        cursor: Option<String>,
    ) -> Result<MemberPage, PlatformError> {
        let state = self.state.read();
        let members = state
            .members
            .get(channel_id)
            .ok_or_else(|| PlatformError::NotFound(channel_id.to_string()))?;

        let start = match cursor {
            Some(cursor) => cursor
                .parse::<usize>()
                .map_err(|_| PlatformError::RequestFailed(format!("invalid cursor {}", cursor)))?,
            None => 0,
        };
        let end = (start + self.page_size).min(members.len());
        let user_ids = members.get(start..end).unwrap_or_default().to_vec();
        let next_cursor = (end < members.len()).then(|| end.to_string());

        Ok(MemberPage {
            user_ids,
            next_cursor,
        })
    }

    async fn is_bot_member(&self, channel_id: &str) -> Result<bool, PlatformError> {
        Ok(self.state.read().channels.contains_key(channel_id))
    }

    async fn is_bot(&self, user_id: &str) -> Result<bool, PlatformError> {
        Ok(self.state.read().bots.contains(user_id))
    }
}

#[async_trait]
impl NotificationSink for InMemoryPlatform {
    async fn open_conversation(&self, user_ids: &[String]) -> Result<String, PlatformError> {
        if user_ids.is_empty() {
            return Err(PlatformError::RequestFailed(
                "cannot open a conversation without users".to_string(),
            ));
        }

        let conversation_id = Self::conversation_id_for(user_ids);
        self.state
            .write()
            .conversations
            .insert(conversation_id.clone(), user_ids.to_vec());
        Ok(conversation_id)
    }

    async fn post_message(
        &self,
        conversation_id: &str,
        notification: &Notification,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.write();
        if state.failing_conversations.contains(conversation_id) {
            return Err(PlatformError::RequestFailed(format!(
                "post to {} rejected",
                conversation_id
            )));
        }

        info!(conversation_id = %conversation_id, notification = ?notification, "Posted notification");
        state.posted.push(PostedMessage {
            conversation_id: conversation_id.to_string(),
            notification: notification.clone(),
        });
        Ok(())
    }

    async fn conversation_history(
        &self,
        conversation_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<ConversationMessage>, PlatformError> {
        Ok(self
            .state
            .read()
            .history
            .get(conversation_id)
            .map(|messages| {
                messages
                    .iter()
                    .filter(|m| m.sent_at >= since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
