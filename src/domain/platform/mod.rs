// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 聊天平台接口模块
///
/// 定义成员来源与通知出口两个窄接口，平台客户端的具体实现
/// 由基础设施层提供。
pub mod traits;

pub use traits::{
    ChannelListing, ConversationMessage, MemberPage, MembershipSource, Notification,
    NotificationSink, PlatformError,
};
