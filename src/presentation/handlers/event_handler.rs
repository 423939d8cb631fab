// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::jobs::params::{
    AddChannelParams, AddMemberParams, BlockMemberParams, BlockParams, DeleteMemberParams,
    SyncChannelsParams, UnblockMemberParams, UpdateChannelParams, UpdateMatchParams,
    UpdateMemberParams,
};
use crate::domain::models::job::JobType;
use crate::domain::repositories::job_repository::JobFilter;
use crate::presentation::errors::AppError;
use crate::presentation::state::AppState;
use crate::queue::scheduler::JobScheduler;
use crate::utils::validators::validate_platform_id;
use axum::{http::StatusCode, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

/// 机器人被加入频道
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BotJoined {
    #[validate(custom(function = "validate_platform_id"))]
    pub channel_id: String,
    /// 邀请者，为空时只触发频道对账
    #[serde(default)]
    pub inviter: Option<String>,
}

/// 成员加入或离开频道
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MemberChanged {
    #[validate(custom(function = "validate_platform_id"))]
    pub channel_id: String,
    #[validate(custom(function = "validate_platform_id"))]
    pub user_id: String,
}

/// 成员对见面询问的回答
#[derive(Debug, Clone, Deserialize)]
pub struct CheckPairAnswer {
    pub match_id: Uuid,
    pub has_met: bool,
    #[serde(default)]
    pub is_mid_round: bool,
}

/// 平台事件
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlatformEvent {
    /// 平台校验回调地址
    UrlVerification { challenge: String },
    BotJoined(BotJoined),
    MemberJoined(MemberChanged),
    MemberLeft(MemberChanged),
    CheckPairAnswer(CheckPairAnswer),
    ProfileUpdated(UpdateMemberParams),
    MemberBlocked(BlockParams),
    MemberUnblocked(BlockParams),
    ChannelSettingsUpdated(UpdateChannelParams),
}

impl PlatformEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            PlatformEvent::UrlVerification { .. } => "url_verification",
            PlatformEvent::BotJoined(_) => "bot_joined",
            PlatformEvent::MemberJoined(_) => "member_joined",
            PlatformEvent::MemberLeft(_) => "member_left",
            PlatformEvent::CheckPairAnswer(_) => "check_pair_answer",
            PlatformEvent::ProfileUpdated(_) => "profile_updated",
            PlatformEvent::MemberBlocked(_) => "member_blocked",
            PlatformEvent::MemberUnblocked(_) => "member_unblocked",
            PlatformEvent::ChannelSettingsUpdated(_) => "channel_settings_updated",
        }
    }

    /// 校验事件中的ID与取值
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            PlatformEvent::UrlVerification { .. } | PlatformEvent::CheckPairAnswer(_) => Ok(()),
            PlatformEvent::BotJoined(e) => e.validate(),
            PlatformEvent::MemberJoined(e) | PlatformEvent::MemberLeft(e) => e.validate(),
            PlatformEvent::ProfileUpdated(p) => MemberChanged {
                channel_id: p.channel_id.clone(),
                user_id: p.user_id.clone(),
            }
            .validate(),
            PlatformEvent::MemberBlocked(p) | PlatformEvent::MemberUnblocked(p) => p.validate(),
            PlatformEvent::ChannelSettingsUpdated(p) => p.validate(),
        }
    }
}

/// 接收平台事件并转换为作业
///
/// # 返回值
///
/// * `202` - 已入队（`queued` 为入队的作业数，可能为0）
/// * `200` - URL 校验回调
/// * `400` - 事件校验失败
/// * `503` - 入队失败，平台应重新投递
#[instrument(skip(state, event), fields(event = event.kind()))]
pub async fn receive_event(
    Extension(state): Extension<AppState>,
    Json(event): Json<PlatformEvent>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    metrics::counter!("events_received_total", "event" => event.kind()).increment(1);
    event.validate()?;

    let queued = match event {
        PlatformEvent::UrlVerification { challenge } => {
            return Ok((StatusCode::OK, Json(json!({ "challenge": challenge }))));
        }
        PlatformEvent::BotJoined(e) => match e.inviter {
            Some(inviter) => {
                state
                    .queue
                    .submit(&AddChannelParams {
                        channel_id: e.channel_id,
                        inviter,
                        interval: None,
                        connection_mode: None,
                        weekday: None,
                        hour: None,
                        next_round: None,
                    })
                    .await?;
                1
            }
            None => {
                state
                    .queue
                    .submit(&SyncChannelsParams { bot_user_id: None })
                    .await?;
                1
            }
        },
        PlatformEvent::MemberJoined(e) => {
            if state.channels.exists(&e.channel_id).await? {
                state
                    .queue
                    .submit(&AddMemberParams {
                        channel_id: e.channel_id,
                        user_id: e.user_id,
                    })
                    .await?;
                1
            } else {
                debug!(channel_id = %e.channel_id, "Ignoring member of unknown channel");
                0
            }
        }
        PlatformEvent::MemberLeft(e) => {
            if state.channels.exists(&e.channel_id).await? {
                state
                    .queue
                    .submit(&DeleteMemberParams {
                        channel_id: e.channel_id,
                        user_id: e.user_id,
                    })
                    .await?;
                1
            } else {
                debug!(channel_id = %e.channel_id, "Ignoring member of unknown channel");
                0
            }
        }
        PlatformEvent::CheckPairAnswer(answer) => {
            state
                .queue
                .submit(&UpdateMatchParams {
                    match_id: answer.match_id,
                    has_met: answer.has_met,
                })
                .await?;

            // A pair that already met skips the final check-in.
            if answer.is_mid_round && answer.has_met {
                let pending = JobFilter::pending([JobType::CheckPair])
                    .with_payload("match_id", answer.match_id);
                let canceled = state.queue.cancel_matching(&pending).await?;
                debug!(canceled, "Canceled pending check-ins");
            }
            1
        }
        PlatformEvent::ProfileUpdated(params) => {
            state.queue.submit(&params).await?;
            1
        }
        PlatformEvent::MemberBlocked(params) => {
            state.queue.submit(&BlockMemberParams(params)).await?;
            1
        }
        PlatformEvent::MemberUnblocked(params) => {
            state.queue.submit(&UnblockMemberParams(params)).await?;
            1
        }
        PlatformEvent::ChannelSettingsUpdated(params) => {
            state.queue.submit(&params).await?;
            1
        }
    };

    info!(queued, "Accepted event");
    Ok((StatusCode::ACCEPTED, Json(json!({ "queued": queued }))))
}

#[cfg(test)]
#[path = "event_handler_test.rs"]
mod tests;
