// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::context::JobContext;
use crate::application::jobs::params::{
    AddChannelParams, CreateRoundParams, DeleteChannelParams, EndRoundParams, GreetAdminParams,
    SyncChannelsParams, SyncMembersParams, UpdateChannelParams,
};
use crate::domain::models::channel::Channel;
use crate::domain::models::job::JobType;
use crate::domain::platform::traits::Notification;
use crate::domain::repositories::job_repository::JobFilter;
use crate::domain::services::reconciliation_service::reconcile;
use crate::domain::services::round_schedule::{first_round, parse_weekday, ROUND_END_OFFSET};
use crate::queue::scheduler::JobScheduler;
use crate::utils::errors::{JobError, StageExt};
use chrono::{DateTime, FixedOffset, Utc};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// 登记一个启用了轮次匹配的频道
///
/// 频道已存在时什么也不做；新建时安排首轮 CREATE_ROUND，
/// 并尽力安排一次成员同步。
#[instrument(skip(ctx, p), fields(channel_id = %p.channel_id))]
pub async fn add_channel(ctx: &JobContext, p: AddChannelParams) -> Result<(), JobError> {
    let defaults = ctx.options.defaults;

    let weekday = match p.weekday.as_deref() {
        Some(value) => parse_weekday(value).map_err(|e| JobError::Validation(e.to_string()))?,
        None => defaults.weekday,
    };
    let hour = p.hour.unwrap_or(defaults.hour);
    if hour > 23 {
        return Err(JobError::Validation(format!("hour {} is out of range", hour)));
    }
    let interval = p.interval.unwrap_or(defaults.interval);

    let next_round = match p.next_round {
        Some(next_round) => next_round,
        None => first_round(Utc::now(), weekday, hour).stage("failed to compute first round")?,
    };

    let now: DateTime<FixedOffset> = Utc::now().into();
    let channel = Channel {
        channel_id: p.channel_id.clone(),
        inviter: p.inviter.clone(),
        connection_mode: p.connection_mode.unwrap_or(defaults.connection_mode),
        interval,
        weekday,
        hour,
        next_round: next_round.into(),
        created_at: now,
        updated_at: now,
    };

    let (_, created) = ctx
        .store("failed to add channel", ctx.channels.insert_or_fetch(&channel))
        .await?;
    if !created {
        debug!("Channel already exists");
        return Ok(());
    }

    info!(next_round = %next_round, %interval, "Added channel");

    let create_round = CreateRoundParams {
        channel_id: p.channel_id.clone(),
        next_round,
        interval,
    };
    ctx.store(
        "failed to queue CREATE_ROUND job",
        ctx.queue.schedule(&create_round, next_round),
    )
    .await?;

    let sync_members = SyncMembersParams {
        channel_id: p.channel_id,
    };
    if let Err(e) = ctx
        .store("failed to queue SYNC_MEMBERS job", ctx.queue.submit(&sync_members))
        .await
    {
        // Members are synced again before every round.
        warn!(error = %e, "Skipping initial member sync");
    }

    Ok(())
}

/// 私信欢迎启用频道的管理员
#[instrument(skip(ctx, p), fields(channel_id = %p.channel_id, user_id = %p.inviter))]
pub async fn greet_admin(ctx: &JobContext, p: GreetAdminParams) -> Result<(), JobError> {
    let conversation = ctx
        .platform(
            "failed to open conversation with admin",
            ctx.notifier.open_conversation(&[p.inviter.clone()]),
        )
        .await?;

    let notification = Notification::GreetAdmin {
        channel_id: p.channel_id,
        user_id: p.inviter,
    };
    ctx.platform(
        "failed to greet admin",
        ctx.notifier.post_message(&conversation, &notification),
    )
    .await?;

    info!("Greeted admin");
    Ok(())
}

/// 更新频道的轮次设置
///
/// 取消尚未执行的 CREATE_ROUND，并按新设置重新安排。有活跃轮次时，
/// 它的 END_ROUND 也按新的下一轮时间重排；来不及提前结束的轮次立即结束。
#[instrument(skip(ctx, p), fields(channel_id = %p.channel_id))]
pub async fn update_channel(ctx: &JobContext, p: UpdateChannelParams) -> Result<(), JobError> {
    p.validate()
        .map_err(|e| JobError::Validation(e.to_string()))?;
    let weekday = parse_weekday(&p.weekday).map_err(|e| JobError::Validation(e.to_string()))?;

    let mut channel = ctx
        .store("failed to load channel", ctx.channels.find_by_id(&p.channel_id))
        .await?
        .ok_or_else(|| JobError::ChannelNotFound(p.channel_id.clone()))?;

    let next_round = match p.next_round {
        Some(next_round) => next_round,
        None => first_round(Utc::now(), weekday, p.hour).stage("failed to compute next round")?,
    };

    channel.interval = p.interval;
    channel.connection_mode = p.connection_mode;
    channel.weekday = weekday;
    channel.hour = p.hour;
    channel.next_round = next_round.into();
    ctx.store("failed to update channel", ctx.channels.update(&channel))
        .await?;

    reschedule_round_end(ctx, &p.channel_id, next_round).await?;

    let pending_rounds =
        JobFilter::pending([JobType::CreateRound]).with_payload("channel_id", &p.channel_id);
    let canceled = ctx
        .store(
            "failed to cancel pending CREATE_ROUND jobs",
            ctx.queue.cancel_matching(&pending_rounds),
        )
        .await?;
    debug!(canceled, "Canceled pending rounds");

    let create_round = CreateRoundParams {
        channel_id: p.channel_id,
        next_round,
        interval: p.interval,
    };
    ctx.store(
        "failed to queue CREATE_ROUND job",
        ctx.queue.schedule(&create_round, next_round),
    )
    .await?;

    info!(next_round = %next_round, interval = %p.interval, "Updated channel");
    Ok(())
}

/// 让活跃轮次在新的下一轮开始之前结束
///
/// 否则新的 CREATE_ROUND 会遇到仍在进行的轮次而不再续排。
async fn reschedule_round_end(
    ctx: &JobContext,
    channel_id: &str,
    next_round: DateTime<Utc>,
) -> Result<(), JobError> {
    let Some(round) = ctx
        .store("failed to load active round", ctx.rounds.find_active(channel_id))
        .await?
    else {
        return Ok(());
    };

    let pending_ends =
        JobFilter::pending([JobType::EndRound]).with_payload("channel_id", channel_id);
    let canceled = ctx
        .store(
            "failed to cancel pending END_ROUND jobs",
            ctx.queue.cancel_matching(&pending_ends),
        )
        .await?;
    debug!(canceled, "Canceled pending round ends");

    let end_at = next_round - ROUND_END_OFFSET;
    if end_at <= Utc::now() {
        ctx.store("failed to end round", ctx.rounds.end_active(channel_id))
            .await?;
        info!(round_id = %round.id, "Ended active round ahead of the new schedule");
        return Ok(());
    }

    let end_round = EndRoundParams {
        channel_id: channel_id.to_string(),
        next_round,
    };
    ctx.store(
        "failed to queue END_ROUND job",
        ctx.queue.schedule(&end_round, end_at),
    )
    .await?;
    debug!(round_id = %round.id, end_at = %end_at, "Rescheduled round end");
    Ok(())
}

/// 下线频道
///
/// 先取消频道所有未完成的作业，再删除频道及其成员、轮次等数据。
#[instrument(skip(ctx, p), fields(channel_id = %p.channel_id))]
pub async fn delete_channel(ctx: &JobContext, p: DeleteChannelParams) -> Result<(), JobError> {
    let filter = JobFilter {
        is_completed: Some(false),
        ..Default::default()
    }
    .with_payload("channel_id", &p.channel_id);

    let canceled = ctx
        .store("failed to cancel channel jobs", ctx.queue.cancel_matching(&filter))
        .await?;

    let deleted = ctx
        .store("failed to delete channel", ctx.channels.delete(&p.channel_id))
        .await?;

    if deleted == 0 {
        debug!(canceled, "Channel was already deleted");
    } else {
        info!(canceled, "Deleted channel");
    }
    Ok(())
}

/// 对账机器人所在的频道与数据库中的频道
#[instrument(skip(ctx, p))]
pub async fn sync_channels(ctx: &JobContext, p: SyncChannelsParams) -> Result<(), JobError> {
    let bot_user_id = p
        .bot_user_id
        .unwrap_or_else(|| ctx.options.bot_user_id.clone());

    let listings = ctx
        .platform(
            "failed to list bot channels",
            ctx.membership.list_channels(&bot_user_id),
        )
        .await?;
    let local = ctx
        .store("failed to list channels", ctx.channels.list_ids())
        .await?;

    debug!(
        platform_channels = listings.len(),
        local_channels = local.len(),
        "Reconciling channels"
    );

    let inviters: HashMap<String, String> = listings
        .iter()
        .map(|l| (l.channel_id.clone(), l.inviter.clone()))
        .collect();

    for entry in reconcile(listings.into_iter().map(|l| l.channel_id), local) {
        let channel_id = entry.key;

        if entry.create {
            let greeted = JobFilter {
                job_types: vec![JobType::GreetAdmin],
                ..Default::default()
            }
            .with_payload("channel_id", &channel_id);

            let existing = ctx
                .store(
                    "failed to check for GREET_ADMIN job",
                    ctx.queue.count(&greeted),
                )
                .await?;
            if existing > 0 {
                debug!(channel_id = %channel_id, "Admin already greeted");
                continue;
            }

            let greet = GreetAdminParams {
                inviter: inviters.get(&channel_id).cloned().unwrap_or_default(),
                channel_id,
            };
            ctx.store("failed to queue GREET_ADMIN job", ctx.queue.submit(&greet))
                .await?;
        } else if entry.delete {
            let delete = DeleteChannelParams { channel_id };
            ctx.store(
                "failed to queue DELETE_CHANNEL job",
                ctx.queue.submit(&delete),
            )
            .await?;
        } else {
            let sync = SyncMembersParams {
                channel_id: channel_id.clone(),
            };
            if let Err(e) = ctx
                .store("failed to queue SYNC_MEMBERS job", ctx.queue.submit(&sync))
                .await
            {
                warn!(channel_id = %channel_id, error = %e, "Skipping member sync");
            }
        }
    }

    info!("Synced channels");
    Ok(())
}

#[cfg(test)]
#[path = "channel_test.rs"]
mod tests;
