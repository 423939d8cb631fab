// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::context::JobContext;
use crate::application::jobs::params::{
    CreateMatchesParams, CreateRoundParams, DeleteChannelParams, EndRoundParams,
    ReportStatsParams, SyncMembersParams,
};
use crate::domain::platform::traits::Notification;
use crate::domain::services::round_schedule::RoundPlan;
use crate::queue::scheduler::JobScheduler;
use crate::utils::errors::{JobError, StageExt};
use tracing::{debug, info, instrument, warn};

/// 开始新一轮
///
/// 机器人已不在频道中时改为下线频道。否则只在没有活跃轮次时创建轮次，
/// 然后依次安排：推进下一轮时间、结束本轮、统计报告、下一轮、成员同步与匹配。
/// 所有时间点都从 `p.next_round` 推导。
#[instrument(skip(ctx, p), fields(channel_id = %p.channel_id, next_round = %p.next_round))]
pub async fn create_round(ctx: &JobContext, p: CreateRoundParams) -> Result<(), JobError> {
    // The platform sends no event when the bot itself is removed from a channel.
    let is_member = ctx
        .platform(
            "failed to check bot channel membership",
            ctx.membership.is_bot_member(&p.channel_id),
        )
        .await?;
    if !is_member {
        warn!("Bot is no longer a channel member, offboarding channel");
        let delete = DeleteChannelParams {
            channel_id: p.channel_id,
        };
        ctx.store(
            "failed to queue DELETE_CHANNEL job",
            ctx.queue.submit(&delete),
        )
        .await?;
        return Ok(());
    }

    let (round, created) = ctx
        .store(
            "failed to start round",
            ctx.rounds.insert_or_fetch_active(&p.channel_id, p.next_round),
        )
        .await?;
    if !created {
        info!(round_id = %round.id, "A round is already in progress");
        return Ok(());
    }

    info!(round_id = %round.id, "Started round");

    let plan = RoundPlan::from_current(p.next_round, p.interval).stage("failed to plan round")?;

    ctx.store(
        "failed to update next round",
        ctx.channels.update_next_round(&p.channel_id, plan.next_round),
    )
    .await?;

    let end_round = EndRoundParams {
        channel_id: p.channel_id.clone(),
        next_round: plan.next_round,
    };
    ctx.store(
        "failed to queue END_ROUND job",
        ctx.queue.schedule(&end_round, plan.end_round_at),
    )
    .await?;

    let report_stats = ReportStatsParams {
        channel_id: p.channel_id.clone(),
        round_id: round.id,
        next_round: plan.next_round,
    };
    ctx.store(
        "failed to queue REPORT_STATS job",
        ctx.queue.schedule(&report_stats, plan.report_stats_at),
    )
    .await?;

    let next = CreateRoundParams {
        channel_id: p.channel_id.clone(),
        next_round: plan.next_round,
        interval: p.interval,
    };
    ctx.store(
        "failed to queue CREATE_ROUND job",
        ctx.queue.schedule(&next, plan.next_round),
    )
    .await?;

    let sync_members = SyncMembersParams {
        channel_id: p.channel_id.clone(),
    };
    ctx.store(
        "failed to queue SYNC_MEMBERS job",
        ctx.queue.submit(&sync_members),
    )
    .await?;

    let create_matches = CreateMatchesParams {
        channel_id: p.channel_id,
        round_id: round.id,
    };
    ctx.store(
        "failed to queue CREATE_MATCHES job",
        ctx.queue.submit(&create_matches),
    )
    .await?;

    debug!(
        next_round = %plan.next_round,
        end_round_at = %plan.end_round_at,
        "Scheduled round lifecycle"
    );
    Ok(())
}

/// 结束频道的活跃轮次
#[instrument(skip(ctx, p), fields(channel_id = %p.channel_id))]
pub async fn end_round(ctx: &JobContext, p: EndRoundParams) -> Result<(), JobError> {
    let ended = ctx
        .store("failed to end round", ctx.rounds.end_active(&p.channel_id))
        .await?;

    if ended == 0 {
        info!("No active round to end");
    } else {
        info!(next_round = %p.next_round, "Ended round");
    }
    Ok(())
}

/// 向频道发送本轮的见面统计
#[instrument(skip(ctx, p), fields(channel_id = %p.channel_id, round_id = %p.round_id))]
pub async fn report_stats(ctx: &JobContext, p: ReportStatsParams) -> Result<(), JobError> {
    let stats = ctx
        .store("failed to count matches", ctx.matches.round_stats(p.round_id))
        .await?;

    let notification = Notification::RoundStats {
        channel_id: p.channel_id.clone(),
        total: stats.total,
        met: stats.met,
        percent: stats.percent(),
    };
    ctx.platform(
        "failed to post round stats",
        ctx.notifier.post_message(&p.channel_id, &notification),
    )
    .await?;

    info!(total = stats.total, met = stats.met, "Reported round stats");
    Ok(())
}

#[cfg(test)]
#[path = "round_test.rs"]
mod tests;
