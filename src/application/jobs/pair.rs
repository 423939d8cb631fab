// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::context::JobContext;
use crate::application::jobs::params::{
    CheckPairParams, CreatePairParams, KickoffPairParams, MarkInactiveParams, NotifyMemberParams,
    NotifyPairParams,
};
use crate::domain::models::job::JobType;
use crate::domain::platform::traits::Notification;
use crate::domain::repositories::job_repository::JobFilter;
use crate::domain::services::round_schedule::{
    midpoint, FINAL_CHECK_OFFSET, KICKOFF_DELAY, ROUND_END_OFFSET,
};
use crate::queue::scheduler::JobScheduler;
use crate::utils::errors::JobError;
use chrono::Utc;
use rand::seq::IndexedRandom;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

/// 为匹配写入两名成员的配对行
///
/// 任一成员已在本轮其他匹配中配对时不做任何修改；写入成功后安排 NOTIFY_PAIR。
/// 配对行已由之前的尝试写入时，只在尚未通知且没有待执行的 NOTIFY_PAIR 时补发。
#[instrument(skip(ctx, p), fields(channel_id = %p.0.channel_id, match_id = %p.0.match_id))]
pub async fn create_pair(ctx: &JobContext, p: CreatePairParams) -> Result<(), JobError> {
    let CreatePairParams(pair) = p;

    let Some(matched) = ctx
        .store("failed to load match", ctx.matches.find_by_id(pair.match_id))
        .await?
    else {
        warn!("Match not found");
        return Ok(());
    };

    let mut member_ids = Vec::with_capacity(2);
    for user_id in [&pair.participant, &pair.partner] {
        match ctx
            .store("failed to load member", ctx.members.find(&pair.channel_id, user_id))
            .await?
        {
            Some(member) => member_ids.push(member.id),
            None => {
                warn!(user_id = %user_id, "Member not found");
                return Ok(());
            }
        }
    }

    let created = ctx
        .store(
            "failed to create pairings",
            ctx.matches
                .create_pairings(matched.id, matched.round_id, &member_ids),
        )
        .await?;
    if created {
        debug!("Created pairings");
    } else {
        // Either this match was paired by an earlier attempt, or a member
        // belongs to another match of the round.
        let paired = ctx
            .store("failed to load match participants", ctx.matches.participants(matched.id))
            .await?;
        if !pair.users().iter().all(|user_id| paired.contains(user_id)) {
            info!("A member is already paired this round");
            return Ok(());
        }
        if matched.was_notified {
            debug!("Pair already notified");
            return Ok(());
        }
        let queued = JobFilter::pending([JobType::NotifyPair]).with_payload("match_id", matched.id);
        if ctx
            .store("failed to check pending notifications", ctx.queue.count(&queued))
            .await?
            > 0
        {
            debug!("Pair notification already queued");
            return Ok(());
        }
        info!("Pairings already written, resuming notification");
    }

    ctx.store(
        "failed to queue NOTIFY_PAIR job",
        ctx.queue.submit(&NotifyPairParams(pair)),
    )
    .await?;
    Ok(())
}

/// 通知一对成员并安排后续提醒
///
/// 打开群组会话并发送介绍，随后安排破冰、期中与期末的见面询问以及
/// 不活跃检查。已通知过的匹配直接跳过；之前的尝试已安排的后续作业不会重复安排。
#[instrument(skip(ctx, p), fields(channel_id = %p.0.channel_id, match_id = %p.0.match_id))]
pub async fn notify_pair(ctx: &JobContext, p: NotifyPairParams) -> Result<(), JobError> {
    let NotifyPairParams(pair) = p;

    let Some(matched) = ctx
        .store("failed to load match", ctx.matches.find_by_id(pair.match_id))
        .await?
    else {
        warn!("Match not found");
        return Ok(());
    };
    if matched.was_notified {
        info!("Pair already notified");
        return Ok(());
    }

    let channel = ctx
        .store("failed to load channel", ctx.channels.find_by_id(&pair.channel_id))
        .await?
        .ok_or_else(|| JobError::ChannelNotFound(pair.channel_id.clone()))?;
    let next_round = channel.next_round.with_timezone(&Utc);

    // Follow-ups left behind by an earlier attempt that failed before
    // marking the match notified.
    let follow_ups = ctx
        .store(
            "failed to list follow-up jobs",
            ctx.queue.find(
                &JobFilter::pending([
                    JobType::KickoffPair,
                    JobType::CheckPair,
                    JobType::MarkInactive,
                ])
                .with_payload("match_id", matched.id),
            ),
        )
        .await?;
    let has_follow_up = |job_type: JobType, is_mid_round: Option<bool>| {
        follow_ups.iter().any(|job| {
            job.job_type == job_type
                && is_mid_round.is_none_or(|mid| job.data["is_mid_round"] == mid)
        })
    };

    let users = pair.users();
    let mpim_id = match matched.mpim_id.clone() {
        // The intro is posted before any follow-up is queued.
        Some(mpim_id) if !follow_ups.is_empty() => {
            info!(scheduled = follow_ups.len(), "Resuming pair notification");
            mpim_id
        }
        _ => {
            let mpim_id = ctx
                .platform(
                    "failed to open group conversation",
                    ctx.notifier.open_conversation(&users),
                )
                .await?;
            ctx.store(
                "failed to save conversation",
                ctx.matches.set_conversation(matched.id, &mpim_id),
            )
            .await?;

            let intro = Notification::PairIntro {
                channel_id: pair.channel_id.clone(),
                participant: pair.participant.clone(),
                partner: pair.partner.clone(),
                next_round,
            };
            ctx.platform(
                "failed to notify pair",
                ctx.notifier.post_message(&mpim_id, &intro),
            )
            .await?;
            mpim_id
        }
    };

    let now = Utc::now();

    if !has_follow_up(JobType::KickoffPair, None) {
        ctx.store(
            "failed to queue KICKOFF_PAIR job",
            ctx.queue
                .schedule(&KickoffPairParams(pair.clone()), now + KICKOFF_DELAY),
        )
        .await?;
    }

    let check = |is_mid_round| CheckPairParams {
        channel_id: pair.channel_id.clone(),
        match_id: matched.id,
        participant: pair.participant.clone(),
        partner: pair.partner.clone(),
        mpim_id: mpim_id.clone(),
        next_round,
        is_mid_round,
    };

    if !has_follow_up(JobType::CheckPair, Some(true)) {
        match midpoint(now, next_round) {
            Ok(mid_round) => {
                ctx.store(
                    "failed to queue mid-round CHECK_PAIR job",
                    ctx.queue.schedule(&check(true), mid_round),
                )
                .await?;
            }
            Err(e) => warn!(error = %e, "Skipping mid-round check"),
        }
    }

    if !has_follow_up(JobType::CheckPair, Some(false)) {
        ctx.store(
            "failed to queue CHECK_PAIR job",
            ctx.queue
                .schedule(&check(false), next_round - FINAL_CHECK_OFFSET),
        )
        .await?;
    }

    if !has_follow_up(JobType::MarkInactive, None) {
        let mark_inactive = MarkInactiveParams {
            channel_id: pair.channel_id.clone(),
            match_id: matched.id,
            next_round,
            participants: users,
        };
        ctx.store(
            "failed to queue MARK_INACTIVE job",
            ctx.queue
                .schedule(&mark_inactive, next_round - ROUND_END_OFFSET),
        )
        .await?;
    }

    ctx.store(
        "failed to mark match notified",
        ctx.matches.mark_notified(matched.id),
    )
    .await?;

    info!(mpim_id = %mpim_id, "Notified pair");
    Ok(())
}

/// 两人尚未交流时随机指定一人发起对话
#[instrument(skip(ctx, p), fields(channel_id = %p.0.channel_id, match_id = %p.0.match_id))]
pub async fn kickoff_pair(ctx: &JobContext, p: KickoffPairParams) -> Result<(), JobError> {
    let KickoffPairParams(pair) = p;

    let Some(matched) = ctx
        .store("failed to load match", ctx.matches.find_by_id(pair.match_id))
        .await?
    else {
        warn!("Match not found");
        return Ok(());
    };
    let Some(mpim_id) = matched.mpim_id else {
        warn!("Pair has no conversation yet");
        return Ok(());
    };

    let history = ctx
        .platform(
            "failed to read conversation history",
            ctx.notifier
                .conversation_history(&mpim_id, matched.created_at.with_timezone(&Utc)),
        )
        .await?;
    if history.len() > 1 {
        info!(messages = history.len(), "Pair is already talking");
        return Ok(());
    }

    let users = pair.users();
    let volunteer = {
        let mut rng = ctx.rng();
        users.choose(&mut rng).cloned()
    };
    let Some(volunteer) = volunteer else {
        return Ok(());
    };

    let kickoff = Notification::Kickoff {
        channel_id: pair.channel_id,
        volunteer,
    };
    ctx.platform(
        "failed to kick off pair",
        ctx.notifier.post_message(&mpim_id, &kickoff),
    )
    .await?;

    info!("Kicked off pair");
    Ok(())
}

/// 向未匹配的成员私信致歉
#[instrument(skip(ctx, p), fields(channel_id = %p.channel_id, user_id = %p.user_id))]
pub async fn notify_member(ctx: &JobContext, p: NotifyMemberParams) -> Result<(), JobError> {
    let conversation = ctx
        .platform(
            "failed to open conversation with member",
            ctx.notifier.open_conversation(&[p.user_id.clone()]),
        )
        .await?;

    let notification = Notification::Unmatched {
        channel_id: p.channel_id,
        user_id: p.user_id,
        next_round: p.next_round,
    };
    ctx.platform(
        "failed to notify unmatched member",
        ctx.notifier.post_message(&conversation, &notification),
    )
    .await?;

    info!("Notified unmatched member");
    Ok(())
}

/// 在群组会话中询问是否已见面
#[instrument(skip(ctx, p), fields(channel_id = %p.channel_id, match_id = %p.match_id, mid_round = p.is_mid_round))]
pub async fn check_pair(ctx: &JobContext, p: CheckPairParams) -> Result<(), JobError> {
    let notification = Notification::CheckPair {
        channel_id: p.channel_id,
        match_id: p.match_id,
        is_mid_round: p.is_mid_round,
    };
    ctx.platform(
        "failed to check pair",
        ctx.notifier.post_message(&p.mpim_id, &notification),
    )
    .await?;

    info!("Asked pair whether they met");
    Ok(())
}

/// 把整轮未在群组会话中发言的成员标记为不活跃
///
/// 被标记的成员收到私信，本轮的不活跃人数同步增加。
///
/// # 参数
///
/// * `p.participants` - 该匹配的全部成员
///
/// # 返回值
///
/// 成功时返回 `Ok(())`；会话不存在时视为无事可做
#[instrument(skip(ctx, p), fields(channel_id = %p.channel_id, match_id = %p.match_id))]
pub async fn mark_inactive(ctx: &JobContext, p: MarkInactiveParams) -> Result<(), JobError> {
    let Some(matched) = ctx
        .store("failed to load match", ctx.matches.find_by_id(p.match_id))
        .await?
    else {
        warn!("Match not found");
        return Ok(());
    };
    let Some(mpim_id) = matched.mpim_id else {
        warn!("Pair has no conversation");
        return Ok(());
    };

    let history = ctx
        .platform(
            "failed to read conversation history",
            ctx.notifier
                .conversation_history(&mpim_id, matched.created_at.with_timezone(&Utc)),
        )
        .await?;
    let senders: HashSet<&str> = history.iter().map(|m| m.user_id.as_str()).collect();

    let silent: Vec<&String> = p
        .participants
        .iter()
        .filter(|user_id| !senders.contains(user_id.as_str()))
        .collect();
    if silent.is_empty() {
        debug!("Every participant spoke this round");
        return Ok(());
    }

    let mut marked = 0;
    for user_id in &silent {
        let updated = ctx
            .store(
                "failed to deactivate member",
                ctx.members.set_active(&p.channel_id, user_id, false),
            )
            .await?;
        if updated > 0 {
            marked += 1;
        }
    }

    if marked > 0 {
        ctx.store(
            "failed to count inactive members",
            ctx.rounds.increment_inactive(matched.round_id, marked),
        )
        .await?;
    }

    for user_id in silent {
        let conversation = ctx
            .platform(
                "failed to open conversation with member",
                ctx.notifier.open_conversation(&[user_id.clone()]),
            )
            .await?;
        let notification = Notification::MarkedInactive {
            channel_id: p.channel_id.clone(),
            user_id: user_id.clone(),
            next_round: p.next_round,
        };
        ctx.platform(
            "failed to notify inactive member",
            ctx.notifier.post_message(&conversation, &notification),
        )
        .await?;
    }

    info!(marked, "Marked silent members inactive");
    Ok(())
}

#[cfg(test)]
#[path = "pair_test.rs"]
mod tests;
