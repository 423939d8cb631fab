// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::context::JobContext;
use crate::application::jobs::params::{
    CreateMatchParams, CreateMatchesParams, CreatePairParams, NotifyMemberParams, PairParams,
    ReportMatchesParams, UpdateMatchParams,
};
use crate::domain::models::job::JobType;
use crate::domain::models::round::Round;
use crate::domain::platform::traits::Notification;
use crate::domain::repositories::job_repository::JobFilter;
use crate::domain::services::pairing_service::{
    late_arrival_candidates, match_group, PairingCandidate,
};
use crate::domain::services::round_schedule::{midpoint, REPORT_MATCHES_DELAY};
use crate::queue::barrier::BarrierOutcome;
use crate::queue::scheduler::JobScheduler;
use crate::utils::errors::{JobError, StageExt};
use chrono::Utc;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

/// 为一轮的全部活跃成员分组匹配
///
/// 先等待频道的成员作业清空，然后对本轮尚未配对的活跃成员执行分组匹配。
/// 未匹配的成员收到致歉，每对成员创建一条匹配并安排 CREATE_PAIR，
/// 最后安排 REPORT_MATCHES。已安排过 REPORT_MATCHES 的轮次直接跳过。
#[instrument(skip(ctx, p), fields(channel_id = %p.channel_id, round_id = %p.round_id))]
pub async fn create_matches(ctx: &JobContext, p: CreateMatchesParams) -> Result<(), JobError> {
    info!("Waiting for in-flight member jobs");
    let outcome = ctx
        .options
        .barrier
        .wait(ctx.queue.as_ref(), &p.channel_id)
        .await
        .stage("failed to wait for member jobs")?;
    if outcome == BarrierOutcome::TimedOut {
        warn!("Matching while member jobs are still pending");
    }

    // REPORT_MATCHES is queued last, so its presence means an earlier attempt
    // finished. Anything short of that is resumed below.
    let reported = JobFilter {
        job_types: vec![JobType::ReportMatches],
        ..Default::default()
    }
    .with_payload("round_id", p.round_id);
    if ctx
        .store("failed to check match report", ctx.queue.count(&reported))
        .await?
        > 0
    {
        info!("Matches already created for this round");
        return Ok(());
    }

    let channel = ctx
        .store("failed to load channel", ctx.channels.find_by_id(&p.channel_id))
        .await?
        .ok_or_else(|| JobError::ChannelNotFound(p.channel_id.clone()))?;
    let next_round = channel.next_round.with_timezone(&Utc);

    // Members paired by an earlier attempt or a late arrival are left out,
    // as are members already named in a pending CREATE_PAIR.
    let booked = booked_users(ctx, &p.channel_id).await?;
    let members: Vec<_> = ctx
        .store(
            "failed to list unpaired members",
            ctx.members.list_unpaired_active(&p.channel_id, p.round_id),
        )
        .await?
        .into_iter()
        .filter(|m| !booked.contains(&m.user_id))
        .collect();
    let blocked = ctx
        .store(
            "failed to list blocked members",
            ctx.blocked.list_for_channel(&p.channel_id),
        )
        .await?;

    let candidates: Vec<PairingCandidate> = members.iter().map(PairingCandidate::from).collect();
    let outcome = {
        let mut rng = ctx.rng();
        match_group(&candidates, &blocked, &mut rng)
    };

    for user_id in &outcome.unmatched {
        let apologized = JobFilter {
            job_types: vec![JobType::NotifyMember],
            ..Default::default()
        }
        .with_payload("round_id", p.round_id)
        .with_payload("user_id", user_id);
        if ctx
            .store("failed to check apologies", ctx.queue.count(&apologized))
            .await?
            > 0
        {
            debug!(user_id = %user_id, "Member already received an apology");
            continue;
        }

        let params = NotifyMemberParams {
            channel_id: p.channel_id.clone(),
            round_id: p.round_id,
            user_id: user_id.clone(),
            next_round,
        };
        ctx.store(
            "failed to queue NOTIFY_MEMBER job",
            ctx.queue.submit(&params),
        )
        .await?;
        debug!(user_id = %user_id, "Queued apology for unmatched member");
    }

    for pair in &outcome.pairs {
        let matched = ctx
            .store("failed to create match", ctx.matches.create(p.round_id))
            .await?;

        let params = CreatePairParams(PairParams {
            channel_id: p.channel_id.clone(),
            match_id: matched.id,
            participant: pair.participant.clone(),
            partner: pair.partner.clone(),
        });
        ctx.store("failed to queue CREATE_PAIR job", ctx.queue.submit(&params))
            .await?;
        debug!(match_id = %matched.id, "Queued pair for match");
    }

    info!(
        participants = outcome.participant_count(),
        pairs = outcome.pair_count(),
        unmatched = outcome.unmatched_count(),
        "Matched active members"
    );

    // The report covers the whole round, including pairs made earlier.
    let stats = ctx
        .store("failed to count matches", ctx.matches.round_stats(p.round_id))
        .await?;
    let pairs = stats.total as usize;
    let report = ReportMatchesParams {
        channel_id: p.channel_id,
        round_id: p.round_id,
        participants: pairs * 2 + outcome.unmatched_count(),
        pairs,
        unmatched: outcome.unmatched_count(),
    };
    ctx.store(
        "failed to queue REPORT_MATCHES job",
        ctx.queue
            .schedule(&report, Utc::now() + REPORT_MATCHES_DELAY),
    )
    .await?;

    Ok(())
}

/// 把本轮匹配汇总同时发给管理员和频道
///
/// 两个分支都会尝试；任一失败时作业失败，已成功的一方不会回滚。
#[instrument(skip(ctx, p), fields(channel_id = %p.channel_id, round_id = %p.round_id))]
pub async fn report_matches(ctx: &JobContext, p: ReportMatchesParams) -> Result<(), JobError> {
    let channel = ctx
        .store("failed to load channel", ctx.channels.find_by_id(&p.channel_id))
        .await?
        .ok_or_else(|| JobError::ChannelNotFound(p.channel_id.clone()))?;

    let notification = Notification::MatchesReport {
        channel_id: p.channel_id.clone(),
        participants: p.participants,
        pairs: p.pairs,
        unmatched: p.unmatched,
    };

    let to_admin = async {
        let conversation = ctx
            .platform(
                "failed to open conversation with admin",
                ctx.notifier.open_conversation(&[channel.inviter.clone()]),
            )
            .await?;
        ctx.platform(
            "failed to report matches to admin",
            ctx.notifier.post_message(&conversation, &notification),
        )
        .await
    };
    let to_channel = ctx.platform(
        "failed to report matches to channel",
        ctx.notifier.post_message(&p.channel_id, &notification),
    );

    let (admin, channel_result) = tokio::join!(to_admin, to_channel);

    let failures: Vec<String> = [admin, channel_result]
        .into_iter()
        .filter_map(Result::err)
        .map(|e| e.to_string())
        .collect();
    if !failures.is_empty() {
        return Err(JobError::Fanout(failures.join("; ")));
    }

    info!("Reported matches");
    Ok(())
}

/// 迟到成员的匹配结果
#[derive(Debug, Clone, PartialEq)]
pub struct LatePairing {
    pub round: Round,
    pub partner: String,
}

/// 为轮次中途加入的成员寻找伙伴
///
/// 以下情况返回 `None`：没有活跃轮次、本轮已过半、成员不存在或已配对、
/// 没有未被屏蔽且尚未被其他作业预订的伙伴。
///
/// # 参数
///
/// * `channel_id` - 频道ID
/// * `participant` - 迟到成员的用户ID
///
/// # 返回值
///
/// * `Ok(Some(LatePairing))` - 选中的伙伴与所在轮次
/// * `Ok(None)` - 无法匹配
/// * `Err(JobError)` - 依赖调用失败或轮次时间无法计算
pub async fn match_late_arrival(
    ctx: &JobContext,
    channel_id: &str,
    participant: &str,
) -> Result<Option<LatePairing>, JobError> {
    let Some(round) = ctx
        .store("failed to load active round", ctx.rounds.find_active(channel_id))
        .await?
    else {
        warn!("No active round");
        return Ok(None);
    };

    let channel = ctx
        .store("failed to load channel", ctx.channels.find_by_id(channel_id))
        .await?
        .ok_or_else(|| JobError::ChannelNotFound(channel_id.to_string()))?;

    let halfway = midpoint(
        round.started_at.with_timezone(&Utc),
        channel.next_round.with_timezone(&Utc),
    )
    .stage("failed to compute round midpoint")?;
    if halfway < Utc::now() {
        warn!("Not enough time left in the round");
        return Ok(None);
    }

    let Some(member) = ctx
        .store("failed to load member", ctx.members.find(channel_id, participant))
        .await?
    else {
        warn!("Member not found");
        return Ok(None);
    };

    let pool = ctx
        .store(
            "failed to list unpaired members",
            ctx.members.list_unpaired_active(channel_id, round.id),
        )
        .await?;
    if !pool.iter().any(|m| m.user_id == participant) {
        info!("Member is inactive or already paired this round");
        return Ok(None);
    }

    let blocked = ctx
        .store(
            "failed to list blocked members",
            ctx.blocked.list_for_channel(channel_id),
        )
        .await?;

    let pool: Vec<PairingCandidate> = pool.iter().map(PairingCandidate::from).collect();
    let ranked = late_arrival_candidates(&PairingCandidate::from(&member), &pool, &blocked);

    if is_booked(ctx, participant).await? {
        warn!("Member already has a pending pairing");
        return Ok(None);
    }

    for candidate in ranked {
        if is_booked(ctx, &candidate.user_id).await? {
            debug!(partner = %candidate.user_id, "Skipping partner with a pending pairing");
            continue;
        }
        return Ok(Some(LatePairing {
            round,
            partner: candidate.user_id,
        }));
    }

    warn!("No suitable partner found");
    Ok(None)
}

/// 频道内未完成的 CREATE_PAIR 作业中出现的全部用户
async fn booked_users(ctx: &JobContext, channel_id: &str) -> Result<HashSet<String>, JobError> {
    let filter = JobFilter::pending([JobType::CreatePair]).with_payload("channel_id", channel_id);
    let jobs = ctx
        .store("failed to list pending pairings", ctx.queue.find(&filter))
        .await?;
    Ok(jobs
        .iter()
        .flat_map(|job| [&job.data["participant"], &job.data["partner"]])
        .filter_map(|value| value.as_str().map(str::to_string))
        .collect())
}

/// 用户是否已出现在未完成的 CREATE_PAIR 作业中
async fn is_booked(ctx: &JobContext, user_id: &str) -> Result<bool, JobError> {
    let filter = JobFilter::pending([JobType::CreatePair])
        .with_any_payload("participant", user_id)
        .with_any_payload("partner", user_id);
    let count = ctx
        .store("failed to check pending pairings", ctx.queue.count(&filter))
        .await?;
    Ok(count > 0)
}

/// 为迟到成员创建匹配
#[instrument(skip(ctx, p), fields(channel_id = %p.channel_id, user_id = %p.participant))]
pub async fn create_match(ctx: &JobContext, p: CreateMatchParams) -> Result<(), JobError> {
    let Some(pairing) = match_late_arrival(ctx, &p.channel_id, &p.participant).await? else {
        return Ok(());
    };

    let matched = ctx
        .store("failed to create match", ctx.matches.create(pairing.round.id))
        .await?;

    let params = CreatePairParams(PairParams {
        channel_id: p.channel_id,
        match_id: matched.id,
        participant: p.participant,
        partner: pairing.partner,
    });
    ctx.store("failed to queue CREATE_PAIR job", ctx.queue.submit(&params))
        .await?;

    info!(match_id = %matched.id, partner = %params.0.partner, "Matched late member");
    Ok(())
}

/// 记录一对成员是否见面
#[instrument(skip(ctx, p), fields(match_id = %p.match_id))]
pub async fn update_match(ctx: &JobContext, p: UpdateMatchParams) -> Result<(), JobError> {
    let updated = ctx
        .store(
            "failed to update match",
            ctx.matches.set_has_met(p.match_id, p.has_met),
        )
        .await?;

    if updated == 0 {
        warn!("Match not found");
    } else {
        info!(has_met = p.has_met, "Updated match");
    }
    Ok(())
}

#[cfg(test)]
#[path = "matches_test.rs"]
mod tests;
