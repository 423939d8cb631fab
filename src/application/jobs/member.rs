// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::context::JobContext;
use crate::application::jobs::params::{
    AddMemberParams, BlockMemberParams, CreateMatchParams, DeleteMemberParams,
    GreetMemberParams, SyncMembersParams, UnblockMemberParams, UpdateMemberParams,
};
use crate::domain::models::member::{ConnectionMode, Gender, Member};
use crate::domain::platform::traits::Notification;
use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::services::reconciliation_service::reconcile;
use crate::domain::services::round_schedule::LATE_MATCH_DELAY;
use crate::queue::scheduler::JobScheduler;
use crate::utils::errors::JobError;
use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// 登记频道的新成员
///
/// 机器人不会被登记。新成员默认不活跃，需要完善资料后才参与匹配。
#[instrument(skip(ctx, p), fields(channel_id = %p.channel_id, user_id = %p.user_id))]
pub async fn add_member(ctx: &JobContext, p: AddMemberParams) -> Result<(), JobError> {
    if p.user_id == ctx.options.bot_user_id {
        debug!("Skipping bot user");
        return Ok(());
    }
    let is_bot = ctx
        .platform("failed to check if user is a bot", ctx.membership.is_bot(&p.user_id))
        .await?;
    if is_bot {
        debug!("Skipping bot user");
        return Ok(());
    }

    let now: DateTime<FixedOffset> = Utc::now().into();
    let member = Member {
        id: Uuid::new_v4(),
        channel_id: p.channel_id.clone(),
        user_id: p.user_id.clone(),
        gender: Gender::Male,
        has_gender_preference: false,
        connection_mode: ConnectionMode::Hybrid,
        is_active: false,
        profile: serde_json::Value::Object(Default::default()),
        created_at: now,
        updated_at: now,
    };

    let (_, created) = ctx
        .store("failed to add member", ctx.members.insert_or_fetch(&member))
        .await?;
    if !created {
        debug!("Member already exists");
        return Ok(());
    }

    info!("Added member");

    let greet = GreetMemberParams {
        channel_id: p.channel_id,
        user_id: p.user_id,
    };
    ctx.store("failed to queue GREET_MEMBER job", ctx.queue.submit(&greet))
        .await?;
    Ok(())
}

/// 更新成员资料与参与状态
///
/// 不活跃的成员被重新激活时，安排一次迟到匹配。
#[instrument(skip(ctx, p), fields(channel_id = %p.channel_id, user_id = %p.user_id))]
pub async fn update_member(ctx: &JobContext, p: UpdateMemberParams) -> Result<(), JobError> {
    // A missing row is retried: ADD_MEMBER may still be queued.
    let mut member = ctx
        .store("failed to load member", ctx.members.find(&p.channel_id, &p.user_id))
        .await?
        .ok_or_else(|| JobError::Repository {
            stage: "failed to load member",
            source: RepositoryError::NotFound,
        })?;

    let was_active = member.is_active;

    if let Some(gender) = p.gender {
        member.gender = gender;
    }
    if let Some(has_gender_preference) = p.has_gender_preference {
        member.has_gender_preference = has_gender_preference;
    }
    if let Some(connection_mode) = p.connection_mode {
        member.connection_mode = connection_mode;
    }
    if let Some(is_active) = p.is_active {
        member.is_active = is_active;
    }
    if let Some(profile) = p.profile {
        member.profile = profile;
    }

    let member = ctx
        .store("failed to update member", ctx.members.update(&member))
        .await?;
    info!(is_active = member.is_active, "Updated member");

    if !was_active && member.is_active {
        let create_match = CreateMatchParams {
            channel_id: p.channel_id,
            participant: p.user_id,
        };
        ctx.store(
            "failed to queue CREATE_MATCH job",
            ctx.queue
                .schedule(&create_match, Utc::now() + LATE_MATCH_DELAY),
        )
        .await?;
        debug!("Queued late match for reactivated member");
    }

    Ok(())
}

/// 私信欢迎新成员
#[instrument(skip(ctx, p), fields(channel_id = %p.channel_id, user_id = %p.user_id))]
pub async fn greet_member(ctx: &JobContext, p: GreetMemberParams) -> Result<(), JobError> {
    let conversation = ctx
        .platform(
            "failed to open conversation with member",
            ctx.notifier.open_conversation(&[p.user_id.clone()]),
        )
        .await?;

    let notification = Notification::GreetMember {
        channel_id: p.channel_id,
        user_id: p.user_id,
    };
    ctx.platform(
        "failed to greet member",
        ctx.notifier.post_message(&conversation, &notification),
    )
    .await?;

    info!("Greeted member");
    Ok(())
}

/// 删除离开频道的成员
#[instrument(skip(ctx, p), fields(channel_id = %p.channel_id, user_id = %p.user_id))]
pub async fn delete_member(ctx: &JobContext, p: DeleteMemberParams) -> Result<(), JobError> {
    let deleted = ctx
        .store(
            "failed to delete member",
            ctx.members.delete(&p.channel_id, &p.user_id),
        )
        .await?;

    if deleted == 0 {
        debug!("Member was already deleted");
    } else {
        info!("Deleted member");
    }
    Ok(())
}

/// 对账平台上的频道成员与数据库中的成员
#[instrument(skip(ctx, p), fields(channel_id = %p.channel_id))]
pub async fn sync_members(ctx: &JobContext, p: SyncMembersParams) -> Result<(), JobError> {
    let mut roster = Vec::new();
    let mut cursor = None;
    loop {
        let page = ctx
            .platform(
                "failed to list channel members",
                ctx.membership.list_channel_members(&p.channel_id, cursor),
            )
            .await?;
        roster.extend(page.user_ids);
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    let local = ctx
        .store("failed to list members", ctx.members.list_user_ids(&p.channel_id))
        .await?;

    let mut added = 0usize;
    let mut removed = 0usize;
    for entry in reconcile(roster, local) {
        if entry.create {
            let params = AddMemberParams {
                channel_id: p.channel_id.clone(),
                user_id: entry.key,
            };
            ctx.store("failed to queue ADD_MEMBER job", ctx.queue.submit(&params))
                .await?;
            added += 1;
        } else if entry.delete {
            let params = DeleteMemberParams {
                channel_id: p.channel_id.clone(),
                user_id: entry.key,
            };
            ctx.store(
                "failed to queue DELETE_MEMBER job",
                ctx.queue.submit(&params),
            )
            .await?;
            removed += 1;
        }
    }

    info!(added, removed, "Synced members");
    Ok(())
}

/// 屏蔽成员
///
/// 在用户所属的每个频道中写入屏蔽关系；已存在的关系视为成功。
#[instrument(skip(ctx, p), fields(user_id = %p.0.user_id, member_id = %p.0.member_id))]
pub async fn block_member(ctx: &JobContext, p: BlockMemberParams) -> Result<(), JobError> {
    let params = p.0;
    params
        .validate()
        .map_err(|e| JobError::Validation(e.to_string()))?;

    let is_bot = ctx
        .platform(
            "failed to check if member is a bot",
            ctx.membership.is_bot(&params.member_id),
        )
        .await?;
    if is_bot {
        debug!("Skipping bot member");
        return Ok(());
    }

    let channels = ctx
        .store(
            "failed to list channels of user",
            ctx.members.channels_of_user(&params.user_id),
        )
        .await?;
    if channels.is_empty() {
        warn!("User is not a member of any channel");
        return Ok(());
    }

    for channel_id in channels {
        let inserted = ctx
            .store(
                "failed to block member",
                ctx.blocked
                    .insert(&channel_id, &params.user_id, &params.member_id),
            )
            .await?;
        if inserted {
            info!(channel_id = %channel_id, "Blocked member");
        } else {
            debug!(channel_id = %channel_id, "Member already blocked");
        }
    }
    Ok(())
}

/// 解除屏蔽，没有对应关系时视为成功
#[instrument(skip(ctx, p), fields(user_id = %p.0.user_id, member_id = %p.0.member_id))]
pub async fn unblock_member(ctx: &JobContext, p: UnblockMemberParams) -> Result<(), JobError> {
    let params = p.0;
    params
        .validate()
        .map_err(|e| JobError::Validation(e.to_string()))?;

    let deleted = ctx
        .store(
            "failed to unblock member",
            ctx.blocked.delete(&params.user_id, &params.member_id),
        )
        .await?;

    if deleted == 0 {
        debug!("Member was not blocked");
    } else {
        info!(deleted, "Unblocked member");
    }
    Ok(())
}

#[cfg(test)]
#[path = "member_test.rs"]
mod tests;
