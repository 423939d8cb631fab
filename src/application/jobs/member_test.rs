use super::*;
use crate::application::jobs::params::BlockParams;
use crate::application::jobs::test_support::{harness, BOT, CHANNEL};
use crate::domain::models::job::JobType;
use crate::infrastructure::platform::memory::InMemoryPlatform;
use crate::queue::job_queue::decode;
use chrono::Duration;

fn add(user_id: &str) -> AddMemberParams {
    AddMemberParams {
        channel_id: CHANNEL.to_string(),
        user_id: user_id.to_string(),
    }
}

fn activate(user_id: &str) -> UpdateMemberParams {
    UpdateMemberParams {
        channel_id: CHANNEL.to_string(),
        user_id: user_id.to_string(),
        gender: Some(Gender::Female),
        has_gender_preference: Some(true),
        connection_mode: Some(ConnectionMode::Physical),
        is_active: Some(true),
        profile: Some(serde_json::json!({"city": "Porto"})),
    }
}

fn block(user_id: &str, member_id: &str) -> BlockParams {
    BlockParams {
        user_id: user_id.to_string(),
        member_id: member_id.to_string(),
    }
}

#[tokio::test]
async fn test_add_member_registers_inactive_and_greets() {
    let h = harness().await;
    h.seed_channel(Utc::now() + Duration::days(7)).await;

    add_member(&h.ctx, add("U1")).await.unwrap();

    let member = h.ctx.members.find(CHANNEL, "U1").await.unwrap().unwrap();
    assert!(!member.is_active);
    assert_eq!(member.connection_mode, ConnectionMode::Hybrid);
    assert_eq!(h.pending(JobType::GreetMember).await.len(), 1);

    // Already known members are not greeted again.
    add_member(&h.ctx, add("U1")).await.unwrap();
    assert_eq!(h.pending(JobType::GreetMember).await.len(), 1);
}

#[tokio::test]
async fn test_add_member_skips_bots() {
    let h = harness().await;
    h.seed_channel(Utc::now() + Duration::days(7)).await;
    h.platform.add_bot("UOTHERBOT");

    add_member(&h.ctx, add(BOT)).await.unwrap();
    add_member(&h.ctx, add("UOTHERBOT")).await.unwrap();

    assert!(h.ctx.members.list_user_ids(CHANNEL).await.unwrap().is_empty());
    assert_eq!(h.pending_count().await, 0);
}

#[tokio::test]
async fn test_update_member_activation_queues_late_match() {
    let h = harness().await;
    h.seed_channel(Utc::now() + Duration::days(7)).await;
    h.seed_members(&["U1"], false).await;

    update_member(&h.ctx, activate("U1")).await.unwrap();

    let member = h.ctx.members.find(CHANNEL, "U1").await.unwrap().unwrap();
    assert!(member.is_active);
    assert!(member.has_gender_preference);
    assert_eq!(member.gender, Gender::Female);
    assert_eq!(member.profile["city"], "Porto");

    let jobs = h.pending(JobType::CreateMatch).await;
    assert_eq!(jobs.len(), 1);
    assert!(jobs[0].exec_at > Utc::now() + Duration::minutes(9));
    let params: CreateMatchParams = decode(&jobs[0]).unwrap();
    assert_eq!(params.participant, "U1");
}

#[tokio::test]
async fn test_update_member_already_active_does_not_rematch() {
    let h = harness().await;
    h.seed_channel(Utc::now() + Duration::days(7)).await;
    h.seed_members(&["U1"], true).await;

    update_member(&h.ctx, activate("U1")).await.unwrap();

    assert!(h.pending(JobType::CreateMatch).await.is_empty());
}

#[tokio::test]
async fn test_update_member_missing_row_is_retryable() {
    let h = harness().await;
    h.seed_channel(Utc::now() + Duration::days(7)).await;

    let err = update_member(&h.ctx, activate("UGHOST")).await.unwrap_err();
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_greet_member_sends_direct_message() {
    let h = harness().await;

    greet_member(
        &h.ctx,
        GreetMemberParams {
            channel_id: CHANNEL.to_string(),
            user_id: "U1".to_string(),
        },
    )
    .await
    .unwrap();

    let posted = h.platform.posted();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].conversation_id, InMemoryPlatform::direct_conversation_id("U1"));
    assert!(matches!(posted[0].notification, Notification::GreetMember { .. }));
}

#[tokio::test]
async fn test_delete_member_is_idempotent() {
    let h = harness().await;
    h.seed_channel(Utc::now() + Duration::days(7)).await;
    h.seed_members(&["U1"], true).await;

    let params = DeleteMemberParams {
        channel_id: CHANNEL.to_string(),
        user_id: "U1".to_string(),
    };
    delete_member(&h.ctx, params.clone()).await.unwrap();
    delete_member(&h.ctx, params).await.unwrap();

    assert!(h.ctx.members.find(CHANNEL, "U1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_sync_members_reconciles_roster() {
    let h = harness().await;
    h.seed_channel(Utc::now() + Duration::days(7)).await;
    h.seed_members(&["U1", "U2"], true).await;
    h.platform.set_members(CHANNEL, &["U2", "U3"]);

    sync_members(
        &h.ctx,
        SyncMembersParams {
            channel_id: CHANNEL.to_string(),
        },
    )
    .await
    .unwrap();

    let adds = h.pending(JobType::AddMember).await;
    assert_eq!(adds.len(), 1);
    let add: AddMemberParams = decode(&adds[0]).unwrap();
    assert_eq!(add.user_id, "U3");

    let deletes = h.pending(JobType::DeleteMember).await;
    assert_eq!(deletes.len(), 1);
    let delete: DeleteMemberParams = decode(&deletes[0]).unwrap();
    assert_eq!(delete.user_id, "U1");
}

#[tokio::test]
async fn test_block_member_applies_to_every_channel_of_user() {
    let h = harness().await;
    h.seed_channel(Utc::now() + Duration::days(7)).await;
    h.seed_members(&["U1", "U2"], true).await;

    block_member(&h.ctx, BlockMemberParams(block("U1", "U2")))
        .await
        .unwrap();
    // Repeating the block is accepted.
    block_member(&h.ctx, BlockMemberParams(block("U1", "U2")))
        .await
        .unwrap();

    let blocked = h.ctx.blocked.list_for_channel(CHANNEL).await.unwrap();
    assert_eq!(blocked.len(), 1);
    assert!(blocked[0].excludes("U2", "U1"));

    unblock_member(&h.ctx, UnblockMemberParams(block("U1", "U2")))
        .await
        .unwrap();
    assert!(h.ctx.blocked.list_for_channel(CHANNEL).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_block_member_rejects_self_block() {
    let h = harness().await;

    let err = block_member(&h.ctx, BlockMemberParams(block("U1", "U1")))
        .await
        .unwrap_err();
    assert!(matches!(err, JobError::Validation(_)));
}

#[tokio::test]
async fn test_block_member_ignores_bots() {
    let h = harness().await;
    h.seed_channel(Utc::now() + Duration::days(7)).await;
    h.seed_members(&["U1"], true).await;

    block_member(&h.ctx, BlockMemberParams(block("U1", BOT)))
        .await
        .unwrap();

    assert!(h.ctx.blocked.list_for_channel(CHANNEL).await.unwrap().is_empty());
}
