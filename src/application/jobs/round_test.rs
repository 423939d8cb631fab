use super::*;
use crate::application::jobs::test_support::{harness, CHANNEL};
use crate::domain::models::channel::RoundInterval;
use crate::domain::models::job::JobType;
use crate::queue::job_queue::decode;
use chrono::{Duration, TimeZone, Utc};

fn create(next_round: chrono::DateTime<Utc>) -> CreateRoundParams {
    CreateRoundParams {
        channel_id: CHANNEL.to_string(),
        next_round,
        interval: RoundInterval::Weekly,
    }
}

#[tokio::test]
async fn test_create_round_schedules_lifecycle() {
    let h = harness().await;
    let start = Utc.with_ymd_and_hms(2030, 1, 7, 12, 0, 0).unwrap();
    h.seed_channel(start).await;

    create_round(&h.ctx, create(start)).await.unwrap();

    let round = h.ctx.rounds.find_active(CHANNEL).await.unwrap().unwrap();
    assert_eq!(round.started_at.timestamp(), start.timestamp());

    let next = start + Duration::days(7);
    let channel = h.ctx.channels.find_by_id(CHANNEL).await.unwrap().unwrap();
    assert_eq!(channel.next_round.timestamp(), next.timestamp());

    let end = h.pending(JobType::EndRound).await;
    assert_eq!(end.len(), 1);
    assert_eq!(end[0].exec_at.timestamp(), (next - Duration::hours(4)).timestamp());

    let stats = h.pending(JobType::ReportStats).await;
    assert_eq!(stats.len(), 1);
    let stats: ReportStatsParams = decode(&stats[0]).unwrap();
    assert_eq!(stats.round_id, round.id);

    let rounds = h.pending(JobType::CreateRound).await;
    assert_eq!(rounds.len(), 1);
    assert_eq!(rounds[0].exec_at.timestamp(), next.timestamp());

    assert_eq!(h.pending(JobType::SyncMembers).await.len(), 1);
    let matches = h.pending(JobType::CreateMatches).await;
    assert_eq!(matches.len(), 1);
    let matches: CreateMatchesParams = decode(&matches[0]).unwrap();
    assert_eq!(matches.round_id, round.id);
}

#[tokio::test]
async fn test_create_round_with_active_round_is_noop() {
    let h = harness().await;
    let start = Utc.with_ymd_and_hms(2030, 1, 7, 12, 0, 0).unwrap();
    h.seed_channel(start).await;

    create_round(&h.ctx, create(start)).await.unwrap();
    let before = h.pending_count().await;
    create_round(&h.ctx, create(start)).await.unwrap();

    assert_eq!(h.pending_count().await, before);
}

#[tokio::test]
async fn test_create_round_offboards_channel_without_bot() {
    let h = harness().await;
    let start = Utc.with_ymd_and_hms(2030, 1, 7, 12, 0, 0).unwrap();
    h.seed_channel(start).await;
    h.platform.remove_channel(CHANNEL);

    create_round(&h.ctx, create(start)).await.unwrap();

    assert!(h.ctx.rounds.find_active(CHANNEL).await.unwrap().is_none());
    assert_eq!(h.pending(JobType::DeleteChannel).await.len(), 1);
    assert!(h.pending(JobType::CreateMatches).await.is_empty());
}

#[tokio::test]
async fn test_end_round_closes_active_round() {
    let h = harness().await;
    h.seed_round().await;

    let params = EndRoundParams {
        channel_id: CHANNEL.to_string(),
        next_round: Utc::now(),
    };
    end_round(&h.ctx, params.clone()).await.unwrap();
    assert!(h.ctx.rounds.find_active(CHANNEL).await.unwrap().is_none());

    // Ending again finds nothing to close.
    end_round(&h.ctx, params).await.unwrap();
}

#[tokio::test]
async fn test_report_stats_posts_to_channel() {
    let h = harness().await;
    let (_, round) = h.seed_round().await;
    let met = h.ctx.matches.create(round.id).await.unwrap();
    h.ctx.matches.create(round.id).await.unwrap();
    h.ctx.matches.set_has_met(met.id, true).await.unwrap();

    report_stats(
        &h.ctx,
        ReportStatsParams {
            channel_id: CHANNEL.to_string(),
            round_id: round.id,
            next_round: Utc::now(),
        },
    )
    .await
    .unwrap();

    let posted = h.platform.posted();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].conversation_id, CHANNEL);
    assert_eq!(
        posted[0].notification,
        Notification::RoundStats {
            channel_id: CHANNEL.to_string(),
            total: 2,
            met: 1,
            percent: 50,
        }
    );
}

#[tokio::test]
async fn test_report_stats_surfaces_platform_failure() {
    let h = harness().await;
    let (_, round) = h.seed_round().await;
    h.platform.fail_posts_to(CHANNEL);

    let err = report_stats(
        &h.ctx,
        ReportStatsParams {
            channel_id: CHANNEL.to_string(),
            round_id: round.id,
            next_round: Utc::now(),
        },
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind(), "platform");
}
