use super::helpers::{create_test_app, CHANNEL};
use chat_roulette::application::jobs::matches::match_late_arrival;
use chat_roulette::application::jobs::params::CreateMatchesParams;
use chat_roulette::domain::models::job::JobType;
use chat_roulette::domain::platform::traits::Notification;
use chat_roulette::domain::repositories::job_repository::JobFilter;
use chat_roulette::queue::scheduler::JobScheduler;
use chat_roulette::workers::job_worker::JobOutcome;
use chrono::{Duration, Utc};

#[tokio::test]
async fn test_odd_channel_gets_pairs_and_one_apology() {
    let app = create_test_app().await;
    app.seed_channel(Utc::now() + Duration::days(7)).await;
    app.seed_active_members(&["U1", "U2", "U3", "U4", "U5"]).await;
    let (round, _) = app
        .ctx
        .rounds
        .insert_or_fetch_active(CHANNEL, Utc::now())
        .await
        .unwrap();

    app.ctx
        .queue
        .submit(&CreateMatchesParams {
            channel_id: CHANNEL.to_string(),
            round_id: round.id,
        })
        .await
        .unwrap();
    assert_eq!(
        app.worker.process_next().await.unwrap(),
        Some(JobOutcome::Succeeded)
    );

    let find = |job_type: JobType| {
        let queue = app.ctx.queue.clone();
        async move { queue.find(&JobFilter::pending([job_type])).await.unwrap() }
    };
    assert_eq!(find(JobType::CreatePair).await.len(), 2);
    assert_eq!(find(JobType::NotifyMember).await.len(), 1);

    let reports = find(JobType::ReportMatches).await;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].data["participants"], 5);
    assert_eq!(reports[0].data["pairs"], 2);
    assert_eq!(reports[0].data["unmatched"], 1);

    app.drain().await;
    let apologies = app
        .platform
        .posted()
        .into_iter()
        .filter(|m| matches!(m.notification, Notification::Unmatched { .. }))
        .count();
    assert_eq!(apologies, 1);
}

#[tokio::test]
async fn test_late_arrival_blocked_by_everyone_stays_unpaired() {
    let app = create_test_app().await;
    app.seed_channel(Utc::now() + Duration::days(7)).await;
    app.seed_active_members(&["U1", "U2", "U3"]).await;
    app.ctx
        .rounds
        .insert_or_fetch_active(CHANNEL, Utc::now())
        .await
        .unwrap();

    app.ctx.blocked.insert(CHANNEL, "U1", "U2").await.unwrap();
    app.ctx.blocked.insert(CHANNEL, "U3", "U1").await.unwrap();

    let pairing = match_late_arrival(&app.ctx, CHANNEL, "U1").await.unwrap();
    assert!(pairing.is_none());

    // U2 and U3 never blocked each other.
    let pairing = match_late_arrival(&app.ctx, CHANNEL, "U2").await.unwrap();
    assert_eq!(pairing.unwrap().partner, "U3");
}
