use super::helpers::{create_test_app, ADMIN, CHANNEL};
use axum_test::TestServer;
use chat_roulette::application::jobs::params::{
    CreateRoundParams, DeleteChannelParams, EndRoundParams,
};
use chat_roulette::domain::models::channel::RoundInterval;
use chat_roulette::domain::models::job::JobType;
use chat_roulette::domain::platform::traits::Notification;
use chat_roulette::domain::repositories::job_repository::JobFilter;
use chat_roulette::presentation::middleware::signature::SignatureState;
use chat_roulette::presentation::routes::routes;
use chat_roulette::presentation::state::AppState;
use chat_roulette::queue::scheduler::JobScheduler;
use chat_roulette::workers::job_worker::JobOutcome;
use chrono::{Duration, Utc};
use serde_json::json;

#[tokio::test]
async fn test_round_chain_introduces_every_pair() {
    let app = create_test_app().await;
    app.seed_channel(Utc::now()).await;
    app.seed_active_members(&["U1", "U2", "U3", "U4"]).await;

    app.ctx
        .queue
        .submit(&CreateRoundParams {
            channel_id: CHANNEL.to_string(),
            next_round: Utc::now(),
            interval: RoundInterval::Weekly,
        })
        .await
        .unwrap();

    // CREATE_ROUND, SYNC_MEMBERS, CREATE_MATCHES, 2x CREATE_PAIR, 2x NOTIFY_PAIR
    let outcomes = app.drain().await;
    assert_eq!(outcomes.len(), 7);
    assert!(outcomes.iter().all(|o| *o == JobOutcome::Succeeded));

    let round = app.ctx.rounds.find_active(CHANNEL).await.unwrap().unwrap();
    let stats = app.ctx.matches.round_stats(round.id).await.unwrap();
    assert_eq!(stats.total, 2);

    let intros = app
        .platform
        .posted()
        .into_iter()
        .filter(|m| matches!(m.notification, Notification::PairIntro { .. }))
        .count();
    assert_eq!(intros, 2);

    // Follow-ups wait for their scheduled time.
    let next_round = app.ctx.queue.find(&JobFilter::pending([JobType::CreateRound])).await.unwrap();
    assert_eq!(next_round.len(), 1);
    assert!(next_round[0].exec_at > Utc::now());
    let reports = app.ctx.queue.find(&JobFilter::pending([JobType::ReportMatches])).await.unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].data["pairs"], 2);
}

#[tokio::test]
async fn test_delete_channel_cancels_pending_work() {
    let app = create_test_app().await;
    let next_round = Utc::now() + Duration::days(7);
    app.seed_channel(next_round).await;

    app.ctx
        .queue
        .schedule(
            &EndRoundParams {
                channel_id: CHANNEL.to_string(),
                next_round,
            },
            Utc::now() + Duration::days(1),
        )
        .await
        .unwrap();
    app.ctx
        .queue
        .schedule(
            &CreateRoundParams {
                channel_id: CHANNEL.to_string(),
                next_round,
                interval: RoundInterval::Weekly,
            },
            next_round,
        )
        .await
        .unwrap();
    app.ctx
        .queue
        .submit(&DeleteChannelParams {
            channel_id: CHANNEL.to_string(),
        })
        .await
        .unwrap();

    assert_eq!(app.drain().await, vec![JobOutcome::Succeeded]);

    let pending = app.ctx.queue.count(&JobFilter::pending(JobType::ALL)).await.unwrap();
    assert_eq!(pending, 0);
    assert!(!app.ctx.channels.exists(CHANNEL).await.unwrap());
    assert!(app.worker.process_next().await.unwrap().is_none());
}

#[tokio::test]
async fn test_bot_joined_event_onboards_channel_members() {
    let app = create_test_app().await;
    app.platform.add_channel(CHANNEL, ADMIN);
    app.platform.set_members(CHANNEL, &["U1", "U2"]);

    let server = TestServer::new(routes(
        AppState::from_context(&app.ctx),
        SignatureState::new("unused", true),
    ))
    .unwrap();
    server
        .post("/v1/events")
        .json(&json!({ "type": "bot_joined", "channel_id": CHANNEL, "inviter": ADMIN }))
        .await
        .assert_status(axum::http::StatusCode::ACCEPTED);

    // ADD_CHANNEL, SYNC_MEMBERS, 2x ADD_MEMBER, 2x GREET_MEMBER
    let outcomes = app.drain().await;
    assert!(outcomes.iter().all(|o| *o == JobOutcome::Succeeded));
    assert!(app.ctx.channels.exists(CHANNEL).await.unwrap());

    let mut members = app.ctx.members.list_user_ids(CHANNEL).await.unwrap();
    members.sort();
    assert_eq!(members, vec!["U1".to_string(), "U2".to_string()]);

    let greetings = app
        .platform
        .posted()
        .into_iter()
        .filter(|m| matches!(m.notification, Notification::GreetMember { .. }))
        .count();
    assert_eq!(greetings, 2);

    // The first round waits for the configured weekday and hour.
    let rounds = app.ctx.queue.find(&JobFilter::pending([JobType::CreateRound])).await.unwrap();
    assert_eq!(rounds.len(), 1);
}

#[tokio::test]
async fn test_pending_jobs_survive_restart() {
    use chat_roulette::application::context::{JobContext, JobOptions};
    use chat_roulette::infrastructure::platform::memory::InMemoryPlatform;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;
    use std::sync::Arc;

    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("jobs.db").display());

    let connect = |url: String| async move {
        let db = Arc::new(Database::connect(url.as_str()).await.unwrap());
        Migrator::up(db.as_ref(), None).await.unwrap();
        JobContext::from_database(db, Arc::new(InMemoryPlatform::new()), JobOptions::default())
    };

    let ctx = connect(url.clone()).await;
    ctx.queue
        .schedule(
            &EndRoundParams {
                channel_id: CHANNEL.to_string(),
                next_round: Utc::now() + Duration::days(7),
            },
            Utc::now() + Duration::days(1),
        )
        .await
        .unwrap();
    drop(ctx);

    let ctx = connect(url.clone()).await;
    let pending = ctx.queue.find(&JobFilter::pending([JobType::EndRound])).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].data["channel_id"], CHANNEL);
}
