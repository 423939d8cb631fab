use super::*;
use crate::application::jobs::params::{
    DeleteChannelParams, GreetMemberParams, SyncMembersParams,
};
use crate::application::jobs::test_support::{harness, Harness, CHANNEL};
use crate::domain::models::job::{JobPriority, JobStatus};
use crate::domain::repositories::job_repository::JobFilter;
use crate::infrastructure::platform::memory::InMemoryPlatform;
use crate::queue::scheduler::JobScheduler;

fn settings(max_retries: u32) -> WorkerSettings {
    WorkerSettings {
        concurrency: 1,
        poll_interval_ms: 10,
        job_deadline_secs: 5,
        lease_secs: 30,
        max_retries,
    }
}

async fn job_status(h: &Harness, job_type: JobType) -> JobStatus {
    let jobs = h
        .ctx
        .queue
        .find(&JobFilter {
            job_types: vec![job_type],
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(jobs.len(), 1);
    jobs[0].status
}

fn greet(user_id: &str) -> GreetMemberParams {
    GreetMemberParams {
        channel_id: CHANNEL.to_string(),
        user_id: user_id.to_string(),
    }
}

#[tokio::test]
async fn test_idle_queue_processes_nothing() {
    let h = harness().await;
    let worker = JobWorker::new(h.ctx.clone(), &settings(3));

    assert_eq!(worker.process_next().await.unwrap(), None);
}

#[tokio::test]
async fn test_successful_job_is_completed() {
    let h = harness().await;
    h.seed_channel(Utc::now() + chrono::Duration::days(7)).await;
    h.ctx.queue.submit(&greet("U1")).await.unwrap();
    let worker = JobWorker::new(h.ctx.clone(), &settings(3));

    let outcome = worker.process_next().await.unwrap();

    assert_eq!(outcome, Some(JobOutcome::Succeeded));
    assert_eq!(job_status(&h, JobType::GreetMember).await, JobStatus::Succeeded);
    assert_eq!(h.platform.posted().len(), 1);
}

#[tokio::test]
async fn test_job_for_missing_channel_is_canceled() {
    let h = harness().await;
    h.ctx.queue.submit(&greet("U1")).await.unwrap();
    let worker = JobWorker::new(h.ctx.clone(), &settings(3));

    let outcome = worker.process_next().await.unwrap();

    assert_eq!(outcome, Some(JobOutcome::Canceled));
    assert_eq!(job_status(&h, JobType::GreetMember).await, JobStatus::Canceled);
    assert!(h.platform.posted().is_empty());
}

#[tokio::test]
async fn test_malformed_payload_fails_without_retry() {
    let h = harness().await;
    let job = Job::new(
        JobType::SyncMembers,
        JobPriority::High,
        serde_json::json!({"unexpected": true}),
        Utc::now(),
    );
    h.ctx.queue.enqueue_job(job).await.unwrap();
    let worker = JobWorker::new(h.ctx.clone(), &settings(3));

    let outcome = worker.process_next().await.unwrap();

    assert_eq!(outcome, Some(JobOutcome::Failed));
    assert_eq!(job_status(&h, JobType::SyncMembers).await, JobStatus::Failed);
}

#[tokio::test]
async fn test_platform_failure_is_retried_then_fails() {
    let h = harness().await;
    h.seed_channel(Utc::now() + chrono::Duration::days(7)).await;
    h.platform
        .fail_posts_to(&InMemoryPlatform::direct_conversation_id("U1"));
    h.ctx.queue.submit(&greet("U1")).await.unwrap();

    let worker = JobWorker::new(h.ctx.clone(), &settings(2)).with_retry_policy({
        let mut policy = RetryPolicy::with_max_retries(2);
        policy.initial_backoff = Duration::ZERO;
        policy.enable_jitter = false;
        policy
    });

    assert_eq!(worker.process_next().await.unwrap(), Some(JobOutcome::Retried));
    assert_eq!(job_status(&h, JobType::GreetMember).await, JobStatus::Errored);

    assert_eq!(worker.process_next().await.unwrap(), Some(JobOutcome::Failed));
    assert_eq!(job_status(&h, JobType::GreetMember).await, JobStatus::Failed);
}

#[tokio::test]
async fn test_delete_channel_job_completes_after_canceling_siblings() {
    let h = harness().await;
    h.seed_channel(Utc::now() + chrono::Duration::days(7)).await;
    h.ctx
        .queue
        .submit(&DeleteChannelParams {
            channel_id: CHANNEL.to_string(),
        })
        .await
        .unwrap();
    h.ctx
        .queue
        .schedule(
            &SyncMembersParams {
                channel_id: CHANNEL.to_string(),
            },
            Utc::now() + chrono::Duration::hours(1),
        )
        .await
        .unwrap();
    let worker = JobWorker::new(h.ctx.clone(), &settings(3));

    let outcome = worker.process_next().await.unwrap();

    assert_eq!(outcome, Some(JobOutcome::Succeeded));
    assert_eq!(job_status(&h, JobType::DeleteChannel).await, JobStatus::Succeeded);
    assert_eq!(job_status(&h, JobType::SyncMembers).await, JobStatus::Canceled);
    assert_eq!(worker.process_next().await.unwrap(), None);
}

#[tokio::test]
async fn test_dispatch_covers_every_job_type() {
    let h = harness().await;

    // SYNC_CHANNELS has no required fields.
    for job_type in JobType::ALL
        .into_iter()
        .filter(|t| *t != JobType::SyncChannels)
    {
        let job = Job::new(job_type, JobPriority::Standard, serde_json::json!({}), Utc::now());
        let err = dispatch(&h.ctx, &job).await.unwrap_err();
        assert!(
            matches!(err, JobError::Validation(_)),
            "{} should reject an empty payload, got {:?}",
            job_type,
            err
        );
    }
}
