use super::*;
use crate::application::jobs::params::{
    AddMemberParams, CreateMatchesParams, CreateRoundParams, EndRoundParams, GreetAdminParams,
    GreetMemberParams, SyncMembersParams,
};
use crate::domain::models::job::JobStatus;
use crate::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use crate::queue::barrier::{BarrierOutcome, MemberJobBarrier};
use crate::queue::scheduler::JobScheduler;
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;

async fn setup_queue() -> Arc<DatabaseJobQueue<JobRepositoryImpl>> {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let db = Arc::new(db);
    Migrator::up(db.as_ref(), None).await.unwrap();
    Arc::new(DatabaseJobQueue::new(Arc::new(JobRepositoryImpl::new(db))))
}

fn add_member(user_id: &str) -> AddMemberParams {
    AddMemberParams {
        channel_id: "C1".to_string(),
        user_id: user_id.to_string(),
    }
}

fn lease() -> Duration {
    Duration::seconds(30)
}

#[tokio::test]
async fn test_submit_uses_declared_priority() {
    let queue = setup_queue().await;

    queue.submit(&add_member("U1")).await.unwrap();

    let job = queue.dequeue(lease()).await.unwrap().unwrap();
    assert_eq!(job.job_type, JobType::AddMember);
    assert_eq!(job.priority, AddMemberParams::PRIORITY.value());
    assert_eq!(job.data["user_id"], "U1");
}

#[tokio::test]
async fn test_greetings_yield_to_membership_jobs() {
    assert_eq!(GreetAdminParams::PRIORITY, JobPriority::High);
    assert_eq!(GreetMemberParams::PRIORITY, JobPriority::Standard);
    assert_eq!(CreateRoundParams::PRIORITY, JobPriority::Standard);
    assert_eq!(EndRoundParams::PRIORITY, JobPriority::Standard);

    let queue = setup_queue().await;
    queue
        .submit(&GreetMemberParams {
            channel_id: "C1".to_string(),
            user_id: "U1".to_string(),
        })
        .await
        .unwrap();
    queue.submit(&add_member("U2")).await.unwrap();

    let first = queue.dequeue(lease()).await.unwrap().unwrap();
    assert_eq!(first.job_type, JobType::AddMember);
    let second = queue.dequeue(lease()).await.unwrap().unwrap();
    assert_eq!(second.job_type, JobType::GreetMember);
}

#[tokio::test]
async fn test_enqueue_defaults_to_standard_priority() {
    let queue = setup_queue().await;

    queue.enqueue(&add_member("U1"), None, None).await.unwrap();

    let job = queue.dequeue(lease()).await.unwrap().unwrap();
    assert_eq!(job.priority, JobPriority::Standard.value());
}

#[tokio::test]
async fn test_scheduled_job_is_not_due_yet() {
    let queue = setup_queue().await;

    queue
        .schedule(&add_member("U1"), Utc::now() + Duration::hours(1))
        .await
        .unwrap();

    assert!(queue.dequeue(lease()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_higher_priority_dequeues_first() {
    let queue = setup_queue().await;
    let round_id = Uuid::new_v4();

    queue
        .submit(&CreateMatchesParams {
            channel_id: "C1".to_string(),
            round_id,
        })
        .await
        .unwrap();
    queue.submit(&add_member("U1")).await.unwrap();

    let first = queue.dequeue(lease()).await.unwrap().unwrap();
    assert_eq!(first.job_type, JobType::AddMember);
}

#[tokio::test]
async fn test_leased_job_is_hidden_until_completed() {
    let queue = setup_queue().await;
    queue.submit(&add_member("U1")).await.unwrap();

    let job = queue.dequeue(lease()).await.unwrap().unwrap();
    assert!(queue.dequeue(lease()).await.unwrap().is_none());

    let done = queue.complete(job).await.unwrap();
    assert_eq!(done.status, JobStatus::Succeeded);
    assert!(done.is_completed);
}

#[tokio::test]
async fn test_retry_marks_errored_and_requeues_later() {
    let queue = setup_queue().await;
    queue.submit(&add_member("U1")).await.unwrap();
    let job = queue.dequeue(lease()).await.unwrap().unwrap();

    let retried = queue
        .retry(job, Utc::now() + Duration::minutes(5))
        .await
        .unwrap();
    assert_eq!(retried.status, JobStatus::Errored);
    assert!(!retried.is_completed);
    assert!(queue.dequeue(lease()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_completed_job_cannot_be_failed() {
    let queue = setup_queue().await;
    queue.submit(&add_member("U1")).await.unwrap();
    let job = queue.dequeue(lease()).await.unwrap().unwrap();
    let done = queue.complete(job).await.unwrap();

    let err = queue.fail(done).await.unwrap_err();
    assert!(matches!(err, QueueError::State(_)));
}

#[tokio::test]
async fn test_cancel_matching_only_touches_pending_jobs() {
    let queue = setup_queue().await;
    queue.submit(&add_member("U1")).await.unwrap();
    queue.submit(&add_member("U2")).await.unwrap();
    queue
        .submit(&SyncMembersParams {
            channel_id: "C2".to_string(),
        })
        .await
        .unwrap();

    let filter = JobFilter::pending(JobType::ALL).with_payload("channel_id", "C1");
    assert_eq!(queue.cancel_matching(&filter).await.unwrap(), 2);

    let remaining = queue.find(&JobFilter::pending(JobType::ALL)).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].job_type, JobType::SyncMembers);
}

#[tokio::test]
async fn test_decode_rejects_wrong_job_type() {
    let job = Job::new(
        JobType::SyncMembers,
        JobPriority::High,
        serde_json::json!({"channel_id": "C1"}),
        Utc::now(),
    );

    let err = decode::<AddMemberParams>(&job).unwrap_err();
    assert!(matches!(err, JobError::Validation(_)));
}

#[tokio::test]
async fn test_decode_rejects_malformed_payload() {
    let job = Job::new(
        JobType::AddMember,
        JobPriority::High,
        serde_json::json!({"channel_id": "C1"}),
        Utc::now(),
    );

    let err = decode::<AddMemberParams>(&job).unwrap_err();
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_execute_passes_decoded_params() {
    let job = Job::new(
        JobType::AddMember,
        JobPriority::High,
        serde_json::to_value(add_member("U7")).unwrap(),
        Utc::now(),
    );

    let result = execute(&job, std::time::Duration::from_secs(1), |p: AddMemberParams| async move {
        assert_eq!(p.user_id, "U7");
        Ok(())
    })
    .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_execute_times_out() {
    let job = Job::new(
        JobType::AddMember,
        JobPriority::High,
        serde_json::to_value(add_member("U7")).unwrap(),
        Utc::now(),
    );

    let err = execute(
        &job,
        std::time::Duration::from_millis(10),
        |_: AddMemberParams| async {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            Ok(())
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, JobError::Timeout { .. }));
    assert!(err.is_retryable());
}

fn fast_barrier() -> MemberJobBarrier {
    MemberJobBarrier::new(
        std::time::Duration::from_millis(5),
        std::time::Duration::from_millis(60),
    )
}

#[tokio::test]
async fn test_barrier_passes_without_member_jobs() {
    let queue = setup_queue().await;
    queue
        .submit(&SyncMembersParams {
            channel_id: "C1".to_string(),
        })
        .await
        .unwrap();

    let outcome = fast_barrier().wait(queue.as_ref(), "C1").await.unwrap();
    assert_eq!(outcome, BarrierOutcome::Drained);
}

#[tokio::test]
async fn test_barrier_ignores_other_channels() {
    let queue = setup_queue().await;
    queue
        .submit(&AddMemberParams {
            channel_id: "C2".to_string(),
            user_id: "U1".to_string(),
        })
        .await
        .unwrap();

    let outcome = fast_barrier().wait(queue.as_ref(), "C1").await.unwrap();
    assert_eq!(outcome, BarrierOutcome::Drained);
}

#[tokio::test]
async fn test_barrier_times_out_on_stuck_member_job() {
    let queue = setup_queue().await;
    queue.submit(&add_member("U1")).await.unwrap();

    let outcome = fast_barrier().wait(queue.as_ref(), "C1").await.unwrap();
    assert_eq!(outcome, BarrierOutcome::TimedOut);
}

#[tokio::test]
async fn test_barrier_drains_when_member_job_completes() {
    let queue = setup_queue().await;
    queue.submit(&add_member("U1")).await.unwrap();

    let worker = {
        let queue = queue.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(15)).await;
            let job = queue.dequeue(lease()).await.unwrap().unwrap();
            queue.complete(job).await.unwrap();
        })
    };

    let barrier = MemberJobBarrier::new(
        std::time::Duration::from_millis(5),
        std::time::Duration::from_secs(5),
    );
    let outcome = barrier.wait(queue.as_ref(), "C1").await.unwrap();
    worker.await.unwrap();
    assert_eq!(outcome, BarrierOutcome::Drained);
}
