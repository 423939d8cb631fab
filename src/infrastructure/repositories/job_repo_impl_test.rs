use super::*;
use crate::domain::models::job::{JobPriority, JobType};
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use serde_json::json;

async fn setup_db() -> Arc<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let db = Arc::new(db);
    Migrator::up(db.as_ref(), None).await.unwrap();
    db
}

async fn insert_job(
    repo: &JobRepositoryImpl,
    job_type: JobType,
    priority: JobPriority,
    data: serde_json::Value,
    exec_at: DateTime<Utc>,
) -> Job {
    repo.create(&Job::new(job_type, priority, data, exec_at))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_acquire_next_orders_by_priority_then_time() {
    let db = setup_db().await;
    let repo = JobRepositoryImpl::new(db);
    let now = Utc::now();

    let low = insert_job(&repo, JobType::CreateMatches, JobPriority::Low, json!({}), now - Duration::minutes(10)).await;
    let high_late = insert_job(&repo, JobType::EndRound, JobPriority::High, json!({}), now - Duration::minutes(1)).await;
    let high_early = insert_job(&repo, JobType::SyncMembers, JobPriority::High, json!({}), now - Duration::minutes(5)).await;

    let lease = Duration::minutes(5);
    let first = repo.acquire_next(lease).await.unwrap().unwrap();
    let second = repo.acquire_next(lease).await.unwrap().unwrap();
    let third = repo.acquire_next(lease).await.unwrap().unwrap();

    assert_eq!(first.id, high_early.id);
    assert_eq!(second.id, high_late.id);
    assert_eq!(third.id, low.id);
    assert_eq!(first.attempt_count, 1);
    assert!(repo.acquire_next(lease).await.unwrap().is_none());
}

#[tokio::test]
async fn test_acquire_next_skips_future_and_completed_jobs() {
    let db = setup_db().await;
    let repo = JobRepositoryImpl::new(db);
    let now = Utc::now();

    insert_job(&repo, JobType::CreateRound, JobPriority::High, json!({}), now + Duration::hours(1)).await;
    let done = insert_job(&repo, JobType::EndRound, JobPriority::High, json!({}), now).await;
    repo.update(&done.succeed().unwrap()).await.unwrap();

    assert!(repo.acquire_next(Duration::minutes(5)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_cancel_matching_by_payload_field() {
    let db = setup_db().await;
    let repo = JobRepositoryImpl::new(db);
    let now = Utc::now();

    insert_job(&repo, JobType::CreateRound, JobPriority::High, json!({"channel_id": "C1"}), now).await;
    insert_job(&repo, JobType::EndRound, JobPriority::High, json!({"channel_id": "C1"}), now + Duration::days(3)).await;
    let other = insert_job(&repo, JobType::EndRound, JobPriority::High, json!({"channel_id": "C2"}), now).await;

    let filter = JobFilter::default().with_payload("channel_id", "C1");
    let canceled = repo.cancel_matching(&filter).await.unwrap();
    assert_eq!(canceled, 2);

    let rows = repo.find(&filter).await.unwrap();
    assert!(rows
        .iter()
        .all(|job| job.status == JobStatus::Canceled && job.is_completed));

    let next = repo.acquire_next(Duration::minutes(5)).await.unwrap().unwrap();
    assert_eq!(next.id, other.id);
}

#[tokio::test]
async fn test_count_with_any_payload() {
    let db = setup_db().await;
    let repo = JobRepositoryImpl::new(db);
    let now = Utc::now();

    insert_job(&repo, JobType::CreatePair, JobPriority::Standard, json!({"participant": "U1", "partner": "U2"}), now).await;
    insert_job(&repo, JobType::CreatePair, JobPriority::Standard, json!({"participant": "U3", "partner": "U4"}), now).await;

    let filter = JobFilter::pending([JobType::CreatePair])
        .with_any_payload("participant", "U2")
        .with_any_payload("partner", "U2");
    assert_eq!(repo.count(&filter).await.unwrap(), 1);

    let filter = JobFilter::pending([JobType::CreatePair]);
    assert_eq!(repo.count(&filter).await.unwrap(), 2);
}

#[tokio::test]
async fn test_update_missing_job_is_not_found() {
    let db = setup_db().await;
    let repo = JobRepositoryImpl::new(db);

    let job = Job::new(JobType::EndRound, JobPriority::High, json!({}), Utc::now());
    let result = repo.update(&job).await;
    assert!(matches!(result, Err(RepositoryError::NotFound)));
}
