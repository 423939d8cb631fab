use chat_roulette::application::context::{JobContext, JobOptions};
use chat_roulette::config::settings::WorkerSettings;
use chat_roulette::domain::models::channel::{Channel, RoundInterval};
use chat_roulette::domain::models::member::{ConnectionMode, Gender, Member};
use chat_roulette::infrastructure::platform::memory::InMemoryPlatform;
use chat_roulette::queue::barrier::MemberJobBarrier;
use chat_roulette::workers::job_worker::{JobOutcome, JobWorker};
use chrono::{DateTime, Utc, Weekday};
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub const CHANNEL: &str = "C1";
pub const ADMIN: &str = "UADMIN";
pub const BOT: &str = "UBOT";

pub struct TestApp {
    pub ctx: JobContext,
    pub platform: Arc<InMemoryPlatform>,
    pub worker: JobWorker,
}

/// 基于内存 SQLite 与内存平台的完整应用
pub async fn create_test_app() -> TestApp {
    let db = Arc::new(Database::connect("sqlite::memory:").await.unwrap());
    Migrator::up(db.as_ref(), None).await.unwrap();

    let platform = Arc::new(InMemoryPlatform::new());
    platform.add_bot(BOT);

    let options = JobOptions {
        store_timeout: Duration::from_secs(5),
        barrier: MemberJobBarrier::new(Duration::from_millis(5), Duration::from_millis(50)),
        bot_user_id: BOT.to_string(),
        rng_seed: Some(42),
        ..JobOptions::default()
    };
    let ctx = JobContext::from_database(db, platform.clone(), options);

    let settings = WorkerSettings {
        concurrency: 1,
        poll_interval_ms: 10,
        job_deadline_secs: 10,
        lease_secs: 60,
        max_retries: 3,
    };
    let worker = JobWorker::new(ctx.clone(), &settings);

    TestApp {
        ctx,
        platform,
        worker,
    }
}

impl TestApp {
    pub async fn seed_channel(&self, next_round: DateTime<Utc>) {
        self.platform.add_channel(CHANNEL, ADMIN);
        let now = Utc::now();
        let channel = Channel {
            channel_id: CHANNEL.to_string(),
            inviter: ADMIN.to_string(),
            connection_mode: ConnectionMode::Hybrid,
            interval: RoundInterval::Weekly,
            weekday: Weekday::Mon,
            hour: 12,
            next_round: next_round.into(),
            created_at: now.into(),
            updated_at: now.into(),
        };
        self.ctx.channels.insert_or_fetch(&channel).await.unwrap();
    }

    /// 写入活跃成员，并让平台侧的成员列表与之一致
    pub async fn seed_active_members(&self, user_ids: &[&str]) {
        self.platform.set_members(CHANNEL, user_ids);
        for user_id in user_ids {
            let now = Utc::now();
            let member = Member {
                id: Uuid::new_v4(),
                channel_id: CHANNEL.to_string(),
                user_id: user_id.to_string(),
                gender: Gender::Female,
                has_gender_preference: false,
                connection_mode: ConnectionMode::Hybrid,
                is_active: true,
                profile: serde_json::json!({}),
                created_at: now.into(),
                updated_at: now.into(),
            };
            self.ctx.members.insert_or_fetch(&member).await.unwrap();
        }
    }

    /// 处理所有已到期的作业，返回各作业的结果
    pub async fn drain(&self) -> Vec<JobOutcome> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.worker.process_next().await.unwrap() {
            outcomes.push(outcome);
            assert!(outcomes.len() < 200, "job chain did not settle");
        }
        outcomes
    }
}
