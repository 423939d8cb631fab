// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::context::{JobContext, JobOptions};
use crate::domain::models::channel::{Channel, RoundInterval};
use crate::domain::models::job::{Job, JobType};
use crate::domain::models::member::{ConnectionMode, Gender, Member};
use crate::domain::repositories::job_repository::JobFilter;
use crate::infrastructure::platform::memory::InMemoryPlatform;
use crate::queue::barrier::MemberJobBarrier;
use chrono::{DateTime, Duration, Utc, Weekday};
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use std::sync::Arc;
use uuid::Uuid;

pub(crate) const CHANNEL: &str = "C1";
pub(crate) const ADMIN: &str = "UADMIN";
pub(crate) const BOT: &str = "UBOT";

pub(crate) struct Harness {
    pub ctx: JobContext,
    pub platform: Arc<InMemoryPlatform>,
}

pub(crate) async fn harness() -> Harness {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let db = Arc::new(db);
    Migrator::up(db.as_ref(), None).await.unwrap();

    let platform = Arc::new(InMemoryPlatform::new());
    platform.add_bot(BOT);

    let options = JobOptions {
        store_timeout: std::time::Duration::from_secs(5),
        barrier: MemberJobBarrier::new(
            std::time::Duration::from_millis(5),
            std::time::Duration::from_millis(50),
        ),
        bot_user_id: BOT.to_string(),
        rng_seed: Some(7),
        ..JobOptions::default()
    };

    Harness {
        ctx: JobContext::from_database(db, platform.clone(), options),
        platform,
    }
}

pub(crate) fn channel(next_round: DateTime<Utc>) -> Channel {
    let now = Utc::now();
    Channel {
        channel_id: CHANNEL.to_string(),
        inviter: ADMIN.to_string(),
        connection_mode: ConnectionMode::Hybrid,
        interval: RoundInterval::Weekly,
        weekday: Weekday::Mon,
        hour: 12,
        next_round: next_round.into(),
        created_at: now.into(),
        updated_at: now.into(),
    }
}

pub(crate) fn member(user_id: &str, is_active: bool) -> Member {
    let now = Utc::now();
    Member {
        id: Uuid::new_v4(),
        channel_id: CHANNEL.to_string(),
        user_id: user_id.to_string(),
        gender: Gender::Male,
        has_gender_preference: false,
        connection_mode: ConnectionMode::Hybrid,
        is_active,
        profile: serde_json::json!({}),
        created_at: now.into(),
        updated_at: now.into(),
    }
}

impl Harness {
    /// Stores the channel and registers it on the platform.
    pub async fn seed_channel(&self, next_round: DateTime<Utc>) -> Channel {
        self.platform.add_channel(CHANNEL, ADMIN);
        let (channel, _) = self
            .ctx
            .channels
            .insert_or_fetch(&channel(next_round))
            .await
            .unwrap();
        channel
    }

    pub async fn seed_members(&self, user_ids: &[&str], is_active: bool) -> Vec<Member> {
        let mut members = Vec::new();
        for user_id in user_ids {
            let (m, _) = self
                .ctx
                .members
                .insert_or_fetch(&member(user_id, is_active))
                .await
                .unwrap();
            members.push(m);
        }
        members
    }

    /// Seeds a channel whose active round started now and ends in a week.
    pub async fn seed_round(&self) -> (Channel, crate::domain::models::round::Round) {
        let channel = self.seed_channel(Utc::now() + Duration::days(7)).await;
        let (round, _) = self
            .ctx
            .rounds
            .insert_or_fetch_active(CHANNEL, Utc::now())
            .await
            .unwrap();
        (channel, round)
    }

    pub async fn pending(&self, job_type: JobType) -> Vec<Job> {
        self.ctx
            .queue
            .find(&JobFilter::pending([job_type]))
            .await
            .unwrap()
    }

    pub async fn pending_count(&self) -> usize {
        self.ctx
            .queue
            .find(&JobFilter::pending(JobType::ALL))
            .await
            .unwrap()
            .len()
    }
}
