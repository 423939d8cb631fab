// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::JobType;
use crate::domain::repositories::job_repository::JobFilter;
use crate::queue::job_queue::{JobQueue, QueueError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// 会修改频道成员的作业类型
pub const MEMBER_JOB_TYPES: [JobType; 3] = [
    JobType::AddMember,
    JobType::DeleteMember,
    JobType::UpdateMember,
];

/// 屏障等待的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierOutcome {
    /// 成员作业已全部完成
    Drained,
    /// 超过上限仍有未完成的成员作业
    TimedOut,
}

/// 成员作业屏障
///
/// 匹配前轮询，直到频道内没有未完成的成员变更作业。
/// 这是协作式的等待而不是锁：超过上限后返回 [`BarrierOutcome::TimedOut`]，
/// 由调用方决定是否继续。丢弃返回的 future 即可取消等待。
#[derive(Debug, Clone, Copy)]
pub struct MemberJobBarrier {
    poll_interval: Duration,
    ceiling: Duration,
}

impl Default for MemberJobBarrier {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(30))
    }
}

impl MemberJobBarrier {
    pub fn new(poll_interval: Duration, ceiling: Duration) -> Self {
        Self {
            poll_interval,
            ceiling,
        }
    }

    /// 等待频道的成员作业清空
    ///
    /// # 参数
    ///
    /// * `queue` - 作业队列
    /// * `channel_id` - 频道ID
    ///
    /// # 返回值
    ///
    /// * `Ok(BarrierOutcome)` - 等待结果
    /// * `Err(QueueError)` - 查询失败
    pub async fn wait<Q: JobQueue + ?Sized>(
        &self,
        queue: &Q,
        channel_id: &str,
    ) -> Result<BarrierOutcome, QueueError> {
        let filter = JobFilter::pending(MEMBER_JOB_TYPES).with_payload("channel_id", channel_id);
        let deadline = Instant::now() + self.ceiling;

        loop {
            let in_flight = queue.count(&filter).await?;
            if in_flight == 0 {
                return Ok(BarrierOutcome::Drained);
            }

            let now = Instant::now();
            if now >= deadline {
                warn!(
                    channel_id,
                    in_flight, "Member jobs still pending after barrier ceiling"
                );
                return Ok(BarrierOutcome::TimedOut);
            }

            debug!(channel_id, in_flight, "Waiting for member jobs to drain");
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }
}
