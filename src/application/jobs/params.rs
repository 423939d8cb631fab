// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::channel::RoundInterval;
use crate::domain::models::job::{JobPriority, JobType};
use crate::domain::models::member::{ConnectionMode, Gender};
use crate::queue::job_queue::JobParams;
use crate::utils::validators::validate_platform_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// ADD_CHANNEL 参数
///
/// 未提供的轮次设置使用配置中的默认值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddChannelParams {
    pub channel_id: String,
    pub inviter: String,
    #[serde(default)]
    pub interval: Option<RoundInterval>,
    #[serde(default)]
    pub connection_mode: Option<ConnectionMode>,
    #[serde(default)]
    pub weekday: Option<String>,
    #[serde(default)]
    pub hour: Option<u32>,
    #[serde(default)]
    pub next_round: Option<DateTime<Utc>>,
}

impl JobParams for AddChannelParams {
    const JOB_TYPE: JobType = JobType::AddChannel;
    const PRIORITY: JobPriority = JobPriority::Highest;

    fn channel_id(&self) -> Option<&str> {
        Some(&self.channel_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreetAdminParams {
    pub channel_id: String,
    pub inviter: String,
}

impl JobParams for GreetAdminParams {
    const JOB_TYPE: JobType = JobType::GreetAdmin;
    const PRIORITY: JobPriority = JobPriority::High;

    fn channel_id(&self) -> Option<&str> {
        Some(&self.channel_id)
    }
}

/// UPDATE_CHANNEL 参数
///
/// 未提供 `next_round` 时按新的星期与小时重新计算首轮时间。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct UpdateChannelParams {
    pub channel_id: String,
    pub interval: RoundInterval,
    pub connection_mode: ConnectionMode,
    pub weekday: String,
    #[validate(range(max = 23))]
    pub hour: u32,
    #[serde(default)]
    pub next_round: Option<DateTime<Utc>>,
}

impl JobParams for UpdateChannelParams {
    const JOB_TYPE: JobType = JobType::UpdateChannel;
    const PRIORITY: JobPriority = JobPriority::High;

    fn channel_id(&self) -> Option<&str> {
        Some(&self.channel_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteChannelParams {
    pub channel_id: String,
}

impl JobParams for DeleteChannelParams {
    const JOB_TYPE: JobType = JobType::DeleteChannel;
    const PRIORITY: JobPriority = JobPriority::Highest;

    fn channel_id(&self) -> Option<&str> {
        Some(&self.channel_id)
    }
}

/// SYNC_CHANNELS 参数，未提供机器人ID时使用配置值
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncChannelsParams {
    #[serde(default)]
    pub bot_user_id: Option<String>,
}

impl JobParams for SyncChannelsParams {
    const JOB_TYPE: JobType = JobType::SyncChannels;
    const PRIORITY: JobPriority = JobPriority::Highest;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMembersParams {
    pub channel_id: String,
}

impl JobParams for SyncMembersParams {
    const JOB_TYPE: JobType = JobType::SyncMembers;
    const PRIORITY: JobPriority = JobPriority::High;

    fn channel_id(&self) -> Option<&str> {
        Some(&self.channel_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddMemberParams {
    pub channel_id: String,
    pub user_id: String,
}

impl JobParams for AddMemberParams {
    const JOB_TYPE: JobType = JobType::AddMember;
    const PRIORITY: JobPriority = JobPriority::High;

    fn channel_id(&self) -> Option<&str> {
        Some(&self.channel_id)
    }
}

/// UPDATE_MEMBER 参数，只更新提供了的字段
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateMemberParams {
    pub channel_id: String,
    pub user_id: String,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub has_gender_preference: Option<bool>,
    #[serde(default)]
    pub connection_mode: Option<ConnectionMode>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub profile: Option<serde_json::Value>,
}

impl JobParams for UpdateMemberParams {
    const JOB_TYPE: JobType = JobType::UpdateMember;
    const PRIORITY: JobPriority = JobPriority::High;

    fn channel_id(&self) -> Option<&str> {
        Some(&self.channel_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreetMemberParams {
    pub channel_id: String,
    pub user_id: String,
}

impl JobParams for GreetMemberParams {
    const JOB_TYPE: JobType = JobType::GreetMember;
    const PRIORITY: JobPriority = JobPriority::Standard;

    fn channel_id(&self) -> Option<&str> {
        Some(&self.channel_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteMemberParams {
    pub channel_id: String,
    pub user_id: String,
}

impl JobParams for DeleteMemberParams {
    const JOB_TYPE: JobType = JobType::DeleteMember;
    const PRIORITY: JobPriority = JobPriority::High;

    fn channel_id(&self) -> Option<&str> {
        Some(&self.channel_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoundParams {
    pub channel_id: String,
    pub next_round: DateTime<Utc>,
    pub interval: RoundInterval,
}

impl JobParams for CreateRoundParams {
    const JOB_TYPE: JobType = JobType::CreateRound;
    const PRIORITY: JobPriority = JobPriority::Standard;

    fn channel_id(&self) -> Option<&str> {
        Some(&self.channel_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndRoundParams {
    pub channel_id: String,
    pub next_round: DateTime<Utc>,
}

impl JobParams for EndRoundParams {
    const JOB_TYPE: JobType = JobType::EndRound;
    const PRIORITY: JobPriority = JobPriority::Standard;

    fn channel_id(&self) -> Option<&str> {
        Some(&self.channel_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMatchesParams {
    pub channel_id: String,
    pub round_id: Uuid,
}

impl JobParams for CreateMatchesParams {
    const JOB_TYPE: JobType = JobType::CreateMatches;
    const PRIORITY: JobPriority = JobPriority::Low;

    fn channel_id(&self) -> Option<&str> {
        Some(&self.channel_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMatchesParams {
    pub channel_id: String,
    pub round_id: Uuid,
    pub participants: usize,
    pub pairs: usize,
    pub unmatched: usize,
}

impl JobParams for ReportMatchesParams {
    const JOB_TYPE: JobType = JobType::ReportMatches;
    const PRIORITY: JobPriority = JobPriority::Lowest;

    fn channel_id(&self) -> Option<&str> {
        Some(&self.channel_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMatchParams {
    pub channel_id: String,
    pub participant: String,
}

impl JobParams for CreateMatchParams {
    const JOB_TYPE: JobType = JobType::CreateMatch;
    const PRIORITY: JobPriority = JobPriority::Low;

    fn channel_id(&self) -> Option<&str> {
        Some(&self.channel_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateMatchParams {
    pub match_id: Uuid,
    pub has_met: bool,
}

impl JobParams for UpdateMatchParams {
    const JOB_TYPE: JobType = JobType::UpdateMatch;
    const PRIORITY: JobPriority = JobPriority::High;
}

/// 一对成员的作业参数，CREATE_PAIR、NOTIFY_PAIR 与 KICKOFF_PAIR 共用这一结构
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairParams {
    pub channel_id: String,
    pub match_id: Uuid,
    pub participant: String,
    pub partner: String,
}

impl PairParams {
    pub fn users(&self) -> Vec<String> {
        vec![self.participant.clone(), self.partner.clone()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreatePairParams(pub PairParams);

impl JobParams for CreatePairParams {
    const JOB_TYPE: JobType = JobType::CreatePair;
    const PRIORITY: JobPriority = JobPriority::Standard;

    fn channel_id(&self) -> Option<&str> {
        Some(&self.0.channel_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotifyPairParams(pub PairParams);

impl JobParams for NotifyPairParams {
    const JOB_TYPE: JobType = JobType::NotifyPair;
    const PRIORITY: JobPriority = JobPriority::Standard;

    fn channel_id(&self) -> Option<&str> {
        Some(&self.0.channel_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KickoffPairParams(pub PairParams);

impl JobParams for KickoffPairParams {
    const JOB_TYPE: JobType = JobType::KickoffPair;
    const PRIORITY: JobPriority = JobPriority::Low;

    fn channel_id(&self) -> Option<&str> {
        Some(&self.0.channel_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyMemberParams {
    pub channel_id: String,
    pub round_id: Uuid,
    pub user_id: String,
    pub next_round: DateTime<Utc>,
}

impl JobParams for NotifyMemberParams {
    const JOB_TYPE: JobType = JobType::NotifyMember;
    const PRIORITY: JobPriority = JobPriority::Standard;

    fn channel_id(&self) -> Option<&str> {
        Some(&self.channel_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckPairParams {
    pub channel_id: String,
    pub match_id: Uuid,
    pub participant: String,
    pub partner: String,
    pub mpim_id: String,
    pub next_round: DateTime<Utc>,
    pub is_mid_round: bool,
}

impl JobParams for CheckPairParams {
    const JOB_TYPE: JobType = JobType::CheckPair;
    const PRIORITY: JobPriority = JobPriority::Standard;

    fn channel_id(&self) -> Option<&str> {
        Some(&self.channel_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStatsParams {
    pub channel_id: String,
    pub round_id: Uuid,
    pub next_round: DateTime<Utc>,
}

impl JobParams for ReportStatsParams {
    const JOB_TYPE: JobType = JobType::ReportStats;
    const PRIORITY: JobPriority = JobPriority::Standard;

    fn channel_id(&self) -> Option<&str> {
        Some(&self.channel_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkInactiveParams {
    pub channel_id: String,
    pub match_id: Uuid,
    pub next_round: DateTime<Utc>,
    pub participants: Vec<String>,
}

impl JobParams for MarkInactiveParams {
    const JOB_TYPE: JobType = JobType::MarkInactive;
    const PRIORITY: JobPriority = JobPriority::High;

    fn channel_id(&self) -> Option<&str> {
        Some(&self.channel_id)
    }
}

/// 屏蔽或解除屏蔽的参数
///
/// 两个ID都必须是非空的字母数字串，且不能相同。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_distinct_members"))]
pub struct BlockParams {
    #[validate(custom(function = "validate_platform_id"))]
    pub user_id: String,
    #[validate(custom(function = "validate_platform_id"))]
    pub member_id: String,
}

fn validate_distinct_members(params: &BlockParams) -> Result<(), ValidationError> {
    if params.user_id == params.member_id {
        return Err(ValidationError::new("distinct_members"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockMemberParams(pub BlockParams);

impl JobParams for BlockMemberParams {
    const JOB_TYPE: JobType = JobType::BlockMember;
    const PRIORITY: JobPriority = JobPriority::High;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnblockMemberParams(pub BlockParams);

impl JobParams for UnblockMemberParams {
    const JOB_TYPE: JobType = JobType::UnblockMember;
    const PRIORITY: JobPriority = JobPriority::High;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_params_validation() {
        let valid = BlockParams {
            user_id: "U1".into(),
            member_id: "U2".into(),
        };
        assert!(valid.validate().is_ok());

        let same = BlockParams {
            user_id: "U1".into(),
            member_id: "U1".into(),
        };
        assert!(same.validate().is_err());

        let malformed = BlockParams {
            user_id: "".into(),
            member_id: "U 2".into(),
        };
        let errors = malformed.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("user_id"));
        assert!(errors.field_errors().contains_key("member_id"));
    }

    #[test]
    fn test_pair_params_keep_flat_payload() {
        let params = NotifyPairParams(PairParams {
            channel_id: "C1".into(),
            match_id: Uuid::nil(),
            participant: "U1".into(),
            partner: "U2".into(),
        });

        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["channel_id"], "C1");
        assert_eq!(value["participant"], "U1");
        assert_eq!(value["match_id"], Uuid::nil().to_string());
    }

    #[test]
    fn test_unknown_interval_is_rejected_when_decoding() {
        let payload = serde_json::json!({
            "channel_id": "C1",
            "next_round": "2024-01-08T12:00:00Z",
            "interval": "fortnightly"
        });
        assert!(serde_json::from_value::<CreateRoundParams>(payload).is_err());
    }
}
