// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::blocked_member::BlockedMember;
use crate::domain::models::matching::{CandidatePair, MatchingOutcome};
use crate::domain::models::member::{ConnectionMode, Gender, Member};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeMap, HashSet};

/// 参与匹配的成员视图
///
/// 只保留匹配规则需要的字段。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingCandidate {
    pub user_id: String,
    pub gender: Gender,
    pub has_gender_preference: bool,
    pub connection_mode: ConnectionMode,
}

impl From<&Member> for PairingCandidate {
    fn from(member: &Member) -> Self {
        Self {
            user_id: member.user_id.clone(),
            gender: member.gender,
            has_gender_preference: member.has_gender_preference,
            connection_mode: member.connection_mode,
        }
    }
}

impl PairingCandidate {
    /// `self` 的性别偏好是否接受 `other`
    fn accepts_gender_of(&self, other: &PairingCandidate) -> bool {
        !self.has_gender_preference || self.gender == other.gender
    }

    /// 双方的性别偏好都得到满足
    fn prefers(&self, other: &PairingCandidate) -> bool {
        self.accepts_gender_of(other) && other.accepts_gender_of(self)
    }
}

fn is_blocked(blocked: &[BlockedMember], a: &str, b: &str) -> bool {
    blocked.iter().any(|entry| entry.excludes(a, b))
}

/// 两个成员是否允许配对：不同人、见面方式兼容且没有屏蔽关系
fn is_eligible_pair(a: &PairingCandidate, b: &PairingCandidate, blocked: &[BlockedMember]) -> bool {
    a.user_id != b.user_id
        && a.connection_mode.is_compatible_with(&b.connection_mode)
        && !is_blocked(blocked, &a.user_id, &b.user_id)
}

/// 贪心一对一匹配
///
/// 按顺序遍历候选，参与者与伙伴都尚未配对、且参与者尚未出现在结果中时提交。
/// 结果由输入顺序唯一决定。
///
/// # 参数
///
/// * `candidates` - 有序的 (participant, partner) 候选列表
///
/// # 返回值
///
/// participant → partner 的映射
pub fn greedy_match(candidates: &[CandidatePair]) -> BTreeMap<String, String> {
    let mut paired: HashSet<&str> = HashSet::new();
    let mut result = BTreeMap::new();

    for candidate in candidates {
        let participant = candidate.participant.as_str();
        let partner = candidate.partner.as_str();

        if participant == partner
            || paired.contains(participant)
            || paired.contains(partner)
            || result.contains_key(participant)
        {
            continue;
        }

        paired.insert(participant);
        paired.insert(partner);
        result.insert(participant.to_string(), partner.to_string());
    }

    result
}

/// 为一组成员生成有序候选
///
/// 1. 随机打乱成员
/// 2. 有性别偏好的成员稳定地排到前面
/// 3. 每个参与者的候选中，满足双方性别偏好的伙伴排在前面，其余随后
///
/// 见面方式不兼容或存在屏蔽关系的组合不会出现在候选中。
pub fn group_candidates<R: Rng + ?Sized>(
    members: &[PairingCandidate],
    blocked: &[BlockedMember],
    rng: &mut R,
) -> Vec<CandidatePair> {
    let mut shuffled: Vec<&PairingCandidate> = members.iter().collect();
    shuffled.shuffle(rng);

    let mut participants = shuffled.clone();
    participants.sort_by_key(|m| !m.has_gender_preference);

    let mut candidates = Vec::new();
    for participant in participants {
        let (preferred, rest): (Vec<&PairingCandidate>, Vec<&PairingCandidate>) = shuffled
            .iter()
            .copied()
            .filter(|partner| is_eligible_pair(participant, partner, blocked))
            .partition(|partner| participant.prefers(partner));

        candidates.extend(
            preferred
                .into_iter()
                .chain(rest)
                .map(|partner| CandidatePair::new(&participant.user_id, &partner.user_id)),
        );
    }

    candidates
}

/// 对一组成员执行分组匹配
///
/// # 参数
///
/// * `members` - 本轮所有活跃成员
/// * `blocked` - 频道内的屏蔽关系
/// * `rng` - 随机源，测试中可传入固定种子
///
/// # 返回值
///
/// 参与者、配对与未匹配成员；三者的数量用于轮次报告
pub fn match_group<R: Rng + ?Sized>(
    members: &[PairingCandidate],
    blocked: &[BlockedMember],
    rng: &mut R,
) -> MatchingOutcome {
    let candidates = group_candidates(members, blocked, rng);
    let matched = greedy_match(&candidates);

    let paired: HashSet<&str> = matched
        .iter()
        .flat_map(|(a, b)| [a.as_str(), b.as_str()])
        .collect();

    let participants: Vec<String> = members.iter().map(|m| m.user_id.clone()).collect();
    let unmatched = participants
        .iter()
        .filter(|id| !paired.contains(id.as_str()))
        .cloned()
        .collect();
    let pairs = matched
        .into_iter()
        .map(|(participant, partner)| CandidatePair::new(participant, partner))
        .collect();

    MatchingOutcome {
        participants,
        pairs,
        unmatched,
    }
}

/// 为迟到成员排序可选伙伴
///
/// `pool` 应为本轮尚未配对的活跃成员。结果排除参与者本人、
/// 见面方式不兼容者以及任一方向的屏蔽对象。参与者有性别偏好时，
/// 同性别成员排在前面，其中自身也有性别偏好的优先；没有同性别成员时
/// 退回到其余成员。其余情况下保持 `pool` 的顺序。
///
/// # 返回值
///
/// 按优先顺序排列的候选，为空表示没有可选伙伴
pub fn late_arrival_candidates(
    participant: &PairingCandidate,
    pool: &[PairingCandidate],
    blocked: &[BlockedMember],
) -> Vec<PairingCandidate> {
    let eligible: Vec<PairingCandidate> = pool
        .iter()
        .filter(|candidate| is_eligible_pair(participant, candidate, blocked))
        .cloned()
        .collect();

    if !participant.has_gender_preference {
        return eligible;
    }

    let (mut same_gender, others): (Vec<_>, Vec<_>) = eligible
        .into_iter()
        .partition(|candidate| candidate.gender == participant.gender);
    same_gender.sort_by_key(|candidate| !candidate.has_gender_preference);
    same_gender.extend(others);
    same_gender
}

#[cfg(test)]
#[path = "pairing_service_test.rs"]
mod tests;
