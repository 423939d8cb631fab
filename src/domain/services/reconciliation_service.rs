// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::BTreeMap;

/// 对账条目
///
/// 两个集合并集中的一个键，以及它需要执行的动作。
/// 两个标记同时为 false 表示两边一致。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileEntry<K> {
    pub key: K,
    /// 仅存在于权威集合，需要在本地创建
    pub create: bool,
    /// 仅存在于本地集合，需要在本地删除
    pub delete: bool,
}

impl<K> ReconcileEntry<K> {
    /// 两边是否一致
    pub fn is_in_sync(&self) -> bool {
        !self.create && !self.delete
    }
}

/// 计算权威集合与本地集合的差异
///
/// 输出为两个集合的并集，按键排序，重复的键只出现一次。
///
/// # 参数
///
/// * `authoritative` - 外部事实来源（平台上的频道或成员）
/// * `local` - 数据库中的记录
///
/// # 返回值
///
/// 每个键一条 [`ReconcileEntry`]
pub fn reconcile<K, A, L>(authoritative: A, local: L) -> Vec<ReconcileEntry<K>>
where
    K: Ord,
    A: IntoIterator<Item = K>,
    L: IntoIterator<Item = K>,
{
    // (in_authoritative, in_local)
    let mut merged: BTreeMap<K, (bool, bool)> = BTreeMap::new();

    for key in authoritative {
        merged.entry(key).or_default().0 = true;
    }
    for key in local {
        merged.entry(key).or_default().1 = true;
    }

    merged
        .into_iter()
        .map(|(key, (in_authoritative, in_local))| ReconcileEntry {
            key,
            create: in_authoritative && !in_local,
            delete: in_local && !in_authoritative,
        })
        .collect()
}

#[cfg(test)]
#[path = "reconciliation_service_test.rs"]
mod tests;
