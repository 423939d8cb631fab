// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 该模块包含不依赖任何I/O的核心业务逻辑：
/// - 对账（reconciliation_service）：计算权威集合与本地集合之间的增删差异
/// - 配对（pairing_service）：贪心一对一匹配、分组候选排序与迟到成员的候选选择
/// - 轮次时间（round_schedule）：首轮、下一轮与轮次中点的计算
///
/// 调用方负责在调用前后完成读取与写入。
pub mod pairing_service;
pub mod reconciliation_service;
pub mod round_schedule;
