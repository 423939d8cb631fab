// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 作业（job）：队列中的延迟工作单元及其状态机
/// - 频道（channel）：启用了轮次匹配的群组及其周期配置
/// - 成员（member）：频道内的参与者
/// - 轮次（round）：一次完整的匹配周期
/// - 匹配（matching）：一轮中产生的配对及匹配过程中的临时结构
/// - 屏蔽关系（blocked_member）：成员之间的排除规则
pub mod blocked_member;
pub mod channel;
pub mod job;
pub mod matching;
pub mod member;
pub mod round;
