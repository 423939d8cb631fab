// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，遵循依赖倒置原则。
/// 具体实现由基础设施层提供。
///
/// 跨实体的查询（例如"本轮已配对的成员"、"某匹配待执行的回访作业"）
/// 都以仓库方法的形式暴露。
pub mod blocked_member_repository;
pub mod channel_repository;
pub mod job_repository;
pub mod match_repository;
pub mod member_repository;
pub mod round_repository;
