// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：核心业务实体和数据结构
/// - 平台接口（platform）：聊天平台的成员来源与通知出口
/// - 仓库接口（repositories）：数据持久化抽象接口
/// - 服务（services）：对账、配对与轮次时间计算
///
/// 领域层不依赖于任何外部实现。
pub mod models;
pub mod platform;
pub mod repositories;
pub mod services;
