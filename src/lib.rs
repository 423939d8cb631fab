// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 包含作业上下文与全部作业处理器
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务实体、服务和仓库接口
pub mod domain;

/// 基础设施模块
///
/// 提供数据库、聊天平台适配与指标导出
pub mod infrastructure;

/// 表示层模块
///
/// 接收平台事件，包括路由、处理器和签名校验中间件
pub mod presentation;

/// 队列模块
///
/// 实现持久化作业队列、类型化调度与成员作业屏障
pub mod queue;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

/// 工作器模块
///
/// 实现作业分发、重试与工作器管理
pub mod workers;
