// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 从作业队列取出到期作业并分派给处理函数，管理工作器的生命周期
pub mod job_worker;
pub mod manager;
pub mod worker;

pub use worker::Worker;
