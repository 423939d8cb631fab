// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// HTTP请求处理器模块
///
/// 平台事件在这里被转换为作业入队，业务处理全部交给工作器
pub mod event_handler;
