// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 聊天平台实现
///
/// 平台的线上客户端不在本仓库内，这里提供一个进程内实现，
/// 用于本地运行与测试。
pub mod memory;

pub use memory::{InMemoryPlatform, PostedMessage};
