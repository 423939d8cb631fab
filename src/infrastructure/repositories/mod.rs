// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// 提供领域仓库接口基于SeaORM的具体实现
pub mod blocked_member_repo_impl;
pub mod channel_repo_impl;
pub mod job_repo_impl;
pub mod match_repo_impl;
pub mod member_repo_impl;
pub mod round_repo_impl;

#[cfg(test)]
#[path = "repositories_test.rs"]
mod tests;
