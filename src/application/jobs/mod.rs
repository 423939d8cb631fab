// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 作业处理函数
//!
//! 每个作业类型对应一个 `async fn(&JobContext, Params)`，由工作者按类型分派。

pub mod channel;
pub mod matches;
pub mod member;
pub mod pair;
pub mod params;
pub mod round;

#[cfg(test)]
pub(crate) mod test_support;
