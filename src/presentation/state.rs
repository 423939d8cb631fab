// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::context::JobContext;
use crate::domain::repositories::channel_repository::ChannelRepository;
use crate::queue::job_queue::JobQueue;
use std::sync::Arc;

/// HTTP 层共享的依赖
///
/// 事件入口只负责入队，因此只需要队列和频道仓库。
#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<dyn JobQueue>,
    pub channels: Arc<dyn ChannelRepository>,
}

impl AppState {
    pub fn from_context(ctx: &JobContext) -> Self {
        Self {
            queue: ctx.queue.clone(),
            channels: ctx.channels.clone(),
        }
    }
}
