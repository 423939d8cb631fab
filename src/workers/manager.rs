// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::context::JobContext;
use crate::config::settings::WorkerSettings;
use crate::workers::job_worker::JobWorker;
use crate::workers::worker::Worker;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 工作管理器
pub struct WorkerManager {
    ctx: JobContext,
    settings: WorkerSettings,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerManager {
    pub fn new(ctx: JobContext, settings: WorkerSettings) -> Self {
        Self {
            ctx,
            settings,
            handles: Vec::new(),
        }
    }

    /// 启动工作进程
    ///
    /// 创建并启动指定数量的工作进程
    ///
    /// # 参数
    ///
    /// * `count` - 要启动的工作进程数量
    pub fn start_workers(&mut self, count: usize) {
        for _ in 0..count {
            let worker = JobWorker::new(self.ctx.clone(), &self.settings);
            let handle = tokio::spawn(async move {
                if let Err(e) = worker.run().await {
                    error!(worker = worker.name(), error = %e, "Worker stopped");
                }
            });
            self.handles.push(handle);
        }
        info!(count, "Started job workers");
    }

    /// 运行中的工作进程数量
    pub fn running(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// 等待关闭信号并关闭工作进程
    ///
    /// 监听关闭信号并优雅地关闭所有工作进程
    pub async fn wait_for_shutdown(&mut self) {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }

        self.shutdown();
    }

    /// 终止所有工作进程
    ///
    /// 被中断的作业租约到期后会被重新取出。
    pub fn shutdown(&mut self) {
        info!("Shutting down workers...");
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        info!("Workers shut down successfully");
    }
}
