// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 初始化Prometheus指标导出器并注册作业指标
///
/// 端口被占用时只记录警告，不阻止服务启动。
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new();

    if let Err(e) = builder.with_http_listener(addr).install() {
        warn!(
            "Failed to install Prometheus recorder: {}. This might happen if the port is already in use.",
            e
        );
        return;
    }

    describe_counter!("jobs_enqueued_total", "Total number of jobs enqueued, by type");
    describe_counter!("jobs_processed_total", "Total number of jobs settled, by type and status");
    describe_counter!("jobs_canceled_total", "Total number of jobs canceled in bulk");
    describe_counter!("events_received_total", "Total number of platform events received");
    describe_histogram!("job_duration_seconds", "Duration of job handlers in seconds");

    info!("Metrics exporter listening on {}", addr);
}
