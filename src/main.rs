// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use chat_roulette::application::context::{JobContext, JobOptions};
use chat_roulette::config::settings::Settings;
use chat_roulette::infrastructure::database::connection;
use chat_roulette::infrastructure::metrics::init_metrics;
use chat_roulette::infrastructure::platform::memory::InMemoryPlatform;
use chat_roulette::presentation::middleware::signature::SignatureState;
use chat_roulette::presentation::routes;
use chat_roulette::presentation::state::AppState;
use chat_roulette::utils::telemetry;
use chat_roulette::workers::manager::WorkerManager;
use migration::{Migrator, MigratorTrait};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    let settings = Settings::new()?;

    // 2. Initialize logging
    telemetry::init_telemetry(settings.telemetry.json);
    info!("Starting chat-roulette...");

    // Initialize Prometheus Metrics
    if settings.metrics.enabled {
        match settings.metrics.address.parse::<SocketAddr>() {
            Ok(addr) => init_metrics(addr),
            Err(e) => warn!(address = %settings.metrics.address, error = %e, "Invalid metrics address"),
        }
    }

    // 3. Connect to database
    let db = connection::connect_with_retry(&settings.database).await?;
    let db = Arc::new(db);
    info!("Database connection established");

    // Run database migrations
    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. Initialize Components
    let platform = Arc::new(InMemoryPlatform::new());
    if settings.bot.dev_mode {
        warn!("Dev mode enabled, request signatures are not verified");
    }
    let options = JobOptions::from_settings(&settings)?;
    let ctx = JobContext::from_database(db.clone(), platform, options);

    // 5. Start Workers
    let mut worker_manager = WorkerManager::new(ctx.clone(), settings.worker.clone());
    worker_manager.start_workers(settings.worker.concurrency);

    // 6. Start HTTP server
    let signature = SignatureState::new(&settings.bot.signing_secret, settings.bot.dev_mode);
    let app = routes::routes(AppState::from_context(&ctx), signature)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    tokio::select! {
        result = axum::serve(listener, app).into_future() => result?,
        _ = worker_manager.wait_for_shutdown() => {}
    }

    Ok(())
}
