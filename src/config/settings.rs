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

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::time::Duration;

/// 应用程序配置设置
///
/// 包含数据库、服务器、工作器、机器人、轮次默认值、屏障、超时、指标和日志等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// 服务器配置
    pub server: ServerSettings,
    /// 工作器配置
    pub worker: WorkerSettings,
    /// 机器人配置
    pub bot: BotSettings,
    /// 新频道的默认轮次设置
    pub roulette: RouletteSettings,
    /// 成员作业屏障配置
    pub barrier: BarrierSettings,
    /// 依赖调用超时配置
    pub timeouts: TimeoutSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
    /// 日志配置
    pub telemetry: TelemetrySettings,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
    /// 是否记录SQL语句
    pub sqlx_logging: bool,
    /// 启动时的最大连接尝试次数
    pub connect_attempts: u32,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 工作器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerSettings {
    /// 并发工作器数量
    pub concurrency: usize,
    /// 空闲时的轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 单个作业的执行时限（秒）
    pub job_deadline_secs: u64,
    /// 出队租约（秒），租约内其他工作器看不到该作业
    pub lease_secs: i64,
    /// 最大尝试次数
    pub max_retries: u32,
}

impl WorkerSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn job_deadline(&self) -> Duration {
        Duration::from_secs(self.job_deadline_secs)
    }

    pub fn lease(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.lease_secs)
    }
}

/// 机器人配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct BotSettings {
    /// 机器人在平台上的用户ID
    pub user_id: String,
    /// 事件签名密钥
    pub signing_secret: String,
    /// 开发模式下跳过签名校验
    pub dev_mode: bool,
}

/// 新频道的默认轮次设置
#[derive(Debug, Clone, Deserialize)]
pub struct RouletteSettings {
    pub interval: String,
    pub weekday: String,
    pub hour: u32,
    pub connection_mode: String,
}

/// 成员作业屏障配置
#[derive(Debug, Clone, Deserialize)]
pub struct BarrierSettings {
    /// 轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 最长等待时间（秒）
    pub ceiling_secs: u64,
}

/// 依赖调用超时配置
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutSettings {
    /// 存储调用超时（毫秒）
    pub store_ms: u64,
    /// 平台调用超时（毫秒）
    pub platform_ms: u64,
}

/// 指标配置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    pub enabled: bool,
    /// Prometheus 导出地址
    pub address: String,
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    /// 是否输出JSON格式
    pub json: bool,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加默认值、`config/default`、`config/{APP_ENVIRONMENT}`
    /// 以及 `CHAT_ROULETTE__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("CHAT_ROULETTE").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// 在默认值之上叠加一段TOML配置
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            // Server
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            // Database pool
            .set_default("database.url", "sqlite://chat-roulette.db?mode=rwc")?
            .set_default("database.max_connections", 20)?
            .set_default("database.min_connections", 2)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            .set_default("database.sqlx_logging", false)?
            .set_default("database.connect_attempts", 5)?
            // Worker
            .set_default("worker.concurrency", 4)?
            .set_default("worker.poll_interval_ms", 1000)?
            .set_default("worker.job_deadline_secs", 60)?
            .set_default("worker.lease_secs", 300)?
            .set_default("worker.max_retries", 3)?
            // Bot
            .set_default("bot.user_id", "")?
            .set_default("bot.signing_secret", "")?
            .set_default("bot.dev_mode", false)?
            // Roulette defaults for new channels
            .set_default("roulette.interval", "biweekly")?
            .set_default("roulette.weekday", "Monday")?
            .set_default("roulette.hour", 12)?
            .set_default("roulette.connection_mode", "hybrid")?
            // Member job barrier
            .set_default("barrier.poll_interval_ms", 1000)?
            .set_default("barrier.ceiling_secs", 30)?
            // Dependency timeouts
            .set_default("timeouts.store_ms", 500)?
            .set_default("timeouts.platform_ms", 3000)?
            // Metrics
            .set_default("metrics.enabled", false)?
            .set_default("metrics.address", "0.0.0.0:9090")?
            // Telemetry
            .set_default("telemetry.json", false)
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
