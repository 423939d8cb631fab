// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::presentation::handlers::event_handler;
use crate::presentation::middleware::signature::{verify_signature, SignatureState};
use crate::presentation::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Extension, Router,
};

/// 创建应用路由
///
/// # 参数
///
/// * `state` - 事件处理器共享的依赖
/// * `signature` - 请求签名校验配置
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes(state: AppState, signature: SignatureState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let protected_routes = Router::new()
        .route("/v1/events", post(event_handler::receive_event))
        .layer(middleware::from_fn_with_state(signature, verify_signature));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(Extension(state))
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
