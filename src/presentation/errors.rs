// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::domain::repositories::job_repository::RepositoryError;
use crate::queue::job_queue::QueueError;

/// 应用错误类型
///
/// 校验失败返回 400；入队或查询失败返回 503，平台会重新投递事件。
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("failed to queue job: {0}")]
    Queue(#[from] QueueError),

    #[error("failed to read channel: {0}")]
    Repository(#[from] RepositoryError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Queue(_) | AppError::Repository(_) => {
                error!(error = %self, "Event intake unavailable");
                StatusCode::SERVICE_UNAVAILABLE
            }
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
