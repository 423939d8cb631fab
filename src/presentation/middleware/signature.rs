// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

/// 请求时间戳头
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";
/// 请求签名头，格式为 `v0=<hex>`
pub const SIGNATURE_HEADER: &str = "x-signature";

const SIGNATURE_VERSION: &str = "v0";
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// 签名校验状态
#[derive(Clone)]
pub struct SignatureState {
    /// 签名密钥
    pub signing_secret: Arc<String>,
    /// 开发模式下跳过校验
    pub dev_mode: bool,
    /// 允许的时间戳偏差（秒），超出视为重放
    pub tolerance_secs: i64,
}

impl SignatureState {
    pub fn new(signing_secret: impl Into<String>, dev_mode: bool) -> Self {
        Self {
            signing_secret: Arc::new(signing_secret.into()),
            dev_mode,
            tolerance_secs: 300,
        }
    }
}

/// 计算请求签名
///
/// 对 `v0:{timestamp}:{body}` 做 HMAC-SHA256，返回 `v0=<hex>`。
///
/// # 参数
///
/// * `secret` - 签名密钥
/// * `timestamp` - 请求时间戳（秒）
/// * `body` - 原始请求体
pub fn sign(secret: &str, timestamp: i64, body: &[u8]) -> Result<String, StatusCode> {
    let mac = mac_for(secret, timestamp, body)?;
    Ok(format!(
        "{}={}",
        SIGNATURE_VERSION,
        hex::encode(mac.finalize().into_bytes())
    ))
}

fn mac_for(secret: &str, timestamp: i64, body: &[u8]) -> Result<HmacSha256, StatusCode> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    mac.update(format!("{}:{}:", SIGNATURE_VERSION, timestamp).as_bytes());
    mac.update(body);
    Ok(mac)
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// 签名校验中间件
///
/// 校验通过后把原始请求体放回请求，交给后续处理器。
///
/// # 返回值
///
/// * `Ok(Response)` - 校验通过后的响应
/// * `Err(StatusCode)` - 缺少签名、时间戳过期或签名不匹配时返回 401
pub async fn verify_signature(
    State(state): State<SignatureState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if state.dev_mode {
        debug!("Dev mode, skipping signature verification");
        return Ok(next.run(req).await);
    }

    let (parts, body) = req.into_parts();

    let timestamp: i64 = header(&parts.headers, TIMESTAMP_HEADER)
        .and_then(|value| value.parse().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if (Utc::now().timestamp() - timestamp).abs() > state.tolerance_secs {
        warn!(timestamp, "Rejecting stale event");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let signature = header(&parts.headers, SIGNATURE_HEADER)
        .and_then(|value| value.strip_prefix("v0="))
        .and_then(|value| hex::decode(value).ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| StatusCode::PAYLOAD_TOO_LARGE)?;

    let mac = mac_for(&state.signing_secret, timestamp, &bytes)?;
    if mac.verify_slice(&signature).is_err() {
        warn!("Rejecting event with invalid signature");
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

#[cfg(test)]
#[path = "signature_test.rs"]
mod tests;
