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

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use validator::ValidationError;

/// 平台ID：非空，只含字母和数字
static PLATFORM_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+$").expect("platform id regex is valid"));

/// 检查平台ID格式
///
/// 供 `#[validate(custom(function = "validate_platform_id"))]` 使用。
///
/// # 参数
///
/// * `value` - 频道ID或用户ID
///
/// # 返回值
///
/// * `Ok(())` - 格式有效
/// * `Err(ValidationError)` - 为空或包含非字母数字字符
pub fn validate_platform_id(value: &str) -> Result<(), ValidationError> {
    if PLATFORM_ID.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new("platform_id")
            .with_message(Cow::Borrowed("must be a non-empty alphanumeric id")))
    }
}

/// 检查一个平台ID是否合法
pub fn is_platform_id(value: &str) -> bool {
    PLATFORM_ID.is_match(value)
}
