// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::DomainError;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 成员实体
///
/// 每个(频道, 用户)组合对应一行。资料字段（所在地、时区、社交链接等）
/// 作为不透明负载保存，匹配逻辑不会解读它们。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub channel_id: String,
    pub user_id: String,
    pub gender: Gender,
    /// 是否只希望与同性别成员匹配
    pub has_gender_preference: bool,
    pub connection_mode: ConnectionMode,
    /// 是否参与下一次匹配
    pub is_active: bool,
    pub profile: serde_json::Value,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

/// 见面方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    /// 仅线上
    Virtual,
    /// 仅线下
    Physical,
    /// 均可
    #[default]
    Hybrid,
}

impl ConnectionMode {
    /// 两种见面方式是否兼容
    ///
    /// 线上与线下互斥，hybrid 与任何方式兼容。
    pub fn is_compatible_with(&self, other: &ConnectionMode) -> bool {
        !matches!(
            (self, other),
            (ConnectionMode::Virtual, ConnectionMode::Physical)
                | (ConnectionMode::Physical, ConnectionMode::Virtual)
        )
    }
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConnectionMode::Virtual => write!(f, "virtual"),
            ConnectionMode::Physical => write!(f, "physical"),
            ConnectionMode::Hybrid => write!(f, "hybrid"),
        }
    }
}

impl FromStr for ConnectionMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "virtual" => Ok(ConnectionMode::Virtual),
            "physical" => Ok(ConnectionMode::Physical),
            "hybrid" => Ok(ConnectionMode::Hybrid),
            _ => Err(DomainError::InvalidValue {
                kind: "connection mode",
                value: s.to_string(),
            }),
        }
    }
}

/// 性别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
        }
    }
}

impl FromStr for Gender {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            _ => Err(DomainError::InvalidValue {
                kind: "gender",
                value: s.to_string(),
            }),
        }
    }
}
