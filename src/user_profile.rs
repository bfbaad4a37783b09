use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// ユーザーのプロフィール。
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub email: String,
    pub is_active: bool,
    #[serde(default)]
    pub weekly_comitted_hours: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reactivation_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// チームや職種など、このCLIでは扱わない項目。更新時にそのまま送り返す。
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// ユーザーの稼働状態。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum UserStatus {
    Active,
    InActive,
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserStatus::Active => write!(f, "Active"),
            UserStatus::InActive => write!(f, "InActive"),
        }
    }
}
