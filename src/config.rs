use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ToolError;
use crate::extract::FieldSpec;
use crate::fetch::RequestTemplate;
use crate::tracking::profiles;
use crate::types::NOT_FOUND;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BACKOFF_MS: u64 = 1000;
const DEFAULT_USER_AGENT: &str = concat!("shipment-scraper/", env!("CARGO_PKG_VERSION"));

/// 取得処理の設定
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    /// 初回に加えて行う再試行回数（0 = 1回のみ）
    pub retries: u32,
    pub initial_backoff: Duration,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retries: 0,
            initial_backoff: Duration::from_millis(DEFAULT_BACKOFF_MS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// プロファイル（リクエスト雛形 + クエリテーブル）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSettings {
    pub request: RequestTemplate,
    /// 出力表の識別子列の見出し
    pub id_header: String,
    pub fields: Vec<FieldSpec>,
}

/// 設定ファイル上のプロファイル。省略した項目は組み込みプロファイルの値を使う
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfileOverride {
    request: Option<RequestTemplate>,
    id_header: Option<String>,
    fields: Option<Vec<FieldSpec>>,
}

impl ProfileOverride {
    fn apply(self, base: ProfileSettings) -> ProfileSettings {
        ProfileSettings {
            request: self.request.unwrap_or(base.request),
            id_header: self.id_header.unwrap_or(base.id_header),
            fields: self.fields.unwrap_or(base.fields),
        }
    }
}

fn order_tracking_override<'de, D>(deserializer: D) -> Result<ProfileSettings, D::Error>
where
    D: Deserializer<'de>,
{
    ProfileOverride::deserialize(deserializer).map(|o| o.apply(profiles::order_tracking()))
}

fn carton_lookup_override<'de, D>(deserializer: D) -> Result<ProfileSettings, D::Error>
where
    D: Deserializer<'de>,
{
    ProfileOverride::deserialize(deserializer).map(|o| o.apply(profiles::carton_lookup()))
}

/// 設定ファイル（TOML）。全項目に既定値あり
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sentinel: String,
    pub timeout_secs: u64,
    pub retries: u32,
    /// ASN ファイルの照合列
    pub asn_column: String,
    #[serde(deserialize_with = "order_tracking_override")]
    pub order_tracking: ProfileSettings,
    #[serde(deserialize_with = "carton_lookup_override")]
    pub carton_lookup: ProfileSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sentinel: NOT_FOUND.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retries: 0,
            asn_column: profiles::DEFAULT_ASN_COLUMN.to_string(),
            order_tracking: profiles::order_tracking(),
            carton_lookup: profiles::carton_lookup(),
        }
    }
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Self, ToolError> {
        toml::from_str(text).map_err(|e| ToolError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ToolError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig::new()
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_retries(self.retries)
    }
}
