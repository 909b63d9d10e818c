//! リモート取得モジュール
//!
//! 識別子ごとに固定エンドポイントへ GET / POST を1回ずつ発行する

mod http;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use http::HttpFetcher;

/// 識別子からリクエストを組み立てる雛形
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "UPPERCASE")]
pub enum RequestTemplate {
    /// `url?{query_param}={id}`
    Get { url: String, query_param: String },
    /// 固定フォーム項目 + `{id_field}={id}` を POST
    Post {
        url: String,
        id_field: String,
        #[serde(default)]
        form: BTreeMap<String, String>,
    },
}

impl RequestTemplate {
    pub fn url(&self) -> &str {
        match self {
            RequestTemplate::Get { url, .. } | RequestTemplate::Post { url, .. } => url,
        }
    }
}
