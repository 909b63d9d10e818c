//! 実行単位で扱う平坦なレコード型

use serde::{Deserialize, Serialize};

/// 未検出フィールドの既定値
pub const NOT_FOUND: &str = "Not Found";

/// 1識別子につき1件の抽出結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    /// クエリテーブルのフィールド順
    pub values: Vec<String>,
}

impl Record {
    /// 全フィールドを sentinel で埋めたレコード
    pub fn missing(id: impl Into<String>, fields: usize, sentinel: &str) -> Self {
        Self {
            id: id.into(),
            values: vec![sentinel.to_string(); fields],
        }
    }
}

/// ヘッダー行付きの表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// 見出しの完全一致で列位置を探す
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// レコード列を `[id_header, field...]` の表にする
    pub fn from_records(id_header: &str, field_names: &[String], records: &[Record]) -> Self {
        let mut headers = Vec::with_capacity(field_names.len() + 1);
        headers.push(id_header.to_string());
        headers.extend(field_names.iter().cloned());

        let rows = records
            .iter()
            .map(|r| {
                let mut row = Vec::with_capacity(r.values.len() + 1);
                row.push(r.id.clone());
                row.extend(r.values.iter().cloned());
                row
            })
            .collect();

        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// ダウンロード用の成果物
#[derive(Debug, Clone)]
pub struct Artifact {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// 識別子ごとの警告（実行は継続）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunWarning {
    pub identifier: String,
    pub message: String,
}

impl RunWarning {
    pub fn new(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            message: message.into(),
        }
    }
}

/// 1回の実行結果
#[derive(Debug, Clone)]
pub struct RunReport {
    pub artifact: Artifact,
    /// 成果物に含まれる行数（ZIP の場合はエントリ数）
    pub rows: usize,
    pub warnings: Vec<RunWarning>,
}
