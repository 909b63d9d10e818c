use regex::Regex;
use scraper::Html;
use serde::{Deserialize, Serialize};

use super::{flatten_lines, normalize_ws, NodePath};
use crate::error::ToolError;
use crate::types::Record;

/// 設定上のクエリ定義
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuerySpec {
    /// 位置指定パス
    Path(String),
    /// プレーンテキストへの正規表現
    Pattern(String),
}

/// フィールド名とクエリの組
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub query: QuerySpec,
}

impl FieldSpec {
    pub fn path(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            query: QuerySpec::Path(path.into()),
        }
    }

    pub fn pattern(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            query: QuerySpec::Pattern(pattern.into()),
        }
    }
}

/// コンパイル済み正規表現クエリ
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self, ToolError> {
        Regex::new(pattern)
            .map(Self)
            .map_err(|e| ToolError::Query(format!("{}: {}", pattern, e)))
    }

    /// 最初の一致（キャプチャグループがあれば1番目）
    pub fn first_match(&self, text: &str) -> Option<String> {
        let caps = self.0.captures(text)?;
        caps.get(1)
            .or_else(|| caps.get(0))
            .map(|m| m.as_str().to_string())
    }
}

/// コンパイル済みクエリ
#[derive(Debug, Clone)]
pub enum FieldQuery {
    Path(NodePath),
    Pattern(Pattern),
}

impl FieldQuery {
    pub fn compile(spec: &QuerySpec) -> Result<Self, ToolError> {
        match spec {
            QuerySpec::Path(p) => NodePath::parse(p).map(FieldQuery::Path),
            QuerySpec::Pattern(p) => Pattern::new(p).map(FieldQuery::Pattern),
        }
    }

    fn evaluate(&self, doc: &Html, plain_text: &str) -> Option<String> {
        match self {
            FieldQuery::Pattern(pattern) => pattern.first_match(plain_text),
            FieldQuery::Path(path) => flatten_lines(&path.select(doc)),
        }
    }
}

/// 名前付きクエリテーブル
#[derive(Debug, Clone)]
pub struct QueryTable {
    names: Vec<String>,
    queries: Vec<FieldQuery>,
}

impl QueryTable {
    pub fn compile(specs: &[FieldSpec]) -> Result<Self, ToolError> {
        let mut names = Vec::with_capacity(specs.len());
        let mut queries = Vec::with_capacity(specs.len());

        for spec in specs {
            if names.contains(&spec.name) {
                return Err(ToolError::Query(format!("フィールド名が重複しています: {}", spec.name)));
            }
            let query = FieldQuery::compile(&spec.query)
                .map_err(|e| ToolError::Query(format!("{}: {}", spec.name, e)))?;
            names.push(spec.name.clone());
            queries.push(query);
        }

        Ok(Self { names, queries })
    }

    pub fn field_names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// 本文を1度だけ解析し、全クエリを評価する。未一致は sentinel
    pub fn extract(&self, identifier: &str, body: &str, sentinel: &str) -> Record {
        let doc = Html::parse_document(body);
        let plain_text = normalize_ws(&doc.root_element().text().collect::<Vec<_>>().join(" "));

        let values = self
            .queries
            .iter()
            .map(|q| {
                q.evaluate(&doc, &plain_text)
                    .unwrap_or_else(|| sentinel.to_string())
            })
            .collect();

        Record {
            id: identifier.to_string(),
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NOT_FOUND;

    const BODY: &str = r#"<html><body>
        <table><tr><td>Status</td><td>Delivered</td></tr>
        <tr><td>Refs</td><td>2024/001<br>2024/002</td></tr></table>
        <p>BOL 1234567890123456 / 123456789012345 / 12345678901234</p>
    </body></html>"#;

    fn table() -> QueryTable {
        QueryTable::compile(&[
            FieldSpec::path("Status", "//table[1]//tr[1]/td[2]"),
            FieldSpec::path("References", "//table[1]//tr[2]/td[2]/text()"),
            FieldSpec::pattern("BOL", r"\b\d{15}\b"),
            FieldSpec::path("Signed By", "//table[1]//tr[9]/td[2]"),
        ])
        .unwrap()
    }

    #[test]
    fn test_extract_fields_in_table_order() {
        let record = table().extract("SO-1", BODY, NOT_FOUND);
        assert_eq!(record.id, "SO-1");
        assert_eq!(
            record.values,
            vec!["Delivered", "2024-001, 2024-002", "123456789012345", NOT_FOUND]
        );
    }

    #[test]
    fn test_multi_element_path_is_flattened() {
        let body = "<table><tr><td>2024/001</td><td>2024/002</td></tr></table>\
                    <table><tr><td>A/1<br>B/2</td></tr></table>";
        let table = QueryTable::compile(&[
            FieldSpec::path("Cells", "//table[1]//td"),
            FieldSpec::path("Lines", "//table[2]//td"),
        ])
        .unwrap();

        let record = table.extract("SO-2", body, NOT_FOUND);
        assert_eq!(record.values, vec!["2024-001, 2024-002", "A-1, B-2"]);
    }

    #[test]
    fn test_fifteen_digit_pattern_ignores_other_runs() {
        let p = Pattern::new(r"\b\d{15}\b").unwrap();
        assert_eq!(
            p.first_match("x 1234567890123456 y 98765432109876 z 111222333444555").as_deref(),
            Some("111222333444555")
        );
        assert_eq!(p.first_match("no numbers"), None);
    }

    #[test]
    fn test_capture_group_preferred() {
        let p = Pattern::new(r"Weight:\s*(\d+)").unwrap();
        assert_eq!(p.first_match("Weight: 42 kg").as_deref(), Some("42"));
    }

    #[test]
    fn test_non_html_body_yields_sentinel_not_panic() {
        let record = table().extract("X", "", "");
        assert_eq!(record.values, vec!["", "", "", ""]);

        let record = table().extract("X", "%PDF-1.4 garbage", NOT_FOUND);
        assert!(record.values.iter().all(|v| v == NOT_FOUND));
    }

    #[test]
    fn test_compile_rejects_bad_definitions() {
        assert!(QueryTable::compile(&[FieldSpec::pattern("A", "(")]).is_err());
        assert!(QueryTable::compile(&[FieldSpec::path("A", "td")]).is_err());
        assert!(QueryTable::compile(&[
            FieldSpec::path("A", "//td"),
            FieldSpec::path("A", "//tr"),
        ])
        .is_err());
    }
}
