//! ASN ファイルとの照合（集合所属によるフィルタ）

use std::collections::HashSet;

use tracing::info;

use crate::error::ToolError;
use crate::types::{Record, Table};

/// 区切り表記をそろえる（`/` → `-`）
pub fn normalize_reference(value: &str) -> String {
    value.trim().replace('/', "-")
}

/// 各レコードの参照フィールド（カンマ区切り）から正規化済み集合を作る
pub fn reference_set(records: &[Record], field: usize, sentinel: &str) -> HashSet<String> {
    records
        .iter()
        .filter_map(|r| r.values.get(field))
        .filter(|v| v.as_str() != sentinel)
        .flat_map(|v| v.split(','))
        .map(normalize_reference)
        .filter(|r| !r.is_empty())
        .collect()
}

/// 指定列の値が集合に含まれる行だけを残す。重複行・元の順序はそのまま
pub fn filter_rows(
    asn: &Table,
    column: &str,
    references: &HashSet<String>,
) -> Result<Table, ToolError> {
    let idx = asn
        .column_index(column)
        .ok_or_else(|| ToolError::MissingColumn(column.to_string()))?;

    let rows: Vec<Vec<String>> = asn
        .rows
        .iter()
        .filter(|row| {
            row.get(idx)
                .map(|v| references.contains(&normalize_reference(v)))
                .unwrap_or(false)
        })
        .cloned()
        .collect();

    info!(
        "Cross-reference kept {} of {} ASN row(s) ({} reference(s))",
        rows.len(),
        asn.rows.len(),
        references.len()
    );

    Ok(Table {
        headers: asn.headers.clone(),
        rows,
    })
}
