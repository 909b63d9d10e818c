//! 入力取得モジュール
//!
//! 貼り付けテキスト、CSV / XLSX の表から識別子を取り出す

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use tracing::debug;

use crate::error::ToolError;
use crate::output::TableFormat;
use crate::types::Table;

/// 改行区切りテキストから識別子一覧（空行は無視）
pub fn identifiers_from_text(text: &str) -> Result<Vec<String>, ToolError> {
    let ids: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    if ids.is_empty() {
        return Err(ToolError::EmptyIdentifiers);
    }
    Ok(ids)
}

/// 指定列（見出し完全一致）から識別子一覧
pub fn identifiers_from_table(table: &Table, column: &str) -> Result<Vec<String>, ToolError> {
    let idx = table
        .column_index(column)
        .ok_or_else(|| ToolError::MissingColumn(column.to_string()))?;

    let ids: Vec<String> = table
        .rows
        .iter()
        .filter_map(|row| row.get(idx))
        .map(|cell| cell.trim())
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect();

    if ids.is_empty() {
        return Err(ToolError::EmptyIdentifiers);
    }
    Ok(ids)
}

/// アップロードされた表を読む（1行目を見出しとする）
pub fn read_table(bytes: &[u8], format: TableFormat) -> Result<Table, ToolError> {
    let table = match format {
        TableFormat::Csv => read_csv(bytes)?,
        TableFormat::Xlsx => read_xlsx(bytes)?,
    };
    debug!(
        "Read {:?} table: {} column(s), {} row(s)",
        format,
        table.headers.len(),
        table.rows.len()
    );
    Ok(table)
}

fn read_csv(bytes: &[u8]) -> Result<Table, ToolError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut table = Table::new(headers);
    for record in reader.records() {
        let record = record?;
        table.rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(table)
}

fn read_xlsx(bytes: &[u8]) -> Result<Table, ToolError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ToolError::InvalidInput("シートがありません".into()))??;

    let mut rows = range.rows().map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>());
    let headers = rows.next().unwrap_or_default();

    let mut table = Table::new(headers);
    table.rows.extend(rows);
    Ok(table)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}
