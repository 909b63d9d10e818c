//! 出力モジュール（CSV / XLSX / ZIP）

mod archive;

use std::path::Path;

use chrono::Local;
use rust_xlsxwriter::Workbook;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::types::{Artifact, Table};

pub use archive::{zip_entries, ArchiveEntries};

pub const CSV_MIME: &str = "text/csv";
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const ZIP_MIME: &str = "application/zip";

/// 表形式ファイルの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    #[default]
    Csv,
    Xlsx,
}

impl TableFormat {
    pub fn ext(self) -> &'static str {
        match self {
            TableFormat::Csv => "csv",
            TableFormat::Xlsx => "xlsx",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            TableFormat::Csv => CSV_MIME,
            TableFormat::Xlsx => XLSX_MIME,
        }
    }

    /// 拡張子から判定（大文字小文字は無視）
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(TableFormat::Csv),
            "xlsx" | "xlsm" => Some(TableFormat::Xlsx),
            _ => None,
        }
    }
}

/// 表をバイト列に書き出す
pub fn write_table(table: &Table, format: TableFormat) -> Result<Vec<u8>, ToolError> {
    match format {
        TableFormat::Csv => write_csv(table),
        TableFormat::Xlsx => write_xlsx(table),
    }
}

fn write_csv(table: &Table) -> Result<Vec<u8>, ToolError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| ToolError::FileIO(e.into_error()))
}

fn write_xlsx(table: &Table) -> Result<Vec<u8>, ToolError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, header) in table.headers.iter().enumerate() {
        sheet.write_string(0, xlsx_col(col)?, header)?;
    }
    for (r, row) in table.rows.iter().enumerate() {
        let row_num = xlsx_row(r + 1)?;
        for (col, cell) in row.iter().enumerate() {
            sheet.write_string(row_num, xlsx_col(col)?, cell)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn xlsx_col(col: usize) -> Result<u16, ToolError> {
    u16::try_from(col).map_err(|_| ToolError::InvalidInput(format!("列数が多すぎます: {}", col + 1)))
}

fn xlsx_row(row: usize) -> Result<u32, ToolError> {
    u32::try_from(row).map_err(|_| ToolError::InvalidInput(format!("行数が多すぎます: {}", row + 1)))
}

/// 表を成果物にする
pub fn table_artifact(
    table: &Table,
    format: TableFormat,
    file_name: String,
) -> Result<Artifact, ToolError> {
    Ok(Artifact {
        bytes: write_table(table, format)?,
        mime: format.mime(),
        file_name,
    })
}

/// `<stem>_YYYYmmdd_HHMMSS.<ext>`
pub fn timestamped_name(stem: &str, ext: &str) -> String {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    format!("{}_{}.{}", stem, timestamp, ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xlsx_too_many_columns_is_input_error() {
        assert_eq!(xlsx_col(3).unwrap(), 3);
        assert!(matches!(xlsx_col(70_000), Err(ToolError::InvalidInput(_))));

        let mut wide = Table::new((0..70_000).map(|i| format!("c{}", i)).collect());
        wide.rows.push(vec!["x".to_string()]);
        assert!(write_table(&wide, TableFormat::Xlsx).is_err());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(TableFormat::from_path(Path::new("a/Cartons.XLSX")), Some(TableFormat::Xlsx));
        assert_eq!(TableFormat::from_path(Path::new("orders.csv")), Some(TableFormat::Csv));
        assert_eq!(TableFormat::from_path(Path::new("orders.txt")), None);
        assert_eq!(TableFormat::from_path(Path::new("orders")), None);
    }

    #[test]
    fn test_mime_values() {
        assert_eq!(TableFormat::Csv.mime(), "text/csv");
        assert_eq!(
            TableFormat::Xlsx.mime(),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!(ZIP_MIME, "application/zip");
    }

    #[test]
    fn test_csv_quotes_embedded_delimiters() {
        let mut table = Table::new(vec!["Order Number".into(), "References".into()]);
        table.rows.push(vec!["SO-1".into(), "2024-001, 2024-002".into()]);

        let bytes = write_table(&table, TableFormat::Csv).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "Order Number,References\nSO-1,\"2024-001, 2024-002\"\n");
    }

    #[test]
    fn test_timestamped_name_shape() {
        let name = timestamped_name("order_tracking", "csv");
        assert!(name.starts_with("order_tracking_"));
        assert!(name.ends_with(".csv"));
        assert_eq!(name.len(), "order_tracking_".len() + 15 + ".csv".len());
    }
}
