use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ToolError;

/// ZIP に入れるファイル群。同名は後勝ち（1エントリに置き換え）
#[derive(Debug, Default)]
pub struct ArchiveEntries {
    entries: Vec<(String, Vec<u8>)>,
}

impl ArchiveEntries {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加する。既存の同名エントリを上書きした場合は true
    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> bool {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => {
                existing.1 = bytes;
                true
            }
            None => {
                self.entries.push((name, bytes));
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn into_zip(self) -> Result<Vec<u8>, ToolError> {
        zip_entries(&self.entries)
    }
}

/// (ファイル名, 内容) を deflate で ZIP にまとめる
pub fn zip_entries(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>, ToolError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, bytes) in entries {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(bytes)?;
    }

    Ok(zip.finish()?.into_inner())
}
