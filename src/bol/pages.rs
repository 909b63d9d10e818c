use lopdf::Document;

use crate::error::ToolError;

/// 読み込み済み PDF。ページ番号は1始まり
pub struct PdfPages {
    doc: Document,
}

impl PdfPages {
    pub fn load(bytes: &[u8]) -> Result<Self, ToolError> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| ToolError::InvalidInput(format!("PDFを読み込めません: {}", e)))?;
        Ok(Self { doc })
    }

    pub fn page_numbers(&self) -> Vec<u32> {
        self.doc.get_pages().keys().copied().collect()
    }

    pub fn page_text(&self, page: u32) -> Result<String, ToolError> {
        Ok(self.doc.extract_text(&[page])?)
    }

    /// 指定ページだけを残した PDF
    pub fn single_page(&self, page: u32) -> Result<Vec<u8>, ToolError> {
        let others: Vec<u32> = self
            .page_numbers()
            .into_iter()
            .filter(|&p| p != page)
            .collect();

        let mut doc = self.doc.clone();
        doc.delete_pages(&others);
        doc.prune_objects();

        let mut out = Vec::new();
        doc.save_to(&mut out)?;
        Ok(out)
    }
}
