//! Bill of Lading リネーム
//!
//! 複数ページの PDF をページごとに分割し、各ページの15桁の BOL 番号で
//! `<番号>.pdf` と名付けて ZIP にまとめる

mod pages;

use tracing::{info, warn};

use crate::error::ToolError;
use crate::extract::Pattern;
use crate::output::{ArchiveEntries, ZIP_MIME};
use crate::traits::Progress;
use crate::types::{Artifact, RunReport, RunWarning};

pub use pages::PdfPages;

/// ちょうど15桁の数字列
pub const BOL_PATTERN: &str = r"\b\d{15}\b";
pub const ARCHIVE_NAME: &str = "renamed_bols.zip";

/// ページ単位の読み出し
trait PageSource {
    fn page_numbers(&self) -> Vec<u32>;
    fn page_text(&self, page: u32) -> Result<String, ToolError>;
    fn single_page(&self, page: u32) -> Result<Vec<u8>, ToolError>;
}

impl PageSource for PdfPages {
    fn page_numbers(&self) -> Vec<u32> {
        PdfPages::page_numbers(self)
    }

    fn page_text(&self, page: u32) -> Result<String, ToolError> {
        PdfPages::page_text(self, page)
    }

    fn single_page(&self, page: u32) -> Result<Vec<u8>, ToolError> {
        PdfPages::single_page(self, page)
    }
}

pub fn rename_bols(pdf: &[u8], progress: &mut dyn Progress) -> Result<RunReport, ToolError> {
    let pages = PdfPages::load(pdf)?;
    rename_pages(&pages, progress)
}

fn rename_pages(
    pages: &dyn PageSource,
    progress: &mut dyn Progress,
) -> Result<RunReport, ToolError> {
    let numbers = pages.page_numbers();
    if numbers.is_empty() {
        return Err(ToolError::InvalidInput("PDFにページがありません".into()));
    }

    let pattern = Pattern::new(BOL_PATTERN)?;
    let mut entries = ArchiveEntries::new();
    let mut warnings = Vec::new();

    progress.begin(numbers.len());
    for (i, &page) in numbers.iter().enumerate() {
        let label = format!("page {}", page);

        let found = match pages.page_text(page) {
            Ok(text) => pattern.first_match(&text),
            Err(e) => {
                warn!("Page {}: text extraction failed: {}", page, e);
                None
            }
        };

        match found {
            Some(bol) => match pages.single_page(page) {
                Ok(bytes) => {
                    if entries.insert(format!("{}.pdf", bol), bytes) {
                        warn!("Page {} replaced an earlier page for {}", page, bol);
                        warnings.push(RunWarning::new(
                            &bol,
                            format!("Page {} overwrote an earlier page with the same Bill of Lading Number", page),
                        ));
                    }
                }
                Err(e) => {
                    warn!("Page {}: split failed: {}", page, e);
                    warnings.push(RunWarning::new(
                        &label,
                        format!("Page {} could not be extracted: {}", page, e),
                    ));
                }
            },
            None => {
                warn!("No Bill of Lading Number found on page {}", page);
                warnings.push(RunWarning::new(
                    &label,
                    format!("No Bill of Lading Number found on page {}", page),
                ));
            }
        }

        progress.item_done(i + 1, &label);
    }
    progress.finish();

    let rows = entries.len();
    info!("Archived {} of {} page(s)", rows, numbers.len());

    Ok(RunReport {
        artifact: Artifact {
            file_name: ARCHIVE_NAME.to_string(),
            mime: ZIP_MIME,
            bytes: entries.into_zip()?,
        },
        rows,
        warnings,
    })
}
