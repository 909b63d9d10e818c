//! 出荷関連の抽出ツール
//!
//! - 注文番号ごとに追跡ページを取得し、配達日・参照番号などを表にする
//! - カートンID一覧（CSV/XLSX の `Carton_ID` 列）で照会ページを取得して表にする
//! - 抽出した参照番号で ASN ファイルの行を絞り込む
//! - BOL の PDF をページ分割し、15桁の BOL 番号で名前を付けて ZIP にする
//!
//! # 注文追跡の使用例
//!
//! ```rust,ignore
//! use shipment_scraper::{ExtractService, RunRequest, Settings};
//! use shipment_scraper::tracking::{InputSource, ProfileKind, TrackingJob};
//! use shipment_scraper::output::TableFormat;
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut service = ExtractService::new(Settings::default());
//!
//!     let job = TrackingJob::new(
//!         ProfileKind::OrderTracking,
//!         InputSource::Pasted("SO-1001\nSO-1002".to_string()),
//!     )
//!     .with_format(TableFormat::Xlsx);
//!
//!     let report = service.call(RunRequest::Track(job)).await.unwrap();
//!     std::fs::write(&report.artifact.file_name, &report.artifact.bytes).unwrap();
//!     for w in &report.warnings {
//!         eprintln!("{}: {}", w.identifier, w.message);
//!     }
//! }
//! ```
//!
//! # BOL リネームの使用例
//!
//! ```rust,ignore
//! use shipment_scraper::bol::rename_bols;
//! use shipment_scraper::traits::TracingProgress;
//!
//! let pdf = std::fs::read("bols.pdf").unwrap();
//! let report = rename_bols(&pdf, &mut TracingProgress::default()).unwrap();
//! std::fs::write("renamed_bols.zip", report.artifact.bytes).unwrap();
//! ```

pub mod bol;
pub mod config;
pub mod crossref;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod input;
pub mod output;
pub mod service;
pub mod tracking;
pub mod traits;
pub mod types;

// 主要な型をリエクスポート
pub use config::{FetchConfig, ProfileSettings, Settings};
pub use error::ToolError;
pub use fetch::{HttpFetcher, RequestTemplate};
pub use service::{ExtractService, RunRequest};
pub use traits::{Fetcher, Progress};
pub use types::{Artifact, Record, RunReport, RunWarning, Table};
