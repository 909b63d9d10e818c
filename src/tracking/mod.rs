//! 注文追跡・カートン照会パイプライン
//!
//! 入力 → 識別子ごとに取得 → 抽出 → （ASN 照合）→ 表出力 を1本で行う。
//! 入力の種類・照合の有無・出力形式は `TrackingJob` で切り替える。

pub mod profiles;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{ProfileSettings, Settings};
use crate::crossref;
use crate::error::ToolError;
use crate::extract::QueryTable;
use crate::input;
use crate::output::{self, TableFormat};
use crate::traits::{Fetcher, Progress};
use crate::types::{Record, RunReport, RunWarning, Table};

/// 組み込みプロファイル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileKind {
    OrderTracking,
    CartonLookup,
}

impl ProfileKind {
    pub fn settings(self, settings: &Settings) -> &ProfileSettings {
        match self {
            ProfileKind::OrderTracking => &settings.order_tracking,
            ProfileKind::CartonLookup => &settings.carton_lookup,
        }
    }

    /// 出力ファイル名の語幹
    pub fn file_stem(self) -> &'static str {
        match self {
            ProfileKind::OrderTracking => "order_tracking",
            ProfileKind::CartonLookup => "carton_lookup",
        }
    }
}

/// 識別子の入力元
#[derive(Debug, Clone)]
pub enum InputSource {
    /// 改行区切りの貼り付けテキスト
    Pasted(String),
    /// CSV / XLSX の指定列
    Table {
        bytes: Vec<u8>,
        format: TableFormat,
        column: String,
    },
}

impl InputSource {
    pub fn identifiers(&self) -> Result<Vec<String>, ToolError> {
        match self {
            InputSource::Pasted(text) => input::identifiers_from_text(text),
            InputSource::Table {
                bytes,
                format,
                column,
            } => {
                let table = input::read_table(bytes, *format)?;
                input::identifiers_from_table(&table, column)
            }
        }
    }
}

/// ASN ファイルとの照合設定
#[derive(Debug, Clone)]
pub struct CrossRef {
    pub bytes: Vec<u8>,
    pub format: TableFormat,
    /// ASN 側の照合列
    pub column: String,
}

/// 1回分の実行内容
#[derive(Debug, Clone)]
pub struct TrackingJob {
    pub profile: ProfileKind,
    pub input: InputSource,
    pub cross_ref: Option<CrossRef>,
    pub format: TableFormat,
}

impl TrackingJob {
    pub fn new(profile: ProfileKind, input: InputSource) -> Self {
        Self {
            profile,
            input,
            cross_ref: None,
            format: TableFormat::default(),
        }
    }

    pub fn with_cross_ref(mut self, cross_ref: CrossRef) -> Self {
        self.cross_ref = Some(cross_ref);
        self
    }

    pub fn with_format(mut self, format: TableFormat) -> Self {
        self.format = format;
        self
    }
}

/// 抽出結果（入力順に1識別子1レコード）
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub records: Vec<Record>,
    pub warnings: Vec<RunWarning>,
}

/// 識別子を順に取得・抽出する。取得失敗は警告にして全項目 sentinel のレコードを残す
pub async fn extract_all(
    fetcher: &dyn Fetcher,
    table: &QueryTable,
    identifiers: &[String],
    sentinel: &str,
    progress: &mut dyn Progress,
) -> Extraction {
    let mut extraction = Extraction::default();
    progress.begin(identifiers.len());

    for (i, id) in identifiers.iter().enumerate() {
        let record = match fetcher.fetch(id).await {
            Ok(body) => table.extract(id, &body, sentinel),
            Err(e) => {
                warn!("{}: {}", id, e);
                extraction.warnings.push(RunWarning::new(id, e.to_string()));
                Record::missing(id, table.len(), sentinel)
            }
        };
        extraction.records.push(record);
        progress.item_done(i + 1, id);
    }

    progress.finish();
    extraction
}

/// パイプライン全体。入力検証はすべて取得開始前に行う
pub async fn run(
    job: &TrackingJob,
    settings: &Settings,
    fetcher: &dyn Fetcher,
    progress: &mut dyn Progress,
) -> Result<RunReport, ToolError> {
    let profile = job.profile.settings(settings);
    let identifiers = job.input.identifiers()?;
    let table = QueryTable::compile(&profile.fields)?;

    let asn = match &job.cross_ref {
        Some(cross_ref) => {
            let references_field = table
                .field_names()
                .iter()
                .position(|n| n == profiles::REFERENCES_FIELD)
                .ok_or_else(|| {
                    ToolError::Config(format!(
                        "照合には {} フィールドが必要です",
                        profiles::REFERENCES_FIELD
                    ))
                })?;
            let asn = input::read_table(&cross_ref.bytes, cross_ref.format)?;
            if asn.column_index(&cross_ref.column).is_none() {
                return Err(ToolError::MissingColumn(cross_ref.column.clone()));
            }
            Some((asn, cross_ref.column.as_str(), references_field))
        }
        None => None,
    };

    info!(
        "Running {:?} for {} identifier(s) against {}",
        job.profile,
        identifiers.len(),
        profile.request.url()
    );

    let extraction = extract_all(fetcher, &table, &identifiers, &settings.sentinel, progress).await;

    let (out_table, stem) = match asn {
        Some((asn, column, references_field)) => {
            let references =
                crossref::reference_set(&extraction.records, references_field, &settings.sentinel);
            (crossref::filter_rows(&asn, column, &references)?, "asn_matches")
        }
        None => (
            Table::from_records(&profile.id_header, table.field_names(), &extraction.records),
            job.profile.file_stem(),
        ),
    };

    let file_name = output::timestamped_name(stem, job.format.ext());
    let artifact = output::table_artifact(&out_table, job.format, file_name)?;

    Ok(RunReport {
        artifact,
        rows: out_table.len(),
        warnings: extraction.warnings,
    })
}
