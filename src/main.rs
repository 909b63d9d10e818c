use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tower::Service;
use tracing_subscriber::EnvFilter;

use shipment_scraper::output::TableFormat;
use shipment_scraper::tracking::profiles::{CARTON_ID_COLUMN, ORDER_ID_HEADER};
use shipment_scraper::tracking::{CrossRef, InputSource, ProfileKind, TrackingJob};
use shipment_scraper::{ExtractService, RunReport, RunRequest, RunWarning, Settings};

#[derive(Parser, Debug)]
#[command(name = "shipment-scraper", version, about = "注文追跡・カートン照会・BOLリネーム")]
struct Cli {
    /// 設定ファイル（TOML）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 実行結果（警告一覧）を JSON で書き出す
    #[arg(long, global = true)]
    report: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// BOL PDF をページ分割し、BOL 番号で名前を付けて ZIP にする
    Bol {
        pdf: PathBuf,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// 注文番号ごとに追跡情報を取得する（入力省略時は標準入力）
    Track {
        /// .txt（1行1件）または .csv / .xlsx
        input: Option<PathBuf>,
        /// 表入力時の注文番号列
        #[arg(long, default_value = ORDER_ID_HEADER)]
        column: String,
        /// 参照番号で絞り込む ASN ファイル（.csv / .xlsx）
        #[arg(long)]
        asn: Option<PathBuf>,
        /// ASN ファイルの照合列（既定は設定ファイルの asn_column）
        #[arg(long)]
        asn_column: Option<String>,
        #[arg(long, value_enum, default_value_t = FormatArg::Csv)]
        format: FormatArg,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Carton_ID 列のカートンを照会する
    Cartons {
        /// .csv / .xlsx
        input: PathBuf,
        #[arg(long, value_enum, default_value_t = FormatArg::Csv)]
        format: FormatArg,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Csv,
    Xlsx,
}

impl From<FormatArg> for TableFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Csv => TableFormat::Csv,
            FormatArg::Xlsx => TableFormat::Xlsx,
        }
    }
}

#[derive(Serialize)]
struct ReportFile<'a> {
    file: String,
    mime: &'a str,
    rows: usize,
    warnings: &'a [RunWarning],
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,shipment_scraper=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("設定ファイルを読み込めません: {}", path.display()))?,
        None => Settings::default(),
    };

    let (request, out) = build_request(cli.command, &settings)?;

    let mut service = ExtractService::new(settings);
    let report = service.call(request).await?;

    for w in &report.warnings {
        eprintln!("警告 [{}]: {}", w.identifier, w.message);
    }

    let path = resolve_out_path(out, &report.artifact.file_name);
    std::fs::write(&path, &report.artifact.bytes)
        .with_context(|| format!("書き込みに失敗しました: {}", path.display()))?;
    println!("{} ({} rows, {})", path.display(), report.rows, report.artifact.mime);

    if let Some(report_path) = &cli.report {
        write_report(report_path, &path, &report)?;
    }

    Ok(())
}

fn build_request(command: Command, settings: &Settings) -> Result<(RunRequest, Option<PathBuf>)> {
    match command {
        Command::Bol { pdf, out } => {
            let pdf = read_file(&pdf)?;
            Ok((RunRequest::RenameBols { pdf }, out))
        }
        Command::Track {
            input,
            column,
            asn,
            asn_column,
            format,
            out,
        } => {
            let source = match input {
                None => {
                    let mut text = String::new();
                    std::io::stdin()
                        .read_to_string(&mut text)
                        .context("標準入力を読み込めません")?;
                    InputSource::Pasted(text)
                }
                Some(path) => match TableFormat::from_path(&path) {
                    Some(fmt) => InputSource::Table {
                        bytes: read_file(&path)?,
                        format: fmt,
                        column,
                    },
                    None => InputSource::Pasted(
                        std::fs::read_to_string(&path)
                            .with_context(|| format!("読み込めません: {}", path.display()))?,
                    ),
                },
            };

            let mut job = TrackingJob::new(ProfileKind::OrderTracking, source).with_format(format.into());
            if let Some(asn) = asn {
                let asn_format = table_format(&asn)?;
                job = job.with_cross_ref(CrossRef {
                    bytes: read_file(&asn)?,
                    format: asn_format,
                    column: asn_column.unwrap_or_else(|| settings.asn_column.clone()),
                });
            }
            Ok((RunRequest::Track(job), out))
        }
        Command::Cartons { input, format, out } => {
            let source = InputSource::Table {
                format: table_format(&input)?,
                bytes: read_file(&input)?,
                column: CARTON_ID_COLUMN.to_string(),
            };
            let job = TrackingJob::new(ProfileKind::CartonLookup, source).with_format(format.into());
            Ok((RunRequest::Track(job), out))
        }
    }
}

fn table_format(path: &Path) -> Result<TableFormat> {
    match TableFormat::from_path(path) {
        Some(f) => Ok(f),
        None => bail!("CSV または XLSX を指定してください: {}", path.display()),
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("読み込めません: {}", path.display()))
}

/// 出力先がディレクトリなら成果物名を付ける
fn resolve_out_path(out: Option<PathBuf>, file_name: &str) -> PathBuf {
    match out {
        Some(p) if p.is_dir() => p.join(file_name),
        Some(p) => p,
        None => PathBuf::from(file_name),
    }
}

fn write_report(report_path: &Path, artifact_path: &Path, report: &RunReport) -> Result<()> {
    let file = ReportFile {
        file: artifact_path.display().to_string(),
        mime: report.artifact.mime,
        rows: report.rows,
        warnings: &report.warnings,
    };
    let json = serde_json::to_string_pretty(&file)?;
    std::fs::write(report_path, json)
        .with_context(|| format!("書き込みに失敗しました: {}", report_path.display()))?;
    Ok(())
}
