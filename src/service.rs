use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tower::Service;
use tracing::info;

use crate::bol;
use crate::config::Settings;
use crate::error::ToolError;
use crate::fetch::HttpFetcher;
use crate::tracking::{self, TrackingJob};
use crate::traits::TracingProgress;
use crate::types::RunReport;

/// 実行リクエスト（画面操作1回分）
#[derive(Debug, Clone)]
pub enum RunRequest {
    /// BOL PDF の分割・リネーム
    RenameBols { pdf: Vec<u8> },
    /// 注文追跡・カートン照会
    Track(TrackingJob),
}

/// tower::Serviceを実装した抽出サービス
#[derive(Debug, Clone, Default)]
pub struct ExtractService {
    settings: Arc<Settings>,
}

impl ExtractService {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

impl Service<RunRequest> for ExtractService {
    type Response = RunReport;
    type Error = ToolError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: RunRequest) -> Self::Future {
        let settings = Arc::clone(&self.settings);

        Box::pin(async move {
            let mut progress = TracingProgress::default();

            let report = match req {
                RunRequest::RenameBols { pdf } => {
                    info!("BOLリネーム要求受信: {}bytes", pdf.len());
                    bol::rename_bols(&pdf, &mut progress)?
                }
                RunRequest::Track(job) => {
                    info!("抽出要求受信: profile={:?}", job.profile);
                    let profile = job.profile.settings(&settings);
                    let fetcher =
                        HttpFetcher::new(profile.request.clone(), settings.fetch_config())?;
                    tracking::run(&job, &settings, &fetcher, &mut progress).await?
                }
            };

            info!(
                "処理完了: file={}, rows={}, warnings={}, size={}bytes",
                report.artifact.file_name,
                report.rows,
                report.warnings.len(),
                report.artifact.bytes.len()
            );

            Ok(report)
        })
    }
}
