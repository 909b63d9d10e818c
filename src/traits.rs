use async_trait::async_trait;
use tracing::info;

use crate::error::ToolError;

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// 識別子1件分のレスポンス本文を取得
    async fn fetch(&self, identifier: &str) -> Result<String, ToolError>;
}

/// 進捗通知（1件処理するごとに呼ばれる）
pub trait Progress: Send {
    fn begin(&mut self, _total: usize) {}

    fn item_done(&mut self, _done: usize, _identifier: &str) {}

    fn finish(&mut self) {}
}

/// 何もしない進捗
pub struct NullProgress;

impl Progress for NullProgress {}

/// `[done/total]` をログに出す進捗
#[derive(Debug, Default)]
pub struct TracingProgress {
    total: usize,
}

impl Progress for TracingProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        info!("Processing {} record(s)", total);
    }

    fn item_done(&mut self, done: usize, identifier: &str) {
        info!("[{}/{}] {}", done, self.total, identifier);
    }

    fn finish(&mut self) {
        info!("Finished {} record(s)", self.total);
    }
}
