use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("必須列がありません: {0}")]
    MissingColumn(String),

    #[error("識別子が入力されていません")]
    EmptyIdentifiers,

    #[error("入力ファイルが不正です: {0}")]
    InvalidInput(String),

    #[error("HTTPステータス {status}: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("タイムアウト: {0}")]
    Timeout(String),

    #[error("接続エラー: {0}")]
    Connection(String),

    #[error("リクエストエラー: {0}")]
    Request(String),

    #[error("クエリ定義エラー: {0}")]
    Query(String),

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("CSVエラー: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX書き込みエラー: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("XLSX読み込みエラー: {0}")]
    XlsxRead(#[from] calamine::XlsxError),

    #[error("ZIPエラー: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("PDFエラー: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("ファイル操作エラー: {0}")]
    FileIO(#[from] std::io::Error),
}

impl ToolError {
    /// 再試行で回復しうるエラーか
    pub fn is_retryable(&self) -> bool {
        match self {
            ToolError::Timeout(_) | ToolError::Connection(_) => true,
            ToolError::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// 入力検証エラー（実行開始前に中断すべきもの）か
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ToolError::MissingColumn(_) | ToolError::EmptyIdentifiers | ToolError::InvalidInput(_)
        )
    }
}

impl From<reqwest::Error> for ToolError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ToolError::Timeout(e.to_string())
        } else if e.is_connect() {
            ToolError::Connection(e.to_string())
        } else if let Some(status) = e.status() {
            ToolError::HttpStatus {
                status: status.as_u16(),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            ToolError::Request(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ToolError::Timeout("t".into()).is_retryable());
        assert!(ToolError::Connection("c".into()).is_retryable());
        assert!(ToolError::HttpStatus { status: 503, url: String::new() }.is_retryable());
        assert!(!ToolError::HttpStatus { status: 404, url: String::new() }.is_retryable());
        assert!(!ToolError::EmptyIdentifiers.is_retryable());
    }

    #[test]
    fn test_input_error_classification() {
        assert!(ToolError::MissingColumn("Carton_ID".into()).is_input_error());
        assert!(ToolError::EmptyIdentifiers.is_input_error());
        assert!(!ToolError::Timeout("t".into()).is_input_error());
    }
}
