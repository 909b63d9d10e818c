use async_trait::async_trait;
use reqwest::{Client, Request, StatusCode};
use tokio::time::sleep;
use tracing::{debug, warn};

use super::RequestTemplate;
use crate::config::FetchConfig;
use crate::error::ToolError;
use crate::traits::Fetcher;

/// reqwest による取得。クライアントは実行中ずっと使い回す
pub struct HttpFetcher {
    client: Client,
    template: RequestTemplate,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(template: RequestTemplate, config: FetchConfig) -> Result<Self, ToolError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ToolError::Config(format!("HTTPクライアント生成失敗: {}", e)))?;

        Ok(Self::with_client(client, template, config))
    }

    pub fn with_client(client: Client, template: RequestTemplate, config: FetchConfig) -> Self {
        Self {
            client,
            template,
            config,
        }
    }

    pub fn template(&self) -> &RequestTemplate {
        &self.template
    }

    /// 識別子1件分のリクエストを組み立てる
    pub fn build_request(&self, identifier: &str) -> Result<Request, ToolError> {
        let builder = match &self.template {
            RequestTemplate::Get { url, query_param } => self
                .client
                .get(url)
                .query(&[(query_param.as_str(), identifier)]),
            RequestTemplate::Post { url, id_field, form } => {
                let mut body: Vec<(&str, &str)> =
                    form.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
                body.push((id_field.as_str(), identifier));
                self.client.post(url).form(&body)
            }
        };

        builder.build().map_err(ToolError::from)
    }

    async fn fetch_once(&self, identifier: &str) -> Result<String, ToolError> {
        let request = self.build_request(identifier)?;
        let url = request.url().to_string();
        debug!("{} {}", request.method(), url);

        let response = self.client.execute(request).await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(ToolError::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, identifier: &str) -> Result<String, ToolError> {
        let mut attempt = 0u32;
        loop {
            match self.fetch_once(identifier).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < self.config.retries => {
                    let backoff = self.config.initial_backoff * 2u32.pow(attempt);
                    warn!(
                        "{}: attempt {} failed, retrying in {}ms: {}",
                        identifier,
                        attempt + 1,
                        backoff.as_millis(),
                        e
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    const OK_BODY: &str =
        "HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello";
    const NOT_FOUND: &str =
        "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
    const UNAVAILABLE: &str =
        "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

    /// 接続ごとに決まった応答を順に返すローカルサーバー
    async fn serve(responses: Vec<&'static str>, hits: Arc<AtomicUsize>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                hits.fetch_add(1, Ordering::SeqCst);

                let mut buf = [0u8; 1024];
                let mut head = Vec::new();
                loop {
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    head.extend_from_slice(&buf[..n]);
                    if head.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }

                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        format!("http://{}/track", addr)
    }

    fn fetcher(url: String, retries: u32) -> HttpFetcher {
        let client = Client::builder().no_proxy().build().unwrap();
        let template = RequestTemplate::Get {
            url,
            query_param: "OrderNo".into(),
        };
        let config = FetchConfig::new()
            .with_retries(retries)
            .with_initial_backoff(Duration::from_millis(10));
        HttpFetcher::with_client(client, template, config)
    }

    #[test]
    fn test_get_request_templates_query() {
        let f = fetcher("http://legacy.local/OrderStatus.aspx".into(), 0);
        let request = f.build_request("SO-1001").unwrap();

        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(
            request.url().as_str(),
            "http://legacy.local/OrderStatus.aspx?OrderNo=SO-1001"
        );
    }

    #[test]
    fn test_post_request_carries_fixed_form() {
        let mut form = BTreeMap::new();
        form.insert("Action".to_string(), "Search".to_string());
        let template = RequestTemplate::Post {
            url: "http://legacy.local/CartonInquiry.aspx".into(),
            id_field: "CartonID".into(),
            form,
        };
        let f = HttpFetcher::with_client(Client::new(), template, FetchConfig::default());
        let request = f.build_request("C0001").unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(body, b"Action=Search&CartonID=C0001");
    }

    #[tokio::test]
    async fn test_fetch_ok_returns_body() {
        let hits = Arc::new(AtomicUsize::new(0));
        let url = serve(vec![OK_BODY], hits.clone()).await;

        let body = fetcher(url, 0).fetch("SO-1").await.unwrap();
        assert_eq!(body, "hello");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_200_is_http_status_error() {
        let hits = Arc::new(AtomicUsize::new(0));
        let url = serve(vec![NOT_FOUND], hits.clone()).await;

        let err = fetcher(url, 3).fetch("SO-1").await.unwrap_err();
        assert!(matches!(err, ToolError::HttpStatus { status: 404, .. }));
        // 4xx は再試行しない
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_default_is_single_attempt() {
        let hits = Arc::new(AtomicUsize::new(0));
        let url = serve(vec![UNAVAILABLE, OK_BODY], hits.clone()).await;

        let err = fetcher(url, 0).fetch("SO-1").await.unwrap_err();
        assert!(matches!(err, ToolError::HttpStatus { status: 503, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_5xx() {
        let hits = Arc::new(AtomicUsize::new(0));
        let url = serve(vec![UNAVAILABLE, OK_BODY], hits.clone()).await;

        let body = fetcher(url, 1).fetch("SO-1").await.unwrap();
        assert_eq!(body, "hello");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
