//! Page loading: fetch a URL and parse it into a queryable document.
//!
//! The orchestrator only depends on the [`PageLoader`] trait; the HTTP
//! implementation lives here as [`HttpPageLoader`].

use crate::error::{AuditError, Result};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Client;
use scraper::Html;
use std::time::Duration;
use tracing::debug;

/// Desktop browser agent sent with every page request.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Default cap on the response body.
pub const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;

/// Default page-load timeout.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_millis(30_000);

#[derive(Debug, Clone, PartialEq, Eq)]
/// Options forwarded from the audit options to the loader.
pub struct LoadOptions {
    pub timeout: Option<Duration>,
    pub max_size: Option<u64>,
    /// Carried onto the page. This analyzer has no script engine, so no
    /// embedded script is executed either way.
    pub allow_js: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_LOAD_TIMEOUT),
            max_size: Some(DEFAULT_MAX_SIZE),
            allow_js: false,
        }
    }
}

/// Parse `raw` as an absolute URL. Only `http` and `https` can be loaded.
pub fn validate_url(raw: &str) -> Result<url::Url> {
    let parsed = url::Url::parse(raw.trim()).map_err(|source| AuditError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(AuditError::PageLoad {
            url: raw.to_string(),
            reason: format!("unsupported scheme \"{}\"", other),
        }),
    }
}

/// A loaded page shared read-only by every rule module in a run.
pub struct Page {
    pub url: String,
    pub html: String,
    pub document: Html,
    /// Response headers captured at load time.
    pub headers: HeaderMap,
    pub status: u16,
    pub allow_js: bool,
}

impl Page {
    /// Build a page from markup that is already in hand.
    pub fn from_html(url: &str, html: &str) -> Self {
        Self {
            url: url.to_string(),
            html: html.to_string(),
            document: Html::parse_document(html),
            headers: HeaderMap::new(),
            status: 200,
            allow_js: false,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn is_https(&self) -> bool {
        self.url.starts_with("https://")
    }

    pub fn is_http(&self) -> bool {
        self.url.starts_with("http://")
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("url", &self.url)
            .field("status", &self.status)
            .field("bytes", &self.html.len())
            .field("allow_js", &self.allow_js)
            .finish()
    }
}

/// Source of pages for the orchestrator.
#[async_trait(?Send)]
pub trait PageLoader {
    /// Fetch and parse `url`. Any failure is fatal to the audit run.
    async fn load(&self, url: &str, options: &LoadOptions) -> Result<Page>;
}

/// Loader backed by `reqwest`.
pub struct HttpPageLoader {
    client: Client,
}

impl HttpPageLoader {
    pub fn new() -> Result<Self> {
        Self::with_user_agent(DEFAULT_USER_AGENT)
    }

    pub fn with_user_agent(user_agent: &str) -> Result<Self> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }

    async fn fetch(&self, url: &str, options: &LoadOptions) -> Result<Page> {
        let mut request = self.client.get(url);
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }
        let mut response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuditError::PageLoad {
                url: url.to_string(),
                reason: format!(
                    "HTTP {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("")
                )
                .trim_end()
                .to_string(),
            });
        }

        if let (Some(limit), Some(len)) = (options.max_size, response.content_length()) {
            if len > limit {
                return Err(AuditError::PayloadTooLarge { size: len, limit });
            }
        }

        let headers = response.headers().clone();
        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            body.extend_from_slice(&chunk);
            if let Some(limit) = options.max_size {
                if body.len() as u64 > limit {
                    return Err(AuditError::PayloadTooLarge {
                        size: body.len() as u64,
                        limit,
                    });
                }
            }
        }

        let html = String::from_utf8_lossy(&body).into_owned();
        let mut page = Page::from_html(url, &html).with_headers(headers);
        page.status = status.as_u16();
        page.allow_js = options.allow_js;
        Ok(page)
    }
}

#[async_trait(?Send)]
impl PageLoader for HttpPageLoader {
    async fn load(&self, url: &str, options: &LoadOptions) -> Result<Page> {
        debug!(url, ?options, "loading page");
        self.fetch(url, options).await.map_err(|e| {
            let reason = match e {
                AuditError::PageLoad { .. } => return e,
                AuditError::Http(ref err) if err.is_timeout() => match options.timeout {
                    Some(t) => format!("request timed out after {}ms", t.as_millis()),
                    None => "request timed out".to_string(),
                },
                other => other.to_string(),
            };
            AuditError::PageLoad {
                url: url.to_string(),
                reason,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_validate_url() {
        assert_eq!(validate_url(" https://example.com/a ").unwrap().path(), "/a");
        assert!(matches!(validate_url("example.com"), Err(AuditError::InvalidUrl { .. })));
        assert!(validate_url("ftp://example.com").is_err());
    }

    #[tokio::test]
    async fn test_load_parses_document_and_keeps_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-Frame-Options", "DENY")
                    .set_body_string("<html><head><title>Hi</title></head><body></body></html>"),
            )
            .mount(&server)
            .await;

        let loader = HttpPageLoader::new().unwrap();
        let page = loader
            .load(&format!("{}/", server.uri()), &LoadOptions::default())
            .await
            .unwrap();
        assert_eq!(page.status, 200);
        assert!(page.html.contains("<title>Hi</title>"));
        assert_eq!(page.headers.get("x-frame-options").unwrap(), "DENY");
        assert!(!page.allow_js);
    }

    #[tokio::test]
    async fn test_non_success_status_is_load_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let loader = HttpPageLoader::new().unwrap();
        let err = loader
            .load(&server.uri(), &LoadOptions::default())
            .await
            .unwrap_err();
        match err {
            AuditError::PageLoad { reason, .. } => assert!(reason.contains("Not Found")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_oversize_body_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(2048)))
            .mount(&server)
            .await;

        let loader = HttpPageLoader::new().unwrap();
        let options = LoadOptions {
            max_size: Some(1024),
            ..LoadOptions::default()
        };
        let err = loader.load(&server.uri(), &options).await.unwrap_err();
        assert!(matches!(err, AuditError::PageLoad { .. }));
        assert!(err.to_string().contains("1024 byte limit"));
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let loader = HttpPageLoader::new().unwrap();
        let options = LoadOptions {
            timeout: Some(Duration::from_millis(50)),
            ..LoadOptions::default()
        };
        let err = loader.load(&server.uri(), &options).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
