//! Resource client
//!
//! Features:
//! - GET and HEAD with redirect following (including http → https upgrades)
//! - Final URL and headers reported after redirection
//! - Non-2xx responses handed back to the caller, not turned into errors
//! - rustls TLS, Brotli/Zstd/Gzip/Deflate decoding, charset-aware text bodies

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, instrument};

use crate::config::HttpConfig;
use crate::error::{ClassificationError, NetworkError};
use crate::mime::MimeType;

/// Final response after redirects.
///
/// Status and headers are available as soon as the response starts. The
/// body is only read by [`FetchedResource::text`], so a caller can look at
/// `Content-Type` first and walk away from an endless stream.
#[derive(Debug)]
pub struct FetchedResource {
    /// URL of the last hop; relative links resolve against this.
    pub final_url: String,
    pub status: StatusCode,
    pub headers: HeaderMap,
    body: Body,
}

#[derive(Debug)]
enum Body {
    Ready(String),
    Pending(reqwest::Response),
}

impl FetchedResource {
    /// A response whose body is already in memory (HEAD, canned responses).
    pub fn from_parts(
        final_url: impl Into<String>,
        status: StatusCode,
        headers: HeaderMap,
        body: impl Into<String>,
    ) -> Self {
        Self {
            final_url: final_url.into(),
            status,
            headers,
            body: Body::Ready(body.into()),
        }
    }

    /// Raw `Content-Type` header value, if present and ASCII.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// `None` if the header is absent, `Some(Err)` if it is malformed.
    pub fn mime_type(&self) -> Option<Result<MimeType, ClassificationError>> {
        self.content_type().map(MimeType::from_header)
    }

    /// Read the whole body as text. Empty for HEAD.
    pub async fn text(self) -> Result<String, NetworkError> {
        match self.body {
            Body::Ready(text) => Ok(text),
            Body::Pending(response) => response
                .text()
                .await
                .map_err(|e| NetworkError::new(self.final_url, e)),
        }
    }
}

/// HTTP transport consumed by discovery.
///
/// Implementations follow redirects transparently and report the final
/// URL and headers.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Start a GET. The body is left unread until [`FetchedResource::text`].
    async fn get(&self, url: &str) -> Result<FetchedResource, NetworkError>;

    async fn head(&self, url: &str) -> Result<FetchedResource, NetworkError>;
}

/// [`Transport`] backed by `reqwest`.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with default settings.
    pub fn new() -> Result<Self, NetworkError> {
        Self::with_config(&HttpConfig::default())
    }

    pub fn with_config(config: &HttpConfig) -> Result<Self, NetworkError> {
        let client = Client::builder()
            // ═══════════════════════════════════════════════════════════════
            // CONNECTION
            // ═══════════════════════════════════════════════════════════════
            // Let the server negotiate HTTP/2 or HTTP/1.1
            .http2_adaptive_window(true)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .hickory_dns(true)
            .use_rustls_tls()
            // ═══════════════════════════════════════════════════════════════
            // COMPRESSION (auto-negotiated via Accept-Encoding)
            // ═══════════════════════════════════════════════════════════════
            .brotli(true)
            .zstd(true)
            .gzip(true)
            .deflate(true)
            // ═══════════════════════════════════════════════════════════════
            // TIMEOUTS
            // ═══════════════════════════════════════════════════════════════
            .connect_timeout(config.connect_timeout())
            .timeout(config.timeout())
            // ═══════════════════════════════════════════════════════════════
            // REDIRECTS
            // ═══════════════════════════════════════════════════════════════
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| NetworkError::new("<client>", e))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self), fields(url = %url))]
    async fn get(&self, url: &str) -> Result<FetchedResource, NetworkError> {
        debug!("GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NetworkError::new(url, e))?;

        let final_url = response.url().to_string();
        let status = response.status();
        let headers = response.headers().clone();

        info!(
            status = %status,
            final_url = %final_url,
            content_type = ?headers.get(CONTENT_TYPE),
            "Response received"
        );

        Ok(FetchedResource {
            final_url,
            status,
            headers,
            body: Body::Pending(response),
        })
    }

    #[instrument(skip(self), fields(url = %url))]
    async fn head(&self, url: &str) -> Result<FetchedResource, NetworkError> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| NetworkError::new(url, e))?;

        debug!(
            status = %response.status(),
            content_type = ?response.headers().get(CONTENT_TYPE),
            "HEAD response"
        );

        Ok(FetchedResource::from_parts(
            response.url().to_string(),
            response.status(),
            response.headers().clone(),
            String::new(),
        ))
    }
}
