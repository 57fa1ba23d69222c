//! The network path behind every strategy.
//!
//! ### Contract
//! - Any HTTP status is a response, not an error. Strategies decide what a
//!   non-ok status means.
//! - Failures before a complete response (connect, TLS, timeout, oversized
//!   body) are errors.
//! - Every request is bounded by the configured timeout.
//!
//! ### Limits
//! - Max redirects: 5
//! - Max body bytes: 5MB (configurable)

pub mod url;

use async_trait::async_trait;
use reqwest::{Client, Method};
use std::time::{Duration, Instant};

pub use self::url::{UrlError, parse_origin, resolve};

use cardash_core::{AppConfig, Error, Request, Response};

/// Outbound network access used by the strategies and by precaching.
#[async_trait]
pub trait Network: Send + Sync {
    /// Perform `request` and return the complete response.
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "cardash-sw/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "cardash-sw/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// reqwest-backed [`Network`].
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpClient(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn map_send_error(url: &str, err: &reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::FetchTimeout(format!("{url}: {err}"))
        } else {
            Error::Network(format!("{url}: {err}"))
        }
    }
}

#[async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();
        let method = Method::from_bytes(request.method.to_ascii_uppercase().as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method {}: {}", request.method, e)))?;

        let mut builder = self.http.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_send_error(&request.url, &e))?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                len, self.config.max_bytes
            )));
        }

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
            .collect();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Self::map_send_error(&request.url, &e))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                bytes.len(),
                self.config.max_bytes
            )));
        }

        tracing::debug!(
            "fetched {} {} -> {} in {}ms ({} bytes)",
            request.method,
            request.url,
            status.as_u16(),
            start.elapsed().as_millis(),
            bytes.len()
        );

        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body: bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header as header_matcher, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_with(config: FetchConfig) -> FetchClient {
        FetchClient::new(config).unwrap()
    }

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "cardash-sw/0.1");
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { user_agent: "dash/2".into(), timeout_ms: 1500, ..Default::default() };
        let config = FetchConfig::from(&app);
        assert_eq!(config.user_agent, "dash/2");
        assert_eq!(config.timeout, Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_fetch_returns_body_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/styles.css"))
            .and(header_matcher("accept", "text/css"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("body{}", "text/css"))
            .mount(&server)
            .await;

        let client = client_with(FetchConfig::default());
        let request = Request::get(format!("{}/styles.css", server.uri())).with_header("Accept", "text/css");
        let response = client.fetch(&request).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.status_text, "OK");
        assert_eq!(response.content_type(), Some("text/css"));
        assert_eq!(response.text(), "body{}");
    }

    #[tokio::test]
    async fn test_fetch_non_success_is_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.js"))
            .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
            .mount(&server)
            .await;

        let client = client_with(FetchConfig::default());
        let response = client
            .fetch(&Request::get(format!("{}/missing.js", server.uri())))
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert!(!response.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client = client_with(FetchConfig { timeout: Duration::from_millis(100), ..Default::default() });
        let result = client.fetch(&Request::get(format!("{}/slow", server.uri()))).await;

        assert!(matches!(result, Err(Error::FetchTimeout(_))));
    }

    #[tokio::test]
    async fn test_fetch_too_large() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'x'; 64]))
            .mount(&server)
            .await;

        let client = client_with(FetchConfig { max_bytes: 16, ..Default::default() });
        let result = client.fetch(&Request::get(format!("{}/big", server.uri()))).await;

        assert!(matches!(result, Err(Error::FetchTooLarge(_))));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_is_network_error() {
        let server = MockServer::builder().start().await;
        let uri = server.uri();
        drop(server);

        let client = client_with(FetchConfig { timeout: Duration::from_secs(2), ..Default::default() });
        let result = client.fetch(&Request::get(format!("{uri}/styles.css"))).await;

        assert!(result.unwrap_err().is_network());
    }

    #[tokio::test]
    async fn test_fetch_forwards_method() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/settings"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let client = client_with(FetchConfig::default());
        let response = client
            .fetch(&Request::new("post", format!("{}/api/settings", server.uri())))
            .await
            .unwrap();
        assert_eq!(response.status, 201);
    }
}
