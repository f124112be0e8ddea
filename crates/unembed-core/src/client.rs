//! HTTP client for embed pages
//!
//! Thin reqwest wrapper: fixed timeout, browser-like headers and a
//! per-request `Referer`. No retries; a failed fetch is final for its item.

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER};

use crate::config::EngineConfig;
use crate::error::{EmbedError, Result};

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.9";

/// HTTP client for fetching third-party embed pages
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct EmbedClient {
    client: reqwest::Client,
}

impl EmbedClient {
    /// Create a client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(&EngineConfig::default())
    }

    /// Create a client from engine configuration
    ///
    /// # Errors
    /// - `InvalidConfig` if the configuration fails validation or the
    ///   user agent is not a valid header value
    /// - `Fetch` if the underlying client cannot be built
    pub fn with_config(config: &EngineConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE),
        );

        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| EmbedError::InvalidConfig(format!("Invalid user agent: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(user_agent)
            .cookie_store(true)
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }

    /// Fetch an embed page, sending the page itself as `Referer`
    ///
    /// # Arguments
    /// * `url` - Absolute embed/iframe URL
    ///
    /// # Returns
    /// The response body as text
    ///
    /// # Errors
    /// `Fetch` on network failure, timeout or a non-2xx status
    pub async fn fetch_embed(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(REFERER, url)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.text().await?)
    }
}
