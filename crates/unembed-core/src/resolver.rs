//! Per-provider embed resolution
//!
//! Fetches an embed page and runs its provider's strategy chain, turning the
//! first hit into a [`ResolvedSource`].

use std::sync::Arc;

use crate::cache::BoundedCache;
use crate::client::EmbedClient;
use crate::error::{EmbedError, Result};
use crate::provider::Provider;
use crate::types::ResolvedSource;

/// Completed lookups keyed by provider and embed URL
///
/// `None` records an exhausted chain. The provider is part of the key
/// because a hint can route one URL through several chains.
pub type ResolutionCache = BoundedCache<(Provider, String), Option<ResolvedSource>>;

/// Resolves embed URLs of one provider to direct stream URLs
///
/// Combines the HTTP client, the provider's extraction chain and an
/// optional shared cache.
#[derive(Clone)]
pub struct EmbedResolver {
    provider: Provider,
    client: EmbedClient,
    cache: Option<Arc<ResolutionCache>>,
}

impl EmbedResolver {
    /// Create a resolver without caching
    ///
    /// # Arguments
    /// * `provider` - Host family whose strategy chain is used
    /// * `client` - HTTP client for page fetches
    pub fn new(provider: Provider, client: EmbedClient) -> Self {
        Self {
            provider,
            client,
            cache: None,
        }
    }

    /// Share a resolution cache with this resolver
    pub fn with_cache(mut self, cache: Arc<ResolutionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Resolve an embed URL to a direct stream
    ///
    /// # Arguments
    /// * `url` - Embed/iframe URL; also sent as `Referer`
    ///
    /// # Returns
    /// The first stream URL found, with `quality = "default"` and HLS tagged
    /// by the `.m3u8` path suffix
    ///
    /// # Errors
    /// - `Fetch` if the page cannot be fetched (including timeout)
    /// - `NotFound` if every strategy was exhausted
    ///
    /// # Example
    /// ```no_run
    /// # async fn example() -> unembed_core::Result<()> {
    /// use unembed_core::{EmbedClient, EmbedResolver, Provider};
    /// let resolver = EmbedResolver::new(Provider::TurboVid, EmbedClient::new()?);
    /// let source = resolver.resolve("https://turbovidhls.com/t/abc123").await?;
    /// println!("{} (hls: {})", source.url, source.is_hls);
    /// # Ok(())
    /// # }
    /// ```
    #[tracing::instrument(skip(self), fields(provider = %self.provider))]
    pub async fn resolve(&self, url: &str) -> Result<ResolvedSource> {
        let key = (self.provider, url.to_string());

        if let Some(cache) = &self.cache
            && let Some(cached) = cache.get(&key)
        {
            tracing::trace!("Cache hit");
            return cached.ok_or_else(|| self.not_found(url));
        }

        let body = self.client.fetch_embed(url).await?;
        let result = self.resolve_body(&body);

        if let Some(cache) = &self.cache {
            match &result {
                Ok(source) => cache.set(key, Some(source.clone())),
                Err(EmbedError::NotFound(_)) => cache.set(key, None),
                Err(_) => {}
            }
        }

        result
    }

    /// Run the strategy chain over an already fetched page
    ///
    /// # Errors
    /// Returns `NotFound` if no strategy produced a usable URL
    pub fn resolve_body(&self, body: &str) -> Result<ResolvedSource> {
        self.provider
            .extract_stream_url(body)
            .map(ResolvedSource::from_url)
    }

    fn not_found(&self, url: &str) -> EmbedError {
        EmbedError::NotFound(format!("{} (cached): {}", self.provider, url))
    }
}
