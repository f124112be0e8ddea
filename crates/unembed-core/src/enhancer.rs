//! Bounded fan-out over a batch of embed descriptors
//!
//! Resolutions run concurrently on the current task, at most `concurrency`
//! at a time. Each result lands in the slot of its input, so output order
//! never depends on completion order.

use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::cache::BoundedCache;
use crate::client::EmbedClient;
use crate::config::EngineConfig;
use crate::error::{EmbedError, Result};
use crate::provider::Provider;
use crate::resolver::{EmbedResolver, ResolutionCache};
use crate::types::{EmbedDescriptor, EnhancedServer, ExtractedMedia};

/// Quality label attached to enhanced servers
const ENHANCED_QUALITY: &str = "HD";

/// Map `f` over `items` with at most `concurrency` futures in flight
///
/// A finished future immediately frees its slot for the next pending item.
/// The returned vector has the same length and order as `items`. A
/// `concurrency` of zero is treated as one.
pub async fn bounded_map<T, R, F, Fut>(items: Vec<T>, concurrency: usize, f: F) -> Vec<R>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = R>,
{
    let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None).take(items.len()).collect();

    let mut completed = stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| {
            let pending = f(item);
            async move { (index, pending.await) }
        })
        .buffer_unordered(concurrency.max(1));

    while let Some((index, result)) = completed.next().await {
        slots[index] = Some(result);
    }

    slots.into_iter().flatten().collect()
}

/// Annotates discovered servers with direct media URLs
///
/// Owns one resolver per provider and the cache they share.
pub struct ServerEnhancer {
    resolvers: Vec<EmbedResolver>,
    concurrency: usize,
    cache: Arc<ResolutionCache>,
}

impl ServerEnhancer {
    /// Create an enhancer for every known provider
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the configuration is invalid
    pub fn new(config: &EngineConfig) -> Result<Self> {
        config.validate()?;

        let client = EmbedClient::with_config(config)?;
        let cache = Arc::new(BoundedCache::new(config.cache_max_size)?);
        let resolvers = Provider::ALL
            .into_iter()
            .map(|provider| {
                EmbedResolver::new(provider, client.clone()).with_cache(Arc::clone(&cache))
            })
            .collect();

        Ok(Self {
            resolvers,
            concurrency: config.concurrency,
            cache,
        })
    }

    /// Create an enhancer from prebuilt resolvers
    ///
    /// # Errors
    /// Returns `InvalidConfig` if `concurrency` is zero
    pub fn with_resolvers(
        resolvers: Vec<EmbedResolver>,
        concurrency: usize,
        cache: Arc<ResolutionCache>,
    ) -> Result<Self> {
        if concurrency == 0 {
            return Err(EmbedError::InvalidConfig(
                "concurrency must be positive".to_string(),
            ));
        }

        Ok(Self {
            resolvers,
            concurrency,
            cache,
        })
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Resolve every routable descriptor, keeping input order
    ///
    /// Descriptors with no matching provider, and those whose resolution
    /// fails, are returned unchanged. This never fails as a whole.
    ///
    /// # Example
    /// ```no_run
    /// # async fn example() -> unembed_core::Result<()> {
    /// use unembed_core::{EmbedDescriptor, EngineConfig, ServerEnhancer};
    /// let enhancer = ServerEnhancer::new(&EngineConfig::default())?;
    /// let servers = enhancer
    ///     .enhance(vec![EmbedDescriptor::new("https://turbovidhls.com/t/abc").with_server("Server 1")])
    ///     .await;
    /// for server in &servers {
    ///     println!("{:?}", server.media());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn enhance(&self, descriptors: Vec<EmbedDescriptor>) -> Vec<EnhancedServer> {
        let total = descriptors.len();
        let attempted = descriptors
            .iter()
            .filter(|descriptor| self.resolver_for(descriptor).is_some())
            .count();

        let servers = bounded_map(descriptors, self.concurrency, |descriptor| {
            self.enhance_one(descriptor)
        })
        .await;

        let resolved = servers.iter().filter(|s| s.is_extracted()).count();
        tracing::info!(resolved, attempted, total, "Enhanced servers");

        servers
    }

    async fn enhance_one(&self, descriptor: EmbedDescriptor) -> EnhancedServer {
        let Some(resolver) = self.resolver_for(&descriptor) else {
            return EnhancedServer::unresolved(descriptor);
        };

        match resolver.resolve(&descriptor.url).await {
            Ok(source) => EnhancedServer {
                extracted: Some(ExtractedMedia {
                    media: source.url.clone(),
                    sources: vec![source],
                    kind: resolver.provider().display_name().to_string(),
                    quality: ENHANCED_QUALITY.to_string(),
                    is_extracted: true,
                }),
                descriptor,
            },
            Err(e) => {
                tracing::warn!(
                    url = %descriptor.url,
                    reason = e.reason(),
                    error = %e,
                    "Failed to resolve embed"
                );
                EnhancedServer::unresolved(descriptor)
            }
        }
    }

    fn resolver_for(&self, descriptor: &EmbedDescriptor) -> Option<&EmbedResolver> {
        let provider = Provider::for_descriptor(descriptor)?;
        self.resolvers.iter().find(|r| r.provider() == provider)
    }
}
