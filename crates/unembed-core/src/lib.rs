//! Embed Resolution Engine
//!
//! Turns opaque iframe/embed URLs from third-party video hosts into direct,
//! playable stream URLs (typically HLS manifests).
//!
//! # Overview
//!
//! This crate provides:
//! - A decoder for `eval(function(p,a,c,k,e,d){...})` packed scripts
//! - Per-provider chains of extraction strategies, tried in a fixed order
//! - A resolver that fetches embed pages under a hard timeout
//! - A bounded fan-out enhancer that annotates whole server lists in order
//! - A bounded LRU cache shared by the resolvers
//!
//! # Example
//!
//! ```no_run
//! use unembed_core::{EmbedDescriptor, EngineConfig, Result, ServerEnhancer};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let enhancer = ServerEnhancer::new(&EngineConfig::default())?;
//!
//!     let servers = enhancer
//!         .enhance(vec![
//!             EmbedDescriptor::new("https://turbovidhls.com/t/abc123").with_server("Server 1"),
//!             EmbedDescriptor::new("https://hicherri.com/e/xyz789").with_server("Server 2"),
//!         ])
//!         .await;
//!
//!     for server in &servers {
//!         match server.media() {
//!             Some(media) => println!("{:?}: {}", server.descriptor.server, media),
//!             None => println!("{:?}: unresolved", server.descriptor.server),
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Failure model
//!
//! Per-item failures (fetch, timeout, decode, no match) never fail a batch:
//! the descriptor is returned without media. Only invalid configuration is
//! reported as an error, at construction time.

mod cache;
mod client;
mod config;
mod enhancer;
mod error;
pub mod parser;
mod provider;
mod resolver;
mod types;

// Re-export cache types
pub use cache::{BoundedCache, CacheStats};

// Re-export client and configuration
pub use client::EmbedClient;
pub use config::{DEFAULT_USER_AGENT, EngineConfig};

// Re-export error types
pub use error::{EmbedError, Result};

// Re-export decoder entry points
pub use parser::{find_packed_script, unpack, unpack_nested};

// Re-export resolution API
pub use enhancer::{ServerEnhancer, bounded_map};
pub use provider::Provider;
pub use resolver::{EmbedResolver, ResolutionCache};

// Re-export data types
pub use types::{EmbedDescriptor, EnhancedServer, ExtractedMedia, ResolvedSource};
