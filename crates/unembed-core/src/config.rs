//! Engine configuration
//!
//! One struct drives the HTTP client, the fan-out width and the cache size.
//! It can be built from defaults, environment variables or a JSON file.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EmbedError, Result};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36";

/// Configuration for the resolution engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Per-request timeout in milliseconds (default: 10000)
    pub timeout_ms: u64,
    /// User-Agent sent with every embed fetch
    pub user_agent: String,
    /// Maximum resolutions in flight per batch (default: 4)
    pub concurrency: usize,
    /// Maximum entries kept by the resolution cache (default: 100)
    pub cache_max_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            concurrency: 4,
            cache_max_size: 100,
        }
    }
}

impl EngineConfig {
    /// Load configuration from `UNEMBED_*` environment variables with defaults
    ///
    /// Missing or unparsable variables fall back to the default value.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            timeout_ms: env::var("UNEMBED_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_ms),
            user_agent: env::var("UNEMBED_USER_AGENT")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.user_agent),
            concurrency: env::var("UNEMBED_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.concurrency),
            cache_max_size: env::var("UNEMBED_CACHE_MAX_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cache_max_size),
        }
    }

    /// Parse a JSON document; absent fields take their default
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| EmbedError::InvalidConfig(format!("Invalid config JSON: {}", e)))
    }

    /// Check construction-time invariants
    ///
    /// # Errors
    /// `InvalidConfig` when timeout, concurrency or cache size is zero,
    /// or the user agent is blank
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(EmbedError::InvalidConfig(
                "timeout must be positive".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(EmbedError::InvalidConfig(
                "concurrency must be positive".to_string(),
            ));
        }
        if self.cache_max_size == 0 {
            return Err(EmbedError::InvalidConfig(
                "cache size must be positive".to_string(),
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(EmbedError::InvalidConfig(
                "user agent cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.timeout_ms, 10_000);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.cache_max_size, 100);
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = EngineConfig::from_json(r#"{"timeoutMs": 2500, "concurrency": 8}"#).unwrap();
        assert_eq!(config.timeout_ms, 2500);
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.cache_max_size, 100);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_from_json_invalid() {
        let result = EngineConfig::from_json("{not json");
        assert!(matches!(result, Err(EmbedError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let config = EngineConfig {
            concurrency: 0,
            ..EngineConfig::default()
        };
        match config.validate() {
            Err(EmbedError::InvalidConfig(msg)) => assert!(msg.contains("concurrency")),
            _ => panic!("Expected InvalidConfig error"),
        }
    }

    #[test]
    fn test_validate_zero_cache_and_timeout() {
        let config = EngineConfig {
            cache_max_size: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            timeout_ms: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_blank_user_agent() {
        let config = EngineConfig {
            user_agent: "  ".to_string(),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
