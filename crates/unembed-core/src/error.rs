//! Error types for embed resolution
//!
//! Every per-item failure degrades to "no media extracted" at the resolver
//! boundary. Only [`EmbedError::InvalidConfig`] is returned from constructors
//! and is meant to stop the caller.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Error type for all embed resolution operations
///
/// Implements Display for human-readable messages and Serialize
/// so failures can be reported inside JSON responses.
#[derive(Error, Debug)]
pub enum EmbedError {
    /// Embed page could not be fetched (network, timeout or non-2xx status)
    #[error("Fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// No packed-script signature was found in the page
    #[error("Packed script signature not found: {0}")]
    SignatureNotFound(String),

    /// Packed-script parameters were located but are malformed
    #[error("Failed to decode packed script: {0}")]
    Decode(String),

    /// Every extraction strategy was exhausted without a usable URL
    #[error("Stream URL not found: {0}")]
    NotFound(String),

    /// Construction-time contract violation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EmbedError {
    /// Whether this failure was caused by the request timing out
    pub fn is_timeout(&self) -> bool {
        matches!(self, EmbedError::Fetch(e) if e.is_timeout())
    }

    /// Short machine-readable reason, stable across message changes
    pub fn reason(&self) -> &'static str {
        match self {
            EmbedError::Fetch(_) => "FetchError",
            EmbedError::SignatureNotFound(_) => "SignatureNotFound",
            EmbedError::Decode(_) => "DecodeError",
            EmbedError::NotFound(_) => "NotFound",
            EmbedError::InvalidConfig(_) => "InvalidConfig",
        }
    }
}

impl Serialize for EmbedError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias for embed resolution operations
pub type Result<T> = std::result::Result<T, EmbedError>;
