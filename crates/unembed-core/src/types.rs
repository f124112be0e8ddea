//! Core data types for embed resolution
//!
//! Descriptors come in from the scraping layer, enhanced servers go out to
//! the API layer. Field names serialize in camelCase to match that layer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reference to a third-party player page, not yet resolved
///
/// Identity is the position in the originating list; the enhancer keeps
/// output order equal to input order. Fields this crate does not know are
/// kept in `extra`, and the URL is written back under the key it was read
/// from, so an unresolved descriptor serializes exactly like its input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDescriptor", into = "RawDescriptor")]
pub struct EmbedDescriptor {
    /// Display label from the source page (e.g., "Server 1")
    pub server: Option<String>,

    /// Embed/iframe URL
    pub url: String,

    /// Optional provider name or host overriding URL detection
    pub provider_hint: Option<String>,

    /// Unrecognized fields, passed through untouched
    pub extra: Map<String, Value>,

    url_key: UrlKey,
}

/// Key the embed URL is serialized under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum UrlKey {
    #[default]
    Url,
    Embed,
}

/// Wire shape of [`EmbedDescriptor`]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    embed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    provider_hint: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<RawDescriptor> for EmbedDescriptor {
    type Error = String;

    fn try_from(raw: RawDescriptor) -> std::result::Result<Self, Self::Error> {
        let mut extra = raw.extra;
        let (url, url_key) = match (raw.url, raw.embed) {
            (Some(url), embed) => {
                // Both keys present: `url` wins, `embed` is kept verbatim
                if let Some(embed) = embed {
                    extra.insert("embed".to_string(), Value::String(embed));
                }
                (url, UrlKey::Url)
            }
            (None, Some(embed)) => (embed, UrlKey::Embed),
            (None, None) => return Err("missing field `url` or `embed`".to_string()),
        };

        Ok(Self {
            server: raw.server,
            url,
            provider_hint: raw.provider_hint,
            extra,
            url_key,
        })
    }
}

impl From<EmbedDescriptor> for RawDescriptor {
    fn from(descriptor: EmbedDescriptor) -> Self {
        let (url, embed) = match descriptor.url_key {
            UrlKey::Url => (Some(descriptor.url), None),
            UrlKey::Embed => (None, Some(descriptor.url)),
        };

        Self {
            server: descriptor.server,
            url,
            embed,
            provider_hint: descriptor.provider_hint,
            extra: descriptor.extra,
        }
    }
}

impl EmbedDescriptor {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            server: None,
            url: url.into(),
            provider_hint: None,
            extra: Map::new(),
            url_key: UrlKey::Url,
        }
    }

    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    pub fn with_provider_hint(mut self, hint: impl Into<String>) -> Self {
        self.provider_hint = Some(hint.into());
        self
    }
}

/// A direct, playable stream recovered from an embed page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSource {
    /// Always "default"; hosts expose a single rendition
    pub quality: String,

    /// Absolute stream URL with explicit scheme
    pub url: String,

    /// True when the URL path ends in `.m3u8`
    #[serde(rename = "isHLS")]
    pub is_hls: bool,
}

impl ResolvedSource {
    /// Wraps a normalized stream URL, tagging HLS by extension suffix
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let is_hls = is_hls_url(&url);
        Self {
            quality: "default".to_string(),
            url,
            is_hls,
        }
    }
}

/// Fields added to a descriptor after a successful resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedMedia {
    /// Direct stream URL (same as `sources[0].url`)
    pub media: String,
    pub sources: Vec<ResolvedSource>,
    /// Provider display name (e.g., "TurboVid")
    #[serde(rename = "type")]
    pub kind: String,
    pub quality: String,
    pub is_extracted: bool,
}

/// Descriptor as returned to the API layer
///
/// Unresolved entries serialize exactly like the input descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnhancedServer {
    #[serde(flatten)]
    pub descriptor: EmbedDescriptor,

    #[serde(flatten)]
    pub extracted: Option<ExtractedMedia>,
}

impl EnhancedServer {
    pub fn unresolved(descriptor: EmbedDescriptor) -> Self {
        Self {
            descriptor,
            extracted: None,
        }
    }

    pub fn is_extracted(&self) -> bool {
        self.extracted.is_some()
    }

    /// Direct media URL, if resolution succeeded
    pub fn media(&self) -> Option<&str> {
        self.extracted.as_ref().map(|e| e.media.as_str())
    }
}

/// Suffix match on the URL path, ignoring query and fragment
pub(crate) fn is_hls_url(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.to_ascii_lowercase().ends_with(".m3u8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_source_from_url() {
        let source = ResolvedSource::from_url("https://cdn/test.m3u8");
        assert_eq!(source.quality, "default");
        assert_eq!(source.url, "https://cdn/test.m3u8");
        assert!(source.is_hls);
    }

    #[test]
    fn test_is_hls_ignores_query() {
        assert!(is_hls_url("https://cdn.example/hls/master.m3u8?t=abc&s=1"));
        assert!(is_hls_url("https://cdn.example/hls/MASTER.M3U8#frag"));
        assert!(!is_hls_url("https://cdn.example/video.mp4?f=x.m3u8"));
    }

    #[test]
    fn test_resolved_source_serialization() {
        let source = ResolvedSource::from_url("https://cdn/video.mp4");
        let json = serde_json::to_value(&source).expect("Serialization should succeed");
        assert_eq!(
            json,
            serde_json::json!({"quality": "default", "url": "https://cdn/video.mp4", "isHLS": false})
        );
    }

    #[test]
    fn test_descriptor_accepts_embed_alias() {
        let descriptor: EmbedDescriptor =
            serde_json::from_str(r#"{"server": "Server 1", "embed": "https://hicherri.com/e/x"}"#)
                .expect("Deserialization should succeed");
        assert_eq!(descriptor.url, "https://hicherri.com/e/x");
        assert_eq!(descriptor.server.as_deref(), Some("Server 1"));
        assert_eq!(descriptor.provider_hint, None);
    }

    #[test]
    fn test_descriptor_round_trip_keeps_input_shape() {
        let input = serde_json::json!({
            "server": "Server 1",
            "embed": "https://example.org/e/1",
            "title": "x",
            "meta": {"lang": "en"}
        });

        let descriptor: EmbedDescriptor = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(descriptor.url, "https://example.org/e/1");
        assert_eq!(descriptor.extra["title"], "x");

        let server = EnhancedServer::unresolved(descriptor);
        assert_eq!(serde_json::to_value(&server).unwrap(), input);
    }

    #[test]
    fn test_descriptor_with_url_and_embed_keys() {
        let input = serde_json::json!({
            "url": "https://a.example/e/1",
            "embed": "https://b.example/e/1",
            "providerHint": "turbovid"
        });

        let descriptor: EmbedDescriptor = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(descriptor.url, "https://a.example/e/1");
        assert_eq!(serde_json::to_value(&descriptor).unwrap(), input);
    }

    #[test]
    fn test_descriptor_requires_url() {
        let result = serde_json::from_str::<EmbedDescriptor>(r#"{"server": "Server 1"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_extracted_server_keeps_embed_key() {
        let input = r#"{"server": "Server 1", "embed": "https://hicherri.com/e/x", "title": "x"}"#;
        let descriptor: EmbedDescriptor = serde_json::from_str(input).unwrap();
        let source = ResolvedSource::from_url("https://cdn/test.m3u8");
        let server = EnhancedServer {
            descriptor,
            extracted: Some(ExtractedMedia {
                media: source.url.clone(),
                sources: vec![source],
                kind: "HiCherri".to_string(),
                quality: "HD".to_string(),
                is_extracted: true,
            }),
        };

        let json = serde_json::to_value(&server).unwrap();
        assert_eq!(json["embed"], "https://hicherri.com/e/x");
        assert_eq!(json["title"], "x");
        assert!(json.get("url").is_none());
        assert_eq!(json["media"], "https://cdn/test.m3u8");
    }

    #[test]
    fn test_unresolved_server_serializes_like_descriptor() {
        let descriptor = EmbedDescriptor::new("https://example.com/e/1").with_server("Server 2");
        let server = EnhancedServer::unresolved(descriptor.clone());

        assert_eq!(
            serde_json::to_value(&server).unwrap(),
            serde_json::to_value(&descriptor).unwrap()
        );
        assert!(!server.is_extracted());
        assert_eq!(server.media(), None);
    }

    #[test]
    fn test_extracted_server_serialization() {
        let source = ResolvedSource::from_url("https://cdn/test.m3u8");
        let server = EnhancedServer {
            descriptor: EmbedDescriptor::new("https://turbovidhls.com/t/abc"),
            extracted: Some(ExtractedMedia {
                media: source.url.clone(),
                sources: vec![source],
                kind: "TurboVid".to_string(),
                quality: "HD".to_string(),
                is_extracted: true,
            }),
        };

        let json = serde_json::to_value(&server).unwrap();
        assert_eq!(json["url"], "https://turbovidhls.com/t/abc");
        assert_eq!(json["media"], "https://cdn/test.m3u8");
        assert_eq!(json["type"], "TurboVid");
        assert_eq!(json["quality"], "HD");
        assert_eq!(json["isExtracted"], true);
        assert_eq!(json["sources"][0]["isHLS"], true);
    }
}
