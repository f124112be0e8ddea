//! Supported embed hosts and their extraction chains
//!
//! A [`Provider`] is picked from a descriptor's hint or its URL, and owns
//! the ordered strategy list used on that host's pages.

use std::fmt;

use serde::Serialize;

use crate::error::{EmbedError, Result};
use crate::parser::strategies::{
    EmbedPage, Strategy, generic_manifest_scan, jwplayer_setup_call, jwplayer_sources_file,
    packed_script, player_data_setup, player_file_field, run_strategies, strict_manifest_scan,
    url_play_variable, video_player_data_hash,
};
use crate::types::EmbedDescriptor;

const TURBOVID_STRATEGIES: &[Strategy] = &[
    Strategy::new("data-hash attribute", video_player_data_hash),
    Strategy::new("urlPlay variable", url_play_variable),
    Strategy::new("packed script", packed_script),
    Strategy::new("sources file", jwplayer_sources_file),
    Strategy::new("generic scan", generic_manifest_scan),
];

const HICHERRI_STRATEGIES: &[Strategy] = &[
    Strategy::new("data-setup attribute", player_data_setup),
    Strategy::new("jwplayer setup", jwplayer_setup_call),
    Strategy::new("packed script", packed_script),
    Strategy::new("file field", player_file_field),
    Strategy::new("strict scan", strict_manifest_scan),
];

/// Embed host family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Provider {
    TurboVid,
    HiCherri,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::TurboVid, Provider::HiCherri];

    /// Name used as the `type` of enhanced servers
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::TurboVid => "TurboVid",
            Provider::HiCherri => "HiCherri",
        }
    }

    /// Host substrings routed to this provider
    pub fn hosts(&self) -> &'static [&'static str] {
        match self {
            Provider::TurboVid => &["turbovidhls.com", "turboviplay.com", "turbovid.com"],
            Provider::HiCherri => &["hicherri.com"],
        }
    }

    /// Ordered extraction chain; the first success wins
    pub fn strategies(&self) -> &'static [Strategy] {
        match self {
            Provider::TurboVid => TURBOVID_STRATEGIES,
            Provider::HiCherri => HICHERRI_STRATEGIES,
        }
    }

    /// Detect the provider from an embed URL by host substring
    pub fn detect(url: &str) -> Option<Self> {
        let url = url.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|provider| provider.hosts().iter().any(|host| url.contains(host)))
    }

    /// Match a hint by provider name or by one of its hosts
    pub fn from_hint(hint: &str) -> Option<Self> {
        let hint = hint.trim().to_ascii_lowercase();
        if hint.is_empty() {
            return None;
        }

        Self::ALL
            .into_iter()
            .find(|provider| provider.display_name().to_ascii_lowercase() == hint)
            .or_else(|| Self::detect(&hint))
    }

    /// Hint first, then URL detection
    pub fn for_descriptor(descriptor: &EmbedDescriptor) -> Option<Self> {
        descriptor
            .provider_hint
            .as_deref()
            .and_then(Self::from_hint)
            .or_else(|| Self::detect(&descriptor.url))
    }

    /// Run this provider's chain over a fetched page body
    ///
    /// # Errors
    /// Returns `NotFound` once every strategy has been tried
    pub fn extract_stream_url(&self, body: &str) -> Result<String> {
        let page = EmbedPage::parse(body);

        match run_strategies(self.strategies(), &page) {
            Some((strategy, url)) => {
                tracing::debug!(provider = %self, strategy, %url, "Stream URL extracted");
                Ok(url)
            }
            None => Err(EmbedError::NotFound(format!(
                "{} strategies exhausted",
                self.display_name()
            ))),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_host() {
        assert_eq!(
            Provider::detect("https://turbovidhls.com/t/abc"),
            Some(Provider::TurboVid)
        );
        assert_eq!(
            Provider::detect("https://www.Turboviplay.com/e/x"),
            Some(Provider::TurboVid)
        );
        assert_eq!(
            Provider::detect("https://hicherri.com/e/xyz"),
            Some(Provider::HiCherri)
        );
        assert_eq!(Provider::detect("https://example.com/embed/1"), None);
    }

    #[test]
    fn test_from_hint() {
        assert_eq!(Provider::from_hint("TurboVid"), Some(Provider::TurboVid));
        assert_eq!(Provider::from_hint(" hicherri "), Some(Provider::HiCherri));
        assert_eq!(Provider::from_hint("hicherri.com"), Some(Provider::HiCherri));
        assert_eq!(Provider::from_hint("streamtape"), None);
        assert_eq!(Provider::from_hint(""), None);
    }

    #[test]
    fn test_hint_overrides_url() {
        let descriptor =
            EmbedDescriptor::new("https://turbovidhls.com/t/abc").with_provider_hint("hicherri");
        assert_eq!(
            Provider::for_descriptor(&descriptor),
            Some(Provider::HiCherri)
        );

        let descriptor =
            EmbedDescriptor::new("https://turbovidhls.com/t/abc").with_provider_hint("unknown");
        assert_eq!(
            Provider::for_descriptor(&descriptor),
            Some(Provider::TurboVid)
        );
    }

    #[test]
    fn test_strategy_order() {
        let names: Vec<_> = Provider::TurboVid
            .strategies()
            .iter()
            .map(Strategy::name)
            .collect();
        assert_eq!(
            names,
            [
                "data-hash attribute",
                "urlPlay variable",
                "packed script",
                "sources file",
                "generic scan"
            ]
        );

        let names: Vec<_> = Provider::HiCherri
            .strategies()
            .iter()
            .map(Strategy::name)
            .collect();
        assert_eq!(
            names,
            [
                "data-setup attribute",
                "jwplayer setup",
                "packed script",
                "file field",
                "strict scan"
            ]
        );
    }

    #[test]
    fn test_hicherri_attribute_beats_jwplayer_call() {
        let body = r#"<html><body>
        <div id="vplayer" data-setup='{"sources":[{"file":"https://a.example/attr.m3u8"}]}'></div>
        <script>jwplayer("vplayer").setup({sources:[{file:"https://b.example/call.m3u8"}]})</script>
        </body></html>"#;

        assert_eq!(
            Provider::HiCherri.extract_stream_url(body).unwrap(),
            "https://a.example/attr.m3u8"
        );

        // Without the attribute the inline call is used
        let body = body.replace("data-setup=", "data-other=");
        assert_eq!(
            Provider::HiCherri.extract_stream_url(&body).unwrap(),
            "https://b.example/call.m3u8"
        );
    }

    #[test]
    fn test_attribute_beats_packed_script() {
        let body = r#"<html><body>
        <div id="video_player" data-hash="https://a.example/attr.m3u8"></div>
        <script>eval(function(p,a,c,k,e,d){return p}('0 1=\'2://3.4/5.6\';',10,7,'var|src|https|cdn|example|packed|m3u8'.split('|'),0,{}))</script>
        </body></html>"#;

        assert_eq!(
            Provider::TurboVid.extract_stream_url(body).unwrap(),
            "https://a.example/attr.m3u8"
        );

        // Without the attribute the packed script is used
        let body = body.replace("data-hash=", "data-other=");
        assert_eq!(
            Provider::TurboVid.extract_stream_url(&body).unwrap(),
            "https://cdn.example/packed.m3u8"
        );
    }

    #[test]
    fn test_hicherri_jwplayer_page() {
        let body = r#"<script>jwplayer("x").setup({sources:[{file:"https://cdn/test.m3u8"}]})</script>"#;
        assert_eq!(
            Provider::HiCherri.extract_stream_url(body).unwrap(),
            "https://cdn/test.m3u8"
        );
    }

    #[test]
    fn test_exhausted_is_not_found() {
        let result = Provider::HiCherri.extract_stream_url("<html><body>Video removed</body></html>");
        match result {
            Err(EmbedError::NotFound(msg)) => assert!(msg.contains("HiCherri")),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }
}
