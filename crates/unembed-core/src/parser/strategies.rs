//! Stream URL extraction strategies for embed pages
//!
//! Each strategy is an independent heuristic over the raw page text and its
//! parsed DOM. Providers arrange them in ordered lists; the first strategy
//! yielding a normalized absolute URL wins.

use std::fmt;

use regex::Regex;
use scraper::{Html, Selector};

use super::packed::{find_packed_script, is_packed, unpack_nested};

/// Sub-patterns tried in order against decoded packed scripts
const MANIFEST_PATTERNS: [&str; 5] = [
    r#"file:\s*['"]([^'"]*\.m3u8[^'"]*)['"]"#,
    r#"sources:\s*\[\s*\{\s*file:\s*['"]([^'"]*\.m3u8[^'"]*)['"]"#,
    r#"(https?://[^\s'"<>{}]+?\.m3u8[^\s'"<>{}]*)"#,
    r#"['"]([^'"]*\.m3u8[^'"]*)['"]"#,
    r#"([^\s'"<>{}]*\.m3u8[^\s'"<>{}]*)"#,
];

// ---------------------------------------------------------------------------
// Page & strategy types
// ---------------------------------------------------------------------------

/// A fetched embed page: raw text plus its parsed DOM
pub struct EmbedPage<'a> {
    body: &'a str,
    document: Html,
}

impl<'a> EmbedPage<'a> {
    pub fn parse(body: &'a str) -> Self {
        Self {
            body,
            document: Html::parse_document(body),
        }
    }

    pub fn body(&self) -> &str {
        self.body
    }

    pub fn document(&self) -> &Html {
        &self.document
    }
}

/// Signature shared by every extraction heuristic
pub type ExtractFn = fn(&EmbedPage<'_>) -> Option<String>;

/// A named extraction attempt
#[derive(Clone, Copy)]
pub struct Strategy {
    name: &'static str,
    extract: ExtractFn,
}

impl Strategy {
    pub const fn new(name: &'static str, extract: ExtractFn) -> Self {
        Self { name, extract }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run the heuristic and normalize its candidate
    pub fn attempt(&self, page: &EmbedPage<'_>) -> Option<String> {
        let url = (self.extract)(page).and_then(|candidate| normalize_candidate(&candidate));
        match &url {
            Some(url) => tracing::debug!(strategy = self.name, %url, "Strategy matched"),
            None => tracing::trace!(strategy = self.name, "Strategy missed"),
        }
        url
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Strategy").field(&self.name).finish()
    }
}

/// Evaluate strategies in order, stopping at the first success
///
/// # Returns
/// The winning strategy's name and its normalized URL, or `None` once
/// every strategy has been tried.
pub fn run_strategies(
    strategies: &[Strategy],
    page: &EmbedPage<'_>,
) -> Option<(&'static str, String)> {
    strategies
        .iter()
        .find_map(|strategy| strategy.attempt(page).map(|url| (strategy.name, url)))
}

// ---------------------------------------------------------------------------
// Candidate normalization
// ---------------------------------------------------------------------------

/// Normalizes a raw URL candidate
///
/// Trims, decodes HTML entities and JSON-escaped slashes, cuts at the first
/// whitespace, quote or tag bracket, and rejects anything without an
/// explicit `http(s)://` scheme.
pub fn normalize_candidate(raw: &str) -> Option<String> {
    let decoded = decode_html_entities(raw.trim()).replace("\\/", "/");
    let cut = decoded
        .split(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '<' | '>'))
        .next()
        .unwrap_or_default();

    let rest = cut
        .strip_prefix("https://")
        .or_else(|| cut.strip_prefix("http://"))?;
    if rest.is_empty() {
        return None;
    }

    Some(cut.to_string())
}

/// Decodes common HTML entities in URLs
fn decode_html_entities(url: &str) -> String {
    url.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

// ---------------------------------------------------------------------------
// Structured attributes
// ---------------------------------------------------------------------------

/// `#video_player[data-hash]` holding a manifest URL
pub fn video_player_data_hash(page: &EmbedPage<'_>) -> Option<String> {
    let selector = Selector::parse("#video_player[data-hash]").ok()?;

    page.document()
        .select(&selector)
        .filter_map(|element| element.value().attr("data-hash"))
        .find(|hash| hash.contains(".m3u8"))
        .map(str::to_string)
}

/// Player element whose `data-setup` / `data-url` carries the sources
///
/// The attribute is read as JSON (`{"sources":[{"file":...}]}`); a bare
/// manifest URL in the attribute is accepted too.
pub fn player_data_setup(page: &EmbedPage<'_>) -> Option<String> {
    let selector = Selector::parse("#vplayer, [data-setup], .jwplayer, .video-player").ok()?;
    let element = page.document().select(&selector).next()?;
    let setup = element
        .value()
        .attr("data-setup")
        .or_else(|| element.value().attr("data-url"))?;

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(setup) {
        return value
            .get("sources")?
            .as_array()?
            .iter()
            .filter_map(|source| source.get("file")?.as_str())
            .find(|file| file.contains(".m3u8"))
            .map(str::to_string);
    }

    setup.contains(".m3u8").then(|| setup.to_string())
}

// ---------------------------------------------------------------------------
// Inline script assignments
// ---------------------------------------------------------------------------

/// `var urlPlay = '...m3u8...'`
pub fn url_play_variable(page: &EmbedPage<'_>) -> Option<String> {
    first_capture(
        page.body(),
        r#"var urlPlay\s*=\s*['"]([^'"]+\.m3u8[^'"]*)['"]"#,
    )
}

/// `jwplayer("id").setup({ ... sources: [{ file: '...m3u8...'`
pub fn jwplayer_setup_call(page: &EmbedPage<'_>) -> Option<String> {
    first_capture(
        page.body(),
        r#"jwplayer\(['"][\w-]+['"]\)\.setup\(\{[\s\S]*?sources:\s*\[\s*\{\s*file:\s*['"]([^'"]+\.m3u8[^'"]*)['"]"#,
    )
}

// ---------------------------------------------------------------------------
// Packed scripts
// ---------------------------------------------------------------------------

/// Locate a packed block, decode it and scan the result for a manifest URL
pub fn packed_script(page: &EmbedPage<'_>) -> Option<String> {
    if !is_packed(page.body()) {
        return None;
    }

    let block = match find_packed_script(page.body()) {
        Ok(block) => block,
        Err(e) => {
            tracing::trace!(error = %e, "No packed script");
            return None;
        }
    };

    let unpacked = match unpack_nested(block) {
        Ok(unpacked) => unpacked,
        Err(e) => {
            tracing::debug!(error = %e, "Packed script could not be decoded");
            return None;
        }
    };

    if !unpacked.contains("m3u8") {
        tracing::debug!("Decoded packed script mentions no manifest");
        return None;
    }

    first_manifest_in(&unpacked)
}

/// First normalizable manifest URL found by the sub-patterns, in order
pub fn first_manifest_in(script: &str) -> Option<String> {
    MANIFEST_PATTERNS.iter().find_map(|pattern| {
        let re = Regex::new(pattern).ok()?;
        re.captures_iter(script)
            .filter_map(|caps| caps.get(1))
            .find_map(|m| normalize_candidate(m.as_str()))
    })
}

// ---------------------------------------------------------------------------
// Player configuration fields
// ---------------------------------------------------------------------------

/// `sources: [{ file: '<url>'` in a JWPlayer-style config
pub fn jwplayer_sources_file(page: &EmbedPage<'_>) -> Option<String> {
    first_capture(
        page.body(),
        r#"sources:\s*\[\s*\{\s*file:\s*['"]([^'"]+)['"]"#,
    )
}

/// Any `file: '...m3u8...'` field
pub fn player_file_field(page: &EmbedPage<'_>) -> Option<String> {
    first_capture(page.body(), r#"file:\s*['"]([^'"]*\.m3u8[^'"]*)['"]"#)
}

// ---------------------------------------------------------------------------
// Generic scans
// ---------------------------------------------------------------------------

/// Any absolute manifest URL in the raw page text
pub fn generic_manifest_scan(page: &EmbedPage<'_>) -> Option<String> {
    first_valid_match(page.body(), r#"https?://[^\s'"<>]+\.m3u8[^\s'"<>]*"#)
}

/// Absolute manifest URL restricted to plain URL characters before `.m3u8`
pub fn strict_manifest_scan(page: &EmbedPage<'_>) -> Option<String> {
    first_valid_match(
        page.body(),
        r#"https?://[a-zA-Z0-9:/.\-_?=&%~]+\.m3u8[^\s'"<]*"#,
    )
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn first_capture(text: &str, pattern: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    re.captures(text)?.get(1).map(|m| m.as_str().to_string())
}

fn first_valid_match(text: &str, pattern: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    re.find_iter(text)
        .find_map(|m| normalize_candidate(m.as_str()))
}
