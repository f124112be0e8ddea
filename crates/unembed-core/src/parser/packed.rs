//! Packed-script decoder
//!
//! Decodes scripts packed with the `eval(function(p,a,c,k,e,d){...}(...))`
//! scheme: a payload whose identifiers were replaced by base-N tokens, plus
//! the symbol table to put them back. Decoding is pure text substitution;
//! nothing is ever executed.

use regex::Regex;

use super::unbase::Unbaser;
use crate::error::{EmbedError, Result};

/// Nested packing deeper than this is left as-is
const MAX_NESTING: usize = 8;

/// The four parameters of a packed call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedScript {
    pub payload: String,
    pub radix: u32,
    pub count: usize,
    pub symbols: Vec<String>,
}

impl PackedScript {
    /// Extract the parameter tuple from a packed block
    ///
    /// # Errors
    /// Returns `Decode` if no accepted signature matches, a number does
    /// not parse, or `count` differs from the symbol-table length
    pub fn parse(source: &str) -> Result<Self> {
        let args = strip_wrapper(source);

        let patterns = [
            (
                args,
                r#"(?s)^["'](.*)["'],\s*(\d+),\s*(\d+),\s*["'](.*?)["']\.split\(["']\|["']\)"#,
            ),
            (
                source,
                r#"(?s)\}\('(.*)',\s*(\d+),\s*(\d+),\s*'(.*?)'\.split\('\|'\)"#,
            ),
            (args, r#"(?s),\s*'(.*?)',\s*(\d+),\s*(\d+),\s*'(.*?)'\.split\("#),
        ];

        for (haystack, pattern) in patterns {
            let Ok(re) = Regex::new(pattern) else {
                continue;
            };
            let Some(caps) = re.captures(haystack) else {
                continue;
            };

            let payload = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let radix = parse_number(caps.get(2).map(|m| m.as_str()), "radix")?;
            let count = parse_number(caps.get(3).map(|m| m.as_str()), "count")?;
            let symbols: Vec<String> = caps
                .get(4)
                .map(|m| m.as_str())
                .unwrap_or_default()
                .split('|')
                .map(str::to_string)
                .collect();

            if count != symbols.len() {
                return Err(EmbedError::Decode(format!(
                    "Malformed symbol table: declared {} symbols, found {}",
                    count,
                    symbols.len()
                )));
            }

            return Ok(Self {
                payload: unescape_payload(payload),
                radix: u32::try_from(radix).map_err(|_| {
                    EmbedError::Decode(format!("Radix out of range: {}", radix))
                })?,
                count,
                symbols,
            });
        }

        Err(EmbedError::Decode(
            "Could not parse packed script arguments".to_string(),
        ))
    }

    /// Substitute every token in the payload with its symbol
    ///
    /// Tokens whose index is out of range, or whose symbol is empty, are
    /// left unchanged.
    pub fn decode(&self) -> Result<String> {
        let unbaser = Unbaser::new(self.radix)?;
        tracing::trace!(
            radix = unbaser.radix(),
            symbols = self.symbols.len(),
            "Decoding packed payload"
        );
        let Ok(token_re) = Regex::new(r"[0-9A-Za-z_]+") else {
            return Err(EmbedError::Decode("Invalid token pattern".to_string()));
        };

        let decoded = token_re.replace_all(&self.payload, |caps: &regex::Captures| {
            let token = &caps[0];
            usize::try_from(unbaser.unbase(token))
                .ok()
                .and_then(|index| self.symbols.get(index))
                .filter(|symbol| !symbol.is_empty())
                .cloned()
                .unwrap_or_else(|| token.to_string())
        });

        Ok(decoded.into_owned())
    }
}

/// Decode a single packed block
///
/// # Errors
/// Returns `Decode` if the parameter signature cannot be located or the
/// symbol table is malformed
pub fn unpack(source: &str) -> Result<String> {
    PackedScript::parse(source)?.decode()
}

/// Decode repeatedly while the output is itself packed
///
/// Text without a packed signature is returned unchanged, so applying
/// this to its own output is a no-op.
pub fn unpack_nested(source: &str) -> Result<String> {
    let mut current = source.to_string();

    for _ in 0..MAX_NESTING {
        let Ok(block) = find_packed_script(&current) else {
            return Ok(current);
        };
        current = unpack(block)?;
    }

    tracing::debug!(depth = MAX_NESTING, "Packed script nesting limit reached");
    Ok(current)
}

/// Whether the text carries a packed-script header
pub fn is_packed(text: &str) -> bool {
    find_header(text).is_some()
}

/// Locate the packed block inside a page
///
/// Prefers the balanced `eval(...)` wrapper around the packer header, then
/// falls back to a `<script>` block that starts with `eval(function(p,a,c,k,e,d`.
///
/// # Errors
/// Returns `SignatureNotFound` if neither form is present
pub fn find_packed_script(page: &str) -> Result<&str> {
    if let Some(header) = find_header(page) {
        let start = page[..header].rfind("eval(").or_else(|| page[..header].rfind('('));
        if let Some(start) = start
            && let Some(end) = find_closing_paren(page, start)
        {
            return Ok(&page[start..=end]);
        }
    }

    if let Ok(re) = Regex::new(
        r"(?s)<script[^>]*>\s*(eval\(function\(p,a,c,k,e,[dr]\).*?)</script>",
    ) && let Some(block) = re.captures(page).and_then(|caps| caps.get(1))
    {
        return Ok(block.as_str());
    }

    Err(EmbedError::SignatureNotFound(
        "No eval(function(p,a,c,k,e,d) block in page".to_string(),
    ))
}

fn find_header(text: &str) -> Option<usize> {
    text.find("function(p,a,c,k,e,d)")
        .or_else(|| text.find("function(p,a,c,k,e,r)"))
}

/// Isolate the argument list of the packer call
fn strip_wrapper(source: &str) -> &str {
    let mut cleaned = source.trim();

    if let Some(inner) = cleaned.strip_prefix("eval(") {
        cleaned = inner.strip_suffix(')').unwrap_or(inner);
    }

    if let Some(pos) = cleaned.find("}(") {
        cleaned = &cleaned[pos + 2..];
        cleaned = cleaned.strip_suffix(')').unwrap_or(cleaned);
    }

    cleaned
}

/// Index of the parenthesis closing the one at `open`, skipping string literals
fn find_closing_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    for (offset, &byte) in text.as_bytes()[open..].iter().enumerate() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == q {
                quote = None;
            }
            continue;
        }

        match byte {
            b'\'' | b'"' => quote = Some(byte),
            b'(' => depth += 1,
            b')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }

    None
}

fn parse_number(text: Option<&str>, field: &str) -> Result<usize> {
    text.unwrap_or_default()
        .parse()
        .map_err(|_| EmbedError::Decode(format!("Invalid {} in packed arguments", field)))
}

/// Undo the string-literal escaping the packer applies to its payload
fn unescape_payload(payload: &str) -> String {
    payload.replace("\\\\", "\\").replace("\\'", "'")
}
