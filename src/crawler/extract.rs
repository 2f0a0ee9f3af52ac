//! URL extraction from raw text (HTML, markdown, source code).
//!
//! Recall-oriented: false positives are expected and cheap, since every
//! candidate goes through the validator before it enters the endpoint list.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Bare http(s) tokens. The excluded characters match common delimiters so a
/// URL embedded in markup does not swallow the surrounding syntax.
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^\s"<>'{}|\\^`\[\]]+"#).expect("url pattern")
});

/// `key: "http..."`-shaped assignments in code and config snippets.
static ASSIGNMENT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"(?i)api[_-]?url\s*[:=]\s*["']?(https?://[^"'\s]+)"#,
        r#"(?i)endpoint\s*[:=]\s*["']?(https?://[^"'\s]+)"#,
        r#"(?i)base[_-]?url\s*[:=]\s*["']?(https?://[^"'\s]+)"#,
        r#"(?i)resource\s*[:=]\s*["']?(https?://[^"'\s]+)"#,
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("assignment pattern"))
    .collect()
});

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', '}', ']', '>'];

/// Extract plausible API endpoint URLs from a text blob.
///
/// Output is deduplicated and keeps first-seen order.
pub fn extract_urls_from_text(text: &str) -> Vec<String> {
    let mut urls = Vec::new();
    let mut seen = HashSet::new();

    for found in URL_PATTERN.find_iter(text) {
        let url = found.as_str().trim_end_matches(TRAILING_PUNCTUATION);
        if is_likely_api_endpoint(url) && seen.insert(url.to_string()) {
            urls.push(url.to_string());
        }
    }

    for pattern in ASSIGNMENT_PATTERNS.iter() {
        for captures in pattern.captures_iter(text) {
            if let Some(url) = captures.get(1) {
                let url = url.as_str();
                if is_likely_api_endpoint(url) && seen.insert(url.to_string()) {
                    urls.push(url.to_string());
                }
            }
        }
    }

    urls
}

/// Heuristic filter: keep URLs whose host or path hints at an API surface or
/// the x402 protocol. Malformed URLs are dropped here.
fn is_likely_api_endpoint(url: &str) -> bool {
    let Ok(parsed) = url::Url::parse(url) else {
        return false;
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }

    let host = parsed.host_str().unwrap_or_default().to_lowercase();
    let path = parsed.path().to_lowercase();

    host.contains("api.")
        || host.contains("api-")
        || host.contains("x402")
        || path.contains("/api")
        || path.contains("/v1")
        || path.contains("/v2")
        || path.contains("/endpoint")
        || path.contains("/x402")
}
