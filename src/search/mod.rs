//! Keyword extraction and relevance ranking for resource search.
//!
//! Queries are natural language ("APIs for token prices"). Extraction
//! lower-cases, splits on whitespace/hyphens/underscores, drops stop words
//! and one-character tokens, and reduces each remaining word to a base form
//! via the synonym registry or simple suffix stripping. Matching is AND
//! across keywords and OR within a keyword's variant group, all as
//! substring checks against the resource's searchable text.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is",
        "it", "its", "of", "on", "that", "the", "to", "was", "will", "with", "i", "you", "we",
        "they", "what", "where", "when", "why", "how", "can", "could", "should", "would", "may",
        "might", "must", "shall", "this", "these", "those", "do", "does", "did", "have", "had",
        "get", "got", "want", "know", "think", "see", "look", "find", "need", "use", "make",
        "take", "give", "go", "come", "say", "tell", "ask", "show",
    ]
    .into_iter()
    .collect()
});

/// Synonym/variant registry. Every key maps to its group; the first entry of
/// a group is the canonical base form.
static WORD_VARIANTS: LazyLock<HashMap<&'static str, &'static [&'static str]>> =
    LazyLock::new(|| {
        const PRICE: &[&str] = &["price", "pricing", "cost", "costing", "costs", "fee", "fees"];
        const TOKEN: &[&str] = &["token", "tokens", "coin", "coins", "currency", "crypto"];
        const DATA: &[&str] = &["data", "dataset", "information", "info"];
        const WALLET: &[&str] = &["wallet", "wallets", "account", "accounts"];
        const API: &[&str] = &["api", "apis", "endpoint", "endpoints", "service", "services"];
        const ANALYSIS: &[&str] = &["analysis", "analyze", "analyzing", "analytics"];
        const FETCH: &[&str] = &["fetch", "get", "retrieve", "obtain", "download"];

        let mut map: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
        for group in [PRICE, TOKEN, DATA, WALLET, API, ANALYSIS, FETCH] {
            for word in group {
                map.insert(word, group);
            }
        }
        map
    });

/// Reduce a word to its base form: registry group head if known, else
/// plural/suffix stripping with the same length thresholds the matcher uses.
fn base_form(word: &str) -> String {
    let word = word.to_lowercase();

    if let Some(group) = WORD_VARIANTS.get(word.as_str()) {
        return group[0].to_string();
    }

    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{stem}y");
    }
    if word.len() > 3 {
        if let Some(stem) = word.strip_suffix("es") {
            return stem.to_string();
        }
    }
    if word.len() > 2 {
        if let Some(stem) = word.strip_suffix('s') {
            return stem.to_string();
        }
    }
    if word.len() > 4 {
        if let Some(stem) = word.strip_suffix("ing") {
            return stem.to_string();
        }
    }
    if word.len() > 3 {
        if let Some(stem) = word.strip_suffix("ed") {
            return stem.to_string();
        }
    }

    word
}

/// Variant group for a keyword; the keyword itself is always included.
fn word_variants(word: &str) -> Vec<String> {
    let base = base_form(word);

    let mut variants: Vec<String> = WORD_VARIANTS
        .get(base.as_str())
        .or_else(|| WORD_VARIANTS.get(word))
        .map(|group| group.iter().map(|v| v.to_string()).collect())
        .unwrap_or_else(|| vec![base.clone()]);

    if !variants.contains(&base) {
        variants.push(base);
    }
    variants
}

/// Extract base-form keywords from a natural language query.
///
/// Returns one keyword per meaningful query word, deduplicated and in query
/// order. Variant expansion happens at match time, not here, so AND
/// semantics hold across query words rather than across every variant.
pub fn extract_search_keywords(query: &str) -> Vec<String> {
    let normalized = query
        .to_lowercase()
        .replace(['.', ',', ';', ':', '!', '?', '\'', '"'], " ");

    let mut keywords = Vec::new();
    let mut seen = HashSet::new();

    for word in normalized.split(|c: char| c.is_whitespace() || c == '-' || c == '_') {
        if word.len() < 2 || STOP_WORDS.contains(word) {
            continue;
        }
        let base = base_form(word);
        if base.len() < 2 || STOP_WORDS.contains(base.as_str()) {
            continue;
        }
        if seen.insert(base.clone()) {
            keywords.push(base);
        }
    }

    keywords
}

/// AND across keywords, OR within each keyword's variant group.
pub fn matches_search_keywords(text: &str, keywords: &[String]) -> bool {
    if text.is_empty() || keywords.is_empty() {
        return false;
    }

    let text = text.to_lowercase();
    keywords.iter().all(|keyword| {
        word_variants(keyword)
            .iter()
            .any(|variant| text.contains(variant.as_str()))
    })
}

/// Relevance score for a matching text.
///
/// +10 per keyword matched by exact substring, +5 when only a variant
/// matches, +5 when the keyword appears as a path segment, then normalized
/// by the matched/total keyword ratio.
pub fn calculate_relevance_score(text: &str, keywords: &[String]) -> f64 {
    if text.is_empty() || keywords.is_empty() {
        return 0.0;
    }

    let text = text.to_lowercase();
    let mut score = 0.0;
    let mut matched = 0usize;

    for keyword in keywords {
        if text.contains(keyword.as_str()) {
            score += 10.0;
            matched += 1;
        } else if word_variants(keyword)
            .iter()
            .any(|variant| variant != keyword && text.contains(variant.as_str()))
        {
            score += 5.0;
            matched += 1;
        }

        let path_segment = format!("/{keyword}");
        if text.contains(&path_segment) {
            score += 5.0;
        }
    }

    score * (matched as f64 / keywords.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_drops_stop_words_and_short_tokens() {
        let keywords = extract_search_keywords("where can I find a weather API");
        assert_eq!(keywords, vec!["weather".to_string(), "api".to_string()]);
    }

    #[test]
    fn test_extract_base_forms() {
        assert_eq!(extract_search_keywords("currencies"), vec!["currency"]);
        assert_eq!(extract_search_keywords("trading"), vec!["trad"]);
        assert_eq!(extract_search_keywords("tokens"), vec!["token"]);
    }

    #[test]
    fn test_extract_splits_on_hyphen_and_underscore() {
        let keywords = extract_search_keywords("real-time price_feed");
        assert_eq!(keywords, vec!["real", "time", "price", "feed"]);
    }

    #[test]
    fn test_and_semantics_with_variant_expansion() {
        // "api pricing" must match text containing only variants of both.
        let keywords = extract_search_keywords("api pricing");
        assert_eq!(keywords, vec!["api", "price"]);
        assert!(matches_search_keywords("endpoint cost", &keywords));

        // Missing any price variant fails the AND gate.
        assert!(!matches_search_keywords("just an api here", &keywords));
        assert!(!matches_search_keywords("", &keywords));
    }

    #[test]
    fn test_variant_groups_are_symmetric() {
        let keywords = extract_search_keywords("endpoint fees");
        assert!(matches_search_keywords("service pricing tiers", &keywords));
    }

    #[test]
    fn test_exact_match_outscores_variant_match() {
        let keywords = extract_search_keywords("price");
        let exact = calculate_relevance_score("spot price feed", &keywords);
        let variant = calculate_relevance_score("lookup cost table", &keywords);
        assert!(exact > variant);
        assert!(variant > 0.0);
    }

    #[test]
    fn test_path_segment_bonus() {
        let keywords = extract_search_keywords("weather");
        let in_path = calculate_relevance_score("https://api.test/weather/today", &keywords);
        let in_text = calculate_relevance_score("weather reports daily", &keywords);
        assert!(in_path > in_text);
    }

    #[test]
    fn test_score_zero_without_match() {
        let keywords = extract_search_keywords("wallet");
        assert_eq!(calculate_relevance_score("unrelated text", &keywords), 0.0);
    }
}
