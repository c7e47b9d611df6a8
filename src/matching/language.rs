//! Language negotiation.
//!
//! # Responsibilities
//! - Normalize language codes (`zh_CN` → `zh-cn`)
//! - Parse `Accept-Language` with quality weights
//! - Pick the best supported language, falling back to the default
//!
//! # Design Decisions
//! - An explicit query parameter beats the header, but only if supported
//! - Ties in quality keep header order (stable sort)
//! - Unparsable `q` values count as 1.0; `q=0` and `*` are skipped
//! - Never fails: the worst case is the configured default

use std::collections::HashSet;

/// Normalize a language code: trimmed, lowercase, underscores as hyphens.
///
/// Idempotent: normalizing a normalized code returns it unchanged.
pub fn normalize(code: &str) -> String {
    code.trim().to_ascii_lowercase().replace('_', "-")
}

/// One entry of an `Accept-Language` header.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageRange {
    pub code: String,
    pub quality: f32,
}

/// Parse an `Accept-Language` header, sorted by quality descending.
///
/// Entries with equal quality keep their original relative order.
pub fn parse_accept_language(header: &str) -> Vec<LanguageRange> {
    let mut ranges: Vec<LanguageRange> = header
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let code = normalize(parts.next()?);
            if code.is_empty() || code == "*" {
                return None;
            }

            let quality = parts
                .filter_map(|p| {
                    let (name, value) = p.split_once('=')?;
                    (name.trim().eq_ignore_ascii_case("q")).then(|| value.trim())
                })
                .last()
                .map(parse_quality)
                .unwrap_or(1.0);

            (quality > 0.0).then_some(LanguageRange { code, quality })
        })
        .collect();

    ranges.sort_by(|a, b| b.quality.total_cmp(&a.quality));
    ranges
}

fn parse_quality(raw: &str) -> f32 {
    match raw.parse::<f32>() {
        Ok(q) if q.is_finite() => q,
        _ => 1.0,
    }
}

/// Negotiates the response language against a fixed supported set.
#[derive(Debug, Clone)]
pub struct LanguageNegotiator {
    supported: HashSet<String>,
    default: String,
}

impl LanguageNegotiator {
    /// Create a negotiator. Codes are normalized on the way in.
    pub fn new<I, S>(supported: I, default: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let default = normalize(default);
        let mut supported: HashSet<String> =
            supported.into_iter().map(|s| normalize(s.as_ref())).collect();
        supported.insert(default.clone());
        Self { supported, default }
    }

    /// The normalized default language.
    pub fn default_language(&self) -> &str {
        &self.default
    }

    /// True if the (normalized) code is supported.
    pub fn is_supported(&self, code: &str) -> bool {
        self.supported.contains(&normalize(code))
    }

    /// Ordered, deduplicated list of supported candidates from the explicit
    /// parameter and the header. Does not include the default unless asked for.
    pub fn candidates(&self, explicit: Option<&str>, accept_header: Option<&str>) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();

        let explicit = explicit.map(normalize).filter(|c| !c.is_empty());
        let from_header = accept_header
            .map(parse_accept_language)
            .unwrap_or_default()
            .into_iter()
            .map(|r| r.code);

        for code in explicit.into_iter().chain(from_header) {
            if self.supported.contains(&code) && !out.contains(&code) {
                out.push(code);
            }
        }
        out
    }

    /// Resolve the language to serve.
    pub fn resolve(&self, explicit: Option<&str>, accept_header: Option<&str>) -> String {
        self.candidates(explicit, accept_header)
            .into_iter()
            .next()
            .unwrap_or_else(|| self.default.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn negotiator(supported: &[&str]) -> LanguageNegotiator {
        LanguageNegotiator::new(supported.iter().copied(), "zh-CN")
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("zh_CN"), "zh-cn");
        assert_eq!(normalize(" EN-us "), "en-us");
        let once = normalize("Ja_JP");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_explicit_param_wins_when_supported() {
        let n = negotiator(&["en-US", "ja-JP"]);
        assert_eq!(n.resolve(Some("ja_jp"), Some("en-US")), "ja-jp");
    }

    #[test]
    fn test_unsupported_param_falls_through_to_header() {
        let n = negotiator(&["en-US", "ja-JP"]);
        assert_eq!(n.resolve(Some("fr-FR"), Some("ja-JP,en-US;q=0.5")), "ja-jp");
    }

    #[test]
    fn test_quality_ordering() {
        let n = LanguageNegotiator::new(["en", "fr", "de"], "en");
        assert_eq!(n.resolve(None, Some("en;q=0.5,fr;q=0.9,de")), "de");

        let n = LanguageNegotiator::new(["en", "fr"], "en");
        assert_eq!(n.resolve(None, Some("en;q=0.5,fr;q=0.9,de")), "fr");
    }

    #[test]
    fn test_ties_keep_header_order() {
        let ranges = parse_accept_language("fr;q=0.8, de;q=0.8, en;q=0.8");
        let codes: Vec<_> = ranges.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["fr", "de", "en"]);
    }

    #[test]
    fn test_malformed_quality_counts_as_one() {
        let ranges = parse_accept_language("fr;q=0.9, de;q=NaN, en;q=abc");
        let codes: Vec<_> = ranges.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["de", "en", "fr"]);
        assert_eq!(ranges[0].quality, 1.0);
    }

    #[test]
    fn test_zero_quality_and_wildcard_skipped() {
        let ranges = parse_accept_language("*, en;q=0, fr");
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].code, "fr");
    }

    #[test]
    fn test_defaults_when_nothing_matches() {
        let n = negotiator(&["en-US"]);
        assert_eq!(n.resolve(None, None), "zh-cn");
        assert_eq!(n.resolve(Some(""), Some(",,;q=")), "zh-cn");
        assert_eq!(n.resolve(Some("xx"), Some("yy, zz;q=0.1")), "zh-cn");
    }

    #[test]
    fn test_candidates_deduplicated() {
        let n = negotiator(&["en-US", "ja-JP"]);
        let c = n.candidates(Some("en_us"), Some("en-US, ja-JP;q=0.4, en-us;q=0.2"));
        assert_eq!(c, vec!["en-us".to_string(), "ja-jp".to_string()]);
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let n = negotiator(&["en-US", "ja-JP", "th-TH"]);
        let header = Some("th;q=0.3, ja-JP;q=0.7, en-US;q=0.7");
        let first = n.resolve(Some("fr"), header);
        for _ in 0..10 {
            assert_eq!(n.resolve(Some("fr"), header), first);
        }
        assert_eq!(first, "ja-jp");
    }
}
