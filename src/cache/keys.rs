//! Cache key grammar.
//!
//! ```text
//! config:{domain}:lang:{language}   language-aware lookups
//! domain:config:{domain}            language-agnostic lookups
//! ```
//!
//! Patterns escape the domain so that glob metacharacters in it (IPv6
//! brackets, stray `*` from malformed input) match literally.

use glob::Pattern;

pub const LANGUAGE_PREFIX: &str = "config:";
pub const DEFAULT_PREFIX: &str = "domain:config:";

/// Key for a `(domain, language)` candidate.
pub fn language_key(domain: &str, language: &str) -> String {
    format!("{LANGUAGE_PREFIX}{domain}:lang:{language}")
}

/// Key for a domain's default-language config.
pub fn default_key(domain: &str) -> String {
    format!("{DEFAULT_PREFIX}{domain}")
}

/// Pattern matching every language variant cached for a domain.
pub fn language_pattern(domain: &str) -> String {
    format!("{LANGUAGE_PREFIX}{}:lang:*", Pattern::escape(domain))
}

/// Patterns covering every key this service writes.
pub fn all_patterns() -> [String; 2] {
    [format!("{LANGUAGE_PREFIX}*"), format!("{DEFAULT_PREFIX}*")]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_shapes() {
        assert_eq!(language_key("www.example.com", "en-us"), "config:www.example.com:lang:en-us");
        assert_eq!(default_key("example.com"), "domain:config:example.com");
        assert_eq!(language_pattern("example.com"), "config:example.com:lang:*");
    }

    #[test]
    fn test_pattern_escapes_domain() {
        let pattern = Pattern::new(&language_pattern("[::1]")).unwrap();
        assert!(pattern.matches(&language_key("[::1]", "en-us")));
        assert!(!pattern.matches(&language_key(":", "en-us")));
    }

    #[test]
    fn test_pattern_does_not_cross_domains() {
        let pattern = Pattern::new(&language_pattern("example.com")).unwrap();
        assert!(pattern.matches(&language_key("example.com", "ja-jp")));
        assert!(!pattern.matches(&language_key("www.example.com", "ja-jp")));
        assert!(!pattern.matches(&default_key("example.com")));
    }
}
