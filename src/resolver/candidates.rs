//! Candidate plans.
//!
//! Language mode tries, stopping at the first hit:
//! ```text
//! 1. (clean, requested)
//! 2. (clean, default)   if requested != default
//! 3. (root,  requested) if root != clean
//! 4. (root,  default)   if both of the above
//! ```
//! Default mode tries `clean`, then `root` if it differs.

use crate::cache::keys;
use crate::matching::CanonicalDomain;

/// One `(domain, language)` pair to look up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// 1-based position in the full four-step order. Skipped steps keep
    /// their number, so tier 4 always means "root domain, default language".
    pub tier: usize,
    pub domain: String,
    /// `None` in default mode.
    pub language: Option<String>,
}

impl Candidate {
    pub fn cache_key(&self) -> String {
        match &self.language {
            Some(language) => keys::language_key(&self.domain, language),
            None => keys::default_key(&self.domain),
        }
    }
}

/// Candidates for a language-aware lookup. Languages must be normalized.
pub fn language_plan(domain: &CanonicalDomain, requested: &str, default: &str) -> Vec<Candidate> {
    let language_fallback = requested != default;
    let root = domain.fallback();

    let steps = [
        (1, Some(domain.clean.as_str()), requested, true),
        (2, Some(domain.clean.as_str()), default, language_fallback),
        (3, root, requested, true),
        (4, root, default, language_fallback),
    ];

    steps
        .into_iter()
        .filter_map(|(tier, host, language, enabled)| {
            let host = host.filter(|_| enabled)?;
            Some(Candidate {
                tier,
                domain: host.to_string(),
                language: Some(language.to_string()),
            })
        })
        .collect()
}

/// Candidates for a language-agnostic lookup.
pub fn default_plan(domain: &CanonicalDomain) -> Vec<Candidate> {
    std::iter::once(domain.clean.as_str())
        .chain(domain.fallback())
        .enumerate()
        .map(|(i, host)| Candidate {
            tier: i + 1,
            domain: host.to_string(),
            language: None,
        })
        .collect()
}
