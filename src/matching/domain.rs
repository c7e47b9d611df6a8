//! Domain canonicalization.
//!
//! # Responsibilities
//! - Strip scheme, userinfo, path, query, fragment and port from raw input
//! - Lowercase and IDNA-normalize the host
//! - Derive the root-domain fallback candidate (last two labels)
//!
//! # Design Decisions
//! - Pure string transformation, never fails: malformed input degrades to a
//!   best-effort host string
//! - Host extraction is manual; `url` is only asked to normalize the bare host
//! - Normalization is repeated until the host stops changing, since stripping
//!   trailing dots after the URL parser can expose a host it reads differently
//!   (`1.%2e` becomes `1`, which parses as the IPv4 address `0.0.0.1`)
//! - IP literals never get a root fallback

use std::fmt;
use url::{Host, Url};

/// A canonical domain plus its root-domain fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalDomain {
    /// Lowercase host with scheme, port, path, query and fragment removed.
    pub clean: String,
    /// Last two labels of `clean`. Equal to `clean` when there is nothing
    /// further to fall back to.
    pub root: String,
}

impl CanonicalDomain {
    /// Root domain to try after `clean`, if it differs from it.
    pub fn fallback(&self) -> Option<&str> {
        (self.root != self.clean).then_some(self.root.as_str())
    }

    /// True when the input contained no usable host at all.
    pub fn is_empty(&self) -> bool {
        self.clean.is_empty()
    }
}

impl fmt::Display for CanonicalDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.clean)
    }
}

/// Upper bound on normalization passes. Real hosts settle in two.
const MAX_PASSES: usize = 8;

/// Canonicalize a raw domain or URL string.
///
/// `canonicalize(&canonicalize(d).clean) == canonicalize(d)` for every input.
pub fn canonicalize(input: &str) -> CanonicalDomain {
    let (mut clean, mut is_ip) = canonical_host(input);
    for _ in 0..MAX_PASSES {
        let (next, next_is_ip) = canonical_host(&clean);
        is_ip = next_is_ip;
        if next == clean {
            break;
        }
        clean = next;
    }

    let root = if is_ip { clean.clone() } else { root_of(&clean) };
    CanonicalDomain { clean, root }
}

/// One normalization pass: the host and whether it is an IP literal.
/// Hosts the URL parser rejects are kept as extracted.
fn canonical_host(input: &str) -> (String, bool) {
    let host = extract_host(input).to_lowercase();
    normalize_host(&host).unwrap_or((host, false))
}

/// Peel everything that is not the host off the input.
fn extract_host(input: &str) -> &str {
    let mut rest = input.trim();

    if let Some(end) = scheme_end(rest) {
        rest = &rest[end + 3..];
    }

    let end = rest
        .find(|c| matches!(c, '/' | '?' | '#'))
        .unwrap_or(rest.len());
    rest = &rest[..end];

    if let Some(at) = rest.rfind('@') {
        rest = &rest[at + 1..];
    }

    let host = if rest.starts_with('[') {
        // IPv6 literal: keep the brackets, drop any port after them
        match rest.find(']') {
            Some(close) => &rest[..=close],
            None => rest,
        }
    } else {
        rest.split(':').next().unwrap_or(rest)
    };

    host.trim()
        .trim_end_matches(|c: char| c == '.' || c.is_whitespace())
}

/// Byte offset of `://` when the input starts with a valid URL scheme.
fn scheme_end(input: &str) -> Option<usize> {
    let idx = input.find("://")?;
    let scheme = &input[..idx];
    let mut chars = scheme.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    (first_ok && rest_ok).then_some(idx)
}

/// Normalize a bare host through the URL parser (IDNA, percent-decoding,
/// IP literal detection). Returns the host and whether it is an IP.
fn normalize_host(host: &str) -> Option<(String, bool)> {
    if host.is_empty() {
        return None;
    }
    let url = Url::parse(&format!("http://{host}/")).ok()?;
    match url.host()? {
        Host::Domain(domain) => {
            let domain = domain.trim_end_matches('.');
            (!domain.is_empty()).then(|| (domain.to_string(), false))
        }
        Host::Ipv4(addr) => Some((addr.to_string(), true)),
        Host::Ipv6(addr) => Some((format!("[{addr}]"), true)),
    }
}

fn root_of(clean: &str) -> String {
    let labels: Vec<&str> = clean.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() <= 2 {
        return clean.to_string();
    }
    labels[labels.len() - 2..].join(".")
}
