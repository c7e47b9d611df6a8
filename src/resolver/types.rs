//! Values produced by the resolver.

use serde::{Deserialize, Serialize};

use crate::cache::Blob;
use crate::store::{Config, Translation};

/// Which lookup a request asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// Translation for a language, with language and domain fallback.
    Language,
    /// The config's own default-language fields, with domain fallback only.
    Default,
}

impl QueryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryMode::Language => "language",
            QueryMode::Default => "default",
        }
    }
}

/// Content served for one `(domain, language)` candidate. This is the value
/// stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigPayload {
    pub config_id: i64,
    pub title: String,
    pub author: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub links: Blob,
    pub permissions: Blob,
}

impl ConfigPayload {
    /// Default-language content of a config.
    pub fn from_config(config: Config) -> Self {
        Self {
            config_id: config.id,
            title: config.title,
            author: config.author,
            description: config.description,
            keywords: config.keywords,
            links: config.links,
            permissions: config.permissions,
        }
    }

    /// Translated text fields over the config's language-independent blobs.
    pub fn translated(config: Config, translation: Translation) -> Self {
        Self {
            config_id: config.id,
            title: translation.title,
            author: translation.author,
            description: translation.description,
            keywords: translation.keywords,
            links: config.links,
            permissions: config.permissions,
        }
    }
}

/// A successful resolution. Rendered as-is on the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionResult {
    /// Canonical form of the requested domain.
    pub domain: String,
    /// Domain whose config was served.
    pub actual_domain: String,
    /// Language served, or `"default"` for the language-agnostic mode.
    pub language: String,
    pub requested_language: Option<String>,
    /// True when `language` differs from `requested_language`.
    pub is_fallback: bool,
    /// True when `actual_domain` differs from `domain`.
    pub is_domain_fallback: bool,
    pub data: ConfigPayload,
}

/// Terminal outcome of a resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(ResolutionResult),
    /// Every candidate was absent.
    NotFound {
        domain: String,
        language: Option<String>,
    },
}

impl Resolution {
    pub fn found(self) -> Option<ResolutionResult> {
        match self {
            Resolution::Found(result) => Some(result),
            Resolution::NotFound { .. } => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}
