//! Rows of the backing store.

use serde::{Deserialize, Serialize};

use crate::cache::Blob;

/// Maps a canonical domain name to a config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    /// Canonical, lowercase name.
    pub name: String,
    pub config_id: i64,
    /// Inactive domains resolve exactly like absent ones.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Default-language content plus the language-independent blobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub links: Blob,
    #[serde(default)]
    pub permissions: Blob,
}

/// Per-language content for a config, unique per `(config_id, language)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub config_id: i64,
    pub language: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}
