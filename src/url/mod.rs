//! URL handling module for Doc-Harvest
//!
//! This module provides the normalized [`CrawlTarget`] identity, crawl-scope
//! checks against the base URL, record-id derivation and host pattern
//! matching for the external-link allow-list.

mod matcher;
mod normalize;

use crate::UrlResult;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use url::Url;

// Re-export main functions
pub use matcher::matches_host_pattern;
pub use normalize::{normalize_parsed, normalize_url};

/// A normalized absolute URL scheduled for (or already seen by) the crawl
///
/// Two targets are equal exactly when their normalized strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CrawlTarget(Url);

impl CrawlTarget {
    /// Parses and normalizes a URL string
    pub fn parse(url_str: &str) -> UrlResult<Self> {
        normalize_url(url_str).map(Self)
    }

    /// Normalizes an already parsed URL
    pub fn from_url(url: Url) -> UrlResult<Self> {
        normalize_parsed(url).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Deterministic record id derived from the URL path
    pub fn record_id(&self) -> String {
        record_id_for_path(self.0.path())
    }
}

impl fmt::Display for CrawlTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CrawlTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CrawlTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Maps a URL path to a record id
///
/// Leading and trailing separators are trimmed, then every `/` and `.` becomes
/// `_`. The site root maps to `"homepage"`.
///
/// ```
/// use doc_harvest::url::record_id_for_path;
///
/// assert_eq!(record_id_for_path("/latest/kernel/index.html"), "latest_kernel_index_html");
/// assert_eq!(record_id_for_path("/"), "homepage");
/// ```
pub fn record_id_for_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return "homepage".to_string();
    }

    trimmed.replace(['/', '.'], "_")
}

/// Returns true if `url` lies below the crawl base
///
/// Scope is the base URL's host and effective port plus its path as a prefix.
/// The prefix ends at a segment boundary: a base of `/latest` covers
/// `/latest` and `/latest/...` but not `/latest-old/`.
pub fn is_in_scope(url: &Url, base: &Url) -> bool {
    let same_host = match (url.host_str(), base.host_str()) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    };

    same_host
        && url.port_or_known_default() == base.port_or_known_default()
        && path_in_scope(url.path(), base.path())
}

fn path_in_scope(path: &str, base: &str) -> bool {
    match path.strip_prefix(base) {
        Some(rest) => base.ends_with('/') || rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
