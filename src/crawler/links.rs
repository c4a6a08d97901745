//! Outgoing link classification
//!
//! Every href found on a fetched page ends up in exactly one bucket: a crawl
//! target below the base URL, an off-site reference worth recording, or
//! something to ignore.

use crate::config::LinkConfig;
use crate::url::{is_in_scope, matches_host_pattern, CrawlTarget};
use std::collections::HashSet;
use std::fmt;
use url::Url;

const NON_NAVIGATIONAL_SCHEMES: [&str; 4] = ["javascript:", "mailto:", "tel:", "data:"];

/// Why a link was not followed or recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// `javascript:`, `mailto:` and similar, or a non-http(s) result
    NonNavigational,
    /// Empty or not resolvable against the page URL
    Unresolvable,
    /// The resolved URL carries a `#fragment`
    Fragment,
    /// The extension is on the ignore list
    IgnoredExtension(String),
    /// Off-site and not of interest
    OffSite,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreReason::NonNavigational => f.write_str("non-navigational"),
            IgnoreReason::Unresolvable => f.write_str("unresolvable"),
            IgnoreReason::Fragment => f.write_str("fragment"),
            IgnoreReason::IgnoredExtension(ext) => write!(f, "ignored extension {}", ext),
            IgnoreReason::OffSite => f.write_str("off-site"),
        }
    }
}

/// Classification of one href
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkClass {
    InScope(CrawlTarget),
    ExternalOfInterest { url: String, extension: String },
    Ignored(IgnoreReason),
}

/// Sorts hrefs into crawl targets, interesting off-site links and the rest
#[derive(Debug, Clone)]
pub struct LinkClassifier {
    ignored_extensions: HashSet<String>,
    external_hosts: Vec<String>,
    external_extensions: HashSet<String>,
    pseudo_extension_keyword: String,
}

impl LinkClassifier {
    pub fn new(config: &LinkConfig) -> Self {
        let lower = |items: &[String]| -> HashSet<String> {
            items.iter().map(|s| s.to_ascii_lowercase()).collect()
        };

        Self {
            ignored_extensions: lower(&config.ignored_extensions),
            external_hosts: config.external_hosts.clone(),
            external_extensions: lower(&config.external_extensions),
            pseudo_extension_keyword: config.pseudo_extension_keyword.to_ascii_lowercase(),
        }
    }

    /// Classifies `href` found on `current` relative to the crawl `base`
    pub fn classify(&self, href: &str, current: &Url, base: &Url) -> LinkClass {
        let href = href.trim();
        if href.is_empty() {
            return LinkClass::Ignored(IgnoreReason::Unresolvable);
        }

        let lowered = href.to_ascii_lowercase();
        if NON_NAVIGATIONAL_SCHEMES
            .iter()
            .any(|scheme| lowered.starts_with(scheme))
        {
            return LinkClass::Ignored(IgnoreReason::NonNavigational);
        }

        let resolved = match current.join(href) {
            Ok(url) => url,
            Err(_) => return LinkClass::Ignored(IgnoreReason::Unresolvable),
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            return LinkClass::Ignored(IgnoreReason::NonNavigational);
        }

        let segment = last_segment(&resolved);
        let extension = file_extension(&segment);

        if let Some(ext) = &extension {
            if self.ignored_extensions.contains(ext) {
                return LinkClass::Ignored(IgnoreReason::IgnoredExtension(ext.clone()));
            }
        }

        if resolved.fragment().is_some() {
            return LinkClass::Ignored(IgnoreReason::Fragment);
        }

        if is_in_scope(&resolved, base) {
            return match CrawlTarget::from_url(resolved) {
                Ok(target) => LinkClass::InScope(target),
                Err(_) => LinkClass::Ignored(IgnoreReason::Unresolvable),
            };
        }

        let host_allowed = resolved.host_str().is_some_and(|host| {
            self.external_hosts
                .iter()
                .any(|pattern| matches_host_pattern(pattern, host))
        });

        if host_allowed {
            if let Some(extension) = self.interesting_extension(&segment, extension) {
                return LinkClass::ExternalOfInterest {
                    url: resolved.to_string(),
                    extension,
                };
            }
        }

        tracing::trace!("Ignoring off-site link {}", resolved);
        LinkClass::Ignored(IgnoreReason::OffSite)
    }

    fn interesting_extension(&self, segment: &str, extension: Option<String>) -> Option<String> {
        match extension {
            Some(ext) if self.external_extensions.contains(&ext) => Some(ext),
            _ if !self.pseudo_extension_keyword.is_empty()
                && segment
                    .to_ascii_lowercase()
                    .contains(&self.pseudo_extension_keyword) =>
            {
                Some(self.pseudo_extension_keyword.clone())
            }
            _ => None,
        }
    }
}

fn last_segment(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("")
        .to_string()
}

/// Lowercase `.ext` of a path segment
///
/// ```
/// use doc_harvest::crawler::file_extension;
///
/// assert_eq!(file_extension("gpio.C"), Some(".c".to_string()));
/// assert_eq!(file_extension("Kconfig"), None);
/// assert_eq!(file_extension(".hidden"), None);
/// ```
pub fn file_extension(segment: &str) -> Option<String> {
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(format!(".{}", ext.to_ascii_lowercase()))
}
