//! Record types persisted in the ledger streams

use crate::url::CrawlTarget;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One extracted documentation page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: String,
    pub url: String,
    pub title: String,
    pub content: String,
    /// Project tag of the crawl that produced the record
    pub source: String,
    pub timestamp: DateTime<Utc>,
}

impl PageRecord {
    pub fn new(target: &CrawlTarget, title: String, content: String, source: &str) -> Self {
        Self {
            id: target.record_id(),
            url: target.as_str().to_string(),
            title,
            content,
            source: source.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// A URL the crawl gave up on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnreachableRecord {
    pub url: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub reason: String,
}

impl UnreachableRecord {
    pub fn new(target: &CrawlTarget, reason: impl Into<String>) -> Self {
        Self {
            url: target.as_str().to_string(),
            timestamp: Utc::now(),
            reason: reason.into(),
        }
    }
}

/// A URL whose page was fetched but yielded no usable content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnextractableRecord {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
}

impl UnextractableRecord {
    pub fn new(target: &CrawlTarget, reason: impl Into<String>) -> Self {
        Self {
            url: target.as_str().to_string(),
            timestamp: Utc::now(),
            reason: reason.into(),
        }
    }
}

/// An off-site link judged worth keeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalLinkRecord {
    pub url: String,
    pub source_page: String,
    pub timestamp_collected: DateTime<Utc>,
    pub file_extension: String,
}

impl ExternalLinkRecord {
    pub fn new(url: &str, source_page: &CrawlTarget, file_extension: &str) -> Self {
        Self {
            url: url.to_string(),
            source_page: source_page.as_str().to_string(),
            timestamp_collected: Utc::now(),
            file_extension: file_extension.to_string(),
        }
    }
}

/// Minimal view of a ledger line; only the URL matters when resuming
#[derive(Debug, Deserialize)]
pub(crate) struct UrlLine {
    pub url: String,
}
