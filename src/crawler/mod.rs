//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The URL frontier with dedup and retry bookkeeping
//! - HTTP fetching with failure classification
//! - HTML parsing, main-content extraction and text cleanup
//! - Outgoing link classification
//! - Overall crawl coordination

mod cleaner;
mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod links;
mod parser;

pub use cleaner::{repair_encoding, Cleaner, ContentTooShort, DOCUMENTATION_SENTINEL};
pub use coordinator::{run_crawl, Coordinator, CrawlSummary};
pub use extractor::{render_text, ContentBlock, Extraction, Extractor, CONTENT_REGIONS};
pub use fetcher::{build_http_client, fetch_url, is_html_content_type, FetchResult, MAX_REDIRECTS};
pub use frontier::{FailureDecision, Frontier};
pub use links::{file_extension, IgnoreReason, LinkClass, LinkClassifier};
pub use parser::{PageParser, ParsedPage};

use crate::config::Config;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the run ledger and reconstruct prior state
/// 2. Build the HTTP client and load robots.txt
/// 3. Seed the base URL and run the worker pool
/// 4. Write the unreachable snapshot and return the run totals
pub async fn crawl(config: Config, fresh: bool) -> crate::Result<CrawlSummary> {
    run_crawl(config, fresh).await
}
