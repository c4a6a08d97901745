//! Run ledger: durable crawl output and resume state
//!
//! The ledger owns four JSON-lines streams: extracted page records, collected
//! off-site links and unextractable URLs (append-only) plus the
//! unreachable-URL snapshot (rewritten at the end of each run). At startup it reconstructs which URLs
//! earlier runs already handled.

mod jsonl;
mod records;
mod traits;
mod writer;

pub use jsonl::{JsonlLedger, LedgerPaths};
pub use records::{ExternalLinkRecord, PageRecord, UnextractableRecord, UnreachableRecord};
pub use traits::{Ledger, LedgerError, LedgerResult};
pub use writer::{spawn_writer, LedgerHandle, WRITER_CHANNEL_CAPACITY};

use crate::url::CrawlTarget;
use std::collections::{HashMap, HashSet};

/// What previous runs left behind
#[derive(Debug, Default)]
pub struct PriorState {
    /// URLs with a page record
    pub recorded: HashSet<CrawlTarget>,
    /// URLs given up on, keyed by target
    pub unreachable: HashMap<CrawlTarget, UnreachableRecord>,
    /// Off-site links already collected
    pub external_links: HashSet<String>,
    /// URLs whose pages had no usable content
    pub unextractable: HashSet<CrawlTarget>,
}

impl PriorState {
    pub fn is_empty(&self) -> bool {
        self.recorded.is_empty()
            && self.unreachable.is_empty()
            && self.external_links.is_empty()
            && self.unextractable.is_empty()
    }
}
