//! Ledger traits and error types
//!
//! This module defines the trait interface for ledger backends and
//! associated error types.

use crate::ledger::{
    ExternalLinkRecord, PageRecord, PriorState, UnextractableRecord, UnreachableRecord,
};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Ledger writer has shut down")]
    WriterClosed,
}

impl LedgerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Trait for ledger backend implementations
///
/// A ledger is the sole writer of the four output streams. Implementations
/// are driven from a single writer task, so methods take `&mut self` and need
/// no internal locking.
pub trait Ledger: Send {
    /// Reconstructs the state left behind by previous runs
    ///
    /// Corrupt lines are skipped; only I/O failures are errors.
    fn load_prior_state(&self) -> LedgerResult<PriorState>;

    /// Appends one page record; durable when this returns
    fn append_page_record(&mut self, record: &PageRecord) -> LedgerResult<()>;

    /// Appends one collected off-site link; durable when this returns
    fn append_external_link(&mut self, record: &ExternalLinkRecord) -> LedgerResult<()>;

    /// Appends one URL that yielded no usable content; durable when this returns
    fn append_unextractable(&mut self, record: &UnextractableRecord) -> LedgerResult<()>;

    /// Replaces the unreachable stream with the given complete set
    fn write_unreachable_snapshot(&mut self, records: &[UnreachableRecord]) -> LedgerResult<()>;
}
