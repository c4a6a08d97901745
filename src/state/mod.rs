//! State module for tracking crawl progress
//!
//! `PageState` describes where a single URL is in its lifecycle within a run.

mod page_state;

pub use page_state::PageState;
