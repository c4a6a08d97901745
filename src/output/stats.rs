//! Statistics generation from the run ledger
//!
//! This module provides functionality for extracting and displaying
//! ledger statistics without crawling.

use crate::crawler::file_extension;
use crate::ledger::{Ledger, LedgerResult};
use std::collections::HashMap;

/// Ledger statistics summary
#[derive(Debug, Clone, Default)]
pub struct LedgerStatistics {
    /// Number of page records
    pub total_records: usize,

    /// Number of unreachable URLs
    pub unreachable: usize,

    /// Unreachable URLs grouped by reason
    pub unreachable_by_reason: HashMap<String, usize>,

    /// Number of collected external links
    pub external_links: usize,

    /// Collected external links grouped by file extension
    pub external_by_extension: HashMap<String, usize>,

    /// URLs whose pages had no usable content
    pub unextractable: usize,
}

/// Loads statistics from a ledger
pub fn load_statistics(ledger: &dyn Ledger) -> LedgerResult<LedgerStatistics> {
    let state = ledger.load_prior_state()?;

    let mut unreachable_by_reason = HashMap::new();
    for record in state.unreachable.values() {
        let reason = if record.reason.is_empty() {
            "unknown".to_string()
        } else {
            record.reason.clone()
        };
        *unreachable_by_reason.entry(reason).or_insert(0) += 1;
    }

    let mut external_by_extension = HashMap::new();
    for url in &state.external_links {
        let segment = url.rsplit('/').next().unwrap_or("");
        let extension = file_extension(segment).unwrap_or_else(|| "(none)".to_string());
        *external_by_extension.entry(extension).or_insert(0) += 1;
    }

    Ok(LedgerStatistics {
        total_records: state.recorded.len(),
        unreachable: state.unreachable.len(),
        unreachable_by_reason,
        external_links: state.external_links.len(),
        external_by_extension,
        unextractable: state.unextractable.len(),
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &LedgerStatistics) {
    println!("=== Ledger Statistics ===\n");

    println!("Overview:");
    println!("  Page records: {}", stats.total_records);
    println!("  Unreachable URLs: {}", stats.unreachable);
    println!("  External links: {}", stats.external_links);
    println!("  Unextractable URLs: {}", stats.unextractable);
    println!();

    if !stats.unreachable_by_reason.is_empty() {
        println!("Unreachable by Reason:");
        for (reason, count) in sorted_by_count(&stats.unreachable_by_reason) {
            println!("  {}: {}", reason, count);
        }
        println!();
    }

    if !stats.external_by_extension.is_empty() {
        println!("External Links by Extension:");
        for (extension, count) in sorted_by_count(&stats.external_by_extension) {
            let percentage = (*count as f64 / stats.external_links as f64) * 100.0;
            println!("  {}: {} ({:.1}%)", extension, count, percentage);
        }
        println!();
    }

    let attempted = stats.total_records + stats.unreachable;
    let success_rate = if attempted > 0 {
        (stats.total_records as f64 / attempted as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Success Rate: {:.1}% ({} / {} URLs recorded)",
        success_rate, stats.total_records, attempted
    );
}

/// Descending by count, ties by key
fn sorted_by_count(counts: &HashMap<String, usize>) -> Vec<(&String, &usize)> {
    let mut entries: Vec<_> = counts.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    entries
}
