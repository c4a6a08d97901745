//! Output module for crawl summaries and reports
//!
//! This module handles:
//! - Printing the end-of-run summary
//! - Ledger statistics for `--stats`

pub mod stats;

pub use stats::{load_statistics, print_statistics, LedgerStatistics};

use crate::crawler::CrawlSummary;
use std::time::Duration;

/// Formats a duration as `1h 02m 03s`, `2m 03s` or `3.4s`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}

/// Renders the end-of-run summary
pub fn format_summary(summary: &CrawlSummary) -> String {
    let status = if summary.cancelled {
        "interrupted"
    } else {
        "complete"
    };

    let mut lines = vec![
        format!("=== Crawl {} ===", status),
        format!("  Pages processed:    {}", summary.processed),
        format!(
            "  Records:            {} new ({} total)",
            summary.new_records, summary.total_records
        ),
        format!("  Unreachable URLs:   {}", summary.unreachable),
        format!("  External links:     {}", summary.external_links),
        format!("  Unextractable:      {}", summary.unextractable),
        format!("  Elapsed:            {}", format_duration(summary.elapsed)),
    ];

    if summary.processed > 0 && summary.elapsed.as_secs_f64() > 0.0 {
        lines.push(format!(
            "  Rate:               {:.2} pages/sec",
            summary.processed as f64 / summary.elapsed.as_secs_f64()
        ));
    }

    lines.join("\n")
}

/// Prints the end-of-run summary to stdout
pub fn print_summary(summary: &CrawlSummary) {
    println!("{}", format_summary(summary));
}
