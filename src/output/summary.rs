//! Console summary of a finished harvest

use crate::crawler::{mode_name, CrawlOutcome, CrawlStatus};

/// Formats a short human-readable report of a harvest
pub fn format_summary(outcome: &CrawlOutcome) -> String {
    let mut out = String::new();

    out.push_str("=== Harvest Summary ===\n\n");
    out.push_str(&format!("Source: {}\n", outcome.source));
    out.push_str(&format!("Pagination: {}\n", mode_name(outcome.pagination)));
    out.push_str(&format!("Pages visited: {}\n", outcome.pages_visited));
    out.push_str(&format!("Stopped: {}\n", outcome.stop_reason));
    out.push_str(&format!("Listings: {}\n", outcome.count()));

    let status = match outcome.status {
        CrawlStatus::Complete => "complete",
        CrawlStatus::ConfirmedEmpty => "confirmed empty (listing container rendered with no listings)",
        CrawlStatus::Undetermined => "UNDETERMINED (the first list page never rendered)",
    };
    out.push_str(&format!("Status: {}\n", status));

    if let Some(report) = &outcome.enrichment {
        let rate = if report.attempted > 0 {
            (report.enriched as f64 / report.attempted as f64) * 100.0
        } else {
            0.0
        };
        out.push_str(&format!(
            "\nDetail pages: {} / {} enriched ({:.1}%), {} failed{}\n",
            report.enriched,
            report.attempted,
            rate,
            report.failed,
            if report.aborted { ", pass aborted" } else { "" }
        ));
    }

    out
}

/// Prints the harvest summary to stdout
pub fn print_summary(outcome: &CrawlOutcome) {
    println!("{}", format_summary(outcome));
}
