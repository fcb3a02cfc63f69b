//! Crawl statistics
//!
//! Workers count every page and link outcome in a shared [`CrawlStats`];
//! the session snapshots it into the final report, which this module can
//! print to stdout.

use crate::crawler::{CrawlReport, LinkOutcome, PageOutcome};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Lock-free per-outcome counters shared by all workers
#[derive(Debug, Default)]
pub struct CrawlStats {
    pages_fetched: AtomicUsize,
    transport_failures: AtomicUsize,
    http_failures: AtomicUsize,
    storage_failures: AtomicUsize,
    links_admitted: AtomicUsize,
    links_already_queued: AtomicUsize,
    links_quota_exhausted: AtomicUsize,
    links_not_whitelisted: AtomicUsize,
    links_excluded: AtomicUsize,
    links_filtered: AtomicUsize,
    links_invalid: AtomicUsize,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_page(&self, outcome: PageOutcome) {
        let counter = match outcome {
            PageOutcome::Fetched => &self.pages_fetched,
            PageOutcome::TransportFailure => &self.transport_failures,
            PageOutcome::HttpFailure => &self.http_failures,
            PageOutcome::StorageFailure => &self.storage_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_link(&self, outcome: LinkOutcome) {
        let counter = match outcome {
            LinkOutcome::Admitted => &self.links_admitted,
            LinkOutcome::AlreadyQueued => &self.links_already_queued,
            LinkOutcome::QuotaExhausted => &self.links_quota_exhausted,
            LinkOutcome::HostNotWhitelisted => &self.links_not_whitelisted,
            LinkOutcome::Excluded => &self.links_excluded,
            LinkOutcome::Filtered => &self.links_filtered,
            LinkOutcome::InvalidUrl => &self.links_invalid,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |counter: &AtomicUsize| counter.load(Ordering::Relaxed);
        StatsSnapshot {
            pages_fetched: load(&self.pages_fetched),
            transport_failures: load(&self.transport_failures),
            http_failures: load(&self.http_failures),
            storage_failures: load(&self.storage_failures),
            links_admitted: load(&self.links_admitted),
            links_already_queued: load(&self.links_already_queued),
            links_quota_exhausted: load(&self.links_quota_exhausted),
            links_not_whitelisted: load(&self.links_not_whitelisted),
            links_excluded: load(&self.links_excluded),
            links_filtered: load(&self.links_filtered),
            links_invalid: load(&self.links_invalid),
        }
    }
}

/// Point-in-time copy of [`CrawlStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub pages_fetched: usize,
    pub transport_failures: usize,
    pub http_failures: usize,
    pub storage_failures: usize,
    pub links_admitted: usize,
    pub links_already_queued: usize,
    pub links_quota_exhausted: usize,
    pub links_not_whitelisted: usize,
    pub links_excluded: usize,
    pub links_filtered: usize,
    pub links_invalid: usize,
}

impl StatsSnapshot {
    /// Pages a worker finished with, whatever the outcome
    pub fn pages_total(&self) -> usize {
        self.pages_fetched + self.transport_failures + self.http_failures + self.storage_failures
    }

    /// Extracted hrefs that went through admission
    pub fn links_total(&self) -> usize {
        self.links_admitted
            + self.links_already_queued
            + self.links_quota_exhausted
            + self.links_not_whitelisted
            + self.links_excluded
            + self.links_filtered
            + self.links_invalid
    }
}

/// Prints the crawl report to stdout in a formatted manner
///
/// # Arguments
///
/// * `report` - The finished crawl's report
pub fn print_statistics(report: &CrawlReport) {
    let stats = &report.stats;

    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Started:  {}", report.started_at.to_rfc3339());
    println!("  Finished: {}", report.finished_at.to_rfc3339());
    println!("  Duration: {}s", report.duration().num_seconds());
    println!("  Commands queued: {}", report.queued);
    println!("  Commands visited: {}", report.visited);
    println!("  Workers launched: {}", report.workers_launched);
    println!();

    println!("Pages:");
    println!("  Fetched and saved: {}", stats.pages_fetched);
    println!("  Transport failures: {}", stats.transport_failures);
    println!("  HTTP failures: {}", stats.http_failures);
    println!("  Storage failures: {}", stats.storage_failures);
    println!();

    println!("Links ({} examined):", stats.links_total());
    let mut link_counts = vec![
        ("Admitted", stats.links_admitted),
        ("Already queued", stats.links_already_queued),
        ("Quota exhausted", stats.links_quota_exhausted),
        ("Host not whitelisted", stats.links_not_whitelisted),
        ("Excluded by robots.txt", stats.links_excluded),
        ("Filtered by content type", stats.links_filtered),
        ("Invalid URL", stats.links_invalid),
    ];
    link_counts.sort_by(|a, b| b.1.cmp(&a.1));

    for (label, count) in link_counts {
        let percentage = if stats.links_total() > 0 {
            (count as f64 / stats.links_total() as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", label, count, percentage);
    }
    println!();

    let success_rate = if stats.pages_total() > 0 {
        (stats.pages_fetched as f64 / stats.pages_total() as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} pages successfully saved)",
        success_rate,
        stats.pages_fetched,
        stats.pages_total()
    );
}
