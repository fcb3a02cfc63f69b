//! Output module for crawl statistics
//!
//! This module handles:
//! - Counting page and link outcomes while the crawl runs
//! - Printing the final crawl report

pub mod stats;

pub use stats::{print_statistics, CrawlStats, StatsSnapshot};
