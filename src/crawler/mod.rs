//! Crawler module for the crawl-coordination engine
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching through an injectable transport
//! - Link extraction and content-type filtering
//! - The worker loop and the supervisor that scales and stops it
//! - The session that seeds a crawl and runs it to completion

mod extract;
mod filter;
mod session;
mod supervisor;
mod transport;
mod worker;

pub use extract::{HtmlLinkExtractor, LinkExtractor};
pub use filter::ContentFilter;
pub use session::{CrawlReport, CrawlSession};
pub use supervisor::{CompletionReason, ProgressMonitor, Supervisor, SupervisorSummary, Verdict};
pub use transport::{
    build_http_client, FetchResponse, Fetcher, HttpTransport, Transport, TransportError,
};
pub use worker::{CrawlContext, LinkOutcome, PageOutcome, Worker};
