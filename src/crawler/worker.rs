//! Crawl workers
//!
//! A worker repeatedly claims the next frontier entry, fetches it, saves the
//! body, feeds every extracted link through admission and records the page
//! as visited before pausing for politeness. Per-page and per-link failures
//! never leave the worker; it only stops once the supervisor signals
//! completion.

use crate::command::{doc_name, Command};
use crate::crawler::extract::LinkExtractor;
use crate::crawler::filter::ContentFilter;
use crate::crawler::transport::Fetcher;
use crate::frontier::{Admission, Frontier};
use crate::output::CrawlStats;
use crate::robots::{self, RobotRegistry};
use crate::storage::DocStorage;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use url::Url;

/// What happened to a claimed page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageOutcome {
    Fetched,
    TransportFailure,
    HttpFailure,
    StorageFailure,
}

impl PageOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetched => "fetched",
            Self::TransportFailure => "transport_failure",
            Self::HttpFailure => "http_failure",
            Self::StorageFailure => "storage_failure",
        }
    }
}

/// What happened to one extracted href
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkOutcome {
    Admitted,
    AlreadyQueued,
    QuotaExhausted,
    HostNotWhitelisted,
    /// Denied by the host's robots.txt
    Excluded,
    /// Matched the content-type denylist
    Filtered,
    /// Did not resolve to a URL
    InvalidUrl,
}

impl LinkOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admitted => "admitted",
            Self::AlreadyQueued => "already_queued",
            Self::QuotaExhausted => "quota_exhausted",
            Self::HostNotWhitelisted => "host_not_whitelisted",
            Self::Excluded => "excluded",
            Self::Filtered => "filtered",
            Self::InvalidUrl => "invalid_url",
        }
    }
}

impl From<Admission> for LinkOutcome {
    fn from(admission: Admission) -> Self {
        match admission {
            Admission::Admitted => Self::Admitted,
            Admission::AlreadyQueued => Self::AlreadyQueued,
            Admission::HostNotWhitelisted => Self::HostNotWhitelisted,
            Admission::QuotaExhausted => Self::QuotaExhausted,
        }
    }
}

impl fmt::Display for LinkOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the workers of one crawl share
pub struct CrawlContext {
    pub frontier: Frontier,
    pub robots: RobotRegistry,
    pub fetcher: Fetcher,
    pub storage: Arc<dyn DocStorage>,
    pub extractor: Arc<dyn LinkExtractor>,
    pub filter: ContentFilter,
    pub stats: CrawlStats,
    /// Configured pause after every page
    pub crawl_delay: Duration,
    /// Pause before re-checking an exhausted frontier
    pub idle_backoff: Duration,
}

impl CrawlContext {
    /// Politeness pause after fetching from `command`'s host
    ///
    /// The longer of the configured delay and the host's robots.txt
    /// `crawl-delay`.
    pub fn politeness_delay(&self, command: &Command) -> Duration {
        command
            .host()
            .and_then(|host| self.robots.for_host(&host))
            .and_then(|robot| robot.crawl_delay)
            .map_or(self.crawl_delay, |delay| delay.max(self.crawl_delay))
    }

    /// Runs one extracted href through resolution, filter, robots and the frontier
    pub fn admit(&self, href: &str, base: &Url) -> LinkOutcome {
        let candidate = match Command::resolve(href, base) {
            Ok(candidate) => candidate,
            Err(e) => {
                tracing::debug!(href, error = %e, outcome = "invalid_url", "Skipping href");
                return LinkOutcome::InvalidUrl;
            }
        };

        let outcome = if self.filter.is_denied(candidate.url()) {
            LinkOutcome::Filtered
        } else if !robots::permits(&candidate, &self.robots) {
            LinkOutcome::Excluded
        } else {
            self.frontier.try_admit(candidate.clone(), &self.robots).into()
        };

        tracing::debug!(url = %candidate, outcome = outcome.as_str(), "Link examined");
        outcome
    }
}

impl fmt::Debug for CrawlContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrawlContext")
            .field("frontier", &self.frontier)
            .field("robots", &self.robots.len())
            .field("crawl_delay", &self.crawl_delay)
            .field("idle_backoff", &self.idle_backoff)
            .finish_non_exhaustive()
    }
}

/// A single crawl loop
pub struct Worker {
    id: usize,
    ctx: Arc<CrawlContext>,
    done: watch::Receiver<bool>,
}

impl Worker {
    pub fn new(id: usize, ctx: Arc<CrawlContext>, done: watch::Receiver<bool>) -> Self {
        Self { id, ctx, done }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Claims and processes commands until completion is signalled
    ///
    /// Returns the number of pages this worker processed.
    pub async fn run(mut self) -> usize {
        tracing::debug!(worker = self.id, "Worker started");
        let mut processed = 0;

        while !self.is_done() {
            let Some(claimed) = self.ctx.frontier.claim() else {
                let backoff = self.ctx.idle_backoff;
                self.pause(backoff).await;
                continue;
            };

            let command = claimed.command;
            tracing::trace!(worker = self.id, index = claimed.index, url = %command, "Claimed");

            let outcome = self.process(&command).await;
            self.ctx.stats.record_page(outcome);
            let delay = self.ctx.politeness_delay(&command);
            self.ctx.frontier.record_visited(command);
            processed += 1;

            self.pause(delay).await;
        }

        tracing::debug!(worker = self.id, processed, "Worker stopped");
        processed
    }

    /// Fetch, persist, extract and admit for one page
    async fn process(&self, command: &Command) -> PageOutcome {
        let ctx = &self.ctx;

        let response = match ctx.fetcher.fetch(command).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    worker = self.id,
                    url = %command,
                    error = %e,
                    outcome = PageOutcome::TransportFailure.as_str(),
                    "Fetch failed"
                );
                return PageOutcome::TransportFailure;
            }
        };

        if response.is_failure() {
            tracing::info!(
                worker = self.id,
                url = %command,
                status = response.status,
                outcome = PageOutcome::HttpFailure.as_str(),
                "HTTP failure status"
            );
            return PageOutcome::HttpFailure;
        }

        let name = doc_name(command.url());
        if let Err(e) = ctx.storage.put(&name, &response.body).await {
            tracing::warn!(
                worker = self.id,
                url = %command,
                error = %e,
                outcome = PageOutcome::StorageFailure.as_str(),
                "Failed to save page"
            );
            return PageOutcome::StorageFailure;
        }

        let hrefs = ctx.extractor.extract_hrefs(&response.body);
        let mut admitted = 0;
        for href in &hrefs {
            let outcome = ctx.admit(href, command.url());
            ctx.stats.record_link(outcome);
            if outcome == LinkOutcome::Admitted {
                admitted += 1;
            }
        }

        tracing::info!(
            worker = self.id,
            url = %command,
            status = response.status,
            links = hrefs.len(),
            admitted,
            outcome = PageOutcome::Fetched.as_str(),
            "Fetched page"
        );
        PageOutcome::Fetched
    }

    fn is_done(&self) -> bool {
        *self.done.borrow() || self.done.has_changed().is_err()
    }

    /// Sleeps for `duration`, waking early when completion is signalled
    async fn pause(&mut self, duration: Duration) {
        if duration.is_zero() {
            tokio::task::yield_now().await;
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = self.done.changed() => {}
        }
    }
}
