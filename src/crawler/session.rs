//! Crawl session
//!
//! A [`CrawlSession`] owns one crawl from seeding to the final report:
//! 1. `seed` fetches robots.txt once per distinct seed host and queues the
//!    seeds of every host that may be crawled
//! 2. `run` refuses an empty frontier, then hands the shared state to the
//!    supervisor and waits for completion

use crate::command::Command;
use crate::config::Config;
use crate::crawler::extract::LinkExtractor;
use crate::crawler::filter::ContentFilter;
use crate::crawler::supervisor::{CompletionReason, Supervisor};
use crate::crawler::transport::{Fetcher, Transport};
use crate::crawler::worker::CrawlContext;
use crate::frontier::Frontier;
use crate::output::{CrawlStats, StatsSnapshot};
use crate::robots::{Robot, RobotRegistry};
use crate::storage::DocStorage;
use crate::{ConfigError, Result, SpiderError};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;

/// Summary of a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Commands ever enqueued
    pub queued: usize,
    /// Commands workers finished with
    pub visited: usize,
    pub workers_launched: usize,
    pub reason: CompletionReason,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stats: StatsSnapshot,
    /// Visited URLs in completion order
    pub visited_urls: Vec<String>,
}

impl CrawlReport {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

pub struct CrawlSession {
    config: Config,
    fetcher: Fetcher,
    storage: Arc<dyn DocStorage>,
    extractor: Arc<dyn LinkExtractor>,
    frontier: Frontier,
    robots: RobotRegistry,
    /// Seed hosts that will not be crawled
    skipped_hosts: HashSet<String>,
}

impl CrawlSession {
    /// Creates a session from configuration and its collaborators
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `transport` - Performs HTTP requests
    /// * `storage` - Receives every fetched page
    /// * `extractor` - Lists the hrefs of a fetched page
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSession)` - Ready to seed
    /// * `Err(SpiderError)` - The user agent is not a valid header value
    pub fn new(
        config: Config,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn DocStorage>,
        extractor: Arc<dyn LinkExtractor>,
    ) -> Result<Self> {
        let user_agent = config.user_agent.header_value();
        let fetcher = Fetcher::new(transport, &user_agent).map_err(|e| {
            ConfigError::Validation(format!("invalid user agent '{}': {}", user_agent, e))
        })?;
        let frontier = Frontier::new(config.crawler.quota());

        Ok(Self {
            config,
            fetcher,
            storage,
            extractor,
            frontier,
            robots: RobotRegistry::new(),
            skipped_hosts: HashSet::new(),
        })
    }

    /// Queues seeds, fetching each new host's robots.txt first
    ///
    /// Invalid seeds, hosts whose robots.txt disallows everything and hosts
    /// whose robots.txt cannot be fetched are skipped with a warning.
    /// Returns how many seeds were queued.
    pub async fn seed<I, S>(&mut self, seeds: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut queued = 0;

        for seed in seeds {
            let seed = seed.as_ref();
            let command = match Command::parse(seed) {
                Ok(command) => command,
                Err(e) => {
                    tracing::warn!(seed, error = %e, "Skipping invalid seed");
                    continue;
                }
            };
            let Some(host) = command.host() else {
                tracing::warn!(seed, "Skipping seed without a host");
                continue;
            };

            if self.skipped_hosts.contains(&host) {
                continue;
            }
            if !self.robots.contains_host(&host) {
                match self.fetch_robot(seed).await {
                    Ok(robot) if robot.full_disallow => {
                        tracing::warn!(host = %host, "robots.txt disallows everything, skipping host");
                        self.skipped_hosts.insert(host);
                        continue;
                    }
                    Ok(robot) => {
                        tracing::info!(
                            host = %host,
                            full_allow = robot.full_allow,
                            groups = robot.groups.len(),
                            "Loaded robots.txt"
                        );
                        self.robots.insert(robot);
                    }
                    Err(e) => {
                        tracing::warn!(host = %host, error = %e, "Could not fetch robots.txt, skipping host");
                        self.skipped_hosts.insert(host);
                        continue;
                    }
                }
            }

            if self.frontier.seed(command) {
                tracing::debug!(seed, "Seeded");
                queued += 1;
            }
        }

        queued
    }

    async fn fetch_robot(&self, seed: &str) -> Result<Robot> {
        let command = Command::robots_for(seed)?;
        let response = self
            .fetcher
            .fetch(&command)
            .await
            .map_err(|source| SpiderError::Transport {
                url: command.to_string(),
                source,
            })?;
        Ok(Robot::from_response(
            command.url(),
            response.status,
            &response.text(),
        ))
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn robots(&self) -> &RobotRegistry {
        &self.robots
    }

    /// Crawls until the supervisor declares completion
    ///
    /// Fails with [`SpiderError::EmptyFrontier`] when seeding queued nothing.
    pub async fn run(self) -> Result<CrawlReport> {
        if self.frontier.is_empty() {
            tracing::error!("No seed could be queued, nothing to crawl");
            return Err(SpiderError::EmptyFrontier);
        }

        let started_at = Utc::now();
        tracing::info!(
            seeds = self.frontier.size(),
            hosts = self.robots.len(),
            workers = self.config.crawler.workers,
            "Starting crawl"
        );

        let ctx = Arc::new(CrawlContext {
            frontier: self.frontier,
            robots: self.robots,
            fetcher: self.fetcher,
            storage: self.storage,
            extractor: self.extractor,
            filter: ContentFilter::from_config(&self.config.filter),
            stats: CrawlStats::new(),
            crawl_delay: self.config.crawler.crawl_delay(),
            idle_backoff: self.config.crawler.idle_backoff(),
        });

        let supervisor = Supervisor::new(
            Arc::clone(&ctx),
            &self.config.supervisor,
            self.config.crawler.workers,
        );
        let summary = supervisor.run().await;
        let finished_at = Utc::now();

        let visited_urls: Vec<String> = ctx
            .frontier
            .visited()
            .iter()
            .map(|c| c.as_str().to_string())
            .collect();

        let report = CrawlReport {
            queued: ctx.frontier.size(),
            visited: visited_urls.len(),
            workers_launched: summary.workers_launched,
            reason: summary.reason,
            started_at,
            finished_at,
            stats: ctx.stats.snapshot(),
            visited_urls,
        };

        tracing::info!(
            queued = report.queued,
            visited = report.visited,
            workers = report.workers_launched,
            "Crawl finished in {}s",
            report.duration().num_seconds()
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::extract::HtmlLinkExtractor;
    use crate::crawler::transport::{FetchResponse, TransportError};
    use crate::storage::StorageResult;
    use async_trait::async_trait;
    use reqwest::header::HeaderMap;
    use reqwest::Method;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use url::Url;

    /// Serves fixed pages; unknown URLs are 404, `down` hosts fail to connect
    #[derive(Default)]
    struct FakeWeb {
        pages: HashMap<String, String>,
        down: Vec<String>,
        requests: Mutex<Vec<String>>,
    }

    impl FakeWeb {
        fn page(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), body.to_string());
            self
        }

        fn down(mut self, host: &str) -> Self {
            self.down.push(host.to_string());
            self
        }
    }

    #[async_trait]
    impl Transport for FakeWeb {
        async fn perform(
            &self,
            _method: &Method,
            url: &Url,
            _headers: &HeaderMap,
        ) -> std::result::Result<FetchResponse, TransportError> {
            self.requests.lock().unwrap().push(url.to_string());
            if self.down.iter().any(|h| Some(h.as_str()) == url.host_str()) {
                return Err(TransportError::Other("connection refused".to_string()));
            }
            let (status, body) = match self.pages.get(url.as_str()) {
                Some(body) => (200, body.clone()),
                None => (404, String::new()),
            };
            Ok(FetchResponse {
                status,
                headers: HeaderMap::new(),
                body: body.into_bytes(),
            })
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        docs: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl DocStorage for MemoryStore {
        async fn put(&self, name: &str, bytes: &[u8]) -> StorageResult<()> {
            self.docs
                .lock()
                .unwrap()
                .insert(name.to_string(), bytes.to_vec());
            Ok(())
        }
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.crawler.workers = 2;
        config.crawler.crawl_delay_ms = 0;
        config.crawler.idle_backoff_ms = 2;
        config.supervisor.sample_interval_ms = 5;
        config.supervisor.stagnation_rounds = 200;
        config
    }

    fn session(config: Config, web: Arc<FakeWeb>, store: Arc<MemoryStore>) -> CrawlSession {
        CrawlSession::new(config, web, store, Arc::new(HtmlLinkExtractor::new())).unwrap()
    }

    #[tokio::test]
    async fn test_single_page_without_links_completes() {
        let web = Arc::new(FakeWeb::default().page("http://a.com/", "<p>nothing here</p>"));
        let store = Arc::new(MemoryStore::default());
        let mut session = session(test_config(), web, Arc::clone(&store));

        assert_eq!(session.seed(["http://a.com/"]).await, 1);
        let report = session.run().await.unwrap();

        assert_eq!(report.visited_urls, vec!["http://a.com/"]);
        assert_eq!(report.queued, 1);
        assert_eq!(report.reason, CompletionReason::Drained);
        assert_eq!(report.stats.pages_fetched, 1);
        assert!(store.docs.lock().unwrap().contains_key("http:_-__-_a.com_-_"));
    }

    #[tokio::test]
    async fn test_full_disallow_everywhere_is_fatal() {
        let web = Arc::new(
            FakeWeb::default()
                .page("http://a.com/robots.txt", "User-agent: *\nDisallow: /")
                .page("http://b.com/robots.txt", "User-agent: *\nDisallow: /")
                .page("http://a.com/", "<a href=\"/x\">x</a>"),
        );
        let mut session = session(test_config(), web, Arc::new(MemoryStore::default()));

        assert_eq!(session.seed(["http://a.com/", "http://b.com/"]).await, 0);
        assert!(matches!(session.run().await, Err(SpiderError::EmptyFrontier)));
    }

    #[tokio::test]
    async fn test_no_seeds_is_fatal() {
        let web = Arc::new(FakeWeb::default());
        let session = session(test_config(), web, Arc::new(MemoryStore::default()));
        assert!(matches!(session.run().await, Err(SpiderError::EmptyFrontier)));
    }

    #[tokio::test]
    async fn test_robots_fetched_once_per_host() {
        let web = Arc::new(FakeWeb::default().down("c.com"));
        let mut session = session(test_config(), Arc::clone(&web), Arc::new(MemoryStore::default()));

        let queued = session
            .seed([
                "http://a.com/",
                "http://a.com/other",
                "http://a.com/",
                "not a url",
                "http://c.com/",
                "http://c.com/again",
            ])
            .await;

        assert_eq!(queued, 2);
        assert_eq!(session.robots().len(), 1);
        let robots_requests: Vec<_> = web
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.ends_with("/robots.txt"))
            .cloned()
            .collect();
        assert_eq!(
            robots_requests,
            vec!["http://a.com/robots.txt", "http://c.com/robots.txt"]
        );
    }

    #[tokio::test]
    async fn test_crawl_follows_permitted_links_on_seed_hosts() {
        let web = Arc::new(
            FakeWeb::default()
                .page(
                    "http://a.com/robots.txt",
                    "User-agent: *\nAllow: /\nDisallow: /secret",
                )
                .page(
                    "http://a.com/",
                    r#"<a href="/one">1</a>
                       <a href="/secret">s</a>
                       <a href="/paper.pdf">pdf</a>
                       <a href="http://elsewhere.org/">out</a>"#,
                )
                .page("http://a.com/one", r#"<a href="/">home</a><a href="/gone">gone</a>"#),
        );
        let store = Arc::new(MemoryStore::default());
        let mut session = session(test_config(), Arc::clone(&web), Arc::clone(&store));

        session.seed(["http://a.com/"]).await;
        let report = session.run().await.unwrap();

        let mut visited = report.visited_urls.clone();
        visited.sort();
        assert_eq!(
            visited,
            vec!["http://a.com/", "http://a.com/gone", "http://a.com/one"]
        );
        assert_eq!(report.stats.links_excluded, 1);
        assert_eq!(report.stats.links_filtered, 1);
        assert_eq!(report.stats.links_not_whitelisted, 1);
        assert_eq!(report.stats.links_already_queued, 1);
        assert_eq!(report.stats.http_failures, 1);
        assert_eq!(store.docs.lock().unwrap().len(), 2);
        assert!(!web
            .requests
            .lock()
            .unwrap()
            .iter()
            .any(|u| u.contains("secret") || u.contains("elsewhere")));
    }

    #[tokio::test]
    async fn test_quota_caps_pages_per_host() {
        let links: String = (0..10)
            .map(|i| format!("<a href=\"/p{}\">{}</a>", i, i))
            .collect();
        let web = Arc::new(FakeWeb::default().page("http://a.com/", &links));
        let mut config = test_config();
        config.crawler.per_host_page_quota = 4;
        let mut session = session(config, web, Arc::new(MemoryStore::default()));

        session.seed(["http://a.com/"]).await;
        let report = session.run().await.unwrap();

        assert_eq!(report.queued, 4);
        assert_eq!(report.visited, 4);
        assert_eq!(report.stats.links_admitted, 3);
        assert_eq!(report.stats.links_quota_exhausted, 7);
    }

    #[tokio::test]
    async fn test_politeness_pause_longer_than_stagnation_window() {
        let web = Arc::new(
            FakeWeb::default()
                .page("http://a.com/", r#"<a href="/b">b</a>"#)
                .page("http://a.com/b", "<p>leaf</p>"),
        );
        let mut config = test_config();
        config.crawler.workers = 1;
        config.crawler.crawl_delay_ms = 300;
        config.supervisor.sample_interval_ms = 10;
        config.supervisor.stagnation_rounds = 10;
        let mut session = session(config, web, Arc::new(MemoryStore::default()));

        session.seed(["http://a.com/"]).await;
        let report = session.run().await.unwrap();

        assert_eq!(report.queued, 2);
        assert_eq!(report.visited, report.queued);
        assert_eq!(report.reason, CompletionReason::Drained);
        assert_eq!(report.stats.pages_fetched, 2);
    }

    #[tokio::test]
    async fn test_backlog_launches_more_workers() {
        let links: String = (0..30)
            .map(|i| format!("<a href=\"/p{}\">{}</a>", i, i))
            .collect();
        let web = Arc::new(FakeWeb::default().page("http://a.com/", &links));
        let mut config = test_config();
        config.crawler.workers = 1;
        config.crawler.crawl_delay_ms = 20;
        config.supervisor.backlog_threshold = 0;
        config.supervisor.max_workers = 3;
        let mut session = session(config, web, Arc::new(MemoryStore::default()));

        session.seed(["http://a.com/"]).await;
        let report = session.run().await.unwrap();

        assert_eq!(report.workers_launched, 3);
        assert_eq!(report.visited, 31);
    }
}
