use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Sumi-Spider
///
/// Every table is optional; missing values fall back to their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub supervisor: SupervisorConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub http: HttpConfig,
    pub output: OutputConfig,
    pub filter: FilterConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of workers started with the crawl
    pub workers: usize,

    /// Pause each worker takes after every page (milliseconds)
    #[serde(rename = "crawl-delay-ms")]
    pub crawl_delay_ms: u64,

    /// Maximum number of pages enqueued per host (0 = unlimited)
    #[serde(rename = "per-host-page-quota")]
    pub per_host_page_quota: usize,

    /// How long an idle worker waits before re-checking the frontier (milliseconds)
    #[serde(rename = "idle-backoff-ms")]
    pub idle_backoff_ms: u64,

    /// Hard cap on total run time (seconds)
    #[serde(rename = "max-run-time-secs")]
    pub max_run_time_secs: Option<u64>,
}

impl CrawlerConfig {
    pub fn crawl_delay(&self) -> Duration {
        Duration::from_millis(self.crawl_delay_ms)
    }

    pub fn idle_backoff(&self) -> Duration {
        Duration::from_millis(self.idle_backoff_ms)
    }

    /// The per-host quota, `None` when unlimited
    pub fn quota(&self) -> Option<usize> {
        match self.per_host_page_quota {
            0 => None,
            quota => Some(quota),
        }
    }

    pub fn max_run_time(&self) -> Option<Duration> {
        self.max_run_time_secs.map(Duration::from_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            crawl_delay_ms: 5000,
            per_host_page_quota: 100,
            idle_backoff_ms: 250,
            max_run_time_secs: None,
        }
    }
}

/// Progress monitoring and worker scaling
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Time between progress samples (milliseconds)
    #[serde(rename = "sample-interval-ms")]
    pub sample_interval_ms: u64,

    /// Pending commands above which another worker is started
    #[serde(rename = "backlog-threshold")]
    pub backlog_threshold: usize,

    /// Consecutive unchanged samples after which the crawl is declared done
    #[serde(rename = "stagnation-rounds")]
    pub stagnation_rounds: u32,

    /// Upper bound on the worker count
    #[serde(rename = "max-workers")]
    pub max_workers: usize,
}

impl SupervisorConfig {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    /// How long the frontier must sit unchanged before the crawl is declared done
    pub fn stagnation_window(&self) -> Duration {
        self.sample_interval().saturating_mul(self.stagnation_rounds)
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 1000,
            backlog_threshold: 20,
            stagnation_rounds: 60,
            max_workers: 32,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,

    /// Complete user agent string, used verbatim when set
    #[serde(rename = "override")]
    pub override_string: Option<String>,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        if let Some(ua) = &self.override_string {
            return ua.clone();
        }
        match &self.contact_url {
            Some(url) => format!("{}/{} (+{})", self.crawler_name, self.crawler_version, url),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SumiSpider".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
            override_string: None,
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Accept self-signed and otherwise invalid TLS certificates
    #[serde(rename = "accept-invalid-certs")]
    pub accept_invalid_certs: bool,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            accept_invalid_certs: false,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory fetched pages are written into
    #[serde(rename = "docs-dir")]
    pub docs_dir: PathBuf,

    /// Remove previous documents before crawling
    #[serde(rename = "clear-on-start")]
    pub clear_on_start: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("docs"),
            clear_on_start: true,
        }
    }
}

/// URL patterns of content that is never enqueued
///
/// Matching is case-insensitive against the full URL.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Skip URLs ending with any of these
    #[serde(rename = "deny-suffixes")]
    pub deny_suffixes: Vec<String>,

    /// Skip URLs containing any of these
    #[serde(rename = "deny-substrings")]
    pub deny_substrings: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        let suffixes = [
            ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".zip", ".gz",
        ];
        let substrings = [
            ".mp3", ".mp4", ".avi", ".mov", ".wav", ".ico", ".jpg", ".jpeg", ".png", ".gif",
            ".svg", ".webp",
        ];
        Self {
            deny_suffixes: suffixes.iter().map(|s| s.to_string()).collect(),
            deny_substrings: substrings.iter().map(|s| s.to_string()).collect(),
        }
    }
}
