//! Sumi-Spider: A polite, host-aware web crawler
//!
//! This crate implements a concurrent crawler that starts from a set of seed
//! URLs, respects each seed host's robots.txt, caps the number of pages per
//! host, pauses between requests, and saves every fetched page to disk.

pub mod command;
pub mod config;
pub mod crawler;
pub mod frontier;
pub mod output;
pub mod robots;
pub mod storage;

use thiserror::Error;

/// Main error type for Sumi-Spider operations
#[derive(Debug, Error)]
pub enum SpiderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Transport error for {url}: {source}")]
    Transport {
        url: String,
        source: crawler::TransportError,
    },

    #[error("Frontier is empty after seeding: no seed host could be crawled")]
    EmptyFrontier,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to parse seed file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL '{input}': {source}")]
    Parse {
        input: String,
        source: ::url::ParseError,
    },
}

/// Result type alias for Sumi-Spider operations
pub type Result<T> = std::result::Result<T, SpiderError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use command::{doc_name, Command};
pub use config::Config;
pub use crawler::{CrawlReport, CrawlSession};
pub use frontier::{Admission, Frontier};
pub use robots::{Robot, RobotRegistry};
