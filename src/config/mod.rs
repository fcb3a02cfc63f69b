//! Configuration module for Sumi-Spider
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and reading seed lists.
//!
//! # Example
//!
//! ```no_run
//! use sumi_spider::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("spider.toml")).unwrap();
//! println!("Crawler starts with {} workers", config.crawler.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, FilterConfig, HttpConfig, OutputConfig, SupervisorConfig,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, dedup_seeds, load_config, load_config_with_hash, load_seed_file,
    parse_config,
};
pub use validation::validate;
