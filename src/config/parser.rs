use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigResult;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sumi_spider::config::load_config;
///
/// let config = load_config(Path::new("spider.toml")).unwrap();
/// println!("Workers: {}", config.crawler.workers);
/// ```
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> ConfigResult<Config> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> ConfigResult<String> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> ConfigResult<(Config, String)> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    links: Vec<String>,
}

/// Reads seed URLs from a JSON file of the form `{"links": [url, ...]}`
///
/// Duplicates are removed, keeping the first occurrence.
pub fn load_seed_file(path: &Path) -> ConfigResult<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    let file: SeedFile = serde_json::from_str(&content)?;
    Ok(dedup_seeds(file.links))
}

/// Removes duplicate seed strings, preserving first-seen order
///
/// # Example
///
/// ```
/// use sumi_spider::config::dedup_seeds;
///
/// let seeds = vec!["http://a/".to_string(), "http://b/".to_string(), "http://a/".to_string()];
/// assert_eq!(dedup_seeds(seeds), vec!["http://a/", "http://b/"]);
/// ```
pub fn dedup_seeds<I>(seeds: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    seeds
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}
