//! Content-type denylist
//!
//! Links whose URL looks like a binary, media or office document are never
//! admitted. Matching is on the lower-cased absolute URL.

use crate::config::FilterConfig;
use url::Url;

#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    suffixes: Vec<String>,
    substrings: Vec<String>,
}

impl ContentFilter {
    pub fn new<S, T>(suffixes: S, substrings: T) -> Self
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
        T: IntoIterator,
        T::Item: AsRef<str>,
    {
        Self {
            suffixes: lowered(suffixes),
            substrings: lowered(substrings),
        }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(&config.deny_suffixes, &config.deny_substrings)
    }

    /// True when the URL ends with a denied suffix or contains a denied substring
    pub fn is_denied(&self, url: &Url) -> bool {
        let url = url.as_str().to_lowercase();
        self.suffixes.iter().any(|s| url.ends_with(s.as_str()))
            || self.substrings.iter().any(|s| url.contains(s.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.suffixes.is_empty() && self.substrings.is_empty()
    }
}

fn lowered<I>(patterns: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    patterns
        .into_iter()
        .map(|p| p.as_ref().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect()
}
