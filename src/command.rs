//! Fetch commands
//!
//! A [`Command`] names one resource the crawler will request: an absolute URL
//! and the HTTP verb to use. Commands are created from seeds or by resolving
//! an extracted href against the page it was found on, and are never mutated.

use crate::{UrlError, UrlResult};
use reqwest::Method;
use std::fmt;
use url::Url;

/// Separator substituted for every "/" when naming a saved page
pub const DOC_NAME_SEPARATOR: &str = "_-_";

/// Relative reference of a host's robots.txt
const ROBOTS_PATH: &str = "/robots.txt";

/// An immutable request for a single resource
///
/// Two commands are considered the same resource when their absolute URL
/// strings are equal. No normalization happens beyond what resolution does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    url: Url,
    method: Method,
}

impl Command {
    /// Creates a GET command for an already absolute URL
    pub fn new(url: Url) -> Self {
        Self {
            url,
            method: Method::GET,
        }
    }

    /// Parses an absolute URL string into a GET command
    ///
    /// # Example
    ///
    /// ```
    /// use sumi_spider::Command;
    ///
    /// let cmd = Command::parse("https://example.com/docs").unwrap();
    /// assert_eq!(cmd.as_str(), "https://example.com/docs");
    /// ```
    pub fn parse(input: &str) -> UrlResult<Self> {
        let url = Url::parse(input.trim()).map_err(|source| UrlError::Parse {
            input: input.to_string(),
            source,
        })?;
        Ok(Self::new(url))
    }

    /// Resolves `href` against `base` (RFC 3986 reference resolution)
    ///
    /// Scheme and host are inherited from `base` unless `href` is itself
    /// absolute. Callers skip the href when this fails.
    ///
    /// # Example
    ///
    /// ```
    /// use sumi_spider::Command;
    /// use url::Url;
    ///
    /// let base = Url::parse("http://h/a/b").unwrap();
    /// let cmd = Command::resolve("c", &base).unwrap();
    /// assert_eq!(cmd.as_str(), "http://h/a/c");
    /// ```
    pub fn resolve(href: &str, base: &Url) -> UrlResult<Self> {
        let url = base.join(href).map_err(|source| UrlError::Parse {
            input: href.to_string(),
            source,
        })?;
        Ok(Self::new(url))
    }

    /// Builds the command for the robots.txt of a seed's host
    pub fn robots_for(seed: &str) -> UrlResult<Self> {
        let seed = Self::parse(seed)?;
        Self::resolve(ROBOTS_PATH, seed.url())
    }

    /// The absolute target URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The HTTP verb
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The absolute URL as a string, the key used for dedup
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Host of the target including an explicit port, if any
    ///
    /// Returns `None` for URLs without a host (e.g. `mailto:`).
    pub fn host(&self) -> Option<String> {
        host_key(&self.url)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Host plus explicit port, the key per-host quotas and whitelisting use
pub fn host_key(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host.to_string()),
    }
}

/// Derives the flat file name a page is saved under
///
/// Every "/" in the URL is replaced by [`DOC_NAME_SEPARATOR`], so the name
/// never contains a path separator.
///
/// # Example
///
/// ```
/// use sumi_spider::doc_name;
/// use url::Url;
///
/// let url = Url::parse("http://h/a/b").unwrap();
/// assert_eq!(doc_name(&url), "http:_-__-_h_-_a_-_b");
/// ```
pub fn doc_name(url: &Url) -> String {
    url.as_str().replace('/', DOC_NAME_SEPARATOR)
}
