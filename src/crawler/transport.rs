//! HTTP transport
//!
//! This module handles all HTTP requests for the crawler, including:
//! - The narrow [`Transport`] capability the workers fetch through
//! - Building the reqwest client with configurable TLS validation
//! - Setting the crawler's user agent on every request that lacks one

use crate::command::Command;
use crate::config::HttpConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue, USER_AGENT};
use reqwest::{Client, Method};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Network, timeout or TLS failure while performing a request
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),

    #[error("{0}")]
    Other(String),
}

/// A completed HTTP exchange
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// True when the status means the page should not be processed
    pub fn is_failure(&self) -> bool {
        self.status >= 400
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Capability to perform a single HTTP request
#[async_trait]
pub trait Transport: Send + Sync {
    async fn perform(
        &self,
        method: &Method,
        url: &Url,
        headers: &HeaderMap,
    ) -> Result<FetchResponse, TransportError>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Builds the transport from the HTTP configuration
    ///
    /// # Arguments
    ///
    /// * `config` - Timeout and TLS settings
    ///
    /// # Returns
    ///
    /// * `Ok(HttpTransport)` - Successfully built HTTP client
    /// * `Err(TransportError)` - Failed to build client
    pub fn new(config: &HttpConfig) -> Result<Self, TransportError> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn perform(
        &self,
        method: &Method,
        url: &Url,
        headers: &HeaderMap,
    ) -> Result<FetchResponse, TransportError> {
        let response = self
            .client
            .request(method.clone(), url.clone())
            .headers(headers.clone())
            .send()
            .await?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(FetchResponse {
            status,
            headers,
            body,
        })
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects follow reqwest's default policy. Certificate validation is
/// disabled only when `accept_invalid_certs` is set, for crawl targets
/// using self-signed certificates.
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(config.timeout())
        .connect_timeout(Duration::from_secs(10))
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Issues commands through a [`Transport`] with the crawler's user agent
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    user_agent: HeaderValue,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>, user_agent: &str) -> Result<Self, TransportError> {
        Ok(Self {
            transport,
            user_agent: HeaderValue::from_str(user_agent)?,
        })
    }

    /// Fetches a command with no extra headers
    pub async fn fetch(&self, command: &Command) -> Result<FetchResponse, TransportError> {
        self.fetch_with(command, HeaderMap::new()).await
    }

    /// Fetches a command, adding `User-Agent` when `headers` has none
    pub async fn fetch_with(
        &self,
        command: &Command,
        mut headers: HeaderMap,
    ) -> Result<FetchResponse, TransportError> {
        if !headers.contains_key(USER_AGENT) {
            headers.insert(USER_AGENT, self.user_agent.clone());
        }
        self.transport
            .perform(command.method(), command.url(), &headers)
            .await
    }

    pub fn user_agent(&self) -> &HeaderValue {
        &self.user_agent
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}
