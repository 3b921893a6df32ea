//! Blocking HTTP client for the danmaku endpoint. One attempt per request, no retries.

use super::{Fetch, FetchError};
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
const MAX_REDIRECTS: usize = 10;

/// Blocking client with a fixed User-Agent and timeout.
#[derive(Debug)]
pub struct DmClient {
    inner: reqwest::blocking::Client,
}

impl DmClient {
    /// Client with the default User-Agent and 15 second timeout.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::builder().build()
    }

    pub fn builder() -> DmClientBuilder {
        DmClientBuilder::default()
    }
}

impl Fetch for DmClient {
    fn fetch(&mut self, url: &str) -> Result<Vec<u8>, FetchError> {
        tracing::debug!(%url, "GET");
        let response = self
            .inner
            .get(url)
            .send()
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                source: e,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let bytes = response.bytes().map_err(|e| FetchError::BodyRead {
            url: url.to_string(),
            source: e,
        })?;
        tracing::debug!(%url, len = bytes.len(), "response body read");
        Ok(bytes.to_vec())
    }
}

/// Builder for DmClient with optional User-Agent and timeout.
#[derive(Debug)]
pub struct DmClientBuilder {
    user_agent: Option<String>,
    timeout_secs: u64,
}

impl Default for DmClientBuilder {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl DmClientBuilder {
    /// Set a custom User-Agent. Default "Mozilla/5.0".
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set request timeout in seconds. Default 15.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn build(self) -> Result<DmClient, reqwest::Error> {
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let inner = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(self.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(DmClient { inner })
    }
}
