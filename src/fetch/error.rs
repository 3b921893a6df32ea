//! Fetch error type. One variant per way a single GET can fail.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} when fetching: {url}")]
    Http { status: u16, url: String },

    #[error("Network error: could not reach {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read response body from {url}: {source}")]
    BodyRead {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Used by non-HTTP `Fetch` implementations.
    #[error("Fetch failed for {url}: {message}")]
    Other { url: String, message: String },
}

impl FetchError {
    /// Status code for HTTP-level failures, None for transport failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
