//! Fetching the danmaku XML. The job talks to a [Fetch] implementation; [DmClient] is the HTTP one.

mod client;
mod error;

pub use client::{DmClient, DmClientBuilder, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
pub use error::FetchError;

/// Default download endpoint. `{id}` is replaced with the sound id.
pub const DEFAULT_ENDPOINT: &str = "https://www.missevan.com/sound/getdm?soundid={id}";

/// One GET per call, body returned as raw bytes on a 2xx response.
pub trait Fetch {
    fn fetch(&mut self, url: &str) -> Result<Vec<u8>, FetchError>;
}
