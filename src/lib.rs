//! dmfetch: batch downloader for Missevan danmaku XML, driven by link.json or link.txt.

pub mod cli;
pub mod config;
pub mod fetch;
pub mod identifier;
pub mod input;
pub mod job;
pub mod logging;
pub mod model;

// Re-exports for CLI and consumers.
pub use fetch::{DmClient, DmClientBuilder, Fetch, FetchError};
pub use identifier::extract_id;
pub use input::{load_input, InputError, InputPaths, LoadedInput};
pub use job::{run_job, EntryError, EntryOutcome, JobConfig, JobError};
pub use model::{Entry, InputSource, Summary};
