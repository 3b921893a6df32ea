//! The batch job: for each entry extract the id, fetch, and write `<name>.xml` into the output dir.
//!
//! Entries are processed one at a time in input order. A failing entry never stops the run;
//! it is reported through the `on_entry` callback and left out of the success count.

use crate::fetch::{Fetch, FetchError, DEFAULT_ENDPOINT};
use crate::identifier::{download_url, extract_id};
use crate::input::LoadedInput;
use crate::model::{Entry, InputSource, Summary};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Settings for one run. Passed in rather than read from globals.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub output_dir: PathBuf,
    /// Download URL template; `{id}` is replaced with the sound id.
    pub endpoint: String,
    /// Do not fetch entries whose output file already exists.
    pub skip_existing: bool,
}

impl JobConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            skip_existing: false,
        }
    }
}

/// Run-level failure. Only setup can fail the whole job.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Per-entry failure after an id was found.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What happened to one entry.
#[derive(Debug)]
pub enum EntryOutcome {
    /// Fetched and written.
    Saved { path: PathBuf, bytes: usize },
    /// Output file already present and `skip_existing` is set. Counts as a success.
    Exists { path: PathBuf },
    /// No id could be extracted from the source URL.
    Skipped,
    Failed { url: String, error: EntryError },
}

impl EntryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, EntryOutcome::Saved { .. } | EntryOutcome::Exists { .. })
    }
}

/// Resolved work for one entry, without any I/O. Used for dry runs and by [run_job].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEntry {
    pub entry: Entry,
    /// None when no id could be extracted; the entry will be skipped.
    pub target: Option<Target>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub id: String,
    pub url: String,
    pub path: PathBuf,
}

/// Characters that cannot appear in a file name on common filesystems.
fn is_forbidden(c: char) -> bool {
    matches!(c, '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|')
}

/// Replace every forbidden filename character with `_`.
pub fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect()
}

/// Output file name: `<sanitized-title>.xml` for structured input, `<position>-<id>.xml` otherwise.
/// An empty title falls back to the positional name.
pub fn output_filename(source: InputSource, entry: &Entry, id: &str) -> String {
    if source == InputSource::Structured {
        let name = sanitize_label(&entry.label);
        if !name.is_empty() {
            return format!("{}.xml", name);
        }
    }
    format!("{}-{}.xml", entry.position, id)
}

/// Resolve id, download URL and output path for every entry.
pub fn plan(config: &JobConfig, input: &LoadedInput) -> Vec<PlannedEntry> {
    input
        .entries
        .iter()
        .map(|entry| {
            let target = extract_id(&entry.source_url).map(|id| Target {
                id: id.to_string(),
                url: download_url(&config.endpoint, id),
                path: config
                    .output_dir
                    .join(output_filename(input.source, entry, id)),
            });
            PlannedEntry {
                entry: entry.clone(),
                target,
            }
        })
        .collect()
}

/// Create the output directory if absent. Idempotent.
pub fn prepare_output_dir(dir: &Path) -> Result<(), JobError> {
    std::fs::create_dir_all(dir).map_err(|e| JobError::OutputDir {
        path: dir.to_path_buf(),
        source: e,
    })
}

/// Process every entry in order and return the tally.
///
/// `on_entry` is called once per entry, right after it is processed.
pub fn run_job(
    config: &JobConfig,
    input: &LoadedInput,
    fetcher: &mut dyn Fetch,
    on_entry: Option<&dyn Fn(&Entry, &EntryOutcome)>,
) -> Result<Summary, JobError> {
    prepare_output_dir(&config.output_dir)?;

    let mut success = 0;
    let mut written: HashSet<PathBuf> = HashSet::new();
    for planned in plan(config, input) {
        let outcome = match &planned.target {
            None => {
                tracing::debug!(
                    position = planned.entry.position,
                    url = %planned.entry.source_url,
                    "no sound id"
                );
                EntryOutcome::Skipped
            }
            Some(target) => process(config, target, fetcher, &mut written),
        };
        if outcome.is_success() {
            success += 1;
        }
        if let Some(cb) = on_entry {
            cb(&planned.entry, &outcome);
        }
    }

    Ok(Summary {
        source: input.source,
        total: input.entries.len(),
        success,
    })
}

fn process(
    config: &JobConfig,
    target: &Target,
    fetcher: &mut dyn Fetch,
    written: &mut HashSet<PathBuf>,
) -> EntryOutcome {
    if config.skip_existing && target.path.exists() {
        tracing::debug!(path = %target.path.display(), "already present, not fetching");
        return EntryOutcome::Exists {
            path: target.path.clone(),
        };
    }

    let result = fetcher
        .fetch(&target.url)
        .map_err(EntryError::from)
        .and_then(|data| {
            std::fs::write(&target.path, &data)
                .map(|()| data.len())
                .map_err(|e| EntryError::Write {
                    path: target.path.clone(),
                    source: e,
                })
        });

    match result {
        Ok(bytes) => {
            if !written.insert(target.path.clone()) {
                tracing::warn!(
                    path = %target.path.display(),
                    "overwrote a file written earlier in this run"
                );
            }
            tracing::info!(id = %target.id, path = %target.path.display(), bytes, "saved");
            EntryOutcome::Saved {
                path: target.path.clone(),
                bytes,
            }
        }
        Err(error) => {
            tracing::debug!(url = %target.url, %error, "entry failed");
            EntryOutcome::Failed {
                url: target.url.clone(),
                error,
            }
        }
    }
}
