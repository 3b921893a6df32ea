//! Input selection. `link.json` wins over `link.txt`; only one is ever read.

use crate::model::{Entry, InputSource, LinkRecord};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_JSON_FILE: &str = "link.json";
pub const DEFAULT_TXT_FILE: &str = "link.txt";

/// Errors reading a present input file. A missing file is not an error.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Cannot read input {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Where to look for the two input files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPaths {
    pub json: PathBuf,
    pub txt: PathBuf,
}

impl InputPaths {
    /// Default file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            json: dir.join(DEFAULT_JSON_FILE),
            txt: dir.join(DEFAULT_TXT_FILE),
        }
    }
}

/// Entries loaded from the selected source.
#[derive(Debug, Clone)]
pub struct LoadedInput {
    pub source: InputSource,
    pub path: PathBuf,
    pub entries: Vec<Entry>,
}

/// Pick and load the input. Returns Ok(None) when neither file exists.
pub fn load_input(paths: &InputPaths) -> Result<Option<LoadedInput>, InputError> {
    if paths.json.exists() {
        let s = read(&paths.json)?;
        let entries = parse_structured(&s).map_err(|e| InputError::Json {
            path: paths.json.clone(),
            source: e,
        })?;
        tracing::debug!(
            path = %paths.json.display(),
            count = entries.len(),
            "loaded structured input"
        );
        return Ok(Some(LoadedInput {
            source: InputSource::Structured,
            path: paths.json.clone(),
            entries,
        }));
    }
    if paths.txt.exists() {
        let s = read(&paths.txt)?;
        let entries = parse_plain_text(&s);
        tracing::debug!(
            path = %paths.txt.display(),
            count = entries.len(),
            "loaded plain-text input"
        );
        return Ok(Some(LoadedInput {
            source: InputSource::PlainText,
            path: paths.txt.clone(),
            entries,
        }));
    }
    Ok(None)
}

fn read(path: &Path) -> Result<String, InputError> {
    std::fs::read_to_string(path).map_err(|e| InputError::Read {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Parse a JSON array of records. Records without a string `title` and `link` are dropped.
/// Positions count kept entries only.
pub fn parse_structured(s: &str) -> Result<Vec<Entry>, serde_json::Error> {
    let records: Vec<serde_json::Value> = serde_json::from_str(s)?;
    let entries = records
        .into_iter()
        .filter_map(|v| serde_json::from_value::<LinkRecord>(v).ok())
        .enumerate()
        .map(|(i, r)| Entry::new(i + 1, r.title, r.link))
        .collect();
    Ok(entries)
}

/// One URL per line; lines are trimmed and blank ones skipped. Labels are "1".."N".
pub fn parse_plain_text(s: &str) -> Vec<Entry> {
    s.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .enumerate()
        .map(|(i, url)| Entry::new(i + 1, (i + 1).to_string(), url))
        .collect()
}
