//! Data model for one batch run: entries, input source, and summary.

use serde::Deserialize;

/// Which input file supplied the entry list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    /// `link.json`: records with explicit titles.
    Structured,
    /// `link.txt`: bare URLs, labels are positions.
    PlainText,
}

impl InputSource {
    /// Word used in the summary line for one item of this source.
    pub fn item_noun(self) -> &'static str {
        match self {
            InputSource::Structured => "records",
            InputSource::PlainText => "URLs",
        }
    }
}

/// One record of the structured input. Records that do not fit this shape are dropped at load time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LinkRecord {
    pub title: String,
    pub link: String,
}

/// One unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// 1-based position in the input.
    pub position: usize,
    /// Title from `link.json`, or the position as a string for `link.txt`.
    pub label: String,
    pub source_url: String,
}

impl Entry {
    pub fn new(position: usize, label: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            position,
            label: label.into(),
            source_url: source_url.into(),
        }
    }
}

/// Final tally of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub source: InputSource,
    pub total: usize,
    pub success: usize,
}

impl Summary {
    pub fn failed(&self) -> usize {
        self.total - self.success
    }
}
