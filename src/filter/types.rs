use std::path::PathBuf;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::error::FilterError;

/// Location of the compared field inside every record line.
///
/// `position` is a zero-based byte offset and `length` a byte count. ICPSR
/// NIBRS extracts carry the state code at column 101 (1-based), two bytes wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSpec {
    pub position: usize,
    pub length: usize,
}

impl FieldSpec {
    /// State code field of the ICPSR NIBRS flat files
    pub const ICPSR_STATE: FieldSpec = FieldSpec {
        position: 100,
        length: 2,
    };

    pub fn new(position: usize, length: usize) -> Self {
        Self { position, length }
    }

    /// Exclusive end offset of the field, `None` on overflow
    pub fn end(&self) -> Option<usize> {
        self.position.checked_add(self.length)
    }

    /// True when `line` is long enough to hold the field and the field
    /// bytes equal `target` exactly.
    ///
    /// A target whose length differs from `self.length` never matches.
    pub fn selects(&self, line: &[u8], target: &[u8]) -> bool {
        match self.end() {
            Some(end) => line.get(self.position..end) == Some(target),
            None => false,
        }
    }
}

impl Default for FieldSpec {
    fn default() -> Self {
        Self::ICPSR_STATE
    }
}

/// What to do with an input file that cannot be opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnreadablePolicy {
    /// Report the file as failed and create no output for it
    #[default]
    Error,
    /// Treat the input as empty and produce a zero-length output file
    Empty,
}

/// Line counters for a single scanned stream
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LineStats {
    pub lines_read: u64,
    pub lines_selected: u64,
}

#[derive(Debug)]
pub enum FileStatus {
    Filtered(LineStats),
    Failed(FilterError),
}

/// Result of processing one input file
#[derive(Debug)]
pub struct FileOutcome {
    /// 1-based position of the input in the original list
    pub index: usize,
    pub input: PathBuf,
    pub output: PathBuf,
    pub status: FileStatus,
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, FileStatus::Filtered(_))
    }

    pub fn stats(&self) -> Option<LineStats> {
        match self.status {
            FileStatus::Filtered(stats) => Some(stats),
            FileStatus::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&FilterError> {
        match &self.status {
            FileStatus::Failed(err) => Some(err),
            FileStatus::Filtered(_) => None,
        }
    }
}

/// Outcome of a whole filter call, one entry per supplied input in input order
#[derive(Debug)]
pub struct FilterReport {
    pub target_code: String,
    pub output_dir: PathBuf,
    pub outcomes: Vec<FileOutcome>,
    pub duration: Duration,
}

impl FilterReport {
    /// Input path → output path.
    ///
    /// Repeated input paths keep the position of their first occurrence and
    /// the output path of their last.
    pub fn mapping(&self) -> IndexMap<String, PathBuf> {
        let mut mapping = IndexMap::with_capacity(self.outcomes.len());
        for outcome in &self.outcomes {
            mapping.insert(
                outcome.input.to_string_lossy().into_owned(),
                outcome.output.clone(),
            );
        }
        mapping
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.is_success())
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(FileOutcome::is_success)
    }

    pub fn files_failed(&self) -> usize {
        self.failures().count()
    }

    pub fn lines_read(&self) -> u64 {
        self.outcomes
            .iter()
            .filter_map(FileOutcome::stats)
            .map(|stats| stats.lines_read)
            .sum()
    }

    pub fn lines_selected(&self) -> u64 {
        self.outcomes
            .iter()
            .filter_map(FileOutcome::stats)
            .map(|stats| stats.lines_selected)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
