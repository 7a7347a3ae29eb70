use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for filter operations
pub type FilterResult<T> = std::result::Result<T, FilterError>;

/// Failures raised while filtering a batch of input files.
///
/// `OutputDirectory` and `WorkerPanic` abort the whole call. The remaining
/// variants are recorded against the single input they belong to and the
/// batch carries on with the next file.
#[derive(Error, Debug)]
pub enum FilterError {
    /// The output directory is missing or is not a directory
    #[error("output directory {}: {reason}", path.display())]
    OutputDirectory { path: PathBuf, reason: String },

    /// The input file could not be opened for reading
    #[error("cannot open input {}: {source}", input.display())]
    UnreadableInput {
        input: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The output file could not be created or truncated
    #[error("cannot create output {}: {source}", output.display())]
    UnwritableOutput {
        output: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading, writing or flushing failed part way through a file
    #[error("I/O failure filtering {} into {}: {source}", input.display(), output.display())]
    Scan {
        input: PathBuf,
        output: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("a filter worker thread panicked")]
    WorkerPanic,
}

impl FilterError {
    /// Whether this error ends the batch rather than a single file
    pub fn is_fatal(&self) -> bool {
        matches!(self, FilterError::OutputDirectory { .. } | FilterError::WorkerPanic)
    }
}
