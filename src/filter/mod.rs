//! Fixed-width record filtering
//!
//! Streams each input file line by line and keeps the lines whose field at
//! [`FieldSpec`] equals the target code. Every input gets its own output file
//! named `<code>-<index>.txt` after its 1-based position in the input list.

pub mod core;
pub mod error;
pub mod types;

pub use self::core::{LineFilter, filter_files, filter_stream, output_path_for};
pub use error::{FilterError, FilterResult};
pub use types::{FieldSpec, FileOutcome, FileStatus, FilterReport, LineStats, UnreadablePolicy};
