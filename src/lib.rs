//! # icpsr-filter
//!
//! Pulls the records for a single state out of the (very large) ICPSR NIBRS
//! fixed-width extract files.
//!
//! Every record line carries a two-letter state code at column 101. The
//! filter streams each input once, keeps the lines whose code matches, and
//! writes them unchanged to one output file per input, named after the code
//! and the input's position in the list (`CA-1.txt`, `CA-2.txt`, ...).
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use icpsr_filter::filter_files;
//! use std::path::Path;
//!
//! let report = filter_files(&["DS0001/data.txt", "DS0002/data.txt"], "OH", Path::new("filtered"))?;
//! for (input, output) in report.mapping() {
//!     println!("{input} -> {}", output.display());
//! }
//! # Ok::<(), icpsr_filter::FilterError>(())
//! ```
//!
//! ## Command Line
//!
//! ```bash
//! icpsr-filter filter --code OH --output-dir filtered DS0001/data.txt DS0002/data.txt
//! ```

pub mod cli;
pub mod config;
pub mod filter;
pub mod parallel;

pub use config::{AppConfig, FilterConfig};
pub use filter::{
    FieldSpec, FileOutcome, FileStatus, FilterError, FilterReport, LineFilter, UnreadablePolicy,
    filter_files,
};

/// Result type alias for application-level operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
