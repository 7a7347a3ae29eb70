//! Configuration management for icpsr-filter
//!
//! Typed settings for the filter plus the layered loader in [`core`]. The
//! defaults below mirror `default-config.toml`, so library callers can build a
//! [`FilterConfig`] without touching the filesystem.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

pub mod core;

pub use self::core::AppConfig;

use crate::filter::{FieldSpec, UnreadablePolicy};

/// Complete filter configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Location of the compared field
    #[serde(default)]
    pub field: FieldSpec,

    /// Input handling
    #[serde(default)]
    pub input: InputConfig,

    /// Worker pool settings
    #[serde(default)]
    pub parallel: ParallelConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default)]
    pub unreadable: UnreadablePolicy,
}

/// How input files are scheduled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    /// Parallel once the file count reaches `min_files_for_parallel`
    #[default]
    Auto,
    /// One file at a time, in input order
    Sequential,
    /// Always use the worker pool
    Parallel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelConfig {
    #[serde(default)]
    pub mode: ProcessingMode,

    /// Maximum number of worker threads (0 = no explicit limit)
    #[serde(default)]
    pub max_threads: usize,

    /// Percentage of CPU cores to use (1-100)
    #[serde(default = "default_thread_percentage")]
    pub thread_percentage: u8,

    /// Minimum file count before `auto` switches to the worker pool
    #[serde(default = "default_min_files_for_parallel")]
    pub min_files_for_parallel: usize,
}

fn default_thread_percentage() -> u8 {
    75
}

fn default_min_files_for_parallel() -> usize {
    4
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            mode: ProcessingMode::Auto,
            max_threads: 0,
            thread_percentage: default_thread_percentage(),
            min_files_for_parallel: default_min_files_for_parallel(),
        }
    }
}

impl FilterConfig {
    /// Reject settings the filter cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.field.length == 0 {
            bail!("field.length must be greater than zero");
        }
        if self.field.end().is_none() {
            bail!("field.position + field.length overflows");
        }
        if !(1..=100).contains(&self.parallel.thread_percentage) {
            bail!(
                "parallel.thread_percentage must be between 1 and 100, got {}",
                self.parallel.thread_percentage
            );
        }
        Ok(())
    }
}
