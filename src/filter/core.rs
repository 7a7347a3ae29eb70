use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::{FilterConfig, ParallelConfig, ProcessingMode};
use crate::parallel::ExecutionStrategy;

use super::error::{FilterError, FilterResult};
use super::types::{FieldSpec, FileOutcome, FileStatus, FilterReport, LineStats, UnreadablePolicy};

// Fixed buffer sizes: per-file memory never depends on input size
const READ_BUFFER_BYTES: usize = 256 * 1024;
const WRITE_BUFFER_BYTES: usize = 128 * 1024;

/// Output path for the `index`-th input (1-based): `<dir>/<code>-<index>.txt`.
///
/// Depends only on position, never on the input file name. The name is
/// appended to `output_dir` as text, so a code starting with a separator
/// still lands under `output_dir`.
pub fn output_path_for(output_dir: &Path, target_code: &str, index: usize) -> PathBuf {
    let mut path = output_dir.as_os_str().to_owned();
    path.push(format!("/{target_code}-{index}.txt"));
    PathBuf::from(path)
}

/// Copy every line of `reader` whose field equals `target` into `writer`.
///
/// Lines are split on `\n` only and copied byte for byte, each followed by a
/// single `\n`. A final line without a delimiter is still considered. Memory
/// use is one line buffer regardless of input size.
pub fn filter_stream<R: BufRead, W: Write>(
    mut reader: R,
    mut writer: W,
    field: FieldSpec,
    target: &[u8],
) -> io::Result<LineStats> {
    let mut stats = LineStats::default();
    let mut line = Vec::with_capacity(512);

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        if line.last() == Some(&b'\n') {
            line.pop();
        }

        stats.lines_read += 1;
        if field.selects(&line, target) {
            writer.write_all(&line)?;
            writer.write_all(b"\n")?;
            stats.lines_selected += 1;
        }
    }

    writer.flush()?;
    Ok(stats)
}

/// Filters fixed-width flat files down to the records carrying one code.
///
/// ```rust,no_run
/// use icpsr_filter::LineFilter;
/// use std::path::Path;
///
/// let filter = LineFilter::default();
/// let report = filter.filter(&["incidents-1.txt", "incidents-2.txt"], "CA", Path::new("out"))?;
/// for (input, output) in report.mapping() {
///     println!("{input} -> {}", output.display());
/// }
/// # Ok::<(), icpsr_filter::FilterError>(())
/// ```
#[derive(Debug, Clone)]
pub struct LineFilter {
    field: FieldSpec,
    unreadable: UnreadablePolicy,
    parallel: ParallelConfig,
}

impl Default for LineFilter {
    fn default() -> Self {
        Self::new(&FilterConfig::default())
    }
}

impl LineFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            field: config.field,
            unreadable: config.input.unreadable,
            parallel: config.parallel.clone(),
        }
    }

    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.field = field;
        self
    }

    pub fn with_unreadable_policy(mut self, policy: UnreadablePolicy) -> Self {
        self.unreadable = policy;
        self
    }

    pub fn with_mode(mut self, mode: ProcessingMode) -> Self {
        self.parallel.mode = mode;
        self
    }

    pub fn field(&self) -> FieldSpec {
        self.field
    }

    /// Resolve the configured mode against the number of input files
    pub fn strategy_for(&self, file_count: usize) -> ExecutionStrategy {
        let max_workers = ExecutionStrategy::calculate_optimal_workers(
            self.parallel.max_threads,
            self.parallel.thread_percentage,
        );
        // No point in more workers than files
        let workers = std::cmp::min(max_workers, file_count.max(1));

        match self.parallel.mode {
            ProcessingMode::Sequential => ExecutionStrategy::Sequential,
            ProcessingMode::Parallel => ExecutionStrategy::Parallel { workers },
            ProcessingMode::Auto => {
                ExecutionStrategy::auto(file_count, self.parallel.min_files_for_parallel, workers)
            }
        }
    }

    /// Filter every input into `output_dir`, one output file per input.
    ///
    /// Fails as a whole only when `output_dir` is unusable or a worker
    /// panics. Per-file failures are recorded in the report and the batch
    /// continues.
    pub fn filter<P: AsRef<Path>>(
        &self,
        input_paths: &[P],
        target_code: &str,
        output_dir: &Path,
    ) -> FilterResult<FilterReport> {
        self.filter_with_progress(
            input_paths,
            target_code,
            output_dir,
            None::<fn(usize, usize, usize)>,
        )
    }

    /// Same as [`LineFilter::filter`], calling `progress(completed, total, worker_id)`
    /// after each file.
    pub fn filter_with_progress<P, F>(
        &self,
        input_paths: &[P],
        target_code: &str,
        output_dir: &Path,
        progress: Option<F>,
    ) -> FilterResult<FilterReport>
    where
        P: AsRef<Path>,
        F: Fn(usize, usize, usize) + Sync,
    {
        let start = Instant::now();
        check_output_dir(output_dir)?;

        if target_code.len() != self.field.length {
            tracing::warn!(
                "Target code {:?} is {} bytes but the field is {} bytes wide; no line can match",
                target_code,
                target_code.len(),
                self.field.length
            );
        }

        // Capture positions before dispatch so naming never depends on completion order
        let work_items: Vec<(usize, PathBuf)> = input_paths
            .iter()
            .enumerate()
            .map(|(i, path)| (i + 1, path.as_ref().to_path_buf()))
            .collect();

        let strategy = self.strategy_for(work_items.len());
        tracing::info!(
            "Filtering {} file(s) for code {:?} into {} ({:?})",
            work_items.len(),
            target_code,
            output_dir.display(),
            strategy
        );

        let outcomes = strategy
            .execute(
                work_items,
                |(index, input), _worker_id| self.filter_file(*index, input, target_code, output_dir),
                progress,
            )
            .map_err(|err| {
                tracing::error!("Parallel filtering aborted: {}", err);
                FilterError::WorkerPanic
            })?;

        let report = FilterReport {
            target_code: target_code.to_string(),
            output_dir: output_dir.to_path_buf(),
            outcomes,
            duration: start.elapsed(),
        };

        tracing::info!(
            "Filtered {} file(s) in {:.2}s: {} of {} lines selected, {} failed",
            report.len(),
            report.duration.as_secs_f64(),
            report.lines_selected(),
            report.lines_read(),
            report.files_failed()
        );

        Ok(report)
    }

    /// Process one input; `index` is its 1-based position in the batch
    pub fn filter_file(
        &self,
        index: usize,
        input: &Path,
        target_code: &str,
        output_dir: &Path,
    ) -> FileOutcome {
        let output = output_path_for(output_dir, target_code, index);

        let status = match self.scan_file(input, &output, target_code) {
            Ok(stats) => {
                tracing::debug!(
                    "[{}] {} -> {}: {} of {} lines selected",
                    index,
                    input.display(),
                    output.display(),
                    stats.lines_selected,
                    stats.lines_read
                );
                FileStatus::Filtered(stats)
            }
            Err(err) => {
                tracing::warn!("[{}] {}", index, err);
                FileStatus::Failed(err)
            }
        };

        FileOutcome {
            index,
            input: input.to_path_buf(),
            output,
            status,
        }
    }

    fn scan_file(&self, input: &Path, output: &Path, target_code: &str) -> FilterResult<LineStats> {
        let reader = match File::open(input) {
            Ok(file) => Some(BufReader::with_capacity(READ_BUFFER_BYTES, file)),
            Err(source) => match self.unreadable {
                UnreadablePolicy::Error => {
                    remove_stale_output(output);
                    return Err(FilterError::UnreadableInput {
                        input: input.to_path_buf(),
                        source,
                    });
                }
                UnreadablePolicy::Empty => {
                    tracing::warn!(
                        "Cannot open {} ({}); writing an empty output",
                        input.display(),
                        source
                    );
                    None
                }
            },
        };

        let file = File::create(output).map_err(|source| FilterError::UnwritableOutput {
            output: output.to_path_buf(),
            source,
        })?;
        let writer = BufWriter::with_capacity(WRITE_BUFFER_BYTES, file);

        // Both handles are dropped on every return path below
        match reader {
            Some(reader) => filter_stream(reader, writer, self.field, target_code.as_bytes())
                .map_err(|source| FilterError::Scan {
                    input: input.to_path_buf(),
                    output: output.to_path_buf(),
                    source,
                }),
            None => Ok(LineStats::default()),
        }
    }
}

/// An output left by an earlier run must not pass for this run's result
fn remove_stale_output(output: &Path) {
    match fs::remove_file(output) {
        Ok(()) => tracing::debug!("Removed stale output {}", output.display()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => tracing::warn!("Cannot remove stale output {}: {}", output.display(), err),
    }
}

fn check_output_dir(output_dir: &Path) -> FilterResult<()> {
    match fs::metadata(output_dir) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(FilterError::OutputDirectory {
            path: output_dir.to_path_buf(),
            reason: "not a directory".to_string(),
        }),
        Err(err) => Err(FilterError::OutputDirectory {
            path: output_dir.to_path_buf(),
            reason: err.to_string(),
        }),
    }
}

/// Filter with the ICPSR state field and default settings
pub fn filter_files<P: AsRef<Path>>(
    input_paths: &[P],
    target_code: &str,
    output_dir: &Path,
) -> FilterResult<FilterReport> {
    LineFilter::default().filter(input_paths, target_code, output_dir)
}
