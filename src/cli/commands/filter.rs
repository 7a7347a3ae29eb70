use anyhow::{Context, Result, bail};
use clap::Args;
use std::path::PathBuf;

use crate::cli::Output;
use crate::config::{AppConfig, ProcessingMode};
use crate::filter::{FileStatus, FilterReport, LineFilter};
use crate::parallel::{ExecutionStrategy, FilterProgress};

#[derive(Args)]
pub struct FilterArgs {
    /// Input files, processed and numbered in the order given
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Code the field must equal (e.g. a two-letter state code)
    #[arg(short = 's', long = "code", alias = "state", value_name = "CODE")]
    pub code: String,

    /// Existing directory that receives <CODE>-<N>.txt files
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Zero-based byte offset of the field (default: 100)
    #[arg(long)]
    pub position: Option<usize>,

    /// Field width in bytes (default: 2)
    #[arg(long)]
    pub length: Option<usize>,

    /// Processing mode: auto (by file count), parallel, or sequential
    #[arg(long, value_enum)]
    pub mode: Option<ProcessingMode>,

    /// Maximum worker threads (0 = no limit)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Treat unreadable inputs as empty instead of failing them
    #[arg(long)]
    pub allow_unreadable: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: ReportFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    /// Human-readable text output
    Text,
    /// JSON format
    Json,
}

impl FilterArgs {
    /// Only the settings given on the command line, shaped like the config file
    fn config_overrides(&self) -> serde_json::Value {
        let mut overrides = serde_json::json!({});
        if let Some(position) = self.position {
            overrides["field"]["position"] = position.into();
        }
        if let Some(length) = self.length {
            overrides["field"]["length"] = length.into();
        }
        if let Some(mode) = self.mode {
            overrides["parallel"]["mode"] = serde_json::to_value(mode).unwrap_or_default();
        }
        if let Some(threads) = self.threads {
            overrides["parallel"]["max_threads"] = threads.into();
        }
        if self.allow_unreadable {
            overrides["input"]["unreadable"] = "empty".into();
        }
        overrides
    }
}

pub async fn execute(args: FilterArgs, config_path: Option<&str>, output: &Output) -> Result<()> {
    let overrides = args.config_overrides();
    let config = AppConfig::load(config_path, Some(&overrides))?.filter_config()?;
    let filter = LineFilter::new(&config);

    let is_parallel = matches!(
        filter.strategy_for(args.files.len()),
        ExecutionStrategy::Parallel { .. }
    );
    let progress = if output.is_quiet() || args.format == ReportFormat::Json {
        FilterProgress::hidden()
    } else {
        FilterProgress::new(args.files.len(), is_parallel)
    };

    output.verbose(&format!(
        "Field at byte {} ({} wide), {} input file(s)",
        config.field.position,
        config.field.length,
        args.files.len()
    ));

    let FilterArgs {
        files,
        code,
        output_dir,
        format,
        ..
    } = args;
    let reporter = progress.clone();

    let report = tokio::task::spawn_blocking(move || {
        filter.filter_with_progress(
            &files,
            &code,
            &output_dir,
            Some(move |completed: usize, total: usize, worker_id: usize| {
                reporter.update(completed, total, worker_id)
            }),
        )
    })
    .await
    .context("Filter task failed")??;

    progress.finish();

    match format {
        ReportFormat::Text => print_text(&report, output),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report_json(&report))?),
    }

    if !report.is_success() {
        bail!(
            "{} of {} file(s) could not be filtered",
            report.files_failed(),
            report.len()
        );
    }

    Ok(())
}

fn print_text(report: &FilterReport, output: &Output) {
    for outcome in &report.outcomes {
        let action = format!("{} → {}", outcome.input.display(), outcome.output.display());
        match &outcome.status {
            FileStatus::Filtered(stats) => output.action_result(
                &action,
                &format!("{} of {} lines", stats.lines_selected, stats.lines_read),
                true,
            ),
            FileStatus::Failed(err) => {
                output.action_result(&action, "failed", false);
                output.error(&err.to_string());
            }
        }
    }

    if report.is_success() {
        output.success(&format!(
            "Filtered {} file(s) for {:?}: {} of {} lines selected in {:.2}s",
            report.len(),
            report.target_code,
            report.lines_selected(),
            report.lines_read(),
            report.duration.as_secs_f64()
        ));
    } else {
        output.warning(&format!(
            "{} of {} file(s) failed",
            report.files_failed(),
            report.len()
        ));
    }
}

fn report_json(report: &FilterReport) -> serde_json::Value {
    let files: Vec<serde_json::Value> = report
        .outcomes
        .iter()
        .map(|outcome| match &outcome.status {
            FileStatus::Filtered(stats) => serde_json::json!({
                "index": outcome.index,
                "input": outcome.input.display().to_string(),
                "output": outcome.output.display().to_string(),
                "status": "filtered",
                "lines_read": stats.lines_read,
                "lines_selected": stats.lines_selected,
            }),
            FileStatus::Failed(err) => serde_json::json!({
                "index": outcome.index,
                "input": outcome.input.display().to_string(),
                "output": outcome.output.display().to_string(),
                "status": "failed",
                "error": err.to_string(),
            }),
        })
        .collect();

    let mapping: serde_json::Map<String, serde_json::Value> = report
        .mapping()
        .into_iter()
        .map(|(input, output)| (input, output.display().to_string().into()))
        .collect();

    serde_json::json!({
        "target_code": report.target_code,
        "output_dir": report.output_dir.display().to_string(),
        "mapping": mapping,
        "files": files,
        "lines_read": report.lines_read(),
        "lines_selected": report.lines_selected(),
        "duration_ms": report.duration.as_millis() as u64,
    })
}
