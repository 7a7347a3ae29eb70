//! Command-line interface for icpsr-filter
//!
//! Thin clap front end over [`crate::filter::LineFilter`] for running the
//! filter as a standalone batch step.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

pub mod commands;
pub mod output;

pub use output::Output;

/// Extract single-state records from ICPSR NIBRS fixed-width files
#[derive(Parser)]
#[command(name = "icpsr-filter", author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use custom configuration file
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Filter input files down to the records carrying one code
    Filter(commands::filter::FilterArgs),
    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the merged configuration
    Show {
        /// Only this section, e.g. `field` or `parallel.mode`
        section: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "toml")]
        format: commands::config::ConfigFormat,
    },
    /// Check that the configuration loads and is valid
    Validate,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        setup_logging(self.verbose, self.quiet);

        let output = Output::new(self.verbose > 0, self.quiet);

        match self.command {
            Some(Commands::Filter(args)) => {
                commands::filter::execute(args, self.config.as_deref(), &output).await
            }
            Some(Commands::Config(cmd)) => {
                commands::config::execute(cmd, self.config.as_deref(), &output).await
            }
            Some(Commands::Version) => commands::version::execute(&output).await,
            None => {
                // Show help when no command is provided
                let mut cmd = Cli::command();
                cmd.print_help()?;
                Ok(())
            }
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info"),
            2 => tracing_subscriber::EnvFilter::new("debug"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    // stdout carries the report, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
