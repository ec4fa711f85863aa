//! CLI argument parsing for benchcost

use crate::aggregate::Estimator;
use crate::config::AnalyzerConfig;
use crate::report::ReportFormat;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "benchcost")]
#[command(version)]
#[command(
    about = "Analyze sultan_bench CPU frequency benchmark logs and produce energy costs",
    long_about = None
)]
pub struct Cli {
    /// Enable debug tracing on stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse logs and write per-frequency cost tables, stats and EAS energy models
    ///
    /// The output directory is created if it does not exist. Existing output
    /// files in it are overwritten.
    Run(RunArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Logs to analyze (one per cluster for sultan_bench captures)
    #[arg(short = 'i', long = "input-logs", value_name = "LOG", num_args = 1.., required = true)]
    pub input_logs: Vec<PathBuf>,

    /// Directory to write results to
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Old min EAS core cost to normalize generated costs onto
    #[arg(short = 'n', long = "old-min-cost", value_name = "COST")]
    pub old_min_cost: Option<u32>,

    /// Old max EAS core cost to normalize generated costs onto
    #[arg(short = 'x', long = "old-max-cost", value_name = "COST")]
    pub old_max_cost: Option<u32>,

    /// Marker token identifying benchmark lines (case-insensitive)
    #[arg(long, value_name = "TOKEN")]
    pub marker: Option<String>,

    /// Per-frequency cost estimator [default: weighted-mean for key/value
    /// samples, midrange for START/STOP sessions]
    #[arg(long, value_enum)]
    pub estimator: Option<Estimator>,

    /// Energy-cost table format
    #[arg(long = "format", value_enum)]
    pub format: Option<ReportFormat>,

    /// TOML configuration file (flags take precedence)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl RunArgs {
    /// Merge the optional config file with command-line overrides
    pub fn resolve_config(&self) -> Result<AnalyzerConfig> {
        let mut config = match &self.config {
            Some(path) => AnalyzerConfig::from_toml(path)?,
            None => AnalyzerConfig::default(),
        };

        if let Some(marker) = &self.marker {
            config.marker = marker.clone();
        }
        if let Some(estimator) = self.estimator {
            config.estimator = Some(estimator);
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if self.old_min_cost.is_some() {
            config.old_min_cost = self.old_min_cost;
        }
        if self.old_max_cost.is_some() {
            config.old_max_cost = self.old_max_cost;
        }

        Ok(config)
    }
}
