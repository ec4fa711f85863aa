use anyhow::{Context, Result};
use benchcost::cli::{Cli, Command, RunArgs};
use benchcost::pipeline::{self, RunOptions, RunSummary};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Print a per-cluster overview of what was found and written
fn print_summary(summary: &RunSummary) {
    println!("Parsing data...");
    for log in &summary.analysis.logs {
        println!(
            "    • {} ({} lines matched, {} skipped)",
            log.path.display(),
            log.matched_lines,
            log.skipped_lines
        );
        if log.session.cores > 0 {
            println!("        > Found {} cores", log.session.cores);
        }
    }

    println!();
    println!("Processing data...");
    if summary.analysis.clusters.is_empty() {
        println!("    • No benchmark samples found");
    }
    for cluster in &summary.analysis.clusters {
        println!(
            "    • Cluster {}: {} frequencies, {} with performance data",
            cluster.cluster,
            cluster.results.len(),
            cluster.profiles.len()
        );
    }

    println!();
    println!("Wrote {} files", summary.files.len());
    for file in &summary.files {
        println!("    • {}", file.display());
    }
}

fn run(args: &RunArgs) -> Result<()> {
    let config = args.resolve_config()?;
    let options = RunOptions {
        inputs: args.input_logs.clone(),
        output_dir: args.output_dir.clone(),
        config,
    };

    let summary = pipeline::run(&options).with_context(|| {
        format!(
            "Failed to analyze logs into {}",
            options.output_dir.display()
        )
    })?;
    print_summary(&summary);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(cli.debug);

    match &cli.command {
        Command::Run(args) => run(args),
    }
}
