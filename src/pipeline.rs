//! End-to-end batch run: ingest -> parse -> aggregate -> emit
//!
//! Analysis finishes before anything is written, so an unreadable input
//! never leaves a half-populated output directory behind.

use crate::aggregate::SampleOrigin;
use crate::analysis::{self, StatRow};
use crate::config::AnalyzerConfig;
use crate::energy_model::{EnergyModel, KeyType, ValueType};
use crate::error::{AnalyzeError, Result};
use crate::ingest::LogIngest;
use crate::parser::{LineParser, Record};
use crate::report::{render_parse_log, ReportEmitter};
use crate::sample::{EnergyResult, FreqProfile, Sample};
use crate::session::{BenchSession, SessionOutcome};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Inputs of one run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub inputs: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub config: AnalyzerConfig,
}

/// Everything extracted from one input capture
#[derive(Debug, Clone)]
pub struct LogAnalysis {
    pub path: PathBuf,
    /// Key/value samples, labelled by their own cluster field
    pub samples: Vec<Sample>,
    /// sultan_bench session data, labelled by input position
    pub session: SessionOutcome,
    pub matched_lines: usize,
    pub skipped_lines: usize,
}

/// Aggregated data of one cluster
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterReport {
    pub cluster: String,
    /// One per distinct frequency, ascending
    pub results: Vec<EnergyResult>,
    /// Frequencies with both a cost and a benchmark time, ascending
    pub profiles: Vec<FreqProfile>,
}

/// Result of analysing all inputs
#[derive(Debug, Clone)]
pub struct Analysis {
    pub logs: Vec<LogAnalysis>,
    /// Clusters in order of first appearance
    pub clusters: Vec<ClusterReport>,
}

impl Analysis {
    pub fn skipped_lines(&self) -> usize {
        self.logs.iter().map(|l| l.skipped_lines).sum()
    }

    pub fn cluster(&self, name: &str) -> Option<&ClusterReport> {
        self.clusters.iter().find(|c| c.cluster == name)
    }
}

/// Outcome of a complete run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub analysis: Analysis,
    pub files: Vec<PathBuf>,
}

/// Label given to session data from the input at `index`
pub fn session_label(index: usize) -> String {
    format!("cl{}", index)
}

/// Parse one capture
pub fn analyze_log(
    path: &Path,
    index: usize,
    marker: &str,
    parser: &LineParser,
) -> Result<LogAnalysis> {
    let ingest = LogIngest::open(path, marker)?;
    let mut session = BenchSession::new(session_label(index));
    let mut samples = Vec::new();
    let mut matched_lines = 0;
    let mut skipped_lines = 0;
    let mut last_line_no = 0;

    for line in ingest.lines()? {
        let line = line?;
        matched_lines += 1;
        last_line_no = line.line_no;

        match parser.parse(&line.text) {
            Ok(Record::Sample(sample)) => samples.push(sample),
            Ok(record) => session.feed(line.line_no, &record),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    line = line.line_no,
                    "skipping line: {}",
                    e
                );
                session.note(line.line_no, e.to_string());
                skipped_lines += 1;
            }
        }
    }

    tracing::info!(
        path = %path.display(),
        matched_lines,
        skipped_lines,
        samples = samples.len(),
        "parsed log"
    );

    Ok(LogAnalysis {
        path: path.to_path_buf(),
        samples,
        session: session.finish(last_line_no),
        matched_lines,
        skipped_lines,
    })
}

#[derive(Default)]
struct ClusterData {
    origin: SampleOrigin,
    samples: Vec<Sample>,
    stop_times: BTreeMap<u64, Vec<u64>>,
}

/// Parse every input and aggregate per cluster
pub fn analyze<P: AsRef<Path>>(inputs: &[P], config: &AnalyzerConfig) -> Result<Analysis> {
    config.validate().map_err(AnalyzeError::Config)?;

    let parser = LineParser::new();
    let logs = inputs
        .iter()
        .enumerate()
        .map(|(index, path)| analyze_log(path.as_ref(), index, &config.marker, &parser))
        .collect::<Result<Vec<_>>>()?;

    // Vec keeps first-appearance order for cluster numbering in the energy model
    let mut clusters: Vec<(String, ClusterData)> = Vec::new();
    let mut entry = |label: &str| -> usize {
        match clusters.iter().position(|(name, _)| name == label) {
            Some(i) => i,
            None => {
                clusters.push((label.to_string(), ClusterData::default()));
                clusters.len() - 1
            }
        }
    };

    let mut assignments: Vec<(usize, &Sample)> = Vec::new();
    let mut timings: Vec<(usize, &BTreeMap<u64, Vec<u64>>)> = Vec::new();
    for log in &logs {
        for sample in &log.samples {
            assignments.push((entry(&sample.cluster), sample));
        }
        if !log.session.is_empty() {
            let i = entry(&log.session.cluster);
            assignments.extend(log.session.samples.iter().map(|s| (i, s)));
            timings.push((i, &log.session.stop_times));
        }
    }

    for (i, sample) in assignments {
        clusters[i].1.samples.push(sample.clone());
    }
    for (i, stop_times) in timings {
        // Session data decides the estimator of a cluster it feeds into
        clusters[i].1.origin = SampleOrigin::Session;
        for (freq, times) in stop_times {
            clusters[i]
                .1
                .stop_times
                .entry(*freq)
                .or_default()
                .extend(times);
        }
    }

    let clusters = clusters
        .into_iter()
        .map(|(cluster, data)| {
            let results = config.aggregator(data.origin).aggregate(&data.samples);
            let profiles = analysis::profiles(&results, &data.stop_times);
            tracing::debug!(
                cluster = %cluster,
                origin = ?data.origin,
                frequencies = results.len(),
                profiled = profiles.len(),
                "aggregated cluster"
            );
            ClusterReport {
                cluster,
                results,
                profiles,
            }
        })
        .collect();

    Ok(Analysis { logs, clusters })
}

/// Write every artifact for an analysis
pub fn emit(
    analyzed: &Analysis,
    output_dir: &Path,
    config: &AnalyzerConfig,
) -> Result<Vec<PathBuf>> {
    let mut emitter = ReportEmitter::create(output_dir, config.format)?;

    for log in &analyzed.logs {
        let cluster = analyzed
            .cluster(&log.session.cluster)
            .filter(|_| !log.session.is_empty());
        let results = cluster.map_or(&[][..], |c| c.results.as_slice());
        let profiles = cluster.map_or(&[][..], |c| c.profiles.as_slice());
        emitter.write(
            &format!("{}_parse.log", log.session.cluster),
            &render_parse_log(&log.path, &log.session, results, profiles),
        )?;
    }

    let mut power_models = Vec::new();
    let mut eff_models = Vec::new();

    for cluster in &analyzed.clusters {
        emitter.write_energy_costs(&cluster.cluster, &cluster.results)?;

        let Some(reference) = analysis::reference_time(&cluster.profiles) else {
            continue;
        };
        let name = cluster.cluster.as_str();

        emitter.write_c_table(name, &cluster.profiles)?;
        let by_khz: Vec<StatRow> = analysis::stat_rows(&cluster.profiles, reference);
        emitter.write_stat_table(name, "stats_by_khz", &by_khz)?;

        let eff_sorted = analysis::sort_by_efficiency(&cluster.profiles, reference);
        emitter.write_stat_table(
            name,
            "stats_by_eff",
            &analysis::stat_rows(&eff_sorted, reference),
        )?;

        let efficient = analysis::efficient_frequencies(&eff_sorted);
        emitter.write_stat_table(
            name,
            "efficient_freqs",
            &analysis::stat_rows(&efficient, reference),
        )?;

        power_models.push(cluster.profiles.clone());
        // Cost tables are keyed by frequency, so restore ascending order
        let mut efficient = efficient;
        efficient.sort_by_key(|p| p.freq_khz);
        eff_models.push(efficient);
    }

    if !power_models.is_empty() {
        let params = config.energy_model_params();
        let power = EnergyModel::new(&power_models, &params);
        let eff = EnergyModel::new(&eff_models, &params);

        for key in KeyType::ALL {
            emitter.write(
                &EnergyModel::file_name(key, ValueType::Power),
                &power.to_dtsi(key, ValueType::Power),
            )?;
        }
        for key in KeyType::ALL {
            emitter.write(
                &EnergyModel::file_name(key, ValueType::Eff),
                &eff.to_dtsi(key, ValueType::Eff),
            )?;
        }
    }

    Ok(emitter.into_written())
}

/// Analyze all inputs and write the reports
pub fn run(options: &RunOptions) -> Result<RunSummary> {
    let analysis = analyze(options.inputs.as_slice(), &options.config)?;
    let files = emit(&analysis, &options.output_dir, &options.config)?;

    tracing::info!(
        clusters = analysis.clusters.len(),
        files = files.len(),
        output_dir = %options.output_dir.display(),
        "run complete"
    );

    Ok(RunSummary { analysis, files })
}
