//! Report emitter: writes analysis artifacts into the output directory
//!
//! Rendering is kept separate from file I/O so every table can be checked
//! without touching the filesystem.

use crate::analysis::StatRow;
use crate::error::{AnalyzeError, Result};
use crate::sample::{EnergyResult, FreqProfile};
use crate::session::SessionOutcome;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Output format for energy-cost tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Tab-separated table (default)
    #[default]
    Tsv,
    /// CSV for spreadsheet analysis
    Csv,
    /// JSON for machine parsing
    Json,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Tsv => "tsv",
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
        }
    }
}

/// JSON document for one cluster's energy costs
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonEnergyCosts {
    pub cluster: String,
    pub results: Vec<EnergyResult>,
}

/// Escape CSV field (handle commas, quotes, newlines)
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render one cluster's energy-cost table
pub fn render_energy_costs(
    cluster: &str,
    results: &[EnergyResult],
    format: ReportFormat,
) -> Result<String> {
    let output = match format {
        ReportFormat::Json => {
            let doc = JsonEnergyCosts {
                cluster: cluster.to_string(),
                results: results.to_vec(),
            };
            let mut json = serde_json::to_string_pretty(&doc)?;
            json.push('\n');
            json
        }
        ReportFormat::Csv => {
            let mut output = String::from("cluster,frequency,average_cost,sample_count\n");
            for r in results {
                output.push_str(&format!(
                    "{},{},{},{}\n",
                    escape_field(cluster),
                    r.frequency,
                    r.average_cost,
                    r.sample_count
                ));
            }
            output
        }
        ReportFormat::Tsv => {
            let mut output = String::from("frequency\taverage_cost\tsample_count\n");
            for r in results {
                output.push_str(&format!(
                    "{}\t{}\t{}\n",
                    r.frequency, r.average_cost, r.sample_count
                ));
            }
            output
        }
    };
    Ok(output)
}

/// Render a C initializer table, flagging frequencies where power drops
pub fn render_c_table(profiles: &[FreqProfile]) -> String {
    let mut output = String::from("\t/* Format: { freq_khz, power_mw, time_us } */\n");
    let mut last_power_mw: Option<f64> = None;

    for p in profiles {
        if let Some(last) = last_power_mw.filter(|&last| last > p.power_mw) {
            output.push_str(&format!(
                "\t/* Power usage dropped: {:.1} -> {:.1} mW */\n",
                last, p.power_mw
            ));
        }
        output.push_str(&format!(
            "\t{{ {:>7}, {:>6.1}, {:>11.1} }},\n",
            p.freq_khz, p.power_mw, p.time_us
        ));
        last_power_mw = Some(p.power_mw);
    }

    output
}

/// Render a statistics table
pub fn render_stat_table(rows: &[StatRow]) -> String {
    let mut output =
        String::from("Frequency      Power          Speed          Perf Ratio  Efficiency\n\n");

    for row in rows {
        output.push_str(&format!(
            "{:>7} kHz\t {:>8.1} mW\t {:>9} us\t {:.3} x\t {:>5.1} mW/perf\n",
            row.freq_khz, row.power_mw, row.time_us as u64, row.perf_ratio, row.mw_per_perf
        ));
    }

    output
}

/// Render the parse log of one input capture
pub fn render_parse_log(
    input: &Path,
    outcome: &SessionOutcome,
    results: &[EnergyResult],
    profiles: &[FreqProfile],
) -> String {
    let mut output = format!(
        "Input: {}\nCluster: {}\nCores: {}\n",
        input.display(),
        outcome.cluster,
        outcome.cores
    );

    for result in results {
        output.push_str(&format!("\nFrequency: {} kHz\n", result.frequency));
        output.push_str(&format!(
            "  - Power usage: {} mW ({} samples)\n",
            result.average_cost, result.sample_count
        ));
        if let Some(p) = profiles.iter().find(|p| p.freq_khz == result.frequency) {
            output.push_str(&format!("  - Median performance: {} us\n", p.time_us));
        }
    }

    if !outcome.diagnostics.is_empty() {
        output.push_str(&format!("\nIgnored ({}):\n", outcome.diagnostics.len()));
        for diagnostic in &outcome.diagnostics {
            output.push_str(&format!("  * {}\n", diagnostic));
        }
    }

    output
}

/// Writes artifacts into one output directory
#[derive(Debug)]
pub struct ReportEmitter {
    dir: PathBuf,
    format: ReportFormat,
    written: Vec<PathBuf>,
}

impl ReportEmitter {
    /// Prepare the output directory, creating it if absent
    ///
    /// Existing files with the same names are overwritten.
    pub fn create<P: AsRef<Path>>(dir: P, format: ReportFormat) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| AnalyzeError::output(&dir, e))?;

        Ok(Self {
            dir,
            format,
            written: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files written so far, in order
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    pub fn into_written(self) -> Vec<PathBuf> {
        self.written
    }

    /// Write a named file into the output directory
    pub fn write(&mut self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.join(name);
        fs::write(&path, contents).map_err(|e| AnalyzeError::output(&path, e))?;
        tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote report file");
        self.written.push(path.clone());
        Ok(path)
    }

    pub fn write_energy_costs(&mut self, cluster: &str, results: &[EnergyResult]) -> Result<PathBuf> {
        let name = format!("{}_energy_costs.{}", cluster, self.format.extension());
        let contents = render_energy_costs(cluster, results, self.format)?;
        self.write(&name, &contents)
    }

    pub fn write_c_table(&mut self, cluster: &str, profiles: &[FreqProfile]) -> Result<PathBuf> {
        self.write(&format!("{}_data.c", cluster), &render_c_table(profiles))
    }

    pub fn write_stat_table(&mut self, cluster: &str, table: &str, rows: &[StatRow]) -> Result<PathBuf> {
        self.write(&format!("{}_{}.tsv", cluster, table), &render_stat_table(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Diagnostic;
    use tempfile::TempDir;

    fn results() -> Vec<EnergyResult> {
        vec![
            EnergyResult {
                frequency: 300_000,
                average_cost: 52.5,
                sample_count: 4,
            },
            EnergyResult {
                frequency: 1_900_800,
                average_cost: 130.0,
                sample_count: 3,
            },
        ]
    }

    #[test]
    fn test_tsv_energy_costs() {
        let tsv = render_energy_costs("big", &results(), ReportFormat::Tsv).unwrap();
        assert_eq!(
            tsv,
            "frequency\taverage_cost\tsample_count\n300000\t52.5\t4\n1900800\t130\t3\n"
        );
    }

    #[test]
    fn test_csv_energy_costs() {
        let csv = render_energy_costs("big", &results(), ReportFormat::Csv).unwrap();
        assert!(csv.starts_with("cluster,frequency,average_cost,sample_count\n"));
        assert!(csv.contains("big,1900800,130,3\n"));
    }

    #[test]
    fn test_json_energy_costs() {
        let json = render_energy_costs("big", &results(), ReportFormat::Json).unwrap();
        let doc: JsonEnergyCosts = serde_json::from_str(&json).unwrap();
        assert_eq!(doc.cluster, "big");
        assert_eq!(doc.results, results());
    }

    #[test]
    fn test_empty_table_has_header_only() {
        let tsv = render_energy_costs("big", &[], ReportFormat::Tsv).unwrap();
        assert_eq!(tsv, "frequency\taverage_cost\tsample_count\n");
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("big"), "big");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_c_table_flags_power_drop() {
        let profiles = vec![
            FreqProfile {
                freq_khz: 300_000,
                power_mw: 60.0,
                time_us: 8000.0,
            },
            FreqProfile {
                freq_khz: 403_200,
                power_mw: 55.0,
                time_us: 6000.0,
            },
        ];
        let table = render_c_table(&profiles);
        assert!(table.contains("\t{  300000,   60.0,      8000.0 },\n"));
        assert!(table.contains("/* Power usage dropped: 60.0 -> 55.0 mW */"));
    }

    #[test]
    fn test_stat_table_row() {
        let rows = vec![StatRow {
            freq_khz: 300_000,
            power_mw: 60.0,
            time_us: 8000.0,
            perf_ratio: 1.0,
            mw_per_perf: 60.0,
        }];
        let table = render_stat_table(&rows);
        assert!(table.contains(" 300000 kHz\t     60.0 mW\t      8000 us\t 1.000 x\t  60.0 mW/perf\n"));
    }

    #[test]
    fn test_parse_log_lists_diagnostics() {
        let outcome = SessionOutcome {
            cluster: "cl0".to_string(),
            cores: 4,
            diagnostics: vec![Diagnostic {
                line_no: 7,
                message: "Ignored stray power value: 999 mW".to_string(),
            }],
            ..SessionOutcome::default()
        };
        let log = render_parse_log(Path::new("big.log"), &outcome, &results(), &[]);
        assert!(log.contains("Cluster: cl0\nCores: 4\n"));
        assert!(log.contains("Frequency: 1900800 kHz"));
        assert!(log.contains("  * line 7: Ignored stray power value: 999 mW\n"));
    }

    #[test]
    fn test_emitter_creates_nested_dir() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("out").join("nested");
        let mut emitter = ReportEmitter::create(&dir, ReportFormat::Tsv).unwrap();

        let path = emitter.write_energy_costs("big", &results()).unwrap();
        assert_eq!(path, dir.join("big_energy_costs.tsv"));
        assert!(path.exists());
        assert_eq!(emitter.written().len(), 1);
    }

    #[test]
    fn test_emitter_fails_when_dir_is_a_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("taken");
        fs::write(&file, "x").unwrap();

        let err = ReportEmitter::create(&file, ReportFormat::Tsv).unwrap_err();
        assert!(matches!(err, AnalyzeError::Output { .. }));
    }
}
