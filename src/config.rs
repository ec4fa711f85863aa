// Analyzer configuration
//
// Loaded from an optional TOML file; command-line flags override file values.

use crate::aggregate::{Aggregator, Estimator, SampleOrigin};
use crate::energy_model::{CostRange, EnergyModelParams};
use crate::report::ReportFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for log analysis and report generation
///
/// # Example
/// ```
/// use benchcost::config::AnalyzerConfig;
///
/// let config = AnalyzerConfig::default();
/// assert_eq!(config.marker, "sultan_bench");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Token that marks benchmark lines in the kernel log (case-insensitive)
    pub marker: String,

    /// Per-frequency cost estimator
    ///
    /// Unset: weighted mean for key/value samples, midrange for session data
    pub estimator: Option<Estimator>,

    /// Outlier cutoff for the midrange estimator, in standard deviations
    ///
    /// Default: 1.5
    pub outlier_sigma: f64,

    /// Energy-cost table format
    pub format: ReportFormat,

    /// SCHED_CAPACITY_SCALE used for capacity keys and efficiency costs
    pub capacity_scale: u32,

    /// Number of CPU nodes in the generated device tree
    pub cpus: u32,

    /// Old minimum EAS core cost to normalize onto (requires `old_max_cost`)
    pub old_min_cost: Option<u32>,

    /// Old maximum EAS core cost to normalize onto (requires `old_min_cost`)
    pub old_max_cost: Option<u32>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            marker: "sultan_bench".to_string(),
            estimator: None,
            outlier_sigma: 1.5,
            format: ReportFormat::Tsv,
            capacity_scale: 1024,
            cpus: 8,
            old_min_cost: None,
            old_max_cost: None,
        }
    }
}

impl AnalyzerConfig {
    /// Settings for power-meter captures from the sultan_bench kernel patch
    ///
    /// Every cluster uses the outlier-trimmed midrange, key/value samples included.
    pub fn sultan_bench() -> Self {
        Self {
            estimator: Some(Estimator::Midrange),
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file
    ///
    /// # Example TOML
    /// ```toml
    /// marker = "sultan_bench"
    /// estimator = "midrange"
    /// outlier_sigma = 2.0
    /// old_min_cost = 12
    /// old_max_cost = 780
    /// ```
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read config file: {}", path.as_ref().display())
        })?;

        toml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse TOML configuration: {}",
                path.as_ref().display()
            )
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.marker.trim().is_empty() {
            return Err("marker must not be empty".to_string());
        }

        if !self.outlier_sigma.is_finite() || self.outlier_sigma < 0.0 {
            return Err(format!(
                "outlier_sigma must be non-negative, got {}",
                self.outlier_sigma
            ));
        }

        if self.capacity_scale == 0 {
            return Err("capacity_scale must be positive".to_string());
        }

        match (self.old_min_cost, self.old_max_cost) {
            (Some(min), Some(max)) if min >= max => Err(format!(
                "old_min_cost ({}) must be less than old_max_cost ({})",
                min, max
            )),
            (Some(_), None) | (None, Some(_)) => {
                Err("old_min_cost and old_max_cost must be given together".to_string())
            }
            _ => Ok(()),
        }
    }

    /// Estimator for samples from `origin`
    pub fn estimator_for(&self, origin: SampleOrigin) -> Estimator {
        self.estimator.unwrap_or_else(|| origin.default_estimator())
    }

    pub fn aggregator(&self, origin: SampleOrigin) -> Aggregator {
        Aggregator::new(self.estimator_for(origin), self.outlier_sigma)
    }

    pub fn energy_model_params(&self) -> EnergyModelParams {
        let normalize = match (self.old_min_cost, self.old_max_cost) {
            (Some(min), Some(max)) => Some(CostRange {
                min: min as f64,
                max: max as f64,
            }),
            _ => None,
        };

        EnergyModelParams {
            capacity_scale: self.capacity_scale,
            cpus: self.cpus,
            normalize,
        }
    }
}
