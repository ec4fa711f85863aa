//! Core data model: samples, frequency buckets and derived energy results

use serde::{Deserialize, Serialize};

/// One measured value at one CPU frequency
///
/// Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Cluster label (e.g. "big", "little", "cl0")
    pub cluster: String,
    /// Frequency as reported by the log (sultan_bench reports kHz)
    pub frequency: u64,
    /// Monotonic timestamp, if the log line carried one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    /// Measured energy or counter value
    pub value: f64,
}

impl Sample {
    pub fn new(cluster: impl Into<String>, frequency: u64, value: f64) -> Self {
        Self {
            cluster: cluster.into(),
            frequency,
            timestamp: None,
            value,
        }
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// All samples collected while the CPU ran at one frequency, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyBucket {
    pub frequency: u64,
    pub samples: Vec<Sample>,
}

/// Average cost of one frequency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyResult {
    pub frequency: u64,
    pub average_cost: f64,
    pub sample_count: usize,
}

/// Cost joined with benchmark completion time for one frequency
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreqProfile {
    pub freq_khz: u64,
    pub power_mw: f64,
    pub time_us: f64,
}

impl FreqProfile {
    /// Power scaled by relative slowness: mW per unit of reference performance
    pub fn mw_per_perf(&self, reference_time_us: f64) -> f64 {
        self.power_mw * self.time_us / reference_time_us
    }
}
