//! Frequency bucketing and per-bucket cost estimation
//!
//! Samples are partitioned by frequency, then each bucket is reduced to one
//! [`EnergyResult`]. Reduction sorts the bucket before doing any arithmetic,
//! so the result does not depend on the order samples arrived in.

use crate::sample::{EnergyResult, FrequencyBucket, Sample};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// How a bucket of samples is reduced to one cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Estimator {
    /// Time-weighted mean when every sample has a timestamp, arithmetic mean otherwise
    #[default]
    WeightedMean,
    /// Midpoint of min and max after dropping outliers beyond `outlier_sigma`
    Midrange,
}

/// Where a cluster's samples were read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleOrigin {
    /// `cluster= freq= val=` lines
    #[default]
    KeyValue,
    /// Power readings between sultan_bench START and STOP lines
    Session,
}

impl SampleOrigin {
    /// Estimator used when none is configured
    ///
    /// Power-meter readings are noisy, so session data is outlier-trimmed.
    pub fn default_estimator(self) -> Estimator {
        match self {
            SampleOrigin::KeyValue => Estimator::WeightedMean,
            SampleOrigin::Session => Estimator::Midrange,
        }
    }
}

/// Reduces samples to per-frequency energy results
#[derive(Debug, Clone)]
pub struct Aggregator {
    estimator: Estimator,
    outlier_sigma: f64,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(Estimator::default(), 1.5)
    }
}

impl Aggregator {
    pub fn new(estimator: Estimator, outlier_sigma: f64) -> Self {
        Self {
            estimator,
            outlier_sigma,
        }
    }

    /// Partition samples into one bucket per frequency, ascending
    pub fn bucket(samples: &[Sample]) -> Vec<FrequencyBucket> {
        let mut buckets: BTreeMap<u64, Vec<Sample>> = BTreeMap::new();
        for sample in samples {
            buckets
                .entry(sample.frequency)
                .or_default()
                .push(sample.clone());
        }

        buckets
            .into_iter()
            .map(|(frequency, samples)| FrequencyBucket { frequency, samples })
            .collect()
    }

    /// One result per distinct frequency, ascending
    pub fn aggregate(&self, samples: &[Sample]) -> Vec<EnergyResult> {
        Self::bucket(samples)
            .iter()
            .map(|bucket| self.reduce(bucket))
            .collect()
    }

    /// Reduce a single bucket
    pub fn reduce(&self, bucket: &FrequencyBucket) -> EnergyResult {
        let average_cost = match self.estimator {
            Estimator::WeightedMean => weighted_mean(&bucket.samples),
            Estimator::Midrange => {
                let values: Vec<f64> = bucket.samples.iter().map(|s| s.value).collect();
                midrange(&values, self.outlier_sigma)
            }
        };

        EnergyResult {
            frequency: bucket.frequency,
            average_cost,
            sample_count: bucket.samples.len(),
        }
    }
}

fn by_value(a: &f64, b: &f64) -> Ordering {
    a.total_cmp(b)
}

fn arithmetic_mean(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(by_value);
    sorted.iter().sum::<f64>() / sorted.len() as f64
}

/// Time-weighted mean over a bucket
///
/// With timestamps on every sample, the value is integrated over time with
/// the trapezoid rule and divided by the covered span. Without them (or
/// with a zero span) this is the arithmetic mean. Empty buckets yield 0.
pub fn weighted_mean(samples: &[Sample]) -> f64 {
    match samples {
        [] => 0.0,
        [only] => only.value,
        _ => {
            let timed: Option<Vec<(u64, f64)>> = samples
                .iter()
                .map(|s| s.timestamp.map(|ts| (ts, s.value)))
                .collect();

            let Some(mut timed) = timed else {
                let values: Vec<f64> = samples.iter().map(|s| s.value).collect();
                return arithmetic_mean(&values);
            };
            timed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| by_value(&a.1, &b.1)));

            let span = timed[timed.len() - 1].0 - timed[0].0;
            if span == 0 {
                let values: Vec<f64> = timed.iter().map(|&(_, v)| v).collect();
                return arithmetic_mean(&values);
            }

            let area: f64 = timed
                .windows(2)
                .map(|w| (w[0].1 + w[1].1) / 2.0 * (w[1].0 - w[0].0) as f64)
                .sum();
            area / span as f64
        }
    }
}

/// Midrange of the values left after outlier removal
///
/// A value is an outlier when its distance from the mean exceeds
/// `sigma` sample standard deviations.
pub fn midrange(values: &[f64], sigma: f64) -> f64 {
    match values {
        [] => 0.0,
        [only] => *only,
        _ => {
            let mut values = values.to_vec();
            values.sort_by(by_value);

            let mean = values.iter().sum::<f64>() / values.len() as f64;
            let threshold = sample_stddev(&values, mean) * sigma;

            let kept: Vec<f64> = values
                .iter()
                .copied()
                .filter(|x| (x - mean).abs() <= threshold)
                .collect();
            // Only reachable with a zero cutoff
            let kept = if kept.is_empty() { values } else { kept };

            let min = kept.iter().copied().min_by(by_value).unwrap_or(0.0);
            let max = kept.iter().copied().max_by(by_value).unwrap_or(0.0);
            (min + max) / 2.0
        }
    }
}

/// Standard deviation with Bessel's correction (n - 1); needs two or more values
fn sample_stddev(values: &[f64], mean: f64) -> f64 {
    let squares: f64 = values.iter().map(|x| (x - mean).powi(2)).sum();
    (squares / (values.len() - 1) as f64).sqrt()
}

/// Median of benchmark completion times
///
/// Odd counts return the middle time exactly; even counts average the two
/// middle times.
pub fn median(values: &[u64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let mid = sorted.len() / 2;
    match sorted.len() {
        0 => None,
        n if n % 2 == 1 => Some(sorted[mid] as f64),
        _ => Some((sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0),
    }
}
