//! Performance/efficiency analysis over per-frequency profiles
//!
//! Efficiency is expressed as mW per unit of performance, relative to the
//! lowest frequency's completion time. Lower is better.

use crate::aggregate::median;
use crate::sample::{EnergyResult, FreqProfile};
use std::collections::BTreeMap;

/// One row of a statistics table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatRow {
    pub freq_khz: u64,
    pub power_mw: f64,
    pub time_us: f64,
    /// Speedup over the reference (lowest) frequency
    pub perf_ratio: f64,
    /// mW per unit of reference performance
    pub mw_per_perf: f64,
}

/// Join costs with median completion times, ascending by frequency
///
/// Frequencies that lack either a cost or a time are left out.
pub fn profiles(results: &[EnergyResult], stop_times: &BTreeMap<u64, Vec<u64>>) -> Vec<FreqProfile> {
    let mut profiles: Vec<FreqProfile> = results
        .iter()
        .filter_map(|result| {
            let time_us = median(stop_times.get(&result.frequency)?)?;
            Some(FreqProfile {
                freq_khz: result.frequency,
                power_mw: result.average_cost,
                time_us,
            })
        })
        .filter(|p| p.time_us > 0.0)
        .collect();
    profiles.sort_by_key(|p| p.freq_khz);
    profiles
}

/// Completion time of the lowest frequency
pub fn reference_time(profiles: &[FreqProfile]) -> Option<f64> {
    profiles.iter().min_by_key(|p| p.freq_khz).map(|p| p.time_us)
}

/// Statistics rows in the given order
pub fn stat_rows(profiles: &[FreqProfile], reference_time_us: f64) -> Vec<StatRow> {
    profiles
        .iter()
        .map(|p| StatRow {
            freq_khz: p.freq_khz,
            power_mw: p.power_mw,
            time_us: p.time_us,
            perf_ratio: reference_time_us / p.time_us,
            mw_per_perf: p.mw_per_perf(reference_time_us),
        })
        .collect()
}

/// Profiles ordered from most to least efficient
pub fn sort_by_efficiency(profiles: &[FreqProfile], reference_time_us: f64) -> Vec<FreqProfile> {
    let mut sorted = profiles.to_vec();
    // Stable sort keeps frequency order between equally efficient entries
    sorted.sort_by(|a, b| {
        a.mw_per_perf(reference_time_us)
            .total_cmp(&b.mw_per_perf(reference_time_us))
    });
    sorted
}

/// Drop frequencies that are less efficient than some lower frequency
///
/// Walks the efficiency-ordered list and keeps only entries whose frequency
/// is at least the highest one kept so far.
pub fn efficient_frequencies(eff_sorted: &[FreqProfile]) -> Vec<FreqProfile> {
    let mut last_freq_khz = 0;
    eff_sorted
        .iter()
        .filter(|p| {
            if p.freq_khz < last_freq_khz {
                return false;
            }
            last_freq_khz = p.freq_khz;
            true
        })
        .copied()
        .collect()
}
