//! sultan_bench session tracking
//!
//! The kernel benchmark walks each frequency of a cluster in turn:
//!
//! ```text
//! sultan_bench: START: CPU4: [ 825600 kHz]     (one per core)
//! sultan_bench: power usage [ 812 mW]          (from the power thread)
//! sultan_bench: STOP: CPU4: [ 825600 kHz] [  123456 us]
//! ```
//!
//! [`BenchSession`] replays those events, turning power readings into
//! [`Sample`]s and collecting completion times per frequency. Anything that
//! does not fit the sequence is kept as a [`Diagnostic`] instead of failing.

use crate::parser::Record;
use crate::sample::Sample;
use std::collections::BTreeMap;
use std::fmt;

/// A non-fatal note about the log, tied to its line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line_no: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line_no, self.message)
    }
}

/// Data gathered from one session
#[derive(Debug, Clone, Default)]
pub struct SessionOutcome {
    pub cluster: String,
    /// Power readings of completed frequencies, in log order
    pub samples: Vec<Sample>,
    /// Completion times (us) per frequency (kHz)
    pub stop_times: BTreeMap<u64, Vec<u64>>,
    /// Cores that reported START for the first frequency
    pub cores: u32,
    pub diagnostics: Vec<Diagnostic>,
}

impl SessionOutcome {
    /// True if the log contained any benchmark session events
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty() && self.stop_times.is_empty() && self.cores == 0
    }
}

/// Frequency currently being benchmarked
#[derive(Debug)]
struct ActiveFreq {
    freq_khz: u64,
    /// Power readings are accepted until the first matching STOP
    benching: bool,
    power_mw: Vec<u64>,
    times_us: Vec<u64>,
}

/// State machine over START / power / STOP events for one log
#[derive(Debug)]
pub struct BenchSession {
    cluster: String,
    active: Option<ActiveFreq>,
    counting_cores: bool,
    outcome: SessionOutcome,
}

impl BenchSession {
    pub fn new(cluster: impl Into<String>) -> Self {
        let cluster = cluster.into();
        Self {
            cluster: cluster.clone(),
            active: None,
            counting_cores: true,
            outcome: SessionOutcome {
                cluster,
                ..SessionOutcome::default()
            },
        }
    }

    /// Record a note for the parse log
    pub fn note(&mut self, line_no: usize, message: impl Into<String>) {
        self.outcome.diagnostics.push(Diagnostic {
            line_no,
            message: message.into(),
        });
    }

    /// Apply one session event
    pub fn feed(&mut self, line_no: usize, record: &Record) {
        match *record {
            Record::Start { cpu, freq_khz } => self.start(line_no, cpu, freq_khz),
            Record::Power { power_mw } => self.power(line_no, power_mw),
            Record::Stop {
                cpu,
                freq_khz,
                time_us,
            } => self.stop(line_no, cpu, freq_khz, time_us),
            Record::Sample(_) => {}
        }
    }

    fn start(&mut self, line_no: usize, cpu: u32, freq_khz: u64) {
        if self.counting_cores {
            self.outcome.cores += 1;
        }

        // Every core prints START for the same frequency
        if self.active.as_ref().map(|a| a.freq_khz) == Some(freq_khz) {
            return;
        }

        self.finish_active(line_no);
        tracing::trace!(cluster = %self.cluster, cpu, freq_khz, "frequency started");
        self.active = Some(ActiveFreq {
            freq_khz,
            benching: true,
            power_mw: Vec::new(),
            times_us: Vec::new(),
        });
    }

    fn power(&mut self, line_no: usize, power_mw: u64) {
        match self.active.as_mut() {
            Some(active) if active.benching => active.power_mw.push(power_mw),
            // The power thread runs independently of the benchmark
            _ => self.note(line_no, format!("Ignored stray power value: {} mW", power_mw)),
        }
    }

    fn stop(&mut self, line_no: usize, cpu: u32, freq_khz: u64, time_us: u64) {
        match self.active.as_mut() {
            Some(active) if active.freq_khz == freq_khz => {
                self.counting_cores = false;
                active.times_us.push(time_us);
                active.benching = false;
                tracing::trace!(cluster = %self.cluster, cpu, freq_khz, time_us, "frequency stopped");
            }
            Some(_) => self.note(
                line_no,
                format!(
                    "Ignored performance value ({} us) for {} kHz; there may be synchronization issues",
                    time_us, freq_khz
                ),
            ),
            None => self.note(
                line_no,
                format!(
                    "Ignored stray performance value: {} us; log may be incomplete",
                    time_us
                ),
            ),
        }
    }

    /// Commit the active frequency if it has both power and time readings
    fn finish_active(&mut self, line_no: usize) {
        let Some(active) = self.active.take() else {
            return;
        };

        if active.power_mw.is_empty() || active.times_us.is_empty() {
            self.note(
                line_no,
                format!("Ignored incomplete frequency: {} kHz", active.freq_khz),
            );
            return;
        }

        self.outcome.samples.extend(
            active
                .power_mw
                .iter()
                .map(|&mw| Sample::new(self.cluster.clone(), active.freq_khz, mw as f64)),
        );
        self.outcome
            .stop_times
            .entry(active.freq_khz)
            .or_default()
            .extend(active.times_us);
    }

    /// Close the last frequency and hand back everything collected
    pub fn finish(mut self, last_line_no: usize) -> SessionOutcome {
        self.finish_active(last_line_no);
        tracing::debug!(
            cluster = %self.cluster,
            cores = self.outcome.cores,
            frequencies = self.outcome.stop_times.len(),
            "session finished"
        );
        self.outcome
    }
}
