//! Log line parser
//!
//! Understands two line syntaxes:
//! - key/value samples: `sultan_bench: cluster=big freq=1900800 [ts=123] val=120`
//! - sultan_bench session events (`START`, `power usage`, `STOP`)
//!
//! Parsing is best-effort: a line that cannot be interpreted yields a
//! [`ParseError`] and the caller moves on.

use crate::error::ParseError;
use crate::sample::Sample;
use regex::Regex;

/// One interpreted log line
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Self-describing key/value sample
    Sample(Sample),
    /// A core switched to a frequency and started benchmarking it
    Start { cpu: u32, freq_khz: u64 },
    /// Power meter reading (from a separate sampling thread)
    Power { power_mw: u64 },
    /// A core finished benchmarking a frequency
    Stop { cpu: u32, freq_khz: u64, time_us: u64 },
}

/// Compiled line patterns
#[derive(Debug, Clone)]
pub struct LineParser {
    kv_field: Regex,
    cluster_label: Regex,
    start: Regex,
    power: Regex,
    stop: Regex,
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LineParser {
    pub fn new() -> Self {
        Self {
            kv_field: pattern(r"(?i)\b(cluster|freq|ts|val)=(\S*)"),
            cluster_label: pattern(r"^[A-Za-z0-9_-]+$"),
            start: pattern(r"START: CPU(\d+): \[\s*(\d+) kHz\]"),
            power: pattern(r"power usage \[\s*(\d+) mW\]"),
            stop: pattern(r"STOP: CPU(\d+): \[\s*(\d+) kHz\] \[\s*(\d+) us\]"),
        }
    }

    /// Interpret one marker line
    pub fn parse(&self, line: &str) -> Result<Record, ParseError> {
        if self.kv_field.is_match(line) {
            return self.parse_kv(line).map(Record::Sample);
        }

        if line.contains("START") {
            let caps = self.start.captures(line).ok_or_else(|| malformed("START", line))?;
            Ok(Record::Start {
                cpu: number("cpu", &caps[1])?,
                freq_khz: number("freq", &caps[2])?,
            })
        } else if line.contains("power usage") {
            let caps = self
                .power
                .captures(line)
                .ok_or_else(|| malformed("power usage", line))?;
            Ok(Record::Power {
                power_mw: number("power", &caps[1])?,
            })
        } else if line.contains("STOP") {
            let caps = self.stop.captures(line).ok_or_else(|| malformed("STOP", line))?;
            Ok(Record::Stop {
                cpu: number("cpu", &caps[1])?,
                freq_khz: number("freq", &caps[2])?,
                time_us: number("time", &caps[3])?,
            })
        } else {
            Err(ParseError::Unknown(line.trim().to_string()))
        }
    }

    /// Parse `key=value` fields in any order; `ts` is optional
    fn parse_kv(&self, line: &str) -> Result<Sample, ParseError> {
        let mut cluster = None;
        let mut freq = None;
        let mut ts = None;
        let mut val = None;

        for caps in self.kv_field.captures_iter(line) {
            let value = caps.get(2).map_or("", |m| m.as_str());
            match caps[1].to_ascii_lowercase().as_str() {
                "cluster" => cluster = Some(value),
                "freq" => freq = Some(value),
                "ts" => ts = Some(value),
                _ => val = Some(value),
            }
        }

        let missing = |field| ParseError::MissingField {
            field,
            line: line.trim().to_string(),
        };

        let cluster = cluster.ok_or_else(|| missing("cluster"))?;
        if !self.cluster_label.is_match(cluster) {
            return Err(invalid("cluster", cluster));
        }
        let frequency = number("freq", freq.ok_or_else(|| missing("freq"))?)?;

        let raw_val = val.ok_or_else(|| missing("val"))?;
        let value: f64 = raw_val.parse().map_err(|_| invalid("val", raw_val))?;
        if !value.is_finite() {
            return Err(invalid("val", raw_val));
        }

        let mut sample = Sample::new(cluster, frequency, value);
        if let Some(ts) = ts {
            sample = sample.with_timestamp(number("ts", ts)?);
        }
        Ok(sample)
    }
}

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("static log pattern must compile")
}

fn number<T: std::str::FromStr>(field: &'static str, raw: &str) -> Result<T, ParseError> {
    raw.parse().map_err(|_| invalid(field, raw))
}

fn invalid(field: &'static str, value: &str) -> ParseError {
    ParseError::InvalidField {
        field,
        value: value.to_string(),
    }
}

fn malformed(kind: &'static str, line: &str) -> ParseError {
    ParseError::Malformed {
        kind,
        line: line.trim().to_string(),
    }
}
