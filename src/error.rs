//! Error types for log analysis
//!
//! I/O failures are fatal for a run; `ParseError` is per-line and never
//! aborts parsing.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised by the analysis pipeline
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("Failed to read input log {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl AnalyzeError {
    pub fn input(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Input {
            path: path.into(),
            source,
        }
    }

    pub fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Output {
            path: path.into(),
            source,
        }
    }
}

/// Non-fatal error for a single log line that could not be interpreted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed {kind} line: \"{line}\"")]
    Malformed { kind: &'static str, line: String },

    #[error("invalid {field} value '{value}'")]
    InvalidField { field: &'static str, value: String },

    #[error("missing {field} field in \"{line}\"")]
    MissingField { field: &'static str, line: String },

    #[error("unknown line: \"{0}\"")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, AnalyzeError>;
