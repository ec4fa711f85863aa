//! Log ingest: marker-filtered, restartable line streams over a capture file
//!
//! Every call to [`LogIngest::lines`] reopens the file, so iterating twice
//! yields identical sequences.

use crate::error::{AnalyzeError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// A log line that carries the marker token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredLine {
    /// 1-based line number in the capture
    pub line_no: usize,
    pub text: String,
}

/// Handle on one log capture
#[derive(Debug, Clone)]
pub struct LogIngest {
    path: PathBuf,
    /// Lowercased marker for case-insensitive matching
    marker: String,
}

impl LogIngest {
    /// Open a capture for filtered reading
    ///
    /// # Errors
    /// Returns [`AnalyzeError::Input`] if the file does not exist or cannot be
    /// opened for reading.
    pub fn open<P: AsRef<Path>>(path: P, marker: &str) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        File::open(&path).map_err(|e| AnalyzeError::input(&path, e))?;

        Ok(Self {
            path,
            marker: marker.to_lowercase(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lazily stream the lines containing the marker
    pub fn lines(&self) -> Result<FilteredLines> {
        let file = File::open(&self.path).map_err(|e| AnalyzeError::input(&self.path, e))?;
        tracing::debug!(path = %self.path.display(), "reading log capture");

        Ok(FilteredLines {
            path: self.path.clone(),
            marker: self.marker.clone(),
            inner: BufReader::new(file),
            buf: Vec::new(),
            line_no: 0,
        })
    }

    /// Case-insensitive substring match against the marker
    pub fn matches(&self, line: &str) -> bool {
        matches_marker(line, &self.marker)
    }
}

fn matches_marker(line: &str, lowercase_marker: &str) -> bool {
    lowercase_marker.is_empty() || line.to_lowercase().contains(lowercase_marker)
}

/// Iterator over marker lines of one capture
pub struct FilteredLines {
    path: PathBuf,
    marker: String,
    inner: BufReader<File>,
    buf: Vec<u8>,
    line_no: usize,
}

impl Iterator for FilteredLines {
    type Item = Result<FilteredLine>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.inner.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(AnalyzeError::input(&self.path, e))),
            }
            self.line_no += 1;

            // Kernel logs occasionally carry non-UTF-8 bytes
            let line = String::from_utf8_lossy(&self.buf)
                .trim_end_matches(['\n', '\r'])
                .to_string();

            if matches_marker(&line, &self.marker) {
                return Some(Ok(FilteredLine {
                    line_no: self.line_no,
                    text: line,
                }));
            }
        }
    }
}
