//! Recorded process-value traces replayed as an acquisition source.

use std::path::Path;

use lc_controls::{Acquisition, AcquisitionError};

use crate::error::{CliError, CliResult};

/// Replays recorded readings in order. Past the end every read reports
/// data unavailable.
#[derive(Debug, Clone, Default)]
pub struct ReplayAcquisition {
    samples: Vec<Result<f64, AcquisitionError>>,
    next: usize,
}

impl ReplayAcquisition {
    pub fn new(samples: Vec<Result<f64, AcquisitionError>>) -> Self {
        Self { samples, next: 0 }
    }

    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CliError::TraceRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(parse_trace(&content)?))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Acquisition for ReplayAcquisition {
    fn read_process_value(&mut self) -> Result<f64, AcquisitionError> {
        let sample = self
            .samples
            .get(self.next)
            .cloned()
            .unwrap_or(Err(AcquisitionError::DataUnavailable));
        self.next = self.next.saturating_add(1);
        sample
    }
}

/// Parse a trace: one sample per line, `#` starts a comment, blank lines
/// are skipped. `bad` or `-` is a failed read; `nan` is a non-finite
/// reading.
pub fn parse_trace(content: &str) -> CliResult<Vec<Result<f64, AcquisitionError>>> {
    let mut samples = Vec::new();
    for (idx, raw) in content.lines().enumerate() {
        let text = raw.split('#').next().unwrap_or("").trim();
        if text.is_empty() {
            continue;
        }
        let sample = match text.to_ascii_lowercase().as_str() {
            "bad" | "-" => Err(AcquisitionError::DataUnavailable),
            "nan" => Ok(f64::NAN),
            other => Ok(other.parse::<f64>().map_err(|_| CliError::TraceSample {
                line: idx + 1,
                text: text.to_string(),
            })?),
        };
        samples.push(sample);
    }
    Ok(samples)
}
