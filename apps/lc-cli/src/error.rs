//! Error types for the lc-cli commands.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Project error: {0}")]
    Project(#[from] lc_project::ProjectError),

    #[error("Control error: {0}")]
    Control(#[from] lc_controls::ControlError),

    #[error("Failed to read trace file: {path}")]
    TraceRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid trace sample on line {line}: '{text}'")]
    TraceSample { line: usize, text: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CliResult<T> = Result<T, CliError>;
