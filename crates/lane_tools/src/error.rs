//! Tool errors.

use std::path::PathBuf;

use lane_core::error::GameError;
use thiserror::Error;

/// Errors raised by the development tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The simulation core rejected some input.
    #[error(transparent)]
    Game(#[from] GameError),

    /// Data files loaded but are inconsistent.
    #[error("{count} validation error(s):\n{}", .errors.join("\n"))]
    Invalid {
        /// Number of problems.
        count: usize,
        /// Every problem found.
        errors: Vec<String>,
    },

    /// A report could not be rendered.
    #[error("Failed to render report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for tool operations.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Read a file to a string.
pub(crate) fn read_to_string(path: &std::path::Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| ToolError::Io {
        path: path.to_path_buf(),
        source,
    })
}
