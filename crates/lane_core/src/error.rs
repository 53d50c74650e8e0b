//! Error types for the battle simulation.
//!
//! Only setup paths (data loading, grid construction) are fallible. The tick
//! loop and the forecast never return errors: a bad plan is skipped with a
//! diagnostic instead of halting the round.

use thiserror::Error;

use crate::entity::EntityId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all battle simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path (or logical name) of the data that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// A unit or skill name has no template in the catalog.
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    /// The classification grid is empty or ragged.
    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    /// Entity handle does not refer to a live slot.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}

impl GameError {
    /// Build a [`GameError::DataParseError`] from a RON error.
    pub(crate) fn ron(path: impl Into<String>, err: &ron::error::SpannedError) -> Self {
        Self::DataParseError {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
