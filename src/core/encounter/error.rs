//! Error types for encounter setup and resolution.

use thiserror::Error;

use crate::core::content::ContentError;
use crate::core::ident::InvalidIdError;

use super::dice::InvalidDiceExpressionError;

/// Result type alias for encounter operations.
pub type Result<T> = std::result::Result<T, EncounterError>;

/// Errors raised by the encounter engine.
#[derive(Debug, Error)]
pub enum EncounterError {
    /// The encounter plan references content that does not resolve, or a
    /// stat block is missing required fields.
    #[error("Invalid encounter: {reason}")]
    InvalidEncounter {
        /// Deterministic description of the setup failure.
        reason: String,
    },

    /// A die expression in a stat block or plan is malformed.
    #[error(transparent)]
    InvalidDiceExpression(#[from] InvalidDiceExpressionError),

    /// A combatant reference could not be canonicalized.
    #[error(transparent)]
    InvalidId(#[from] InvalidIdError),

    /// Content layer failure while resolving stat blocks.
    #[error(transparent)]
    Content(#[from] ContentError),

    /// The event sink failed to accept an event.
    #[error("Event sink error: {0}")]
    Sink(#[from] std::io::Error),
}
