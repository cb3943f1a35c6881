//! Error types for the rules index.

use thiserror::Error;

use crate::core::content::ContentError;
use crate::core::ident::InvalidIdError;

/// Result type alias for rules index operations.
pub type Result<T> = std::result::Result<T, RulesError>;

/// Errors raised by the rules indexer.
#[derive(Debug, Error)]
pub enum RulesError {
    /// The persisted index exists but cannot be parsed.
    ///
    /// A missing index is not an error (reload regenerates from scratch);
    /// corruption of an existing file is surfaced so data is never
    /// silently discarded.
    #[error("Index corrupt at {path}: {detail}")]
    IndexCorrupt {
        /// Path of the persisted index file.
        path: String,
        /// Deterministic description of the corruption.
        detail: String,
    },

    /// A rule source file name could not be canonicalized.
    #[error(transparent)]
    InvalidId(#[from] InvalidIdError),

    /// Content layer failure while enumerating rule items.
    #[error(transparent)]
    Content(#[from] ContentError),

    /// File system I/O error.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path involved in the failed operation.
        path: String,
        #[source]
        source: std::io::Error,
    },
}
