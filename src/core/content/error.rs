//! Error types for content loading and lookup.

use thiserror::Error;

use crate::core::ident::InvalidIdError;

/// Result type alias for content store operations.
pub type Result<T> = std::result::Result<T, ContentError>;

/// Errors raised by the content store.
#[derive(Debug, Error)]
pub enum ContentError {
    /// An identifier could not be canonicalized.
    #[error(transparent)]
    InvalidId(#[from] InvalidIdError),

    /// Two records normalized to the same ID within one type.
    ///
    /// Loading never silently overwrites; the duplicate is reported
    /// with the canonical ID both records collapsed onto.
    #[error("Duplicate content id: {id}")]
    DuplicateId {
        /// The canonical ID that collided.
        id: String,
    },

    /// No record exists under the requested canonical ID.
    #[error("Content not found: {id}")]
    NotFound {
        /// The canonical form of the ID that was looked up.
        id: String,
    },

    /// File system I/O error.
    #[error("IO error reading {path}: {source}")]
    Io {
        /// Path of the content file involved.
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A content file is not valid JSON of the expected shape.
    #[error("Malformed content file {path}: {source}")]
    Parse {
        /// Path of the content file involved.
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
