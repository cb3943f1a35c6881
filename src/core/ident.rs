//! Canonical content identity.
//!
//! Every content item is addressed by a single canonical ID of the form
//! `<type>/<name>` (e.g. `monster/goblin`). User input arrives in many
//! shapes (`"monster.goblin"`, `"Monster/Goblin"`, `"monster/monster.goblin"`)
//! and [`normalize`] folds all of them onto the canonical form. No other
//! module stores or compares un-normalized IDs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Characters treated as segment separators in raw IDs.
const SEPARATORS: [char; 4] = ['.', '/', '\\', ':'];

// ============================================================================
// Content Types
// ============================================================================

/// The closed set of content record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Monster,
    Weapon,
    Rule,
    Encounter,
}

impl ContentType {
    /// All content types, in canonical order.
    pub const ALL: [ContentType; 4] = [
        ContentType::Monster,
        ContentType::Weapon,
        ContentType::Rule,
        ContentType::Encounter,
    ];

    /// Canonical lowercase singular name, used as the ID prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Monster => "monster",
            ContentType::Weapon => "weapon",
            ContentType::Rule => "rule",
            ContentType::Encounter => "encounter",
        }
    }

    /// File stem of the content file holding records of this type
    /// (e.g. `monsters` for `monsters.json`).
    pub fn file_stem(&self) -> &'static str {
        match self {
            ContentType::Monster => "monsters",
            ContentType::Weapon => "weapons",
            ContentType::Rule => "rules",
            ContentType::Encounter => "encounters",
        }
    }

    /// Parse a canonical singular type name.
    pub fn parse(s: &str) -> Option<ContentType> {
        match s {
            "monster" => Some(ContentType::Monster),
            "weapon" => Some(ContentType::Weapon),
            "rule" => Some(ContentType::Rule),
            "encounter" => Some(ContentType::Encounter),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Errors
// ============================================================================

/// A raw identifier could not be canonicalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid content id {raw:?}: {reason}")]
pub struct InvalidIdError {
    /// The raw input as supplied by the caller.
    pub raw: String,
    /// Deterministic human-readable reason.
    pub reason: &'static str,
}

impl InvalidIdError {
    fn new(raw: &str, reason: &'static str) -> Self {
        Self {
            raw: raw.to_string(),
            reason,
        }
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// Canonicalize a free-form content identifier.
///
/// Rules:
/// - lowercases the whole input;
/// - splits on `.`, `/`, `\` and `:`;
/// - whitespace inside a segment becomes `-` (`"Dire Wolf"` → `dire-wolf`);
/// - segments duplicating the type name are collapsed, so
///   `monster/monster.goblin` and `monster.goblin` both yield
///   `monster/goblin`;
/// - the type comes from the first segment when it names a known type,
///   otherwise from `type_hint`.
///
/// Idempotent: `normalize(&normalize(x)?, hint) == normalize(x, hint)`.
///
/// # Errors
///
/// [`InvalidIdError`] when the input carries no recognizable type segment
/// and no `type_hint` is supplied, or when no name remains after
/// normalization.
pub fn normalize(raw: &str, type_hint: Option<ContentType>) -> Result<String, InvalidIdError> {
    let mut segments: Vec<String> = raw
        .split(SEPARATORS)
        .map(|s| {
            s.trim()
                .to_lowercase()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join("-")
        })
        .filter(|s| !s.is_empty())
        .collect();

    if segments.is_empty() {
        return Err(InvalidIdError::new(raw, "empty identifier"));
    }

    let kind = match ContentType::parse(&segments[0]) {
        Some(kind) => {
            segments.remove(0);
            kind
        }
        None => type_hint.ok_or_else(|| {
            InvalidIdError::new(raw, "no recognizable type segment and no type hint")
        })?,
    };

    // Collapse redundant repetitions of the type name anywhere in the tail.
    segments.retain(|s| s != kind.as_str());

    if segments.is_empty() {
        return Err(InvalidIdError::new(raw, "no name segment"));
    }

    Ok(format!("{}/{}", kind.as_str(), segments.join("/")))
}

/// Extract the content type of an already-canonical ID, if any.
pub fn type_of(id: &str) -> Option<ContentType> {
    id.split('/').next().and_then(ContentType::parse)
}
