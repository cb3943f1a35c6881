//! Index entries, content hashing and tokenization.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Origin of an index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryOrigin {
    /// Derived automatically from source content; replaced when the
    /// source hash changes.
    Generated,
    /// User-authored; never auto-replaced, shadows a generated entry
    /// with the same ID on lookup.
    Custom,
}

/// One searchable entry in the rules index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Canonical rule ID (e.g. `rule/grappling`).
    pub id: String,
    /// Blake3 hex digest of the payload this entry was built from.
    pub content_hash: String,
    /// Whether the entry was generated from source or authored by hand.
    pub origin: EntryOrigin,
    /// Searchable rule text.
    pub payload: String,
    /// Token cache over the payload; rebuilt whenever the payload changes.
    #[serde(default)]
    pub tokens: Vec<String>,
}

impl IndexEntry {
    /// Build a generated entry from source text.
    pub fn generated(id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::build(id, payload, EntryOrigin::Generated)
    }

    /// Build a custom (user-authored) entry.
    pub fn custom(id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::build(id, payload, EntryOrigin::Custom)
    }

    fn build(id: impl Into<String>, payload: impl Into<String>, origin: EntryOrigin) -> Self {
        let payload = payload.into();
        Self {
            id: id.into(),
            content_hash: content_hash(&payload),
            origin,
            tokens: tokenize(&payload),
            payload,
        }
    }
}

/// Blake3 hex digest of rule text.
pub fn content_hash(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

/// Tokenize rule text into sorted, deduplicated lowercase word tokens.
///
/// Tokens are alphanumeric runs; everything else is a boundary. Sorted
/// output keeps the persisted index byte-stable across reloads.
pub fn tokenize(text: &str) -> Vec<String> {
    let tokens: BTreeSet<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    tokens.into_iter().collect()
}
