//! The persisted rules index.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::entry::{tokenize, EntryOrigin, IndexEntry};
use super::error::{Result, RulesError};

/// Persisted index format version.
pub(super) const INDEX_VERSION: u32 = 1;

/// On-disk shape of the index.
#[derive(Debug, Serialize, Deserialize)]
pub(super) struct IndexFile {
    pub version: u32,
    pub entries: Vec<IndexEntry>,
}

/// In-memory rules index with custom-over-generated lookup precedence.
#[derive(Debug, Default)]
pub struct RulesIndex {
    entries: Vec<IndexEntry>,
}

impl RulesIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the persisted index.
    ///
    /// A missing file is treated as an empty index (the reload path
    /// regenerates it in full). An existing but unparseable file fails
    /// with [`RulesError::IndexCorrupt`].
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no persisted index, starting empty");
            return Ok(Self::new());
        }
        let path_str = path.display().to_string();
        let raw = fs::read_to_string(path).map_err(|source| RulesError::Io {
            path: path_str.clone(),
            source,
        })?;
        let file: IndexFile =
            serde_json::from_str(&raw).map_err(|e| RulesError::IndexCorrupt {
                path: path_str.clone(),
                detail: e.to_string(),
            })?;
        if file.version != INDEX_VERSION {
            return Err(RulesError::IndexCorrupt {
                path: path_str,
                detail: format!(
                    "unsupported index version {} (expected {})",
                    file.version, INDEX_VERSION
                ),
            });
        }
        Ok(Self {
            entries: file.entries,
        })
    }

    /// Persist the index. Entries are written sorted by (id, origin) so
    /// identical index states serialize identically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let path_str = path.display().to_string();
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.origin.cmp_key().cmp(&b.origin.cmp_key())));
        let file = IndexFile {
            version: INDEX_VERSION,
            entries,
        };
        let body = serde_json::to_string_pretty(&file).map_err(|e| RulesError::IndexCorrupt {
            path: path_str.clone(),
            detail: e.to_string(),
        })?;
        fs::write(path, body).map_err(|source| RulesError::Io {
            path: path_str,
            source,
        })?;
        Ok(())
    }

    /// Lookup by canonical ID; a custom entry always wins over a
    /// generated entry with the same ID.
    pub fn lookup(&self, id: &str) -> Option<&IndexEntry> {
        self.entry_of(id, EntryOrigin::Custom)
            .or_else(|| self.entry_of(id, EntryOrigin::Generated))
    }

    /// Lookup restricted to one origin.
    pub fn entry_of(&self, id: &str, origin: EntryOrigin) -> Option<&IndexEntry> {
        self.entries
            .iter()
            .find(|e| e.id == id && e.origin == origin)
    }

    /// Replace or insert the entry for `(entry.id, entry.origin)`.
    pub fn upsert(&mut self, entry: IndexEntry) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.id == entry.id && e.origin == entry.origin)
        {
            Some(slot) => *slot = entry,
            None => self.entries.push(entry),
        }
    }

    /// Remove every generated entry whose ID is not in `live_ids`.
    /// Custom entries are never removed here.
    pub fn retain_generated(&mut self, live_ids: &BTreeSet<String>) {
        self.entries
            .retain(|e| e.origin == EntryOrigin::Custom || live_ids.contains(&e.id));
    }

    /// Add a custom entry through the explicit user-edit path.
    pub fn add_custom(&mut self, entry: IndexEntry) {
        debug_assert_eq!(entry.origin, EntryOrigin::Custom);
        self.upsert(entry);
    }

    /// Iterate entries of one origin, ID ascending.
    pub fn of_origin(&self, origin: EntryOrigin) -> Vec<&IndexEntry> {
        let mut out: Vec<&IndexEntry> =
            self.entries.iter().filter(|e| e.origin == origin).collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// Count of entries of one origin.
    pub fn count_of(&self, origin: EntryOrigin) -> usize {
        self.entries.iter().filter(|e| e.origin == origin).count()
    }

    /// Number of queryable entries: IDs deduplicated, custom shadowing
    /// generated.
    pub fn queryable_count(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.id.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Search by token overlap with the query.
    ///
    /// Shadowed generated entries do not appear. Results are ordered by
    /// descending overlap, then ID ascending, for deterministic output.
    pub fn search(&self, query: &str) -> Vec<(&IndexEntry, usize)> {
        let query_tokens = tokenize(query);
        // id -> visible entry (custom shadows generated)
        let mut visible: BTreeMap<&str, &IndexEntry> = BTreeMap::new();
        for entry in &self.entries {
            let shadowed = matches!(visible.get(entry.id.as_str()),
                Some(existing) if existing.origin == EntryOrigin::Custom);
            if !shadowed {
                visible.insert(entry.id.as_str(), entry);
            }
        }
        let mut hits: Vec<(&IndexEntry, usize)> = visible
            .into_values()
            .filter_map(|entry| {
                let overlap = query_tokens
                    .iter()
                    .filter(|t| entry.tokens.binary_search(t).is_ok())
                    .count();
                (overlap > 0).then_some((entry, overlap))
            })
            .collect();
        hits.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.id.cmp(&b.0.id)));
        hits
    }

    /// All entries, in insertion order (used by `doctor`).
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }
}

impl EntryOrigin {
    // Sort key for stable serialization: custom before generated.
    fn cmp_key(&self) -> u8 {
        match self {
            EntryOrigin::Custom => 0,
            EntryOrigin::Generated => 1,
        }
    }
}
