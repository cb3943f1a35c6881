//! Incremental index reload.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::core::ident::{self, ContentType};

use super::entry::{content_hash, EntryOrigin, IndexEntry};
use super::error::{Result, RulesError};
use super::index::RulesIndex;

/// Source file extensions recognized as rule text.
const RULE_EXTENSIONS: [&str; 2] = ["md", "txt"];

/// Counts reported after a reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReloadReport {
    /// Generated entries now in the index.
    pub generated: usize,
    /// Custom entries now in the index (untouched by reload).
    pub custom: usize,
    /// Queryable entries: IDs deduplicated, custom shadowing generated.
    pub idx: usize,
}

impl std::fmt::Display for ReloadReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "reloaded (generated={}, custom={}, idx={})",
            self.generated, self.custom, self.idx
        )
    }
}

/// Builds and refreshes the persisted rules index from a source
/// directory of rule text files.
#[derive(Debug)]
pub struct RulesIndexer {
    source_dir: PathBuf,
    index_path: PathBuf,
}

impl RulesIndexer {
    pub fn new(source_dir: impl Into<PathBuf>, index_path: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            index_path: index_path.into(),
        }
    }

    /// Path of the persisted index this indexer maintains.
    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Reload the index from the source directory.
    ///
    /// For every rule source file the content hash is recomputed; a
    /// generated entry is replaced and re-tokenized only when its hash
    /// changed, so an unchanged source tree makes reload a no-op.
    /// Generated entries whose source vanished are dropped. Custom
    /// entries are never regenerated, only counted. A custom entry
    /// colliding with differently-hashed source content gets a
    /// `Conflict:` warning on the diagnostic channel.
    ///
    /// # Errors
    ///
    /// [`RulesError::IndexCorrupt`] when an existing index cannot be
    /// parsed (a missing index is regenerated in full).
    pub fn reload(&self) -> Result<ReloadReport> {
        let mut index = RulesIndex::load(&self.index_path)?;
        let sources = self.collect_sources()?;

        let live_ids: BTreeSet<String> = sources.iter().map(|(id, _)| id.clone()).collect();
        index.retain_generated(&live_ids);

        let mut refreshed = 0usize;
        for (id, text) in &sources {
            let hash = content_hash(text);
            let unchanged = index
                .entry_of(id, EntryOrigin::Generated)
                .is_some_and(|e| e.content_hash == hash);
            if !unchanged {
                index.upsert(IndexEntry::generated(id.clone(), text.clone()));
                refreshed += 1;
            }
            if let Some(custom) = index.entry_of(id, EntryOrigin::Custom) {
                if custom.content_hash != hash {
                    warn!("Conflict: custom entry {id} shadows generated content with a different hash");
                }
            }
        }

        index.save(&self.index_path)?;

        let report = ReloadReport {
            generated: index.count_of(EntryOrigin::Generated),
            custom: index.count_of(EntryOrigin::Custom),
            idx: index.queryable_count(),
        };
        info!(
            "Indexed {} rule sources ({refreshed} refreshed) into {}",
            sources.len(),
            self.index_path.display()
        );
        Ok(report)
    }

    /// Load the current index for querying.
    pub fn open(&self) -> Result<RulesIndex> {
        RulesIndex::load(&self.index_path)
    }

    /// Enumerate rule source files as `(canonical id, text)` pairs,
    /// ordered by ID for a deterministic reload sequence.
    ///
    /// Two source files whose stems normalize to the same ID never
    /// silently overwrite each other: the first in (sorted) traversal
    /// order wins and the rest are skipped with a `Conflict:` warning.
    fn collect_sources(&self) -> Result<Vec<(String, String)>> {
        let mut sources = Vec::new();
        let mut seen: BTreeSet<String> = BTreeSet::new();
        if !self.source_dir.exists() {
            debug!(dir = %self.source_dir.display(), "rules source dir missing, indexing nothing");
            return Ok(sources);
        }
        for entry in WalkDir::new(&self.source_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if !RULE_EXTENSIONS.contains(&ext) {
                continue;
            }
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default();
            let id = ident::normalize(stem, Some(ContentType::Rule))?;
            if !seen.insert(id.clone()) {
                warn!(
                    "Conflict: duplicate rule source for {id}, ignoring {}",
                    path.display()
                );
                continue;
            }
            let text = fs::read_to_string(path).map_err(|source| RulesError::Io {
                path: path.display().to_string(),
                source,
            })?;
            sources.push((id, text));
        }
        sources.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (tempfile::TempDir, RulesIndexer) {
        let dir = tempfile::tempdir().unwrap();
        let source_dir = dir.path().join("rules");
        fs::create_dir(&source_dir).unwrap();
        fs::write(source_dir.join("grappling.md"), "Grappling uses a check.").unwrap();
        fs::write(source_dir.join("cover.md"), "Cover grants a bonus.").unwrap();
        let indexer = RulesIndexer::new(&source_dir, dir.path().join("index.json"));
        (dir, indexer)
    }

    #[test]
    fn test_initial_reload_generates_all() {
        let (_dir, indexer) = fixture();
        let report = indexer.reload().unwrap();
        assert_eq!(
            report,
            ReloadReport {
                generated: 2,
                custom: 0,
                idx: 2
            }
        );
    }

    #[test]
    fn test_reload_is_idempotent() {
        let (_dir, indexer) = fixture();
        let first = indexer.reload().unwrap();
        let second = indexer.reload().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_changed_source_replaces_generated_entry() {
        let (dir, indexer) = fixture();
        indexer.reload().unwrap();
        fs::write(
            dir.path().join("rules/grappling.md"),
            "Grappling was rewritten.",
        )
        .unwrap();
        indexer.reload().unwrap();
        let index = indexer.open().unwrap();
        let entry = index.lookup("rule/grappling").unwrap();
        assert_eq!(entry.payload, "Grappling was rewritten.");
        assert!(entry.tokens.contains(&"rewritten".to_string()));
    }

    #[test]
    fn test_vanished_source_drops_generated_entry() {
        let (dir, indexer) = fixture();
        indexer.reload().unwrap();
        fs::remove_file(dir.path().join("rules/cover.md")).unwrap();
        let report = indexer.reload().unwrap();
        assert_eq!(report.generated, 1);
        assert!(indexer.open().unwrap().lookup("rule/cover").is_none());
    }

    #[test]
    fn test_custom_entry_survives_reloads() {
        let (_dir, indexer) = fixture();
        indexer.reload().unwrap();
        let mut index = indexer.open().unwrap();
        index.add_custom(IndexEntry::custom("rule/grappling", "House rule: always works."));
        index.save(indexer.index_path()).unwrap();

        let report = indexer.reload().unwrap();
        assert_eq!(report.custom, 1);
        assert_eq!(report.generated, 2);
        assert_eq!(report.idx, 2);
        let index = indexer.open().unwrap();
        assert_eq!(
            index.lookup("rule/grappling").unwrap().payload,
            "House rule: always works."
        );
    }

    #[test]
    fn test_colliding_stems_keep_first_source() {
        let (dir, indexer) = fixture();
        // A subdirectory file with the same stem normalizes to the same
        // ID; it must not overwrite the root file.
        let house = dir.path().join("rules/house");
        fs::create_dir(&house).unwrap();
        fs::write(house.join("cover.md"), "House cover variant.").unwrap();

        let report = indexer.reload().unwrap();
        assert_eq!(report.generated, 2);
        let index = indexer.open().unwrap();
        assert_eq!(
            index.lookup("rule/cover").unwrap().payload,
            "Cover grants a bonus."
        );
    }

    #[test]
    fn test_report_display_contract() {
        let report = ReloadReport {
            generated: 3,
            custom: 1,
            idx: 4,
        };
        let line = report.to_string();
        assert!(line.contains("reloaded ("));
        assert!(line.contains("generated=3"));
        assert!(line.contains("custom=1"));
        assert!(line.contains("idx=4"));
    }
}
