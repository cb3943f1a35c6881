//! The read-only content store.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::core::ident::{self, ContentType};

use super::error::{ContentError, Result};
use super::types::{ContentItem, RawRecord};

/// In-memory store of all loaded content records, keyed by canonical ID.
///
/// Read-only after [`load_dir`](ContentStore::load_dir)/
/// [`load_file`](ContentStore::load_file); lookups normalize their input
/// before hitting the map, so callers may pass any raw ID shape.
#[derive(Debug, Default)]
pub struct ContentStore {
    // BTreeMap keeps listing order deterministic (canonical ID ascending).
    items: BTreeMap<String, ContentItem>,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every per-type content file present under `dir`
    /// (`monsters.json`, `weapons.json`, `rules.json`, `encounters.json`).
    /// Missing files are skipped.
    ///
    /// # Errors
    ///
    /// [`ContentError::DuplicateId`] if two records normalize to the same
    /// canonical ID; I/O and parse failures carry the offending path.
    pub fn load_dir(&mut self, dir: &Path) -> Result<()> {
        for kind in ContentType::ALL {
            let path = dir.join(format!("{}.json", kind.file_stem()));
            if path.exists() {
                self.load_file(&path, kind)?;
            }
        }
        Ok(())
    }

    /// Load one content file holding a JSON array of records of `kind`.
    pub fn load_file(&mut self, path: &Path, kind: ContentType) -> Result<()> {
        let path_str = path.display().to_string();
        let raw = fs::read_to_string(path).map_err(|source| ContentError::Io {
            path: path_str.clone(),
            source,
        })?;
        let records: Vec<RawRecord> =
            serde_json::from_str(&raw).map_err(|source| ContentError::Parse {
                path: path_str.clone(),
                source,
            })?;

        let count = records.len();
        for record in records {
            let raw_id = record.id.as_deref().unwrap_or(&record.name);
            let id = ident::normalize(raw_id, Some(kind))?;
            if self.items.contains_key(&id) {
                return Err(ContentError::DuplicateId { id });
            }
            let item = ContentItem {
                id: id.clone(),
                kind,
                name: record.name,
                fields: record.fields,
            };
            self.items.insert(id, item);
        }
        debug!(path = %path_str, kind = %kind, count, "loaded content file");
        Ok(())
    }

    /// Exact lookup by (possibly raw) ID.
    ///
    /// # Errors
    ///
    /// [`ContentError::NotFound`] carrying the canonical form of the ID.
    pub fn get(&self, id: &str) -> Result<&ContentItem> {
        let canonical = ident::normalize(id, None)?;
        self.items
            .get(&canonical)
            .ok_or(ContentError::NotFound { id: canonical })
    }

    /// Lookup with a type hint, for IDs arriving without a type prefix.
    pub fn get_hinted(&self, id: &str, hint: ContentType) -> Result<&ContentItem> {
        let canonical = ident::normalize(id, Some(hint))?;
        self.items
            .get(&canonical)
            .ok_or(ContentError::NotFound { id: canonical })
    }

    /// List items, optionally filtered by exact type and by a
    /// case-insensitive substring over ID and name.
    ///
    /// Ordering is canonical ID ascending; empty filters return all items.
    pub fn list(&self, kind: Option<ContentType>, grep: Option<&str>) -> Vec<&ContentItem> {
        let needle = grep.map(str::to_lowercase);
        self.items
            .values()
            .filter(|item| kind.map_or(true, |k| item.kind == k))
            .filter(|item| {
                needle.as_deref().map_or(true, |n| {
                    item.id.contains(n) || item.name.to_lowercase().contains(n)
                })
            })
            .collect()
    }

    /// Number of loaded items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn store_with(files: &[(ContentType, &str)]) -> ContentStore {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ContentStore::new();
        for (kind, body) in files {
            let path = dir.path().join(format!("{}.json", kind.file_stem()));
            let mut file = fs::File::create(&path).unwrap();
            file.write_all(body.as_bytes()).unwrap();
            store.load_file(&path, *kind).unwrap();
        }
        store
    }

    const MONSTERS: &str = r#"[
        {"name": "Goblin", "hp": 7, "ac": 15, "attack": 4, "damage": "1d6+2"},
        {"name": "Dire Wolf", "hp": 37, "ac": 14, "attack": 5, "damage": "2d6+3"}
    ]"#;

    const WEAPONS: &str = r#"[
        {"name": "Warhammer", "damage": "1d8", "properties": ["versatile (1d10)"]}
    ]"#;

    #[test]
    fn test_get_accepts_raw_id_shapes() {
        let store = store_with(&[(ContentType::Monster, MONSTERS)]);
        for raw in ["monster/goblin", "monster.goblin", "Monster/Monster.Goblin"] {
            let item = store.get(raw).unwrap();
            assert_eq!(item.id, "monster/goblin");
            assert_eq!(item.hp(), Some(7));
        }
    }

    #[test]
    fn test_get_not_found_reports_canonical_id() {
        let store = store_with(&[(ContentType::Monster, MONSTERS)]);
        match store.get("Monster.Ogre") {
            Err(ContentError::NotFound { id }) => assert_eq!(id, "monster/ogre"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_list_filtered_by_type() {
        let store = store_with(&[
            (ContentType::Monster, MONSTERS),
            (ContentType::Weapon, WEAPONS),
        ]);
        let monsters = store.list(Some(ContentType::Monster), None);
        assert_eq!(monsters.len(), 2);
        // Canonical ID ascending
        assert_eq!(monsters[0].id, "monster/dire-wolf");
        assert_eq!(monsters[1].id, "monster/goblin");
    }

    #[test]
    fn test_list_grep_is_case_insensitive() {
        let store = store_with(&[(ContentType::Monster, MONSTERS)]);
        let hits = store.list(None, Some("GOB"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "monster/goblin");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monsters.json");
        fs::write(
            &path,
            r#"[{"name": "Goblin", "hp": 7}, {"name": "goblin", "hp": 9}]"#,
        )
        .unwrap();
        let mut store = ContentStore::new();
        match store.load_file(&path, ContentType::Monster) {
            Err(ContentError::DuplicateId { id }) => assert_eq!(id, "monster/goblin"),
            other => panic!("expected DuplicateId, got {other:?}"),
        }
        // The first record is untouched by the rejected duplicate.
        assert_eq!(store.get("monster/goblin").unwrap().hp(), Some(7));
    }

    #[test]
    fn test_warhammer_record() {
        let store = store_with(&[(ContentType::Weapon, WEAPONS)]);
        let item = store.get("weapon/Warhammer").unwrap();
        assert_eq!(item.damage(), Some("1d8"));
        assert!(item.properties().iter().any(|p| p.starts_with("versatile")));
    }
}
