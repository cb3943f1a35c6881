//! Index consistency checking.
//!
//! `doctor` validates a persisted index without modifying it and
//! classifies every issue as fixable (a reload or re-save would repair
//! it) or unfixable (requires user intervention or data is lost).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;

use super::entry::{content_hash, tokenize};
use super::error::Result;
use super::index::{IndexFile, INDEX_VERSION};

/// Tri-state outcome of an index check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DoctorStatus {
    /// No issues found.
    Healthy,
    /// Issues found, all mechanically fixable (degraded but usable).
    Repaired,
    /// At least one issue needs user intervention.
    Unrepaired,
}

/// Findings of one doctor run.
#[derive(Debug, Serialize)]
pub struct DoctorReport {
    pub status: DoctorStatus,
    /// Issues a reload/re-save would repair.
    pub fixable: Vec<String>,
    /// Issues that cannot be repaired mechanically.
    pub unfixable: Vec<String>,
}

impl DoctorReport {
    fn from_issues(fixable: Vec<String>, unfixable: Vec<String>) -> Self {
        let status = if !unfixable.is_empty() {
            DoctorStatus::Unrepaired
        } else if !fixable.is_empty() {
            DoctorStatus::Repaired
        } else {
            DoctorStatus::Healthy
        };
        Self {
            status,
            fixable,
            unfixable,
        }
    }
}

/// Validate the persisted index at `path` without modifying it.
///
/// A missing index is healthy (reload regenerates it). Checks, in order:
/// parseability and version, empty IDs, same-origin duplicate IDs
/// (identical payloads are fixable dedupe, diverging payloads are not),
/// stale content hashes and stale token caches (both fixable).
pub fn doctor(path: &Path) -> Result<DoctorReport> {
    if !path.exists() {
        return Ok(DoctorReport::from_issues(Vec::new(), Vec::new()));
    }

    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            return Ok(DoctorReport::from_issues(
                Vec::new(),
                vec![format!("index unreadable: {e}")],
            ))
        }
    };
    let file: IndexFile = match serde_json::from_str(&raw) {
        Ok(file) => file,
        Err(e) => {
            return Ok(DoctorReport::from_issues(
                Vec::new(),
                vec![format!("index unparseable: {e}")],
            ))
        }
    };

    let mut fixable = Vec::new();
    let mut unfixable = Vec::new();

    if file.version != INDEX_VERSION {
        unfixable.push(format!(
            "unsupported index version {} (expected {})",
            file.version, INDEX_VERSION
        ));
    }

    let mut seen: BTreeMap<(String, u8), &str> = BTreeMap::new();
    for entry in &file.entries {
        if entry.id.is_empty() {
            unfixable.push("entry with empty id".to_string());
            continue;
        }
        let origin_key = match entry.origin {
            super::entry::EntryOrigin::Custom => 0u8,
            super::entry::EntryOrigin::Generated => 1u8,
        };
        match seen.insert((entry.id.clone(), origin_key), entry.payload.as_str()) {
            Some(previous) if previous == entry.payload => {
                fixable.push(format!("duplicate entry {} (identical payloads)", entry.id));
            }
            Some(_) => {
                unfixable.push(format!("duplicate entry {} (diverging payloads)", entry.id));
            }
            None => {}
        }
        if entry.content_hash != content_hash(&entry.payload) {
            fixable.push(format!("stale content hash on {}", entry.id));
        }
        if entry.tokens != tokenize(&entry.payload) {
            fixable.push(format!("stale token cache on {}", entry.id));
        }
    }

    Ok(DoctorReport::from_issues(fixable, unfixable))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rules::{IndexEntry, RulesIndex};

    #[test]
    fn test_missing_index_is_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let report = doctor(&dir.path().join("index.json")).unwrap();
        assert_eq!(report.status, DoctorStatus::Healthy);
    }

    #[test]
    fn test_clean_index_is_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        let mut index = RulesIndex::new();
        index.upsert(IndexEntry::generated("rule/cover", "Cover grants a bonus."));
        index.save(&path).unwrap();
        let report = doctor(&path).unwrap();
        assert_eq!(report.status, DoctorStatus::Healthy);
        assert!(report.fixable.is_empty());
        assert!(report.unfixable.is_empty());
    }

    #[test]
    fn test_unparseable_index_is_unrepaired() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        fs::write(&path, "{broken").unwrap();
        let report = doctor(&path).unwrap();
        assert_eq!(report.status, DoctorStatus::Unrepaired);
        assert_eq!(report.unfixable.len(), 1);
    }

    #[test]
    fn test_stale_hash_is_repairable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        let mut entry = IndexEntry::generated("rule/cover", "Cover grants a bonus.");
        entry.content_hash = "0".repeat(64);
        let mut index = RulesIndex::new();
        index.upsert(entry);
        index.save(&path).unwrap();
        let report = doctor(&path).unwrap();
        assert_eq!(report.status, DoctorStatus::Repaired);
        assert!(report.fixable.iter().any(|i| i.contains("stale content hash")));
        assert!(report.unfixable.is_empty());
    }

    #[test]
    fn test_doctor_does_not_modify_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        fs::write(&path, "{broken").unwrap();
        doctor(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{broken");
    }
}
