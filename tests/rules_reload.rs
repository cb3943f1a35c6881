//! End-to-end rules index lifecycle: reload from source files, custom
//! overrides surviving reloads, search shadowing and doctor checks.

use std::fs;
use std::path::PathBuf;

use grimoire::core::rules::{
    doctor, DoctorStatus, EntryOrigin, IndexEntry, RulesIndexer,
};

struct Fixture {
    _dir: tempfile::TempDir,
    source_dir: PathBuf,
    indexer: RulesIndexer,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let source_dir = dir.path().join("rules");
    fs::create_dir(&source_dir).unwrap();
    fs::write(
        source_dir.join("grappling.md"),
        "Grappling is a special melee attack resolved with a check.",
    )
    .unwrap();
    fs::write(
        source_dir.join("cover.md"),
        "Half cover grants a bonus to armor class.",
    )
    .unwrap();
    let indexer = RulesIndexer::new(&source_dir, dir.path().join("rules-index.json"));
    Fixture {
        _dir: dir,
        source_dir,
        indexer,
    }
}

#[test]
fn reload_then_search_finds_rule_by_tokens() {
    let fx = fixture();
    let report = fx.indexer.reload().unwrap();
    assert_eq!(report.generated, 2);
    assert_eq!(report.idx, 2);

    let index = fx.indexer.open().unwrap();
    let hits = index.search("melee attack check");
    assert!(!hits.is_empty());
    assert_eq!(hits[0].0.id, "rule/grappling");
}

#[test]
fn custom_override_shadows_generated_across_reloads() {
    let fx = fixture();
    fx.indexer.reload().unwrap();

    let mut index = fx.indexer.open().unwrap();
    index.add_custom(IndexEntry::custom(
        "rule/cover",
        "Table rule: cover stacks with shields.",
    ));
    index.save(fx.indexer.index_path()).unwrap();

    // Touch a source file so the reload actually rewrites state.
    fs::write(
        fx.source_dir.join("grappling.md"),
        "Grappling now also works underwater.",
    )
    .unwrap();
    let report = fx.indexer.reload().unwrap();
    assert_eq!(report.generated, 2);
    assert_eq!(report.custom, 1);
    assert_eq!(report.idx, 2);

    let index = fx.indexer.open().unwrap();
    let hit = index.lookup("rule/cover").unwrap();
    assert_eq!(hit.origin, EntryOrigin::Custom);
    assert_eq!(hit.payload, "Table rule: cover stacks with shields.");
    // The shadowed generated entry is still present under its origin.
    assert!(index.entry_of("rule/cover", EntryOrigin::Generated).is_some());
    // Search never surfaces the shadowed generated entry.
    let hits = index.search("cover");
    let cover_hits: Vec<_> = hits.iter().filter(|(e, _)| e.id == "rule/cover").collect();
    assert_eq!(cover_hits.len(), 1);
    assert_eq!(cover_hits[0].0.origin, EntryOrigin::Custom);
}

#[test]
fn repeated_reload_leaves_index_bytes_unchanged() {
    let fx = fixture();
    fx.indexer.reload().unwrap();
    let first = fs::read_to_string(fx.indexer.index_path()).unwrap();
    fx.indexer.reload().unwrap();
    let second = fs::read_to_string(fx.indexer.index_path()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn doctor_on_freshly_reloaded_index_is_healthy() {
    let fx = fixture();
    fx.indexer.reload().unwrap();
    let report = doctor(fx.indexer.index_path()).unwrap();
    assert_eq!(report.status, DoctorStatus::Healthy);
    assert!(report.fixable.is_empty());
    assert!(report.unfixable.is_empty());
}

#[test]
fn doctor_flags_hand_edited_payload_without_touching_file() {
    let fx = fixture();
    fx.indexer.reload().unwrap();
    let path = fx.indexer.index_path();

    // Simulate a hand edit that changes a payload but not its hash.
    let edited = fs::read_to_string(path)
        .unwrap()
        .replace("Half cover grants a bonus", "Half cover grants a big bonus");
    fs::write(path, &edited).unwrap();

    let report = doctor(path).unwrap();
    assert_eq!(report.status, DoctorStatus::Repaired);
    assert!(report
        .fixable
        .iter()
        .any(|issue| issue.contains("rule/cover")));
    assert_eq!(fs::read_to_string(path).unwrap(), edited);
}

#[test]
fn non_rule_files_are_ignored() {
    let fx = fixture();
    fs::write(fx.source_dir.join("notes.json"), "{}").unwrap();
    fs::write(fx.source_dir.join("flanking.txt"), "Flanking grants advantage.").unwrap();
    let report = fx.indexer.reload().unwrap();
    assert_eq!(report.generated, 3);
    let index = fx.indexer.open().unwrap();
    assert!(index.lookup("rule/flanking").is_some());
    assert!(index.lookup("rule/notes").is_none());
}
