//! Verb resolution contract: exact forms and aliases resolve, near
//! misses degrade to ranked suggestions, garbage is rejected.

use grimoire::cli::output;
use grimoire::core::verbs::{AliasResolver, Command, Resolution};

#[test]
fn every_canonical_name_resolves_to_itself() {
    let resolver = AliasResolver::new();
    for command in Command::ALL {
        assert_eq!(
            resolver.resolve(command.name()),
            Resolution::Resolved(command),
            "canonical name {:?} failed to resolve",
            command.name()
        );
    }
}

#[test]
fn stablize_misspelling_suggests_the_documented_candidates() {
    let resolver = AliasResolver::new();
    let suggestions = match resolver.resolve("stablize") {
        Resolution::Suggestions(s) => s,
        other => panic!("expected suggestions, got {other:?}"),
    };
    assert!(suggestions.len() <= 5);
    assert_eq!(suggestions[0].command, Command::Stabilize);
    let names: Vec<&str> = suggestions.iter().map(|s| s.command.name()).collect();
    for expected in ["attack", "heal", "stabilize", "spare"] {
        assert!(names.contains(&expected), "missing {expected} in {names:?}");
    }
}

#[test]
fn suggestion_failure_output_contract() {
    let resolver = AliasResolver::new();
    let suggestions = match resolver.resolve("stablize") {
        Resolution::Suggestions(s) => s,
        other => panic!("expected suggestions, got {other:?}"),
    };

    let text = output::suggestion_failure("stablize", &suggestions, false);
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(r#"Not found verb: "stablize""#));
    assert_eq!(lines.next(), Some("Did you mean:"));
    let rest: Vec<&str> = lines.collect();
    assert_eq!(rest.len(), suggestions.len());
    assert_eq!(rest[0].trim(), "stabilize");

    // With scores enabled every suggestion line carries its score.
    let scored = output::suggestion_failure("stablize", &suggestions, true);
    let scored_lines: Vec<&str> = scored.lines().skip(2).collect();
    assert!(scored_lines.iter().all(|l| l.contains('(')));
}

#[test]
fn not_found_output_has_no_suggestion_block() {
    let text = output::suggestion_failure("zzzzzzzz", &[], false);
    assert_eq!(text.lines().count(), 1);
    assert_eq!(text.lines().next(), Some(r#"Not found verb: "zzzzzzzz""#));
}
