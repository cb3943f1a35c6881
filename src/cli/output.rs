//! Boundary output formatting.
//!
//! The exact strings the glue layer prints for each surface. Kept pure
//! so the contracts are unit-testable without spawning the binary.

use crate::core::encounter::{EncounterEvent, EventKind};
use crate::core::rules::{DoctorReport, ReloadReport};
use crate::core::verbs::Suggestion;

/// The failure block for an unresolved verb: header line, `Did you
/// mean:` line, then one ranked candidate per line (best first).
pub fn suggestion_failure(verb: &str, suggestions: &[Suggestion], show_scores: bool) -> String {
    let mut out = format!("Not found verb: \"{verb}\"\n");
    if suggestions.is_empty() {
        return out;
    }
    out.push_str("Did you mean:\n");
    for suggestion in suggestions {
        if show_scores {
            out.push_str(&format!(
                "  {} ({:.2})\n",
                suggestion.command.name(),
                suggestion.score
            ));
        } else {
            out.push_str(&format!("  {}\n", suggestion.command.name()));
        }
    }
    out
}

/// The reload status line.
pub fn reload_line(report: &ReloadReport) -> String {
    format!("rules {report}")
}

/// Doctor findings, one issue per line.
pub fn doctor_lines(report: &DoctorReport) -> String {
    let mut out = format!("index status: {:?}\n", report.status).to_lowercase();
    for issue in &report.fixable {
        out.push_str(&format!("fixable: {issue}\n"));
    }
    for issue in &report.unfixable {
        out.push_str(&format!("unfixable: {issue}\n"));
    }
    out
}

/// Human-readable rendering of one encounter event (non-JSON mode).
pub fn event_line(event: &EncounterEvent) -> String {
    let d = &event.detail;
    let get = |k: &str| d.get(k).map(|v| v.to_string()).unwrap_or_default();
    match event.event {
        EventKind::Action => format!(
            "[round {}] {} {} {}",
            event.round,
            event.actor,
            d.get("action").and_then(|v| v.as_str()).unwrap_or("acts"),
            get("target").trim_matches('"')
        )
        .trim_end()
        .to_string(),
        EventKind::Damage => format!(
            "[round {}] {} deals {} to {} ({} hp left)",
            event.round,
            event.actor,
            get("amount"),
            get("target").trim_matches('"'),
            get("remaining")
        ),
        EventKind::Status => format!(
            "[round {}] {} is {}",
            event.round,
            event.actor,
            get("status").trim_matches('"')
        ),
        EventKind::Summary => format!(
            "== {} after {} rounds ==",
            get("outcome").trim_matches('"'),
            get("rounds")
        ),
    }
}
