//! Verb resolution.
//!
//! Maps user verb surface forms (including misspellings) onto the closed
//! [`Command`] set. Resolution is exact-match first (canonical names and
//! the alias table, case-insensitive); on a miss it degrades to ranked
//! suggestions scored by normalized Damerau-Levenshtein similarity rather
//! than failing outright.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strsim::normalized_damerau_levenshtein;

/// Maximum number of suggestions returned on a miss.
const SUGGESTION_LIMIT: usize = 5;

/// Minimum similarity score for a candidate to be suggested.
const SCORE_CUTOFF: f64 = 0.2;

// ============================================================================
// Commands
// ============================================================================

/// The closed set of commands a verb can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    // Combat verbs
    Attack,
    Heal,
    Stabilize,
    Flee,
    Spare,
    // Content & index commands
    Show,
    List,
    Reload,
    Doctor,
    Play,
}

impl Command {
    /// All commands, in canonical order.
    pub const ALL: [Command; 10] = [
        Command::Attack,
        Command::Heal,
        Command::Stabilize,
        Command::Flee,
        Command::Spare,
        Command::Show,
        Command::List,
        Command::Reload,
        Command::Doctor,
        Command::Play,
    ];

    /// Canonical verb name.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Attack => "attack",
            Command::Heal => "heal",
            Command::Stabilize => "stabilize",
            Command::Flee => "flee",
            Command::Spare => "spare",
            Command::Show => "show",
            Command::List => "list",
            Command::Reload => "reload",
            Command::Doctor => "doctor",
            Command::Play => "play",
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Alias surface forms mapped onto canonical commands. Many-to-one.
const ALIASES: &[(&str, Command)] = &[
    ("stab", Command::Attack),
    ("hit", Command::Attack),
    ("strike", Command::Attack),
    ("swing", Command::Attack),
    ("cure", Command::Heal),
    ("mend", Command::Heal),
    ("stabilise", Command::Stabilize),
    ("run", Command::Flee),
    ("escape", Command::Flee),
    ("mercy", Command::Spare),
    ("view", Command::Show),
    ("info", Command::Show),
    ("ls", Command::List),
    ("reindex", Command::Reload),
    ("fight", Command::Play),
];

// ============================================================================
// Resolution
// ============================================================================

/// One ranked suggestion for an unresolved verb.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Canonical command suggested.
    pub command: Command,
    /// Similarity score in `[0, 1]`; higher is closer.
    pub score: f64,
}

/// Outcome of resolving a verb surface form.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Exact alias-table or canonical-name match.
    Resolved(Command),
    /// No exact match; ranked candidates, best first.
    Suggestions(Vec<Suggestion>),
    /// No candidate close enough.
    NotFound,
}

/// Verb-to-command resolver. Built once, read-only thereafter.
#[derive(Debug)]
pub struct AliasResolver {
    table: HashMap<String, Command>,
    limit: usize,
    cutoff: f64,
}

impl Default for AliasResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl AliasResolver {
    /// Build the resolver over all canonical names and the alias table.
    pub fn new() -> Self {
        let mut table = HashMap::new();
        for command in Command::ALL {
            table.insert(command.name().to_string(), command);
        }
        for (surface, command) in ALIASES {
            table.insert((*surface).to_string(), *command);
        }
        Self {
            table,
            limit: SUGGESTION_LIMIT,
            cutoff: SCORE_CUTOFF,
        }
    }

    /// Resolve a verb surface form.
    ///
    /// Exact case-insensitive table lookup first; on a miss, every known
    /// surface is scored against the input and the best score per command
    /// is kept. Candidates at or above the cutoff are returned sorted by
    /// descending score, ties broken alphabetically, truncated to the
    /// suggestion limit.
    pub fn resolve(&self, verb: &str) -> Resolution {
        let needle = verb.trim().to_lowercase();
        if needle.is_empty() {
            return Resolution::NotFound;
        }
        if let Some(command) = self.table.get(&needle) {
            return Resolution::Resolved(*command);
        }

        let mut best: HashMap<Command, f64> = HashMap::new();
        for (surface, command) in &self.table {
            let score = normalized_damerau_levenshtein(&needle, surface);
            let entry = best.entry(*command).or_insert(0.0);
            if score > *entry {
                *entry = score;
            }
        }

        let mut ranked: Vec<Suggestion> = best
            .into_iter()
            .filter(|(_, score)| *score >= self.cutoff)
            .map(|(command, score)| Suggestion { command, score })
            .collect();
        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.command.name().cmp(b.command.name()))
        });
        ranked.truncate(self.limit);

        if ranked.is_empty() {
            Resolution::NotFound
        } else {
            Resolution::Suggestions(ranked)
        }
    }
}
