//! Command-line glue.
//!
//! Owns argument handling, output printing and exit codes; all real
//! logic lives in `core`. Verbs pass through the alias resolver before
//! dispatch, so misspelled commands degrade to ranked suggestions
//! instead of a bare failure. Diagnostics go to the tracing channel
//! (stderr), never stdout, keeping the `play --json` stream clean.

pub mod output;

use std::io;

use anyhow::{bail, Context, Result};

use crate::config::{AppConfig, EngineBackend};
use crate::core::content::ContentStore;
use crate::core::encounter::{
    BuiltinSource, CombatantSource, ContentSource, EncounterEngine, EncounterPlan, JsonLinesSink,
    MemorySink,
};
use crate::core::ident::{self, ContentType};
use crate::core::rules::{doctor, DoctorStatus, RulesIndexer};
use crate::core::verbs::{AliasResolver, Command, Resolution};

/// Process exit codes.
pub const EXIT_OK: u8 = 0;
/// Generic failure: unknown verb, unresolvable content, corrupt index.
pub const EXIT_FAILURE: u8 = 1;
/// Degraded but usable: doctor found only fixable issues.
pub const EXIT_DEGRADED: u8 = 2;

/// Dispatch one invocation. `args` excludes the program name.
pub fn run(config: &AppConfig, args: &[String]) -> Result<u8> {
    let Some(verb) = args.first() else {
        eprintln!("usage: grimoire <verb> [args]");
        return Ok(EXIT_FAILURE);
    };

    // The interactive shell is not part of the verb vocabulary yet.
    if verb == "tui" {
        return tui_placeholder(&args[1..]);
    }

    let resolver = AliasResolver::new();
    match resolver.resolve(verb) {
        Resolution::Resolved(command) => dispatch(command, config, &args[1..]),
        Resolution::Suggestions(suggestions) => {
            print!(
                "{}",
                output::suggestion_failure(verb, &suggestions, config.display.show_scores)
            );
            Ok(EXIT_FAILURE)
        }
        Resolution::NotFound => {
            print!("{}", output::suggestion_failure(verb, &[], false));
            Ok(EXIT_FAILURE)
        }
    }
}

fn dispatch(command: Command, config: &AppConfig, rest: &[String]) -> Result<u8> {
    match command {
        Command::List => cmd_list(config, rest),
        Command::Show => cmd_show(config, rest),
        Command::Reload => cmd_reload(config),
        Command::Doctor => cmd_doctor(config),
        Command::Play => cmd_play(config, rest),
        // Combat verbs only make sense inside an encounter; the
        // interactive shell that will host them is not built yet.
        Command::Attack
        | Command::Heal
        | Command::Stabilize
        | Command::Flee
        | Command::Spare => {
            eprintln!("'{command}' is an encounter verb; run 'grimoire play' instead");
            Ok(EXIT_FAILURE)
        }
    }
}

/// Pull the value of `--flag value` out of the argument list.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

/// Flags that take no value.
const BOOLEAN_FLAGS: [&str; 1] = ["--json"];

/// First argument that is not a flag or a flag value.
fn positional(args: &[String]) -> Option<&str> {
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg.starts_with("--") {
            skip_next = !BOOLEAN_FLAGS.contains(&arg.as_str());
            continue;
        }
        return Some(arg);
    }
    None
}

fn load_store(config: &AppConfig) -> Result<ContentStore> {
    let mut store = ContentStore::new();
    store
        .load_dir(&config.content.dir)
        .with_context(|| format!("loading content from {}", config.content.dir.display()))?;
    Ok(store)
}

fn cmd_list(config: &AppConfig, args: &[String]) -> Result<u8> {
    let kind = match flag_value(args, "--type") {
        Some(raw) => Some(
            ContentType::parse(raw)
                .with_context(|| format!("unknown content type {raw:?}"))?,
        ),
        None => None,
    };
    let store = load_store(config)?;
    for item in store.list(kind, flag_value(args, "--grep")) {
        println!("{}", item.id);
    }
    Ok(EXIT_OK)
}

fn cmd_show(config: &AppConfig, args: &[String]) -> Result<u8> {
    let Some(id) = positional(args) else {
        bail!("usage: grimoire show <id>");
    };
    let store = load_store(config)?;
    match store.get(id) {
        Ok(item) => {
            println!("{}", item.to_json());
            Ok(EXIT_OK)
        }
        Err(e) => {
            eprintln!("{e}");
            Ok(EXIT_FAILURE)
        }
    }
}

fn cmd_reload(config: &AppConfig) -> Result<u8> {
    let indexer = RulesIndexer::new(&config.rules.source_dir, &config.rules.index_path);
    match indexer.reload() {
        Ok(report) => {
            println!("{}", output::reload_line(&report));
            Ok(EXIT_OK)
        }
        Err(e) => {
            eprintln!("{e}");
            Ok(EXIT_FAILURE)
        }
    }
}

fn cmd_doctor(config: &AppConfig) -> Result<u8> {
    let report = doctor(&config.rules.index_path)?;
    print!("{}", output::doctor_lines(&report));
    Ok(match report.status {
        DoctorStatus::Healthy => EXIT_OK,
        DoctorStatus::Repaired => EXIT_DEGRADED,
        DoctorStatus::Unrepaired => EXIT_FAILURE,
    })
}

fn cmd_play(config: &AppConfig, args: &[String]) -> Result<u8> {
    let target = positional(args).unwrap_or("encounter/goblin");
    let seed: u64 = match flag_value(args, "--seed") {
        Some(raw) => raw.parse().with_context(|| format!("bad seed {raw:?}"))?,
        None => 0,
    };
    let json_mode = has_flag(args, "--json");
    let rules = config.encounter_rules();

    match config.engine.backend {
        EngineBackend::Data => {
            let store = load_store(config)?;
            let plan = plan_for(target, Some(&store))?;
            let source = ContentSource::new(&store);
            play(plan, &source, rules, seed, json_mode)?;
        }
        EngineBackend::Builtin => {
            let plan = plan_for(target, None)?;
            play(plan, &BuiltinSource, rules, seed, json_mode)?;
        }
    }
    Ok(EXIT_OK)
}

/// Build the encounter plan for a target ref: an encounter fixture's
/// opponent list when one resolves, otherwise the ref itself as a
/// single monster.
fn plan_for(target: &str, store: Option<&ContentStore>) -> Result<EncounterPlan> {
    if let Some(store) = store {
        if let Ok(fixture_id) = ident::normalize(target, Some(ContentType::Encounter)) {
            if let Ok(item) = store.get(&fixture_id) {
                if item.kind == ContentType::Encounter {
                    let opponents = item.opponents().iter().map(|s| s.to_string()).collect();
                    return Ok(EncounterPlan::solo_against(opponents));
                }
            }
        }
    }
    Ok(EncounterPlan::solo_against(vec![target.to_string()]))
}

fn play<S: CombatantSource>(
    plan: EncounterPlan,
    source: &S,
    rules: crate::core::encounter::EncounterRules,
    seed: u64,
    json_mode: bool,
) -> Result<crate::core::encounter::Outcome> {
    let engine = EncounterEngine::setup(&plan, source, rules, seed)?;
    if json_mode {
        let stdout = io::stdout();
        let mut sink = JsonLinesSink::new(stdout.lock());
        Ok(engine.run(&mut sink)?)
    } else {
        let mut sink = MemorySink::new();
        let outcome = engine.run(&mut sink)?;
        for event in &sink.events {
            println!("{}", output::event_line(event));
        }
        Ok(outcome)
    }
}

/// Terminal-UI shell placeholder: validates its arguments and reports
/// that the interactive shell is not built yet.
pub fn tui_placeholder(args: &[String]) -> Result<u8> {
    if !args.is_empty() {
        eprintln!("tui takes no arguments");
        return Ok(EXIT_FAILURE);
    }
    eprintln!("interactive shell not available yet; see 'grimoire play'");
    Ok(EXIT_FAILURE)
}
