//! The encounter state machine.
//!
//! `Setup → RoundLoop → Resolved`. All randomness is drawn from one
//! seeded ChaCha8 stream in a fixed order, so two runs with the same
//! seed, plan and rules produce byte-identical event sequences.
//!
//! RNG draw order per turn:
//! 1. stabilize: one d20;
//! 2. heal: the heal dice, in expression order;
//! 3. flee: one d20;
//! 4. attack: one d20, then the damage dice on a hit.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::content::{ContentItem, ContentStore};
use crate::core::ident::{self, ContentType};

use super::combatant::{Combatant, PlayerCharacter, Side, StatusFlag};
use super::error::{EncounterError, Result};
use super::event::{EncounterEvent, EventKind, EventSink};

/// Roll needed on a d20 to stabilize a downed ally or break away.
const RESCUE_DC: u32 = 10;

/// A combatant heals (or tries to flee) below this fraction of max hp.
const DESPERATION_DIVISOR: i64 = 4;

// ============================================================================
// Configuration & plan
// ============================================================================

/// Rule toggles governing one encounter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterRules {
    /// When true, zero hp removes a combatant instantly instead of
    /// entering the stabilization-eligible downed state. Evaluated at
    /// every hp transition, never cached.
    pub instant_death: bool,
    /// Hard cap on rounds; the only built-in termination guard.
    pub round_cap: u32,
}

impl Default for EncounterRules {
    fn default() -> Self {
        Self {
            instant_death: false,
            round_cap: 20,
        }
    }
}

/// What to fight: party definitions plus opponent content refs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterPlan {
    pub party: Vec<PlayerCharacter>,
    /// Content refs in any raw shape (`monster.goblin`, ...).
    pub opponents: Vec<String>,
}

impl EncounterPlan {
    /// A single default hero against the given opponents.
    pub fn solo_against(opponents: Vec<String>) -> Self {
        Self {
            party: vec![PlayerCharacter::default()],
            opponents,
        }
    }
}

/// Final outcome carried by the terminal summary event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Victory,
    Defeat,
    Draw,
    Timeout,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Victory => "victory",
            Outcome::Defeat => "defeat",
            Outcome::Draw => "draw",
            Outcome::Timeout => "timeout",
        }
    }
}

// ============================================================================
// Combatant sources
// ============================================================================

/// Where opponent stat blocks come from.
pub trait CombatantSource {
    /// Resolve a raw content ref to a stat block.
    fn stat_block(&self, raw_ref: &str) -> Result<ContentItem>;
}

/// The content-backed ("data") source: stat blocks from the store.
pub struct ContentSource<'a> {
    store: &'a ContentStore,
}

impl<'a> ContentSource<'a> {
    pub fn new(store: &'a ContentStore) -> Self {
        Self { store }
    }
}

impl CombatantSource for ContentSource<'_> {
    fn stat_block(&self, raw_ref: &str) -> Result<ContentItem> {
        let item = self
            .store
            .get_hinted(raw_ref, ContentType::Monster)
            .map_err(|e| EncounterError::InvalidEncounter {
                reason: format!("unresolvable opponent ref {raw_ref:?}: {e}"),
            })?;
        Ok(item.clone())
    }
}

/// Minimal fallback bestiary used when no content directory is wired.
pub struct BuiltinSource;

const BUILTIN_BESTIARY: &[(&str, &str, i64, i64, i64, &str)] = &[
    // (id, name, hp, ac, attack, damage)
    ("monster/goblin", "Goblin", 7, 15, 4, "1d6+2"),
    ("monster/wolf", "Wolf", 11, 13, 4, "2d4+2"),
    ("monster/bandit", "Bandit", 11, 12, 3, "1d6+1"),
];

impl CombatantSource for BuiltinSource {
    fn stat_block(&self, raw_ref: &str) -> Result<ContentItem> {
        let id = ident::normalize(raw_ref, Some(ContentType::Monster))?;
        let (id, name, hp, ac, attack, damage) = BUILTIN_BESTIARY
            .iter()
            .find(|(bid, ..)| *bid == id)
            .ok_or_else(|| EncounterError::InvalidEncounter {
                reason: format!("unresolvable opponent ref {raw_ref:?}: not in builtin bestiary"),
            })?;
        let fields = serde_json::json!({
            "hp": hp, "ac": ac, "attack": attack, "damage": damage
        });
        Ok(ContentItem {
            id: (*id).to_string(),
            kind: ContentType::Monster,
            name: (*name).to_string(),
            fields: fields.as_object().cloned().unwrap_or_default(),
        })
    }
}

// ============================================================================
// Engine
// ============================================================================

/// One bounded encounter run from Setup to Resolved.
///
/// Constructed per encounter; consumed by [`run`](EncounterEngine::run),
/// after which no further actions are accepted.
#[derive(Debug)]
pub struct EncounterEngine {
    rules: EncounterRules,
    combatants: Vec<Combatant>,
    rng: ChaCha8Rng,
}

impl EncounterEngine {
    /// Setup: build combatants from the plan, party first (turn order is
    /// party before opponents, stable by original ordering).
    ///
    /// # Errors
    ///
    /// [`EncounterError::InvalidEncounter`] when an opponent ref does not
    /// resolve or a stat block is unusable.
    pub fn setup<S: CombatantSource>(
        plan: &EncounterPlan,
        source: &S,
        rules: EncounterRules,
        seed: u64,
    ) -> Result<Self> {
        if plan.party.is_empty() {
            return Err(EncounterError::InvalidEncounter {
                reason: "encounter plan has no party members".to_string(),
            });
        }
        if plan.opponents.is_empty() {
            return Err(EncounterError::InvalidEncounter {
                reason: "encounter plan has no opponents".to_string(),
            });
        }

        let mut combatants = Vec::new();
        for pc in &plan.party {
            combatants.push(pc.to_combatant()?);
        }

        let items: Vec<ContentItem> = plan
            .opponents
            .iter()
            .map(|raw| source.stat_block(raw))
            .collect::<Result<_>>()?;
        for (idx, item) in items.iter().enumerate() {
            // Number duplicates so every actor name is unambiguous.
            let repeated = items.iter().filter(|i| i.id == item.id).count() > 1;
            let ordinal = items[..idx].iter().filter(|i| i.id == item.id).count() + 1;
            let name = if repeated {
                format!("{} {}", item.name, ordinal)
            } else {
                item.name.clone()
            };
            combatants.push(Combatant::from_item(item, Side::Opponents, name)?);
        }

        debug!(
            party = plan.party.len(),
            opponents = plan.opponents.len(),
            seed,
            "encounter setup complete"
        );
        Ok(Self {
            rules,
            combatants,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    /// RoundLoop → Resolved: run the encounter to completion, emitting
    /// one event per resolved action and exactly one terminal summary.
    pub fn run<K: EventSink>(mut self, sink: &mut K) -> Result<Outcome> {
        let mut outcome = None;
        let mut rounds_played = 0;

        for round in 1..=self.rules.round_cap {
            rounds_played = round;
            for idx in 0..self.combatants.len() {
                if !self.combatants[idx].is_active() || self.combatants[idx].needs_stabilizing() {
                    continue;
                }
                self.take_turn(idx, round, sink)?;
                if let Some(done) = self.check_resolution() {
                    outcome = Some(done);
                    break;
                }
            }
            if outcome.is_some() {
                break;
            }
        }

        let outcome = outcome.unwrap_or(Outcome::Timeout);
        let summary = EncounterEvent::new(EventKind::Summary, rounds_played, "encounter")
            .with("outcome", outcome.as_str())
            .with("rounds", rounds_played);
        sink.emit(&summary)?;
        sink.flush()?;
        Ok(outcome)
    }

    /// One combatant's turn. Deterministic policy; see the module docs
    /// for the RNG draw order.
    fn take_turn<K: EventSink>(&mut self, idx: usize, round: u32, sink: &mut K) -> Result<()> {
        let side = self.combatants[idx].side;

        // 1. Stabilize a downed ally (downed-state rule only).
        if !self.rules.instant_death {
            let downed = self
                .combatants
                .iter()
                .position(|c| c.side == side && c.needs_stabilizing());
            if let Some(target_idx) = downed {
                return self.stabilize(idx, target_idx, round, sink);
            }
        }

        // 2. Desperation: heal while supplies last, otherwise flee.
        let actor = &self.combatants[idx];
        if actor.hp * DESPERATION_DIVISOR <= actor.max_hp {
            if actor.heals_left > 0 && actor.heal.is_some() {
                return self.heal_self(idx, round, sink);
            }
            return self.flee(idx, round, sink);
        }

        // 3. Attack the first active enemy, stable by original ordering.
        let target_idx = self
            .combatants
            .iter()
            .position(|c| c.side == side.opposing() && c.is_active());
        match target_idx {
            Some(target_idx) => self.attack(idx, target_idx, round, sink),
            None => Ok(()),
        }
    }

    fn stabilize<K: EventSink>(
        &mut self,
        idx: usize,
        target_idx: usize,
        round: u32,
        sink: &mut K,
    ) -> Result<()> {
        let roll = self.rng.gen_range(1..=20u32);
        let success = roll >= RESCUE_DC;
        let (actor, target) = (
            self.combatants[idx].name.clone(),
            self.combatants[target_idx].name.clone(),
        );
        sink.emit(
            &EncounterEvent::new(EventKind::Action, round, actor)
                .with("action", "stabilize")
                .with("target", target.clone())
                .with("roll", roll)
                .with("success", success),
        )?;
        if success {
            self.combatants[target_idx].status.insert(StatusFlag::Stable);
            sink.emit(
                &EncounterEvent::new(EventKind::Status, round, target).with("status", "stable"),
            )?;
        }
        Ok(())
    }

    fn heal_self<K: EventSink>(&mut self, idx: usize, round: u32, sink: &mut K) -> Result<()> {
        let Some(heal) = self.combatants[idx].heal else {
            return Ok(());
        };
        let roll = heal.roll(&mut self.rng);
        let actor = &mut self.combatants[idx];
        actor.heals_left -= 1;
        let healed = actor.apply_healing(roll as i64);
        let event = EncounterEvent::new(EventKind::Action, round, actor.name.clone())
            .with("action", "heal")
            .with("roll", roll)
            .with("healed", healed)
            .with("hp", actor.hp);
        sink.emit(&event)?;
        Ok(())
    }

    fn flee<K: EventSink>(&mut self, idx: usize, round: u32, sink: &mut K) -> Result<()> {
        let roll = self.rng.gen_range(1..=20u32);
        let success = roll >= RESCUE_DC;
        let name = self.combatants[idx].name.clone();
        sink.emit(
            &EncounterEvent::new(EventKind::Action, round, name.clone())
                .with("action", "flee")
                .with("roll", roll)
                .with("success", success),
        )?;
        if success {
            self.combatants[idx].status.insert(StatusFlag::Fled);
            sink.emit(&EncounterEvent::new(EventKind::Status, round, name).with("status", "fled"))?;
        }
        Ok(())
    }

    fn attack<K: EventSink>(
        &mut self,
        idx: usize,
        target_idx: usize,
        round: u32,
        sink: &mut K,
    ) -> Result<()> {
        let roll = self.rng.gen_range(1..=20u32) as i64;
        let total = roll + self.combatants[idx].attack_bonus;
        let hit = total >= self.combatants[target_idx].ac;
        let actor_name = self.combatants[idx].name.clone();
        let target_name = self.combatants[target_idx].name.clone();

        sink.emit(
            &EncounterEvent::new(EventKind::Action, round, actor_name.clone())
                .with("action", "attack")
                .with("target", target_name.clone())
                .with("roll", roll)
                .with("total", total)
                .with("hit", hit),
        )?;
        if !hit {
            return Ok(());
        }

        let damage = self.combatants[idx].damage.roll(&mut self.rng) as i64;
        let flag = self.combatants[target_idx].apply_damage(damage, self.rules.instant_death);
        sink.emit(
            &EncounterEvent::new(EventKind::Damage, round, actor_name)
                .with("target", target_name.clone())
                .with("amount", damage)
                .with("remaining", self.combatants[target_idx].hp),
        )?;
        if let Some(flag) = flag {
            let status = match flag {
                StatusFlag::Dead => "dead",
                _ => "downed",
            };
            sink.emit(
                &EncounterEvent::new(EventKind::Status, round, target_name).with("status", status),
            )?;
        }
        Ok(())
    }

    /// Resolved when a side has no combatant standing (fled combatants
    /// count as absent).
    fn check_resolution(&self) -> Option<Outcome> {
        let party_up = self
            .combatants
            .iter()
            .any(|c| c.side == Side::Party && c.is_standing());
        let opponents_up = self
            .combatants
            .iter()
            .any(|c| c.side == Side::Opponents && c.is_standing());
        match (party_up, opponents_up) {
            (false, false) => Some(Outcome::Draw),
            (false, true) => Some(Outcome::Defeat),
            (true, false) => Some(Outcome::Victory),
            (true, true) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::encounter::MemorySink;

    fn goblin_plan() -> EncounterPlan {
        EncounterPlan::solo_against(vec!["monster/goblin".to_string()])
    }

    fn run_with_seed(seed: u64) -> (Outcome, Vec<EncounterEvent>) {
        let engine =
            EncounterEngine::setup(&goblin_plan(), &BuiltinSource, EncounterRules::default(), seed)
                .unwrap();
        let mut sink = MemorySink::new();
        let outcome = engine.run(&mut sink).unwrap();
        (outcome, sink.events)
    }

    #[test]
    fn test_identical_seed_identical_event_sequence() {
        let (outcome_a, events_a) = run_with_seed(7);
        let (outcome_b, events_b) = run_with_seed(7);
        assert_eq!(outcome_a, outcome_b);
        assert_eq!(events_a, events_b);
    }

    #[test]
    fn test_terminal_event_is_single_summary() {
        let (_, events) = run_with_seed(7);
        let last = events.last().unwrap();
        assert_eq!(last.event, EventKind::Summary);
        let summaries = events.iter().filter(|e| e.event == EventKind::Summary).count();
        assert_eq!(summaries, 1);
        assert!(last.detail.contains_key("outcome"));
    }

    #[test]
    fn test_unresolvable_ref_fails_setup() {
        let plan = EncounterPlan::solo_against(vec!["monster/tarrasque".to_string()]);
        match EncounterEngine::setup(&plan, &BuiltinSource, EncounterRules::default(), 1) {
            Err(EncounterError::InvalidEncounter { reason }) => {
                assert!(reason.contains("tarrasque"));
            }
            other => panic!("expected InvalidEncounter, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_plan_fails_setup() {
        let plan = EncounterPlan {
            party: vec![],
            opponents: vec!["monster/goblin".to_string()],
        };
        assert!(EncounterEngine::setup(&plan, &BuiltinSource, EncounterRules::default(), 1).is_err());
    }

    #[test]
    fn test_round_cap_yields_timeout() {
        // Unhittable combatants: every attack misses, so the cap is the
        // only way out.
        let plan = EncounterPlan {
            party: vec![PlayerCharacter {
                ac: 100,
                attack: -50,
                heal: None,
                heals: 0,
                ..PlayerCharacter::default()
            }],
            opponents: vec!["monster/goblin".to_string()],
        };
        let rules = EncounterRules {
            round_cap: 3,
            ..EncounterRules::default()
        };
        let engine = EncounterEngine::setup(&plan, &BuiltinSource, rules, 1).unwrap();
        let mut sink = MemorySink::new();
        let outcome = engine.run(&mut sink).unwrap();
        // Goblin (ac 15) cannot be hit at -50; hero (ac 100) cannot be hit.
        assert_eq!(outcome, Outcome::Timeout);
        let last = sink.events.last().unwrap();
        assert_eq!(last.detail["outcome"], "timeout");
        assert_eq!(last.round, 3);
    }

    #[test]
    fn test_duplicate_opponents_get_numbered_names() {
        let plan = EncounterPlan::solo_against(vec![
            "monster/goblin".to_string(),
            "monster/goblin".to_string(),
        ]);
        let engine =
            EncounterEngine::setup(&plan, &BuiltinSource, EncounterRules::default(), 1).unwrap();
        let names: Vec<&str> = engine
            .combatants
            .iter()
            .filter(|c| c.side == Side::Opponents)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["Goblin 1", "Goblin 2"]);
    }

    #[test]
    fn test_instant_death_marks_dead_not_downed() {
        let rules = EncounterRules {
            instant_death: true,
            ..EncounterRules::default()
        };
        let engine = EncounterEngine::setup(&goblin_plan(), &BuiltinSource, rules, 7).unwrap();
        let mut sink = MemorySink::new();
        engine.run(&mut sink).unwrap();
        for event in &sink.events {
            if event.event == EventKind::Status {
                assert_ne!(event.detail["status"], "downed");
            }
        }
    }

    #[test]
    fn test_party_acts_before_opponents() {
        let (_, events) = run_with_seed(7);
        let first_action = events.iter().find(|e| e.event == EventKind::Action).unwrap();
        assert_eq!(first_action.actor, "Hero");
        assert_eq!(first_action.round, 1);
    }
}
