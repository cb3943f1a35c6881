//! The deterministic encounter engine.
//!
//! Consumes combatant stat blocks (content-backed or builtin) and a
//! seeded RNG stream to run a turn-based resolution loop, emitting one
//! structured event per state transition and a terminal summary event.

mod combatant;
mod dice;
mod engine;
mod error;
mod event;

pub use combatant::{Combatant, PlayerCharacter, Side, StatusFlag};
pub use dice::{DiceExpression, InvalidDiceExpressionError};
pub use engine::{
    BuiltinSource, CombatantSource, ContentSource, EncounterEngine, EncounterPlan,
    EncounterRules, Outcome,
};
pub use error::{EncounterError, Result};
pub use event::{
    EncounterEvent, EventKind, EventSink, JsonLinesSink, MemorySink, NdjsonFileSink,
};
