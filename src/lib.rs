//! Grimoire - TTRPG Assistant (Rules Index & Encounter Engine)
//!
//! Core library providing canonical content lookup, typo-tolerant verb
//! resolution, an incrementally reloadable rules index, and a seeded,
//! fully deterministic encounter engine for tabletop RPG game masters.

pub mod cli;
pub mod config;
pub mod core;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
