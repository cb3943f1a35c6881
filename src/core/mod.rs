//! Core subsystems: content identity, typed content storage, verb
//! resolution, the rules index, and the encounter engine.

pub mod content;
pub mod encounter;
pub mod ident;
pub mod rules;
pub mod verbs;
