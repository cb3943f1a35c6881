//! The searchable rules index.
//!
//! Rule text is indexed from a source directory into a persisted JSON
//! index. Entries derived from source content are `generated` and are
//! refreshed whenever their content hash changes; user-authored `custom`
//! entries are never touched by a reload and shadow generated entries
//! sharing their ID.

mod doctor;
mod entry;
mod error;
mod index;
mod reload;

pub use doctor::{doctor, DoctorReport, DoctorStatus};
pub use entry::{content_hash, tokenize, EntryOrigin, IndexEntry};
pub use error::{Result, RulesError};
pub use index::RulesIndex;
pub use reload::{ReloadReport, RulesIndexer};
