//! Typed content records and the read-only content store.

mod error;
mod store;
mod types;

pub use error::{ContentError, Result};
pub use store::ContentStore;
pub use types::ContentItem;
