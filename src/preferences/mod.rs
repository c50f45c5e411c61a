//! Client-local preferences
//!
//! Kept outside the record store: sorting mode and expanded categories.

mod store;
mod sorting;
mod expansion;

pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use sorting::{SortingPreference, SORT_MODE_KEY};
pub use expansion::{ExpansionState, EXPANDED_KEY};
