//! Database module for search terms.
//!
//! Uses `rusqlite` (bundled `SQLite`) to record the terms users search for
//! and to notify registered observers when a term is first saved.

mod migrations;
/// Search term storage and save hooks.
pub mod search_terms;

#[allow(clippy::module_name_repetitions)]
pub use search_terms::{SearchTerm, SearchTermObserver, SearchTermStore, normalize_term};
