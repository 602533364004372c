//! Search-index synchronization for rowmap repositories.
//!
//! [`IndexedRepository`] decorates a generic repository so that creates,
//! updates and deletes keep a secondary full-text index eventually
//! consistent with the store, and supports term search with wrong-layout
//! retry and full reindexing.

pub mod client;
pub mod repository;
pub mod term;

pub use client::{IndexSettings, SearchIndex, SearchOptions, SearchRequest};
pub use repository::{IndexableEntity, IndexedRepository};
pub use term::switch_keyboard_layout;
