//! Generic repository engine for rowmap.
//!
//! Composes the field-metadata introspector (column projection), the
//! write-path row sanitizer and the read-path row materializer with SQL
//! statement construction into a generic CRUD/batch repository:
//!
//! - [`projection`]: ordered column projections from descriptor trees
//! - [`sanitize`]: insert/update payload extraction with timestamp defaults
//! - [`materialize`]: scan layouts and the nullable-shadow pass
//! - [`conflict`]: upsert-based multi-row update
//! - [`repository`]: the [`Repository`] itself

pub mod conflict;
pub mod materialize;
pub mod options;
pub mod projection;
pub mod repository;
pub mod sanitize;

pub use conflict::{build_conflict_update, dedup_by_primary_key};
pub use materialize::{Slot, materialize, materialize_rows, slots};
pub use options::{ListOptions, Relation};
pub use repository::Repository;
pub use sanitize::{RowValues, SanitizeOptions, extract_row};
