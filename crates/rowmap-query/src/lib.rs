//! SQL statement construction for rowmap.
//!
//! Builders here assemble the statements the generic repository issues:
//! SELECT with joined relations, single- and multi-row INSERT with
//! RETURNING, UPDATE, DELETE and upsert conflict clauses. Rendering is
//! dialect-aware and positional; build failures are programmer errors
//! surfaced as [`rowmap_core::Error::Build`].

pub mod clause;
pub mod expr;
pub mod join;
pub mod select;
pub mod statement;

pub use clause::{Criteria, OrderBy, OrderDirection, criteria_expr};
pub use expr::{BinaryOp, Dialect, Expr, QueryOptions};
pub use join::{Join, JoinType};
pub use select::SelectStatement;
pub use statement::{
    ConflictValue, DeleteStatement, InsertStatement, OnConflict, UpdateStatement,
};
