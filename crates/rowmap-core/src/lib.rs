//! Core types and traits for rowmap.
//!
//! This crate provides the foundational abstractions of the mapping layer:
//!
//! - `Entity` trait and static descriptor trees for declarative field metadata
//! - `Value` / `Row` dynamic SQL values and result rows
//! - `Executor` trait for the SQL store collaborator
//! - `Outcome` / `Cx` re-exports from asupersync for cancel-correct operations

// Re-export asupersync primitives for structured concurrency
pub use asupersync::{Cx, Outcome};

pub mod descriptor;
pub mod entity;
pub mod error;
pub mod executor;
pub mod row;
pub mod value;

pub use descriptor::{
    ColumnDescriptor, EntityDescriptor, FieldDescriptor, RelationDescriptor, ScalarKind,
};
pub use entity::{Entity, Key, RowReader};
pub use error::{BuildError, Error, ExecutionError, ExecutionErrorKind, Result, TypeError};
pub use executor::Executor;
pub use row::{ColumnInfo, Row};
pub use value::{FromValue, Value};
