//! The `Entity` trait and row-reading support.
//!
//! An entity is a typed record mapped to a relational row, plus optional
//! joined substructures. The trait surfaces the declared descriptor tree,
//! an ordered write-path projection (`to_row`) and an ordered read-path
//! constructor (`from_reader`). Both walk fields in declaration order;
//! the descriptor is the single source of truth for that order.

use crate::Result;
use crate::descriptor::EntityDescriptor;
use crate::error::{Error, TypeError};
use crate::value::{FromValue, Value};
use std::fmt;

/// Trait for types mapped to database tables.
pub trait Entity: Sized + Send + Sync {
    /// The table name.
    const TABLE: &'static str;

    /// The alias used to qualify the entity's own columns in queries.
    const ALIAS: &'static str;

    /// The declared field metadata.
    fn descriptor() -> &'static EntityDescriptor;

    /// The entity's values as ordered `(column, value)` pairs.
    ///
    /// Walks fields in declaration order; embedded and inner structs
    /// contribute their pairs in place. Relation fields contribute nothing.
    fn to_row(&self) -> Vec<(&'static str, Value)>;

    /// Construct an entity from an ordered value stream.
    ///
    /// Must consume values in exactly the order the descriptor declares
    /// columns; relation substructures are read through
    /// [`RowReader::relation`], which yields `None` when the relation was
    /// not part of the query.
    #[allow(clippy::result_large_err)]
    fn from_reader(reader: &mut RowReader<'_>) -> Result<Self>;

    /// The primary-key value ([`Value::Null`] when unset).
    fn primary_key(&self) -> Value;
}

/// Primary-key parameter of a repository: integer or text keys only.
pub trait Key: Clone + fmt::Display + Send + Sync + 'static {
    /// Encode the key as a bind value.
    fn to_value(&self) -> Value;

    /// Decode a key returned by the store.
    #[allow(clippy::result_large_err)]
    fn from_value(value: Value) -> Result<Self>;
}

impl Key for i64 {
    fn to_value(&self) -> Value {
        Value::BigInt(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        <i64 as FromValue>::from_value(&value)
    }
}

impl Key for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        <String as FromValue>::from_value(&value)
    }
}

/// Sequential reader over a materialized row's values.
///
/// Created by the materializer after the nullable-shadow pass resolved; the
/// reader only decodes. The requested relation set gates whether relation
/// substructures consume values; nested walks see an empty relation set,
/// so only top-level relations expand.
#[derive(Debug)]
pub struct RowReader<'a> {
    values: &'a [Value],
    relations: &'a [&'a str],
    pos: usize,
}

impl<'a> RowReader<'a> {
    /// Create a reader over resolved values with the requested relations.
    pub fn new(values: &'a [Value], relations: &'a [&'a str]) -> Self {
        Self {
            values,
            relations,
            pos: 0,
        }
    }

    /// Decode the next value as `T`.
    #[allow(clippy::result_large_err)]
    pub fn column<T: FromValue>(&mut self) -> Result<T> {
        let value = self.values.get(self.pos).ok_or_else(|| {
            Error::Type(TypeError {
                expected: std::any::type_name::<T>(),
                actual: format!("row exhausted at position {}", self.pos),
                column: None,
            })
        })?;
        self.pos += 1;
        T::from_value(value)
    }

    /// Whether the named relation was requested for this row.
    #[must_use]
    pub fn has_relation(&self, name: &str) -> bool {
        self.relations.contains(&name)
    }

    /// Read a relation substructure, if it was requested.
    ///
    /// Returns `Ok(None)` without consuming values when the relation is not
    /// part of the query; callers substitute the substructure's zero value.
    #[allow(clippy::result_large_err)]
    pub fn relation<E>(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut RowReader<'a>) -> Result<E>,
    ) -> Result<Option<E>> {
        if !self.has_relation(name) {
            return Ok(None);
        }
        let saved = self.relations;
        self.relations = &[];
        let out = f(self);
        self.relations = saved;
        out.map(Some)
    }

    /// Number of values not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.values.len().saturating_sub(self.pos)
    }
}
