//! JOIN clause types.

use crate::expr::{Expr, QueryOptions};
use rowmap_core::Value;

/// A JOIN clause.
#[derive(Debug, Clone)]
pub struct Join {
    /// Type of join
    pub join_type: JoinType,
    /// Table to join
    pub table: String,
    /// Table alias
    pub alias: String,
    /// ON condition
    pub on: Expr,
}

/// Types of SQL joins.
///
/// A nullable relation joins LEFT so an absent row scans as NULLs; a
/// required relation joins INNER.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
}

impl JoinType {
    /// Get the SQL keyword for this join type.
    pub const fn as_str(self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
        }
    }
}

impl Join {
    /// Create an INNER JOIN.
    pub fn inner(table: impl Into<String>, alias: impl Into<String>, on: Expr) -> Self {
        Self {
            join_type: JoinType::Inner,
            table: table.into(),
            alias: alias.into(),
            on,
        }
    }

    /// Create a LEFT JOIN.
    pub fn left(table: impl Into<String>, alias: impl Into<String>, on: Expr) -> Self {
        Self {
            join_type: JoinType::Left,
            table: table.into(),
            alias: alias.into(),
            on,
        }
    }

    /// Render this join, appending bind values to `params`.
    pub fn render(&self, opts: &QueryOptions, params: &mut Vec<Value>) -> String {
        let on_sql = self.on.render(opts, params);
        format!(
            "{} {} AS {} ON {}",
            self.join_type.as_str(),
            self.table,
            self.alias,
            on_sql
        )
    }
}
