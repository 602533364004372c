//! SELECT statement builder.

use crate::clause::OrderBy;
use crate::expr::{Expr, QueryOptions};
use crate::join::Join;
use rowmap_core::{Error, Result, Value};

/// SELECT statement builder.
///
/// Column projections come in pre-qualified from the introspector; the
/// builder assembles FROM/JOIN/WHERE/ORDER/LIMIT around them.
#[derive(Debug, Clone)]
pub struct SelectStatement {
    columns: Vec<String>,
    table: String,
    alias: Option<String>,
    joins: Vec<Join>,
    filter: Option<Expr>,
    order: Vec<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl SelectStatement {
    /// Create a builder selecting `columns` from `table`.
    pub fn new(table: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            columns,
            table: table.into(),
            alias: None,
            joins: Vec::new(),
            filter: None,
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Alias the FROM table.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Add a join.
    #[must_use]
    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    /// Add joins.
    #[must_use]
    pub fn joins(mut self, joins: impl IntoIterator<Item = Join>) -> Self {
        self.joins.extend(joins);
        self
    }

    /// Add a WHERE condition (ANDed with any existing condition).
    #[must_use]
    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter = Some(match self.filter {
            Some(existing) => existing.and(expr),
            None => expr,
        });
        self
    }

    /// Add an optional WHERE condition.
    #[must_use]
    pub fn filter_opt(self, expr: Option<Expr>) -> Self {
        match expr {
            Some(expr) => self.filter(expr),
            None => self,
        }
    }

    /// Set the ordering.
    #[must_use]
    pub fn order_by(mut self, order: Vec<OrderBy>) -> Self {
        self.order = order;
        self
    }

    /// Set the row limit.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the row offset.
    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Build the SELECT SQL and parameters.
    #[allow(clippy::result_large_err)]
    pub fn build(&self, opts: &QueryOptions) -> Result<(String, Vec<Value>)> {
        if self.columns.is_empty() {
            return Err(Error::build(self.table.clone(), "empty column projection"));
        }
        if self.table.is_empty() {
            return Err(Error::build(self.table.clone(), "missing FROM table"));
        }

        let mut params = Vec::new();
        let mut sql = format!("SELECT {} FROM {}", self.columns.join(", "), self.table);

        if let Some(alias) = &self.alias {
            sql.push_str(" AS ");
            sql.push_str(alias);
        }

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.render(opts, &mut params));
        }

        if let Some(filter) = &self.filter {
            sql.push_str(" WHERE ");
            sql.push_str(&filter.render(opts, &mut params));
        }

        if !self.order.is_empty() {
            sql.push_str(" ORDER BY ");
            let order: Vec<_> = self.order.iter().map(OrderBy::to_sql).collect();
            sql.push_str(&order.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        Ok((sql, params))
    }
}
