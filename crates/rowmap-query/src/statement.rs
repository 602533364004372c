//! INSERT, UPDATE and DELETE statement builders.

use crate::expr::{Expr, QueryOptions, render_value};
use rowmap_core::{Error, Result, Value};

/// Value assigned to a column when an upsert hits its conflict target.
#[derive(Debug, Clone)]
pub enum ConflictValue {
    /// Take the value proposed in the conflicting row (`excluded.<column>`).
    Excluded,
    /// Bind a fixed value (the forced `updated_at` timestamp).
    Bind(Value),
}

/// ON CONFLICT DO UPDATE clause of an upsert.
#[derive(Debug, Clone)]
pub struct OnConflict {
    /// Conflict target column.
    pub target: String,
    /// Ordered SET assignments applied on conflict.
    pub assignments: Vec<(String, ConflictValue)>,
}

/// INSERT statement builder (single- and multi-row, optional RETURNING and
/// conflict resolution).
#[derive(Debug, Clone)]
pub struct InsertStatement {
    table: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    returning: Option<String>,
    on_conflict: Option<OnConflict>,
}

impl InsertStatement {
    /// Create an insert into `table` over the given column set.
    pub fn new(table: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            table: table.into(),
            columns,
            rows: Vec::new(),
            returning: None,
            on_conflict: None,
        }
    }

    /// Append one row of values. Every row must match the column set.
    #[must_use]
    pub fn row(mut self, values: Vec<Value>) -> Self {
        self.rows.push(values);
        self
    }

    /// Add a single-column RETURNING clause.
    #[must_use]
    pub fn returning(mut self, column: impl Into<String>) -> Self {
        self.returning = Some(column.into());
        self
    }

    /// Add conflict resolution.
    #[must_use]
    pub fn on_conflict(mut self, clause: OnConflict) -> Self {
        self.on_conflict = Some(clause);
        self
    }

    /// Build the INSERT SQL and parameters.
    #[allow(clippy::result_large_err)]
    pub fn build(&self, opts: &QueryOptions) -> Result<(String, Vec<Value>)> {
        if self.columns.is_empty() {
            return Err(Error::build(self.table.clone(), "empty column list"));
        }
        if self.rows.is_empty() {
            return Err(Error::build(self.table.clone(), "no rows to insert"));
        }
        for row in &self.rows {
            if row.len() != self.columns.len() {
                return Err(Error::build(
                    self.table.clone(),
                    format!(
                        "row has {} values for {} columns",
                        row.len(),
                        self.columns.len()
                    ),
                ));
            }
        }

        let mut params = Vec::new();
        let mut row_sqls = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let placeholders: Vec<_> = row
                .iter()
                .map(|value| render_value(value, opts, &mut params))
                .collect();
            row_sqls.push(format!("({})", placeholders.join(", ")));
        }

        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.table,
            self.columns.join(", "),
            row_sqls.join(", ")
        );

        if let Some(conflict) = &self.on_conflict {
            let assignments: Vec<_> = conflict
                .assignments
                .iter()
                .map(|(column, value)| match value {
                    ConflictValue::Excluded => format!("{column} = excluded.{column}"),
                    ConflictValue::Bind(value) => {
                        format!("{column} = {}", render_value(value, opts, &mut params))
                    }
                })
                .collect();
            sql.push_str(&format!(
                " ON CONFLICT ({}) DO UPDATE SET {}",
                conflict.target,
                assignments.join(", ")
            ));
        }

        if let Some(column) = &self.returning {
            sql.push_str(" RETURNING ");
            sql.push_str(column);
        }

        Ok((sql, params))
    }
}

/// UPDATE statement builder.
#[derive(Debug, Clone)]
pub struct UpdateStatement {
    table: String,
    set: Vec<(String, Value)>,
    filter: Option<Expr>,
}

impl UpdateStatement {
    /// Create an update of `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            set: Vec::new(),
            filter: None,
        }
    }

    /// Assign a column.
    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: Value) -> Self {
        self.set.push((column.into(), value));
        self
    }

    /// Assign many columns in order.
    #[must_use]
    pub fn set_all(mut self, assignments: impl IntoIterator<Item = (String, Value)>) -> Self {
        self.set.extend(assignments);
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

    /// Add an optional WHERE condition. `None` updates the whole table.
    #[must_use]
    pub fn filter_opt(self, expr: Option<Expr>) -> Self {
        match expr {
            Some(expr) => self.filter(expr),
            None => self,
        }
    }

    /// Build the UPDATE SQL and parameters.
    #[allow(clippy::result_large_err)]
    pub fn build(&self, opts: &QueryOptions) -> Result<(String, Vec<Value>)> {
        if self.set.is_empty() {
            return Err(Error::build(self.table.clone(), "no columns to update"));
        }

        let mut params = Vec::new();
        let assignments: Vec<_> = self
            .set
            .iter()
            .map(|(column, value)| format!("{column} = {}", render_value(value, opts, &mut params)))
            .collect();

        let mut sql = format!("UPDATE {} SET {}", self.table, assignments.join(", "));

        if let Some(filter) = &self.filter {
            sql.push_str(" WHERE ");
            sql.push_str(&filter.render(opts, &mut params));
        }

        Ok((sql, params))
    }
}

/// DELETE statement builder.
#[derive(Debug, Clone)]
pub struct DeleteStatement {
    table: String,
    filter: Option<Expr>,
}

impl DeleteStatement {
    /// Create a delete from `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filter: None,
        }
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

    /// Add an optional WHERE condition. `None` deletes the whole table.
    #[must_use]
    pub fn filter_opt(self, expr: Option<Expr>) -> Self {
        match expr {
            Some(expr) => self.filter(expr),
            None => self,
        }
    }

    /// Build the DELETE SQL and parameters.
    #[allow(clippy::result_large_err)]
    pub fn build(&self, opts: &QueryOptions) -> Result<(String, Vec<Value>)> {
        let mut params = Vec::new();
        let mut sql = format!("DELETE FROM {}", self.table);

        if let Some(filter) = &self.filter {
            sql.push_str(" WHERE ");
            sql.push_str(&filter.render(opts, &mut params));
        }

        Ok((sql, params))
    }
}
