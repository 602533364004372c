//! Generic CRUD/batch repository over an [`Executor`].
//!
//! One statement per operation; transaction scope, if any, belongs to the
//! executor the repository was built over. Statement build failures and
//! execution failures are logged with their table and key/criteria context
//! and surfaced to the caller; a single-row fetch matching nothing surfaces
//! as [`Error::NotFound`] without logging.

use crate::conflict::{build_conflict_update, dedup_by_primary_key};
use crate::materialize::{materialize, materialize_rows};
use crate::options::{ListOptions, Relation};
use crate::projection;
use crate::sanitize::{SanitizeOptions, extract_row};
use asupersync::{Cx, Outcome};
use rowmap_core::{Entity, Error, Executor, Key, Result, Value};
use rowmap_query::{
    Criteria, DeleteStatement, Expr, InsertStatement, Join, QueryOptions, SelectStatement,
    UpdateStatement, criteria_expr,
};
use std::marker::PhantomData;

/// A generic repository for one entity type and key type.
pub struct Repository<E, K, X> {
    executor: X,
    id_column: &'static str,
    options: QueryOptions,
    _marker: PhantomData<fn() -> (E, K)>,
}

impl<E, K, X> Repository<E, K, X>
where
    E: Entity,
    K: Key,
    X: Executor,
{
    /// Create a repository over the given executor.
    ///
    /// Table and alias come from the entity; the key column defaults to
    /// `id`.
    pub fn new(executor: X) -> Self {
        Self {
            executor,
            id_column: "id",
            options: QueryOptions::default(),
            _marker: PhantomData,
        }
    }

    /// Use a different key column.
    #[must_use]
    pub fn with_id_column(mut self, column: &'static str) -> Self {
        self.id_column = column;
        self
    }

    /// Use different statement rendering options.
    #[must_use]
    pub fn with_query_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    /// The underlying executor.
    pub fn executor(&self) -> &X {
        &self.executor
    }

    /// The key column qualified with the entity alias, for select
    /// predicates.
    fn qualified_id(&self) -> String {
        if self.id_column.contains('.') {
            self.id_column.to_string()
        } else {
            format!("{}.{}", E::ALIAS, self.id_column)
        }
    }

    fn log_build<T>(&self, op: &'static str, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            tracing::error!(error = %err, table = E::TABLE, op, "cannot build SQL query");
        }
        result
    }

    /// Resolve requested relations into joins via the descriptor: nullable
    /// relations join LEFT, required ones INNER.
    #[allow(clippy::result_large_err)]
    fn resolve_joins(&self, relations: &[Relation]) -> Result<Vec<Join>> {
        relations
            .iter()
            .map(|rel| {
                let declared = E::descriptor().relation(rel.name).ok_or_else(|| {
                    Error::build(E::TABLE, format!("unknown relation '{}'", rel.name))
                })?;
                let join = if declared.nullable {
                    Join::left(declared.table, declared.name, rel.on.clone())
                } else {
                    Join::inner(declared.table, declared.name, rel.on.clone())
                };
                Ok(join)
            })
            .collect()
    }

    /// Insert the entity and return the generated key.
    pub async fn create(&self, cx: &Cx, entity: &E) -> Outcome<K, Error> {
        let (_, rows) = extract_row(entity, &SanitizeOptions::for_insert());

        let stmt = InsertStatement::new(E::TABLE, rows.columns())
            .row(rows.values())
            .returning(self.id_column);

        let (sql, params) = match self.log_build("insert", stmt.build(&self.options)) {
            Ok(v) => v,
            Err(err) => return Outcome::Err(err),
        };

        match self.executor.insert(cx, &sql, &params).await {
            Outcome::Ok(value) => match K::from_value(value) {
                Ok(id) => Outcome::Ok(id),
                Err(err) => Outcome::Err(err),
            },
            Outcome::Err(err) => {
                tracing::error!(error = %err, table = E::TABLE, "error during exec insert");
                Outcome::Err(err)
            }
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    /// Insert a batch in one multi-row statement and return the generated
    /// keys in input order. An empty batch issues no statement.
    pub async fn create_multiple(&self, cx: &Cx, entities: &[E]) -> Outcome<Vec<K>, Error> {
        if entities.is_empty() {
            return Outcome::Ok(Vec::new());
        }

        let payloads: Vec<_> = entities
            .iter()
            .map(|entity| extract_row(entity, &SanitizeOptions::for_insert()).1)
            .collect();

        let mut stmt = InsertStatement::new(E::TABLE, payloads[0].columns());
        for rows in &payloads {
            stmt = stmt.row(rows.values());
        }
        let stmt = stmt.returning(self.id_column);

        let (sql, params) = match self.log_build("insert many", stmt.build(&self.options)) {
            Ok(v) => v,
            Err(err) => return Outcome::Err(err),
        };

        match self.executor.insert_many(cx, &sql, &params).await {
            Outcome::Ok(values) => {
                let mut ids = Vec::with_capacity(values.len());
                for value in values {
                    match K::from_value(value) {
                        Ok(id) => ids.push(id),
                        Err(err) => return Outcome::Err(err),
                    }
                }
                Outcome::Ok(ids)
            }
            Outcome::Err(err) => {
                tracing::error!(error = %err, table = E::TABLE, "error during exec multiple insert");
                Outcome::Err(err)
            }
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    /// Update the entity's row by primary key.
    pub async fn update(&self, cx: &Cx, entity: &E) -> Outcome<(), Error> {
        let (id, rows) = extract_row(entity, &SanitizeOptions::for_update());

        let stmt = UpdateStatement::new(E::TABLE)
            .set_all(rows.assignments())
            .filter(Expr::col(self.id_column).eq(Expr::Literal(id.clone())));

        let (sql, params) = match self.log_build("update", stmt.build(&self.options)) {
            Ok(v) => v,
            Err(err) => return Outcome::Err(err),
        };

        match self.executor.exec(cx, &sql, &params).await {
            Outcome::Ok(_) => Outcome::Ok(()),
            Outcome::Err(err) => {
                tracing::error!(error = %err, table = E::TABLE, id = ?id, "error during exec update");
                Outcome::Err(err)
            }
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    /// Update a batch as an insert with conflict resolution.
    ///
    /// The store has no multi-row positional update; rows sharing a primary
    /// key are de-duplicated first (first occurrence wins, duplicates
    /// dropped with a warning) because a conflict-resolution statement may
    /// not touch the same key twice.
    pub async fn update_multiple(&self, cx: &Cx, entities: &[E]) -> Outcome<(), Error> {
        if entities.is_empty() {
            return Outcome::Ok(());
        }

        let conflict = match self.log_build(
            "multiple update",
            build_conflict_update(E::TABLE, E::descriptor()),
        ) {
            Ok(v) => v,
            Err(err) => return Outcome::Err(err),
        };

        let pk_column = E::descriptor().primary_key().map(|pk| pk.column);
        let target_is_key = pk_column == Some(conflict.target.as_str());

        let mut payloads = Vec::new();
        for entity in dedup_by_primary_key(entities) {
            let (id, mut rows) = extract_row(entity, &SanitizeOptions::for_update_multiple());

            // the key column rides along only when it is the conflict target
            if target_is_key {
                if let Some(pk_column) = pk_column {
                    rows.set(pk_column, id);
                }
            }

            payloads.push(rows);
        }

        let mut stmt = InsertStatement::new(E::TABLE, payloads[0].columns());
        for rows in &payloads {
            stmt = stmt.row(rows.values());
        }
        let stmt = stmt.on_conflict(conflict);

        let (sql, params) = match self.log_build("multiple update", stmt.build(&self.options)) {
            Ok(v) => v,
            Err(err) => return Outcome::Err(err),
        };

        match self.executor.exec(cx, &sql, &params).await {
            Outcome::Ok(_) => Outcome::Ok(()),
            Outcome::Err(err) => {
                tracing::error!(error = %err, table = E::TABLE, "error during exec multiple update");
                Outcome::Err(err)
            }
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    /// Fetch one entity by key.
    pub async fn get(&self, cx: &Cx, id: &K, relations: &[Relation]) -> Outcome<E, Error> {
        let criteria = vec![(self.qualified_id(), id.to_value())];
        self.get_one_by(cx, &criteria, relations).await
    }

    /// Fetch one entity by criteria.
    ///
    /// No matching row is the distinguished [`Error::NotFound`] outcome,
    /// distinct from execution failure and never logged as an error.
    pub async fn get_one_by(
        &self,
        cx: &Cx,
        criteria: &Criteria,
        relations: &[Relation],
    ) -> Outcome<E, Error> {
        let names: Vec<&str> = relations.iter().map(|r| r.name).collect();
        let columns = projection::columns_with_prefix(E::descriptor(), E::ALIAS, &names);

        let joins = match self.log_build("select", self.resolve_joins(relations)) {
            Ok(v) => v,
            Err(err) => return Outcome::Err(err),
        };

        let stmt = SelectStatement::new(E::TABLE, columns)
            .alias(E::ALIAS)
            .joins(joins)
            .filter_opt(criteria_expr(criteria));

        let (sql, params) = match self.log_build("select", stmt.build(&self.options)) {
            Ok(v) => v,
            Err(err) => return Outcome::Err(err),
        };

        match self.executor.select_one(cx, &sql, &params).await {
            Outcome::Ok(Some(row)) => match materialize::<E>(&row, &names) {
                Ok(entity) => Outcome::Ok(entity),
                Err(err) => Outcome::Err(err),
            },
            Outcome::Ok(None) => Outcome::Err(Error::NotFound),
            Outcome::Err(err) => {
                tracing::error!(
                    error = %err,
                    table = E::TABLE,
                    criteria = ?criteria,
                    "error during exec select"
                );
                Outcome::Err(err)
            }
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    /// List every row.
    pub async fn list(&self, cx: &Cx) -> Outcome<Vec<E>, Error> {
        self.list_by_expr(cx, None, &ListOptions::new()).await
    }

    /// List rows matching an equality criteria map.
    pub async fn list_by(
        &self,
        cx: &Cx,
        criteria: &Criteria,
        options: &ListOptions,
    ) -> Outcome<Vec<E>, Error> {
        self.list_by_expr(cx, criteria_expr(criteria), options).await
    }

    /// List rows matching a predicate expression.
    pub async fn list_by_expr(
        &self,
        cx: &Cx,
        criteria: Option<Expr>,
        options: &ListOptions,
    ) -> Outcome<Vec<E>, Error> {
        let query = options.query.unwrap_or(self.options);
        let names = options.relation_names();
        let columns = projection::columns_with_prefix(E::descriptor(), E::ALIAS, &names);

        let joins = match self.log_build("select", self.resolve_joins(&options.relations)) {
            Ok(v) => v,
            Err(err) => return Outcome::Err(err),
        };

        let mut stmt = SelectStatement::new(E::TABLE, columns)
            .alias(E::ALIAS)
            .joins(joins)
            .filter_opt(criteria)
            .order_by(options.order.clone());

        if let Some(limit) = options.limit {
            stmt = stmt.limit(limit);
        }
        if let Some(offset) = options.offset {
            stmt = stmt.offset(offset);
        }

        let (sql, params) = match self.log_build("select", stmt.build(&query)) {
            Ok(v) => v,
            Err(err) => return Outcome::Err(err),
        };

        match self.executor.select(cx, &sql, &params).await {
            Outcome::Ok(rows) => match materialize_rows::<E>(&rows, &names) {
                Ok(entities) => Outcome::Ok(entities),
                Err(err) => Outcome::Err(err),
            },
            Outcome::Err(err) => {
                tracing::error!(error = %err, table = E::TABLE, "error during exec select");
                Outcome::Err(err)
            }
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    /// Count rows matching an equality criteria map.
    pub async fn count(&self, cx: &Cx, criteria: &Criteria) -> Outcome<i64, Error> {
        let stmt = SelectStatement::new(E::TABLE, vec!["COUNT(*)".to_string()])
            .alias(E::ALIAS)
            .filter_opt(criteria_expr(criteria));

        let (sql, params) = match self.log_build("count", stmt.build(&self.options)) {
            Ok(v) => v,
            Err(err) => return Outcome::Err(err),
        };

        match self.executor.count(cx, &sql, &params).await {
            Outcome::Ok(count) => Outcome::Ok(count),
            Outcome::Err(err) => {
                tracing::error!(error = %err, table = E::TABLE, "error during exec count");
                Outcome::Err(err)
            }
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    /// Delete by key: soft when the entity declares a soft-delete column,
    /// hard otherwise.
    pub async fn delete(&self, cx: &Cx, id: &K) -> Outcome<(), Error> {
        if E::descriptor().is_soft_deletable() {
            self.soft_delete(cx, id).await
        } else {
            self.force_delete(cx, id).await
        }
    }

    /// Mark the row deleted by stamping the declared soft-delete column.
    pub async fn soft_delete(&self, cx: &Cx, id: &K) -> Outcome<(), Error> {
        let Some(column) = E::descriptor().soft_delete else {
            let err = Error::build(E::TABLE, "entity does not declare a soft-delete column");
            tracing::error!(error = %err, table = E::TABLE, "cannot build SQL query");
            return Outcome::Err(err);
        };

        let stmt = UpdateStatement::new(E::TABLE)
            .set(column, Value::now())
            .filter(Expr::col(self.id_column).eq(Expr::Literal(id.to_value())));

        let (sql, params) = match self.log_build("soft delete", stmt.build(&self.options)) {
            Ok(v) => v,
            Err(err) => return Outcome::Err(err),
        };

        match self.executor.exec(cx, &sql, &params).await {
            Outcome::Ok(_) => Outcome::Ok(()),
            Outcome::Err(err) => {
                tracing::error!(error = %err, table = E::TABLE, id = %id, "error during exec soft delete");
                Outcome::Err(err)
            }
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    /// Mark a batch of rows deleted.
    pub async fn soft_delete_multiple(&self, cx: &Cx, ids: &[K]) -> Outcome<(), Error> {
        let Some(column) = E::descriptor().soft_delete else {
            let err = Error::build(E::TABLE, "entity does not declare a soft-delete column");
            tracing::error!(error = %err, table = E::TABLE, "cannot build SQL query");
            return Outcome::Err(err);
        };

        let stmt = UpdateStatement::new(E::TABLE)
            .set(column, Value::now())
            .filter(Expr::col(self.id_column).in_values(ids.iter().map(Key::to_value)));

        let (sql, params) = match self.log_build("multiple soft delete", stmt.build(&self.options))
        {
            Ok(v) => v,
            Err(err) => return Outcome::Err(err),
        };

        match self.executor.exec(cx, &sql, &params).await {
            Outcome::Ok(_) => Outcome::Ok(()),
            Outcome::Err(err) => {
                tracing::error!(error = %err, table = E::TABLE, "error during exec multiple soft delete");
                Outcome::Err(err)
            }
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    /// Physically delete the row.
    pub async fn force_delete(&self, cx: &Cx, id: &K) -> Outcome<(), Error> {
        let stmt = DeleteStatement::new(E::TABLE)
            .filter(Expr::col(self.id_column).eq(Expr::Literal(id.to_value())));

        let (sql, params) = match self.log_build("delete", stmt.build(&self.options)) {
            Ok(v) => v,
            Err(err) => return Outcome::Err(err),
        };

        match self.executor.exec(cx, &sql, &params).await {
            Outcome::Ok(_) => Outcome::Ok(()),
            Outcome::Err(err) => {
                tracing::error!(error = %err, table = E::TABLE, id = %id, "error during exec delete");
                Outcome::Err(err)
            }
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    /// Physically delete a batch of rows by key.
    pub async fn force_delete_multiple(&self, cx: &Cx, ids: &[K]) -> Outcome<(), Error> {
        let stmt = DeleteStatement::new(E::TABLE)
            .filter(Expr::col(self.id_column).in_values(ids.iter().map(Key::to_value)));

        let (sql, params) = match self.log_build("multiple delete", stmt.build(&self.options)) {
            Ok(v) => v,
            Err(err) => return Outcome::Err(err),
        };

        match self.executor.exec(cx, &sql, &params).await {
            Outcome::Ok(_) => Outcome::Ok(()),
            Outcome::Err(err) => {
                tracing::error!(error = %err, table = E::TABLE, "error during exec multiple delete");
                Outcome::Err(err)
            }
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    /// Delete rows by criteria: soft (bulk stamp) when the entity declares a
    /// soft-delete column, hard otherwise.
    pub async fn delete_by(&self, cx: &Cx, criteria: &Criteria) -> Outcome<(), Error> {
        if let Some(column) = E::descriptor().soft_delete {
            let set = vec![(column.to_string(), Value::now())];
            self.bulk_update(cx, set, Some(criteria)).await
        } else {
            self.force_delete_by(cx, criteria).await
        }
    }

    /// Physically delete rows by criteria; an empty criteria map clears the
    /// table.
    pub async fn force_delete_by(&self, cx: &Cx, criteria: &Criteria) -> Outcome<(), Error> {
        let stmt = DeleteStatement::new(E::TABLE).filter_opt(criteria_expr(criteria));

        let (sql, params) = match self.log_build("force delete", stmt.build(&self.options)) {
            Ok(v) => v,
            Err(err) => return Outcome::Err(err),
        };

        match self.executor.exec(cx, &sql, &params).await {
            Outcome::Ok(_) => Outcome::Ok(()),
            Outcome::Err(err) => {
                tracing::error!(error = %err, table = E::TABLE, "error during exec force delete");
                Outcome::Err(err)
            }
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    /// Bulk column update by criteria; `None` updates the whole table.
    pub async fn bulk_update(
        &self,
        cx: &Cx,
        set: Vec<(String, Value)>,
        criteria: Option<&Criteria>,
    ) -> Outcome<(), Error> {
        let stmt = UpdateStatement::new(E::TABLE)
            .set_all(set)
            .filter_opt(criteria.and_then(|c| criteria_expr(c)));

        let (sql, params) = match self.log_build("bulk update", stmt.build(&self.options)) {
            Ok(v) => v,
            Err(err) => return Outcome::Err(err),
        };

        match self.executor.exec(cx, &sql, &params).await {
            Outcome::Ok(_) => Outcome::Ok(()),
            Outcome::Err(err) => {
                tracing::error!(error = %err, table = E::TABLE, "error during exec bulk update");
                Outcome::Err(err)
            }
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    /// Extension point for repositories whose entities are referenced
    /// elsewhere: re-point dependents at `new_id`, then delete `id`.
    ///
    /// The default is a plain delete; wrappers that own references override
    /// this by re-pointing before delegating.
    pub async fn delete_and_move_references(
        &self,
        cx: &Cx,
        id: &K,
        _new_id: &K,
    ) -> Outcome<(), Error> {
        self.delete(cx, id).await
    }
}
