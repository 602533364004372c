//! The SQL executor collaborator trait.
//!
//! The mapping layer never talks to a driver directly; it hands finished
//! statements to an [`Executor`] and scans what comes back. Transaction
//! scope, pooling and wire protocol are the executor's concern; an
//! implementation bound to an active transaction handle satisfies the same
//! contract.
//!
//! All operations are async and take a `Cx` context for cancellation and
//! timeout handling; a cancelled context aborts the in-flight statement and
//! surfaces as `Outcome::Cancelled`.

use crate::error::Error;
use crate::row::Row;
use crate::value::Value;
use asupersync::{Cx, Outcome};
use std::future::Future;

/// A statement executor over some SQL store.
pub trait Executor: Send + Sync {
    /// Execute a statement (UPDATE, DELETE, upsert) and return rows affected.
    fn exec(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<u64, Error>> + Send;

    /// Execute an INSERT with a single-value RETURNING clause and scan the
    /// one returned value.
    fn insert(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Value, Error>> + Send;

    /// Execute a multi-row INSERT with a single-value RETURNING clause and
    /// scan all returned values, preserving statement row order.
    fn insert_many(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Vec<Value>, Error>> + Send;

    /// Execute a query and return all rows.
    fn select(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Vec<Row>, Error>> + Send;

    /// Execute a query and return the first row, if any.
    ///
    /// `None` is the distinguished no-matching-row outcome; callers turn it
    /// into [`Error::NotFound`], never into an execution error.
    fn select_one(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Option<Row>, Error>> + Send;

    /// Execute a COUNT query and scan the single integer result.
    fn count(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<i64, Error>> + Send;
}
