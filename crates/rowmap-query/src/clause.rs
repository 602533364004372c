//! SQL clause types (criteria, ORDER BY).

use crate::expr::Expr;
use rowmap_core::Value;

/// An equality criteria map: ordered `(column, value)` pairs combined with
/// AND. A `Value::Null` entry renders as `IS NULL`.
pub type Criteria = Vec<(String, Value)>;

/// Convert a criteria map into a predicate expression.
///
/// Returns `None` for an empty map (no WHERE clause).
#[must_use]
pub fn criteria_expr(criteria: &[(String, Value)]) -> Option<Expr> {
    let mut iter = criteria.iter().map(|(column, value)| {
        if value.is_null() {
            Expr::col(column.clone()).is_null()
        } else {
            Expr::col(column.clone()).eq(Expr::Literal(value.clone()))
        }
    });

    let first = iter.next()?;
    Some(iter.fold(first, |acc, expr| acc.and(expr)))
}

/// ORDER BY clause.
#[derive(Debug, Clone)]
pub struct OrderBy {
    column: String,
    direction: OrderDirection,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderBy {
    /// Create an ascending order by clause.
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: OrderDirection::Asc,
        }
    }

    /// Create a descending order by clause.
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: OrderDirection::Desc,
        }
    }

    /// Generate SQL for this ORDER BY clause.
    pub fn to_sql(&self) -> String {
        let mut sql = self.column.clone();
        sql.push_str(match self.direction {
            OrderDirection::Asc => " ASC",
            OrderDirection::Desc => " DESC",
        });
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::QueryOptions;

    #[test]
    fn empty_criteria_is_no_predicate() {
        assert!(criteria_expr(&[]).is_none());
    }

    #[test]
    fn criteria_combine_with_and() {
        let expr = criteria_expr(&[
            ("r.id".to_string(), Value::BigInt(5)),
            ("r.name".to_string(), Value::Text("Suite".to_string())),
        ])
        .unwrap();

        let mut params = Vec::new();
        let sql = expr.render(&QueryOptions::default(), &mut params);
        assert_eq!(sql, "r.id = $1 AND r.name = $2");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn null_criteria_renders_is_null() {
        let expr = criteria_expr(&[("r.deleted_at".to_string(), Value::Null)]).unwrap();
        let mut params = Vec::new();
        let sql = expr.render(&QueryOptions::default(), &mut params);
        assert_eq!(sql, "r.deleted_at IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn order_by_to_sql() {
        assert_eq!(OrderBy::asc("r.id").to_sql(), "r.id ASC");
        assert_eq!(OrderBy::desc("created_at").to_sql(), "created_at DESC");
    }
}
