//! Per-call list options.

use rowmap_query::{Expr, OrderBy, QueryOptions};

/// A requested relation join.
///
/// Names a relation declared in the entity's descriptor and supplies the
/// join predicate; table, alias and join kind come from the descriptor.
#[derive(Debug, Clone)]
pub struct Relation {
    /// Declared relation name.
    pub name: &'static str,
    /// ON condition joining the relation to the entity.
    pub on: Expr,
}

impl Relation {
    /// Request the named relation with the given join predicate.
    pub fn new(name: &'static str, on: Expr) -> Self {
        Self { name, on }
    }
}

/// Options for list queries: paging, ordering, relations and statement
/// rendering.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Maximum rows to return.
    pub limit: Option<u64>,
    /// Rows to skip.
    pub offset: Option<u64>,
    /// Ordering expressions.
    pub order: Vec<OrderBy>,
    /// Relations to join and materialize.
    pub relations: Vec<Relation>,
    /// Statement rendering override; falls back to the repository's own.
    pub query: Option<QueryOptions>,
}

impl ListOptions {
    /// Empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the row limit.
    #[must_use]
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the row offset.
    #[must_use]
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Set the ordering.
    #[must_use]
    pub fn with_order(mut self, order: Vec<OrderBy>) -> Self {
        self.order = order;
        self
    }

    /// Set the requested relations.
    #[must_use]
    pub fn with_relations(mut self, relations: Vec<Relation>) -> Self {
        self.relations = relations;
        self
    }

    /// Override statement rendering options.
    #[must_use]
    pub fn with_query(mut self, query: QueryOptions) -> Self {
        self.query = Some(query);
        self
    }

    /// Names of the requested relations.
    #[must_use]
    pub fn relation_names(&self) -> Vec<&str> {
        self.relations.iter().map(|r| r.name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowmap_query::Dialect;

    #[test]
    fn builder_accumulates() {
        let opts = ListOptions::new()
            .with_limit(500)
            .with_offset(1000)
            .with_order(vec![OrderBy::asc("r.id")])
            .with_relations(vec![Relation::new("photo", Expr::raw("TRUE"))])
            .with_query(QueryOptions::dialect(Dialect::Postgres));

        assert_eq!(opts.limit, Some(500));
        assert_eq!(opts.offset, Some(1000));
        assert_eq!(opts.order.len(), 1);
        assert_eq!(opts.relation_names(), vec!["photo"]);
        assert!(opts.query.is_some());
    }

    #[test]
    fn defaults_are_empty() {
        let opts = ListOptions::default();
        assert_eq!(opts.limit, None);
        assert_eq!(opts.offset, None);
        assert!(opts.order.is_empty());
        assert!(opts.relation_names().is_empty());
        assert!(opts.query.is_none());
    }
}
