//! Declarative field mapping and generic repositories over SQL stores.
//!
//! `rowmap` turns statically declared entity descriptors into relational
//! column projections, materializes query results (including nullable
//! outer-joined substructures) back into typed entities, and exposes a
//! generic CRUD/batch repository plus a search-index synchronization
//! decorator.
//!
//! # Crates
//!
//! - [`rowmap_core`]: entities, descriptors, values, rows, errors, the
//!   `Executor` collaborator trait
//! - [`rowmap_query`]: SQL statement builders
//! - [`rowmap_repo`]: projection, sanitization, materialization and the
//!   generic [`Repository`]
//! - [`rowmap_index`]: the [`IndexedRepository`] decorator
//!
//! # Example
//!
//! ```ignore
//! let repo: Repository<Room, i64, PgExecutor> = Repository::new(executor);
//! let id = repo.create(&cx, &room).await?;
//! let room = repo
//!     .get(&cx, &id, &[Relation::new("photo", photo_join())])
//!     .await?;
//! ```

pub use asupersync::{Cx, Outcome};

pub use rowmap_core::{
    ColumnDescriptor, ColumnInfo, Entity, EntityDescriptor, Error, Executor, FieldDescriptor,
    FromValue, Key, RelationDescriptor, Result, Row, RowReader, ScalarKind, Value,
};
pub use rowmap_index::{
    IndexSettings, IndexableEntity, IndexedRepository, SearchIndex, SearchOptions, SearchRequest,
};
pub use rowmap_query::{
    Criteria, Dialect, Expr, Join, JoinType, OrderBy, QueryOptions, criteria_expr,
};
pub use rowmap_repo::{
    ListOptions, Relation, Repository, RowValues, SanitizeOptions, extract_row, materialize,
};

/// Commonly used items.
pub mod prelude {
    pub use asupersync::{Cx, Outcome};
    pub use rowmap_core::{
        ColumnDescriptor, Entity, EntityDescriptor, Error, Executor, FieldDescriptor, Key,
        RelationDescriptor, Result, Row, RowReader, ScalarKind, Value,
    };
    pub use rowmap_index::{IndexableEntity, IndexedRepository, SearchIndex, SearchOptions};
    pub use rowmap_query::{Expr, OrderBy, QueryOptions};
    pub use rowmap_repo::{ListOptions, Relation, Repository};
}
