//! Repository decorator keeping a search index in sync with writes.
//!
//! Wraps a [`Repository`] and a [`SearchIndex`]. Row writes come first;
//! index pushes are best-effort: a failed push is logged and absorbed, the
//! write's success never depends on it. Consistency between store and index
//! is eventual; [`IndexedRepository::reindex`] rebuilds from scratch.

use crate::client::{IndexSettings, SearchIndex, SearchOptions, SearchRequest};
use crate::term::switch_keyboard_layout;
use asupersync::{Cx, Outcome};
use rowmap_core::{Entity, Error, Executor, Key, Value};
use rowmap_query::{Criteria, Expr, OrderBy};
use rowmap_repo::{ListOptions, Relation, Repository};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Reindex page size, ordered by key ascending.
const REINDEX_PAGE_SIZE: u64 = 500;

/// An entity that projects itself into a search index.
pub trait IndexableEntity: Entity {
    /// The document pushed to the index.
    type Document: Serialize + DeserializeOwned + Send + Sync;

    /// The entity's index projection.
    fn index_document(&self) -> Self::Document;

    /// Soft-deleted entities are never pushed to the index.
    fn is_deleted(&self) -> bool;

    /// Adopt a store-generated primary key, so a freshly created entity can
    /// be indexed under its real id.
    fn set_primary_key(&mut self, key: Value);
}

/// A repository whose writes also maintain a search index.
pub struct IndexedRepository<E, K, X, S> {
    repo: Repository<E, K, X>,
    index: S,
    index_name: String,
    index_relations: Vec<Relation>,
    settings: Option<IndexSettings>,
}

impl<E, K, X, S> IndexedRepository<E, K, X, S>
where
    E: IndexableEntity,
    K: Key,
    X: Executor,
    S: SearchIndex,
{
    /// Wrap a repository and an index client.
    pub fn new(repo: Repository<E, K, X>, index: S, index_name: impl Into<String>) -> Self {
        Self {
            repo,
            index,
            index_name: index_name.into(),
            index_relations: Vec::new(),
            settings: None,
        }
    }

    /// Relations joined when loading entities for reindexing.
    #[must_use]
    pub fn with_index_relations(mut self, relations: Vec<Relation>) -> Self {
        self.index_relations = relations;
        self
    }

    /// Settings applied to the index before a reindex fills it.
    #[must_use]
    pub fn with_settings(mut self, settings: IndexSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// The wrapped repository.
    pub fn inner(&self) -> &Repository<E, K, X> {
        &self.repo
    }

    /// The index name this decorator maintains.
    #[must_use]
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Create the row, then push the entity's index projection under the
    /// generated key. Index failure is logged, never propagated.
    pub async fn create(&self, cx: &Cx, mut entity: E) -> Outcome<K, Error> {
        let id = match self.repo.create(cx, &entity).await {
            Outcome::Ok(id) => id,
            Outcome::Err(err) => return Outcome::Err(err),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        };

        entity.set_primary_key(id.to_value());
        match self.update_index(cx, &entity).await {
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
            Outcome::Ok(()) | Outcome::Err(_) => {}
        }

        Outcome::Ok(id)
    }

    /// Update the row, then refresh the index document.
    pub async fn update(&self, cx: &Cx, entity: &E) -> Outcome<(), Error> {
        match self.repo.update(cx, entity).await {
            Outcome::Ok(()) => {}
            Outcome::Err(err) => return Outcome::Err(err),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        }

        match self.update_index(cx, entity).await {
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
            Outcome::Ok(()) | Outcome::Err(_) => {}
        }

        Outcome::Ok(())
    }

    /// Push the entity's index projection. Deleted entities are skipped;
    /// push failures are logged and absorbed.
    pub async fn update_index(&self, cx: &Cx, entity: &E) -> Outcome<(), Error> {
        if entity.is_deleted() {
            return Outcome::Ok(());
        }

        let document = match serde_json::to_value(entity.index_document()) {
            Ok(document) => document,
            Err(err) => {
                tracing::error!(
                    error = %err,
                    index = %self.index_name,
                    "cannot serialize index document"
                );
                return Outcome::Ok(());
            }
        };

        match self
            .index
            .update_documents(cx, &self.index_name, &[document])
            .await
        {
            Outcome::Ok(()) => {}
            Outcome::Err(err) => {
                tracing::error!(error = %err, index = %self.index_name, "update document error");
            }
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        }

        Outcome::Ok(())
    }

    /// Delete the row, then best-effort remove the index document.
    pub async fn delete(&self, cx: &Cx, id: &K) -> Outcome<(), Error> {
        match self.repo.delete(cx, id).await {
            Outcome::Ok(()) => {}
            Outcome::Err(err) => return Outcome::Err(err),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        }

        match self
            .index
            .delete_document(cx, &self.index_name, &id.to_string())
            .await
        {
            Outcome::Ok(()) => {}
            Outcome::Err(err) => {
                tracing::error!(
                    error = %err,
                    index = %self.index_name,
                    id = %id,
                    "can't delete entity search index"
                );
            }
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        }

        Outcome::Ok(())
    }

    /// Delegates to this decorator's own delete, keeping the index in sync.
    pub async fn delete_and_move_references(
        &self,
        cx: &Cx,
        id: &K,
        _new_id: &K,
    ) -> Outcome<(), Error> {
        self.delete(cx, id).await
    }

    /// Query the index by term.
    ///
    /// Zero hits for a term of at least three characters get one retry with
    /// the keyboard-layout-transposed term.
    pub async fn search_by_term(
        &self,
        cx: &Cx,
        term: &str,
        filters: &[(String, serde_json::Value)],
        options: &SearchOptions,
    ) -> Outcome<Vec<E::Document>, Error> {
        let mut hits = match self
            .index
            .search(cx, &self.index_name, term, filters, options)
            .await
        {
            Outcome::Ok(hits) => hits,
            Outcome::Err(err) => return Outcome::Err(err),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        };

        if hits.is_empty() && term.chars().count() >= 3 {
            let switched = switch_keyboard_layout(term);
            hits = match self
                .index
                .search(cx, &self.index_name, &switched, filters, options)
                .await
            {
                Outcome::Ok(hits) => hits,
                Outcome::Err(err) => return Outcome::Err(err),
                Outcome::Cancelled(r) => return Outcome::Cancelled(r),
                Outcome::Panicked(p) => return Outcome::Panicked(p),
            };
        }

        match decode_documents::<E::Document>(hits) {
            Ok(documents) => Outcome::Ok(documents),
            Err(err) => Outcome::Err(err),
        }
    }

    /// Fan a batch of search requests at this decorator's index.
    pub async fn multi_search(
        &self,
        cx: &Cx,
        mut requests: Vec<SearchRequest>,
    ) -> Outcome<Vec<Vec<E::Document>>, Error> {
        for request in &mut requests {
            request.index = self.index_name.clone();
        }

        let hit_lists = match self.index.multi_search(cx, &requests).await {
            Outcome::Ok(hit_lists) => hit_lists,
            Outcome::Err(err) => return Outcome::Err(err),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        };

        let mut out = Vec::with_capacity(hit_lists.len());
        for hits in hit_lists {
            match decode_documents::<E::Document>(hits) {
                Ok(documents) => out.push(documents),
                Err(err) => return Outcome::Err(err),
            }
        }
        Outcome::Ok(out)
    }

    /// Fetch the index document stored under the given key.
    pub async fn get_value(&self, cx: &Cx, id: &K) -> Outcome<E::Document, Error> {
        match self
            .index
            .get_document(cx, &self.index_name, &id.to_string())
            .await
        {
            Outcome::Ok(Some(document)) => match serde_json::from_value(document) {
                Ok(document) => Outcome::Ok(document),
                Err(err) => Outcome::Err(Error::Serde(err.to_string())),
            },
            Outcome::Ok(None) => Outcome::Err(Error::NotFound),
            Outcome::Err(err) => Outcome::Err(err),
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    /// Rebuild the index from the store.
    ///
    /// Clears the index, applies configured settings, then pages the
    /// repository by key ascending (soft-deleted rows excluded), pushing
    /// each page's projections until a page comes back empty. Cancellation
    /// mid-loop leaves a partial index; the next reindex clears it first.
    pub async fn reindex(&self, cx: &Cx) -> Outcome<(), Error> {
        match self.index.clear(cx, &self.index_name).await {
            Outcome::Ok(()) => {}
            Outcome::Err(err) => return Outcome::Err(err),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        }

        if let Some(settings) = &self.settings {
            match self
                .index
                .update_settings(cx, &self.index_name, settings)
                .await
            {
                Outcome::Ok(()) => {}
                Outcome::Err(err) => return Outcome::Err(err),
                Outcome::Cancelled(r) => return Outcome::Cancelled(r),
                Outcome::Panicked(p) => return Outcome::Panicked(p),
            }
        }

        let mut criteria: Criteria = Vec::new();
        if let Some(column) = E::descriptor().soft_delete {
            criteria.push((format!("{}.{}", E::ALIAS, column), Value::Null));
        }
        let order = vec![OrderBy::asc(format!("{}.id", E::ALIAS))];

        let mut offset = 0;
        loop {
            let options = ListOptions::new()
                .with_limit(REINDEX_PAGE_SIZE)
                .with_offset(offset)
                .with_order(order.clone())
                .with_relations(self.index_relations.clone());

            let items = match self.repo.list_by(cx, &criteria, &options).await {
                Outcome::Ok(items) => items,
                Outcome::Err(err) => return Outcome::Err(err),
                Outcome::Cancelled(r) => return Outcome::Cancelled(r),
                Outcome::Panicked(p) => return Outcome::Panicked(p),
            };

            if items.is_empty() {
                break;
            }

            let mut documents = Vec::with_capacity(items.len());
            for item in &items {
                match serde_json::to_value(item.index_document()) {
                    Ok(document) => documents.push(document),
                    Err(err) => return Outcome::Err(Error::Serde(err.to_string())),
                }
            }

            match self
                .index
                .add_documents(cx, &self.index_name, &documents)
                .await
            {
                Outcome::Ok(()) => {}
                Outcome::Err(err) => return Outcome::Err(err),
                Outcome::Cancelled(r) => return Outcome::Cancelled(r),
                Outcome::Panicked(p) => return Outcome::Panicked(p),
            }

            offset += REINDEX_PAGE_SIZE;
        }

        Outcome::Ok(())
    }

    // Reads and batch writes pass straight through to the wrapped
    // repository; only create/update/delete touch the index.

    /// Fetch one entity by key.
    pub async fn get(&self, cx: &Cx, id: &K, relations: &[Relation]) -> Outcome<E, Error> {
        self.repo.get(cx, id, relations).await
    }

    /// Fetch one entity by criteria.
    pub async fn get_one_by(
        &self,
        cx: &Cx,
        criteria: &Criteria,
        relations: &[Relation],
    ) -> Outcome<E, Error> {
        self.repo.get_one_by(cx, criteria, relations).await
    }

    /// List every row.
    pub async fn list(&self, cx: &Cx) -> Outcome<Vec<E>, Error> {
        self.repo.list(cx).await
    }

    /// List rows matching an equality criteria map.
    pub async fn list_by(
        &self,
        cx: &Cx,
        criteria: &Criteria,
        options: &ListOptions,
    ) -> Outcome<Vec<E>, Error> {
        self.repo.list_by(cx, criteria, options).await
    }

    /// List rows matching a predicate expression.
    pub async fn list_by_expr(
        &self,
        cx: &Cx,
        criteria: Option<Expr>,
        options: &ListOptions,
    ) -> Outcome<Vec<E>, Error> {
        self.repo.list_by_expr(cx, criteria, options).await
    }

    /// Insert a batch of entities.
    pub async fn create_multiple(&self, cx: &Cx, entities: &[E]) -> Outcome<Vec<K>, Error> {
        self.repo.create_multiple(cx, entities).await
    }

    /// Update a batch of entities.
    pub async fn update_multiple(&self, cx: &Cx, entities: &[E]) -> Outcome<(), Error> {
        self.repo.update_multiple(cx, entities).await
    }

    /// Physically delete a batch of rows by key.
    pub async fn force_delete_multiple(&self, cx: &Cx, ids: &[K]) -> Outcome<(), Error> {
        self.repo.force_delete_multiple(cx, ids).await
    }
}

#[allow(clippy::result_large_err)]
fn decode_documents<D: DeserializeOwned>(
    hits: Vec<serde_json::Value>,
) -> Result<Vec<D>, Error> {
    hits.into_iter()
        .map(|hit| serde_json::from_value(hit).map_err(|err| Error::Serde(err.to_string())))
        .collect()
}
