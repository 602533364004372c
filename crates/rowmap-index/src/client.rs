//! The search-index client contract.
//!
//! A thin consumed interface over whatever full-text index backs the
//! system. Documents cross the boundary as JSON values; the decorator owns
//! serialization of entity index projections.

use rowmap_core::Error;
use asupersync::{Cx, Outcome};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Per-search options.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Maximum hits to return.
    pub limit: Option<i64>,
    /// Minimum ranking score for a hit to count.
    pub ranking_score_threshold: Option<f64>,
}

impl SearchOptions {
    /// Empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the number of hits.
    #[must_use]
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Require a minimum ranking score.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.ranking_score_threshold = Some(threshold);
        self
    }
}

/// One query of a batched multi-search.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    /// Index to query; the decorator pins this to its own index.
    pub index: String,
    /// Search term.
    pub term: String,
    /// Equality filters.
    pub filters: Vec<(String, serde_json::Value)>,
    /// Per-search options.
    pub options: SearchOptions,
}

/// Index settings applied before a full reindex.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexSettings {
    /// Attributes matched by search terms.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub searchable_attributes: Vec<String>,
    /// Attributes usable in filters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filterable_attributes: Vec<String>,
    /// Attributes usable for sorting.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sortable_attributes: Vec<String>,
}

/// A search-index client.
pub trait SearchIndex: Send + Sync {
    /// Add documents to an index.
    fn add_documents(
        &self,
        cx: &Cx,
        index: &str,
        documents: &[serde_json::Value],
    ) -> impl Future<Output = Outcome<(), Error>> + Send;

    /// Update (or insert) documents in an index.
    fn update_documents(
        &self,
        cx: &Cx,
        index: &str,
        documents: &[serde_json::Value],
    ) -> impl Future<Output = Outcome<(), Error>> + Send;

    /// Remove one document by id.
    fn delete_document(
        &self,
        cx: &Cx,
        index: &str,
        id: &str,
    ) -> impl Future<Output = Outcome<(), Error>> + Send;

    /// Fetch one document by id, `None` when absent.
    fn get_document(
        &self,
        cx: &Cx,
        index: &str,
        id: &str,
    ) -> impl Future<Output = Outcome<Option<serde_json::Value>, Error>> + Send;

    /// Search an index.
    fn search(
        &self,
        cx: &Cx,
        index: &str,
        term: &str,
        filters: &[(String, serde_json::Value)],
        options: &SearchOptions,
    ) -> impl Future<Output = Outcome<Vec<serde_json::Value>, Error>> + Send;

    /// Run a batch of searches, one hit list per request.
    fn multi_search(
        &self,
        cx: &Cx,
        requests: &[SearchRequest],
    ) -> impl Future<Output = Outcome<Vec<Vec<serde_json::Value>>, Error>> + Send;

    /// Remove every document from an index.
    fn clear(&self, cx: &Cx, index: &str) -> impl Future<Output = Outcome<(), Error>> + Send;

    /// Apply index settings.
    fn update_settings(
        &self,
        cx: &Cx,
        index: &str,
        settings: &IndexSettings,
    ) -> impl Future<Output = Outcome<(), Error>> + Send;
}
