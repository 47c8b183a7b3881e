//! Cache facade: the single entry point that normalizes query results.
//!
//! A [`Cache`] owns the canonical entity store, the arena of issued views,
//! and the result-tree map. Every call to [`Cache::update_cache`] is one
//! synchronous pass; all propagation onto earlier views has happened by the
//! time it returns.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::keys::{result_tree_key, EntityKey};
use crate::normalize::{validate_keys, Normalizer, UpdateReport};
use crate::store::{CanonicalRecord, EntityStore};
use crate::value::{Fields, Value};
use crate::view::{Node, ResultTree, View, ViewArena, ViewId};

mod metrics;
mod options;
mod results;
mod shared;

pub use metrics::{default_metrics, CacheMetrics, CounterMetrics, MetricsSnapshot, NoopMetrics};
pub use options::{CacheOptions, DEFAULT_ID_FIELD, DEFAULT_TYPENAME_FIELD};
pub use results::ResultTreeCache;
pub use shared::SharedCache;

/// One query execution as delivered by the query layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// Name of the executed query.
    pub query_name: String,
    /// Variables the query ran with.
    #[serde(default)]
    pub variables: serde_json::Value,
    /// Result data: a field-keyed record.
    pub data: Value,
}

impl QueryResult {
    /// Builds a result from JSON variables and data.
    pub fn new(
        query_name: impl Into<String>,
        variables: serde_json::Value,
        data: serde_json::Value,
    ) -> Self {
        Self {
            query_name: query_name.into(),
            variables,
            data: Value::from(data),
        }
    }
}

/// Size counters for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Canonical records.
    pub entities: usize,
    /// Views issued.
    pub views: usize,
    /// Stored result trees.
    pub result_trees: usize,
    /// Listener registrations across all records.
    pub listeners: usize,
}

/// Normalized response cache.
#[derive(Debug, Default)]
pub struct Cache {
    options: CacheOptions,
    entities: EntityStore,
    views: ViewArena,
    results: ResultTreeCache,
}

impl Cache {
    /// Creates a cache with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache with the given options.
    pub fn with_options(options: CacheOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Options the cache was built with.
    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    /// Normalizes `result` and stores its tree under its name and variables.
    pub fn update_cache(&mut self, result: &QueryResult) -> Result<UpdateReport> {
        self.normalize_result(&result.query_name, &result.variables, &result.data)
    }

    /// Normalizes `data` for the query `query_name` run with `variables`.
    ///
    /// Fails before touching any state if a cache key cannot be built.
    /// A `null` `data` stores an empty tree.
    pub fn normalize_result<V>(
        &mut self,
        query_name: &str,
        variables: &V,
        data: &Value,
    ) -> Result<UpdateReport>
    where
        V: Serialize + ?Sized,
    {
        let key = result_tree_key(query_name, variables)?;
        let empty = Fields::new();
        let fields = match data {
            Value::Object(fields) => fields,
            Value::Null => &empty,
            _ => {
                return Err(CacheError::InvalidResultData(
                    "data must be a field-keyed record",
                ))
            }
        };
        validate_keys(data, &self.options)?;

        let mut report = UpdateReport::new(key.clone());
        let tree = Normalizer::new(
            &self.options,
            &mut self.entities,
            &mut self.views,
            &mut report,
        )
        .normalize_fields(fields)?;
        let replaced = self.results.store(key, ResultTree::new(tree)).is_some();

        debug!(
            query = %report.key,
            created = report.entities_created,
            merged = report.entities_merged,
            view_writes = report.view_writes,
            warnings = report.warnings.len(),
            replaced,
            "cache.update"
        );
        Ok(report)
    }

    /// Looks up the latest tree for `query_name` run with `variables`.
    pub fn lookup_result_tree<V>(
        &self,
        query_name: &str,
        variables: &V,
    ) -> Result<Option<&ResultTree>>
    where
        V: Serialize + ?Sized,
    {
        let key = result_tree_key(query_name, variables)?;
        Ok(self.results.lookup(&key))
    }

    /// Renders the latest tree for `query_name` run with `variables` as JSON.
    pub fn render_result_tree<V>(
        &self,
        query_name: &str,
        variables: &V,
    ) -> Result<Option<serde_json::Value>>
    where
        V: Serialize + ?Sized,
    {
        Ok(self
            .lookup_result_tree(query_name, variables)?
            .map(|tree| self.render_tree(tree)))
    }

    /// Renders a whole result tree against the current view state.
    pub fn render_tree(&self, tree: &ResultTree) -> serde_json::Value {
        let mut path = Vec::new();
        serde_json::Value::Object(
            tree.iter()
                .map(|(name, node)| (name.clone(), self.render_node(node, &mut path)))
                .collect(),
        )
    }

    /// Renders one node, resolving views to their current field values.
    pub fn render(&self, node: &Node) -> serde_json::Value {
        self.render_node(node, &mut Vec::new())
    }

    /// Renders one view, or `None` for an unknown handle.
    pub fn render_view(&self, id: ViewId) -> Option<serde_json::Value> {
        self.views.get(id)?;
        Some(self.render_node(&Node::View(id), &mut Vec::new()))
    }

    fn render_node(&self, node: &Node, path: &mut Vec<ViewId>) -> serde_json::Value {
        match node {
            Node::Scalar(value) | Node::Raw(value) => value.to_json(),
            Node::List(items) => serde_json::Value::Array(
                items.iter().map(|item| self.render_node(item, path)).collect(),
            ),
            Node::Object(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(name, item)| (name.clone(), self.render_node(item, path)))
                    .collect(),
            ),
            Node::View(id) => {
                let Some(view) = self.views.get(*id) else {
                    return serde_json::Value::Null;
                };
                // A view reachable from itself renders as its key fields only.
                if path.contains(id) {
                    return self.render_key_fields(view);
                }
                path.push(*id);
                let out = serde_json::Value::Object(
                    view.fields()
                        .map(|(name, item)| (name.clone(), self.render_node(item, path)))
                        .collect(),
                );
                path.pop();
                out
            }
        }
    }

    fn render_key_fields(&self, view: &View) -> serde_json::Value {
        let mut out = serde_json::Map::new();
        for name in [&self.options.typename_field, &self.options.id_field] {
            if let Some(node) = view.field(name) {
                out.insert(name.clone(), self.render(node));
            }
        }
        serde_json::Value::Object(out)
    }

    /// Looks up a view by handle.
    pub fn view(&self, id: ViewId) -> Option<&View> {
        self.views.get(id)
    }

    /// All views issued by this cache.
    pub fn views(&self) -> &ViewArena {
        &self.views
    }

    /// Looks up the canonical record for `key`.
    pub fn entity(&self, key: &EntityKey) -> Option<&CanonicalRecord> {
        self.entities.lookup(key)
    }

    /// The canonical entity store.
    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    /// The result-tree map.
    pub fn result_trees(&self) -> &ResultTreeCache {
        &self.results
    }

    /// Size counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entities: self.entities.len(),
            views: self.views.len(),
            result_trees: self.results.len(),
            listeners: self
                .entities
                .iter()
                .map(|(_, record)| record.listener_count())
                .sum(),
        }
    }
}
