//! Recursive normalization of query result data.
//!
//! Children are normalized before their parent is classified, so a nested
//! entity always gets its own canonical record and view, whether or not any
//! ancestor is itself an entity. Entity occurrences become [`Node::View`]s;
//! everything else is copied through as inert data.

use std::fmt;

use tracing::{debug, warn};

use crate::cache::CacheOptions;
use crate::classify::{identity, list_shape, Identity, ListShape};
use crate::error::Result;
use crate::keys::{entity_key, ResultTreeKey};
use crate::store::{EntityStore, Observation};
use crate::value::{Fields, Value};
use crate::view::{Node, NodeFields, View, ViewArena};

/// Recoverable anomaly found while normalizing. The affected data is kept
/// as inert nested data instead of failing the pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NormalizeWarning {
    /// List elements disagree in shape; the list was stored unnormalized.
    MixedList {
        /// Location of the list.
        path: String,
    },
    /// A record named a type but carried no identifier.
    MissingIdentifier {
        /// Location of the record.
        path: String,
        /// The type name the record carried.
        typename: String,
    },
    /// A record carried an identifier but no usable type name.
    MissingTypename {
        /// Location of the record.
        path: String,
    },
}

impl fmt::Display for NormalizeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeWarning::MixedList { path } => {
                write!(f, "{path}: list mixes element shapes; stored unnormalized")
            }
            NormalizeWarning::MissingIdentifier { path, typename } => {
                write!(f, "{path}: {typename} has no identifier; stored inline")
            }
            NormalizeWarning::MissingTypename { path } => {
                write!(f, "{path}: identifier without type name; stored inline")
            }
        }
    }
}

/// Summary of one normalization pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateReport {
    /// Key the result tree was stored under.
    pub key: ResultTreeKey,
    /// Canonical records created.
    pub entities_created: usize,
    /// Entity occurrences merged into existing records.
    pub entities_merged: usize,
    /// Views created.
    pub views_created: usize,
    /// In-place field writes on previously issued views.
    pub view_writes: usize,
    /// Recoverable anomalies.
    pub warnings: Vec<NormalizeWarning>,
}

impl UpdateReport {
    pub(crate) fn new(key: ResultTreeKey) -> Self {
        Self {
            key,
            entities_created: 0,
            entities_merged: 0,
            views_created: 0,
            view_writes: 0,
            warnings: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
enum Segment {
    Field(String),
    Index(usize),
}

/// Walks one result-data tree and rewrites it against the entity store.
pub(crate) struct Normalizer<'a> {
    opts: &'a CacheOptions,
    entities: &'a mut EntityStore,
    views: &'a mut ViewArena,
    report: &'a mut UpdateReport,
    path: Vec<Segment>,
}

impl<'a> Normalizer<'a> {
    pub(crate) fn new(
        opts: &'a CacheOptions,
        entities: &'a mut EntityStore,
        views: &'a mut ViewArena,
        report: &'a mut UpdateReport,
    ) -> Self {
        Self {
            opts,
            entities,
            views,
            report,
            path: Vec::new(),
        }
    }

    /// Normalizes every top-level field of a result.
    pub(crate) fn normalize_fields(&mut self, data: &Fields) -> Result<NodeFields> {
        let mut out = NodeFields::new();
        for (name, value) in data {
            self.path.push(Segment::Field(name.clone()));
            let node = self.normalize_node(value)?;
            self.path.pop();
            out.insert(name.clone(), node);
        }
        Ok(out)
    }

    /// Normalizes one value, replacing entity occurrences with live views.
    pub(crate) fn normalize_node(&mut self, value: &Value) -> Result<Node> {
        match value {
            Value::List(items) => self.normalize_list(items),
            Value::Object(fields) if fields.is_empty() => Ok(Node::Raw(value.clone())),
            Value::Object(fields) => self.normalize_record(fields),
            scalar => Ok(Node::Scalar(scalar.clone())),
        }
    }

    fn normalize_list(&mut self, items: &[Value]) -> Result<Node> {
        if list_shape(items, self.opts.allow_null_list_items) == ListShape::Mixed {
            let path = self.render_path();
            warn!(path = %path, len = items.len(), "cache.normalize.mixed_list");
            self.opts.metrics.mixed_list();
            self.report.warnings.push(NormalizeWarning::MixedList { path });
            return Ok(Node::Raw(Value::List(items.to_vec())));
        }
        let mut out = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            self.path.push(Segment::Index(idx));
            let node = self.normalize_node(item)?;
            self.path.pop();
            out.push(node);
        }
        Ok(Node::List(out))
    }

    fn normalize_record(&mut self, fields: &Fields) -> Result<Node> {
        let mut rebuilt = NodeFields::new();
        for (name, value) in fields {
            self.path.push(Segment::Field(name.clone()));
            let node = self.normalize_node(value)?;
            self.path.pop();
            rebuilt.insert(name.clone(), node);
        }

        // Normalization preserves field presence and nullness, so the
        // original fields classify exactly like the rebuilt record.
        let (typename, id) = match identity(fields, self.opts) {
            Identity::Entity { typename, id } => (typename, id),
            Identity::MissingId { typename } => {
                let path = self.render_path();
                warn!(path = %path, typename, "cache.normalize.missing_id");
                self.report.warnings.push(NormalizeWarning::MissingIdentifier {
                    path,
                    typename: typename.to_owned(),
                });
                return Ok(Node::Object(rebuilt));
            }
            Identity::MissingTypename => {
                let path = self.render_path();
                warn!(path = %path, "cache.normalize.missing_typename");
                self.report
                    .warnings
                    .push(NormalizeWarning::MissingTypename { path });
                return Ok(Node::Object(rebuilt));
            }
            Identity::Plain => return Ok(Node::Object(rebuilt)),
        };

        let key = entity_key(typename, id)?;
        let view = self.views.insert(View::new(key.clone(), rebuilt));
        self.report.views_created += 1;
        self.opts.metrics.view_created();

        match self.entities.observe(&key, fields, view, self.views) {
            Observation::Created { listeners } => {
                debug!(entity = %key, view = %view, listeners, "cache.normalize.create");
                self.report.entities_created += 1;
                self.opts.metrics.entity_created();
            }
            Observation::Merged(outcome) => {
                debug!(
                    entity = %key,
                    view = %view,
                    view_writes = outcome.view_writes,
                    listeners = outcome.listeners,
                    "cache.normalize.merge"
                );
                self.report.entities_merged += 1;
                self.report.view_writes += outcome.view_writes;
                self.opts.metrics.entity_merged();
                self.opts.metrics.views_updated(outcome.view_writes as u64);
            }
        }
        Ok(Node::View(view))
    }

    fn render_path(&self) -> String {
        render_path(&self.path)
    }
}

fn render_path(path: &[Segment]) -> String {
    let mut out = String::new();
    for segment in path {
        match segment {
            Segment::Field(name) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(name);
            }
            Segment::Index(idx) => {
                out.push('[');
                out.push_str(&idx.to_string());
                out.push(']');
            }
        }
    }
    if out.is_empty() {
        out.push('$');
    }
    out
}

/// Computes every entity key the tree would produce, without touching any
/// state. Fails on the first key that cannot be encoded.
pub(crate) fn validate_keys(value: &Value, opts: &CacheOptions) -> Result<()> {
    match value {
        Value::List(items) => {
            if list_shape(items, opts.allow_null_list_items) == ListShape::Mixed {
                return Ok(());
            }
            for item in items {
                validate_keys(item, opts)?;
            }
        }
        Value::Object(fields) => {
            for item in fields.values() {
                validate_keys(item, opts)?;
            }
            if let Identity::Entity { typename, id } = identity(fields, opts) {
                entity_key(typename, id)?;
            }
        }
        _ => {}
    }
    Ok(())
}
