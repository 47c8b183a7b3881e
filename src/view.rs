//! Live views handed back to callers and the arena that owns them.
//!
//! A view never holds a reference to its canonical record. Result trees carry
//! [`ViewId`] handles; the cache owns every [`View`] in a [`ViewArena`] and
//! writes propagated field values through those handles.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use crate::keys::EntityKey;
use crate::value::Value;

/// Opaque handle to a view stored in a [`ViewArena`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct ViewId(pub u64);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Field-keyed record of normalized nodes.
pub type NodeFields = BTreeMap<String, Node>;

/// One normalized value inside a result tree or view.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// Scalar leaf, copied as returned.
    Scalar(Value),
    /// Ordered sequence of normalized nodes; a list of views when the field
    /// returned entities.
    List(Vec<Node>),
    /// Nested record that is not an entity. Inert: never updated by later queries.
    Object(NodeFields),
    /// Live projection of a canonical record.
    View(ViewId),
    /// Data passed through without normalization (mixed lists, empty records).
    Raw(Value),
}

impl Node {
    /// Returns the view handle if this node is a live view.
    pub fn as_view(&self) -> Option<ViewId> {
        match self {
            Node::View(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the elements if this node is a normalized list.
    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Node::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Returns the scalar payload, if any.
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Node::Scalar(value) => Some(value),
            _ => None,
        }
    }
}

/// A field-subset projection of one canonical record.
///
/// The field set is fixed when the view is created; only values change.
#[derive(Clone, Debug, PartialEq)]
pub struct View {
    key: EntityKey,
    fields: NodeFields,
}

impl View {
    pub(crate) fn new(key: EntityKey, fields: NodeFields) -> Self {
        Self { key, fields }
    }

    /// Key of the canonical record this view is bound to.
    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    /// Current value of `name`, if the view selected it.
    pub fn field(&self, name: &str) -> Option<&Node> {
        self.fields.get(name)
    }

    /// True if the view selected `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Names of all selected fields, sorted.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Iterates selected fields and their current values.
    pub fn fields(&self) -> btree_map::Iter<'_, String, Node> {
        self.fields.iter()
    }

    /// Number of selected fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if the view selected no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Overwrites a field the view already has. Returns false, leaving the
    /// view untouched, when the field was never selected.
    pub(crate) fn overwrite(&mut self, name: &str, node: Node) -> bool {
        match self.fields.get_mut(name) {
            Some(slot) => {
                *slot = node;
                true
            }
            None => false,
        }
    }
}

/// Owner of every view issued by a cache.
#[derive(Debug, Default)]
pub struct ViewArena {
    views: Vec<View>,
}

impl ViewArena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `view` and returns its handle.
    pub fn insert(&mut self, view: View) -> ViewId {
        let id = ViewId(self.views.len() as u64);
        self.views.push(view);
        id
    }

    /// Looks up a view by handle.
    pub fn get(&self, id: ViewId) -> Option<&View> {
        self.views.get(id.0 as usize)
    }

    /// Looks up a view by handle for mutation.
    pub fn get_mut(&mut self, id: ViewId) -> Option<&mut View> {
        self.views.get_mut(id.0 as usize)
    }

    /// Number of views issued.
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// True if no view was issued yet.
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

/// Shaped output of one query execution.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultTree {
    fields: NodeFields,
}

impl ResultTree {
    pub(crate) fn new(fields: NodeFields) -> Self {
        Self { fields }
    }

    /// Top-level node for `name`.
    pub fn field(&self, name: &str) -> Option<&Node> {
        self.fields.get(name)
    }

    /// Iterates top-level fields.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Node> {
        self.fields.iter()
    }

    /// Number of top-level fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if the query returned no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
