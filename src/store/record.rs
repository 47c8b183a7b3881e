use std::collections::{BTreeMap, BTreeSet};

use crate::keys::EntityKey;
use crate::value::{Fields, Value};
use crate::view::ViewId;

/// The single source of truth for one entity's field values.
///
/// Besides the last known server value per field, the record tracks which
/// views display each field. Listener sets are per field so that a view is
/// only ever written for fields it selected.
#[derive(Clone, Debug)]
pub struct CanonicalRecord {
    key: EntityKey,
    server: Fields,
    local: Fields,
    listeners: BTreeMap<String, BTreeSet<ViewId>>,
}

impl CanonicalRecord {
    pub(crate) fn new(key: EntityKey) -> Self {
        Self {
            key,
            server: Fields::new(),
            local: Fields::new(),
            listeners: BTreeMap::new(),
        }
    }

    /// Key of the entity.
    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    /// Last known server values.
    pub fn server_fields(&self) -> &Fields {
        &self.server
    }

    /// Last known server value of `name`.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.server.get(name)
    }

    /// Locally applied values awaiting server confirmation.
    ///
    /// Reserved for latency-compensated writes; normalization never fills it.
    pub fn local_fields(&self) -> &Fields {
        &self.local
    }

    /// Views currently displaying `name`.
    pub fn listeners(&self, name: &str) -> impl Iterator<Item = ViewId> + '_ {
        self.listeners
            .get(name)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Total listener registrations across all fields.
    pub fn listener_count(&self) -> usize {
        self.listeners.values().map(BTreeSet::len).sum()
    }

    /// Distinct views bound to this record.
    pub fn views(&self) -> BTreeSet<ViewId> {
        self.listeners.values().flatten().copied().collect()
    }

    pub(crate) fn set_server(&mut self, name: &str, value: Value) {
        self.server.insert(name.to_owned(), value);
    }

    /// Listener set for `name`, created on first use.
    pub(crate) fn listeners_mut(&mut self, name: &str) -> &mut BTreeSet<ViewId> {
        self.listeners.entry(name.to_owned()).or_default()
    }
}
