//! Canonical entity store: one record per entity key.
//!
//! Records are created the first time an entity is observed and merged on
//! every later observation. Merging writes fresh values through to every view
//! registered for the touched fields. Records are never removed.

use std::collections::hash_map;
use std::collections::HashMap;

use tracing::trace;

use crate::keys::EntityKey;
use crate::value::Fields;
use crate::view::{ViewArena, ViewId};

mod record;

pub use record::CanonicalRecord;

/// Result of merging fresh fields into an existing record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Number of server values stored.
    pub fields_written: usize,
    /// Number of in-place field writes made on previously issued views.
    pub view_writes: usize,
    /// Listener registrations on the record after the merge.
    pub listeners: usize,
}

/// What [`EntityStore::observe`] did with an entity occurrence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Observation {
    /// A new record was created; carries its listener count.
    Created {
        /// Listener registrations on the new record.
        listeners: usize,
    },
    /// An existing record was merged.
    Merged(MergeOutcome),
}

/// Mapping from entity key to canonical record.
#[derive(Debug, Default)]
pub struct EntityStore {
    records: HashMap<EntityKey, CanonicalRecord>,
}

impl EntityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the record for `key`.
    pub fn lookup(&self, key: &EntityKey) -> Option<&CanonicalRecord> {
        self.records.get(key)
    }

    /// Inserts a new record holding `initial` and registers `first_view` as a
    /// listener of every field in `initial`.
    ///
    /// Returns the listener count, or `None` without touching the store when
    /// a record for `key` already exists.
    pub fn create(
        &mut self,
        key: &EntityKey,
        initial: &Fields,
        first_view: ViewId,
    ) -> Option<usize> {
        let entry = match self.records.entry(key.clone()) {
            hash_map::Entry::Occupied(_) => return None,
            hash_map::Entry::Vacant(entry) => entry,
        };
        let record = entry.insert(CanonicalRecord::new(key.clone()));
        for (name, value) in initial {
            record.set_server(name, value.clone());
            record.listeners_mut(name).insert(first_view);
        }
        trace!(entity = %key, fields = initial.len(), "cache.store.create");
        Some(record.listener_count())
    }

    /// Merges `fresh` into the existing record for `key`.
    ///
    /// Each fresh field overwrites the stored server value, is written onto
    /// every view already listening to it, and gains `new_view` as a
    /// listener. The value written onto existing views is `new_view`'s own
    /// normalized node for that field, so nested entities stay live. Fields
    /// `new_view` did not select are stored but neither propagated nor
    /// subscribed. Returns `None` when no record exists for `key`.
    pub fn merge(
        &mut self,
        key: &EntityKey,
        fresh: &Fields,
        new_view: ViewId,
        views: &mut ViewArena,
    ) -> Option<MergeOutcome> {
        let record = self.records.get_mut(key)?;
        let mut outcome = MergeOutcome::default();
        for (name, value) in fresh {
            record.set_server(name, value.clone());
            outcome.fields_written += 1;

            let Some(node) = views.get(new_view).and_then(|view| view.field(name)).cloned()
            else {
                continue;
            };
            let listeners = record.listeners_mut(name);
            let mut written = 0;
            for &listener in listeners.iter().filter(|&&id| id != new_view) {
                if let Some(view) = views.get_mut(listener) {
                    if view.overwrite(name, node.clone()) {
                        written += 1;
                    }
                }
            }
            listeners.insert(new_view);
            if written > 0 {
                trace!(entity = %key, field = %name, views = written, "cache.store.propagate");
            }
            outcome.view_writes += written;
        }
        outcome.listeners = record.listener_count();
        trace!(
            entity = %key,
            fields = outcome.fields_written,
            view_writes = outcome.view_writes,
            "cache.store.merge"
        );
        Some(outcome)
    }

    /// Creates the record for `key` or merges into it.
    pub fn observe(
        &mut self,
        key: &EntityKey,
        fields: &Fields,
        view: ViewId,
        views: &mut ViewArena,
    ) -> Observation {
        match self.merge(key, fields, view, views) {
            Some(outcome) => Observation::Merged(outcome),
            None => Observation::Created {
                listeners: self.create(key, fields, view).unwrap_or_default(),
            },
        }
    }

    /// Number of canonical records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no entity was observed yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates all records in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityKey, &CanonicalRecord)> {
        self.records.iter()
    }
}
