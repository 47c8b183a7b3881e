use std::collections::HashMap;

use crate::keys::ResultTreeKey;
use crate::view::ResultTree;

/// Mapping from (query name, variables) to the latest result tree.
///
/// Storing under an existing key replaces the entry outright. Trees handed
/// out earlier stay live because their views are updated through the entity
/// store, not through this map.
#[derive(Debug, Default)]
pub struct ResultTreeCache {
    trees: HashMap<ResultTreeKey, ResultTree>,
}

impl ResultTreeCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `tree` under `key`, returning the tree it replaced.
    pub fn store(&mut self, key: ResultTreeKey, tree: ResultTree) -> Option<ResultTree> {
        self.trees.insert(key, tree)
    }

    /// Looks up the tree stored under `key`.
    pub fn lookup(&self, key: &ResultTreeKey) -> Option<&ResultTree> {
        self.trees.get(key)
    }

    /// Number of stored trees.
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// True if nothing was stored yet.
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Iterates stored trees in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&ResultTreeKey, &ResultTree)> {
        self.trees.iter()
    }
}
