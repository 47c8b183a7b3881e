use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use serde::Serialize;

use super::{Cache, CacheOptions, CacheStats, QueryResult};
use crate::error::Result;
use crate::normalize::UpdateReport;

/// Cloneable handle that serializes access to one [`Cache`].
///
/// The cache itself has no internal synchronization. Each update holds the
/// write lock for the whole pass, so readers never observe a half-propagated
/// result.
#[derive(Clone, Debug, Default)]
pub struct SharedCache {
    inner: Arc<RwLock<Cache>>,
}

impl SharedCache {
    /// Wraps a fresh cache built with `options`.
    pub fn new(options: CacheOptions) -> Self {
        Self::from_cache(Cache::with_options(options))
    }

    /// Wraps an existing cache.
    pub fn from_cache(cache: Cache) -> Self {
        Self {
            inner: Arc::new(RwLock::new(cache)),
        }
    }

    /// Runs [`Cache::update_cache`] under the write lock.
    pub fn update_cache(&self, result: &QueryResult) -> Result<UpdateReport> {
        self.inner.write().update_cache(result)
    }

    /// Renders the latest tree for a query under the read lock.
    pub fn render_result_tree<V>(
        &self,
        query_name: &str,
        variables: &V,
    ) -> Result<Option<serde_json::Value>>
    where
        V: Serialize + ?Sized,
    {
        self.inner.read().render_result_tree(query_name, variables)
    }

    /// Size counters, read under the read lock.
    pub fn stats(&self) -> CacheStats {
        self.inner.read().stats()
    }

    /// Holds the read lock for direct inspection.
    pub fn read(&self) -> RwLockReadGuard<'_, Cache> {
        self.inner.read()
    }
}
