use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Trait for tracking normalization activity in the cache.
///
/// Implementations collect counts of canonical records created and merged,
/// views handed out, and propagated field writes. Recording never affects
/// normalization results.
pub trait CacheMetrics: Send + Sync {
    /// Records the creation of a new canonical record.
    fn entity_created(&self);

    /// Records a merge of fresh fields into an existing canonical record.
    fn entity_merged(&self);

    /// Records the creation of a live view.
    fn view_created(&self);

    /// Records in-place writes onto previously issued views.
    ///
    /// # Parameters
    /// * `count` - Number of view fields overwritten by one merge.
    fn views_updated(&self, count: u64);

    /// Records a list that was passed through because its elements disagreed in shape.
    fn mixed_list(&self);
}

/// A no-op implementation of [`CacheMetrics`] that discards all recorded metrics.
#[derive(Default)]
pub struct NoopMetrics;

impl CacheMetrics for NoopMetrics {
    fn entity_created(&self) {}
    fn entity_merged(&self) {}
    fn view_created(&self) {}
    fn views_updated(&self, _count: u64) {}
    fn mixed_list(&self) {}
}

/// A thread-safe counter-based implementation of [`CacheMetrics`].
#[derive(Default)]
pub struct CounterMetrics {
    /// Number of canonical records created.
    pub entities_created: AtomicU64,

    /// Number of merges into existing canonical records.
    pub entities_merged: AtomicU64,

    /// Number of views created.
    pub views_created: AtomicU64,

    /// Number of view fields overwritten by propagation.
    pub view_field_writes: AtomicU64,

    /// Number of mixed-shape lists passed through unnormalized.
    pub mixed_lists: AtomicU64,
}

/// Point-in-time copy of a [`CounterMetrics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Number of canonical records created.
    pub entities_created: u64,
    /// Number of merges into existing canonical records.
    pub entities_merged: u64,
    /// Number of views created.
    pub views_created: u64,
    /// Number of view fields overwritten by propagation.
    pub view_field_writes: u64,
    /// Number of mixed-shape lists passed through unnormalized.
    pub mixed_lists: u64,
}

impl CounterMetrics {
    /// Reads all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            entities_created: self.entities_created.load(Ordering::Relaxed),
            entities_merged: self.entities_merged.load(Ordering::Relaxed),
            views_created: self.views_created.load(Ordering::Relaxed),
            view_field_writes: self.view_field_writes.load(Ordering::Relaxed),
            mixed_lists: self.mixed_lists.load(Ordering::Relaxed),
        }
    }
}

impl CacheMetrics for CounterMetrics {
    fn entity_created(&self) {
        self.entities_created.fetch_add(1, Ordering::Relaxed);
    }

    fn entity_merged(&self) {
        self.entities_merged.fetch_add(1, Ordering::Relaxed);
    }

    fn view_created(&self) {
        self.views_created.fetch_add(1, Ordering::Relaxed);
    }

    fn views_updated(&self, count: u64) {
        self.view_field_writes.fetch_add(count, Ordering::Relaxed);
    }

    fn mixed_list(&self) {
        self.mixed_lists.fetch_add(1, Ordering::Relaxed);
    }
}

/// Returns the shared default metrics sink.
pub fn default_metrics() -> Arc<dyn CacheMetrics> {
    Arc::new(NoopMetrics)
}
