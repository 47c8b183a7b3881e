//! Normalization layer of a client-side response cache.
//!
//! Query results are walked recursively; every nested record carrying a type
//! name and identifier is stored once as a canonical record and replaced in
//! the returned tree by a live view. Later results for the same entity update
//! the canonical record and every earlier view that selected the touched
//! fields, and nothing else.
//!
//! ```
//! use entity_cache::{Cache, QueryResult};
//! use serde_json::json;
//!
//! let mut cache = Cache::new();
//! cache.update_cache(&QueryResult::new(
//!     "listMovies",
//!     json!({"limit": 10}),
//!     json!({"movies": [{"__typename": "Movie", "id": "1", "title": "Alien"}]}),
//! ))?;
//! cache.update_cache(&QueryResult::new(
//!     "getMovie",
//!     json!({"id": "1"}),
//!     json!({"movie": {"__typename": "Movie", "id": "1", "title": "Alien (1979)"}}),
//! ))?;
//!
//! let list = cache.render_result_tree("listMovies", &json!({"limit": 10}))?.unwrap();
//! assert_eq!(list["movies"][0]["title"], "Alien (1979)");
//! # Ok::<(), entity_cache::CacheError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod classify;
pub mod keys;
pub mod store;
pub mod value;
pub mod view;

mod error;
mod logging;
mod normalize;

pub use cache::{
    Cache, CacheMetrics, CacheOptions, CacheStats, CounterMetrics, MetricsSnapshot, NoopMetrics,
    QueryResult, ResultTreeCache, SharedCache,
};
pub use error::{CacheError, Result};
pub use keys::{entity_key, result_tree_key, EntityKey, ResultTreeKey};
pub use logging::init_logging;
pub use normalize::{NormalizeWarning, UpdateReport};
pub use store::{CanonicalRecord, EntityStore, MergeOutcome, Observation};
pub use value::{Fields, Value};
pub use view::{Node, NodeFields, ResultTree, View, ViewArena, ViewId};
