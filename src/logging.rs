use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{CacheError, Result};

/// Installs a global `tracing` subscriber filtered by `filter`
/// (e.g. `"entity_cache=debug"`).
///
/// Fails if the filter does not parse or a subscriber is already installed.
pub fn init_logging(filter: &str) -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_new(filter)
                .map_err(|e| CacheError::Config(format!("invalid log filter: {e}")))?,
        )
        .with_target(true)
        .try_init()
        .map_err(|_| CacheError::Config("logging already initialized".into()))
}
