use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use super::metrics::{default_metrics, CacheMetrics};
use crate::error::{CacheError, Result};

/// Default field carrying an entity's type name.
pub const DEFAULT_TYPENAME_FIELD: &str = "__typename";
/// Default field carrying an entity's identifier.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Configuration options supplied when constructing a [`super::Cache`].
#[derive(Clone)]
pub struct CacheOptions {
    /// Field whose value names the entity type.
    pub typename_field: String,
    /// Field whose value identifies the entity within its type.
    pub id_field: String,
    /// Whether `null` items are ignored when deciding if a list is mixed.
    ///
    /// Defaults to `true`, which relaxes the strict rule that counts `null` as
    /// a scalar and so treats `[entity, null]` as a mixed list. Set `false`
    /// for strict classification.
    pub allow_null_list_items: bool,
    /// Metrics sink for normalization activity.
    pub metrics: Arc<dyn CacheMetrics>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            typename_field: DEFAULT_TYPENAME_FIELD.to_owned(),
            id_field: DEFAULT_ID_FIELD.to_owned(),
            allow_null_list_items: true,
            metrics: default_metrics(),
        }
    }
}

impl fmt::Debug for CacheOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheOptions")
            .field("typename_field", &self.typename_field)
            .field("id_field", &self.id_field)
            .field("allow_null_list_items", &self.allow_null_list_items)
            .finish_non_exhaustive()
    }
}

impl CacheOptions {
    /// Creates options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the type-name field.
    pub fn typename_field(mut self, name: impl Into<String>) -> Self {
        self.typename_field = name.into();
        self
    }

    /// Sets the identifier field.
    pub fn id_field(mut self, name: impl Into<String>) -> Self {
        self.id_field = name.into();
        self
    }

    /// Controls whether `null` list items are neutral during list classification.
    pub fn allow_null_list_items(mut self, allow: bool) -> Self {
        self.allow_null_list_items = allow;
        self
    }

    /// Sets the metrics collection implementation.
    pub fn metrics(mut self, metrics: Arc<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Parses options from a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let raw: RawOptions =
            toml::from_str(input).map_err(|err| CacheError::Config(err.to_string()))?;
        raw.into_options()
    }

    /// Reads options from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOptions {
    #[serde(default)]
    typename_field: Option<String>,
    #[serde(default)]
    id_field: Option<String>,
    #[serde(default)]
    allow_null_list_items: Option<bool>,
}

impl RawOptions {
    fn into_options(self) -> Result<CacheOptions> {
        let mut opts = CacheOptions::default();
        if let Some(name) = self.typename_field {
            opts.typename_field = non_empty("typename_field", name)?;
        }
        if let Some(name) = self.id_field {
            opts.id_field = non_empty("id_field", name)?;
        }
        if opts.typename_field == opts.id_field {
            return Err(CacheError::Config(
                "typename_field and id_field must differ".into(),
            ));
        }
        if let Some(allow) = self.allow_null_list_items {
            opts.allow_null_list_items = allow;
        }
        Ok(opts)
    }
}

fn non_empty(key: &str, value: String) -> Result<String> {
    if value.trim().is_empty() {
        return Err(CacheError::Config(format!("{key} cannot be empty")));
    }
    Ok(value)
}
