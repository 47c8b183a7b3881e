//! Deterministic cache keys for entities and query results.
//!
//! Both key kinds embed a canonical encoding of an arbitrary [`Value`]: record
//! fields are emitted in sorted order, strings use JSON escaping, and floats
//! with no fractional part encode like integers. Logically equal values
//! therefore always produce the same key regardless of field insertion order.

use std::fmt;

use serde::Serialize;

use crate::error::{CacheError, Result};
use crate::value::Value;

mod finite;

/// Largest float magnitude that still encodes exactly as an integer.
const EXACT_INT_LIMIT: f64 = 9_007_199_254_740_992.0;

/// Key of one canonical entity record: type name plus encoded identifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityKey {
    typename: String,
    id: String,
}

impl EntityKey {
    /// Entity type name.
    pub fn typename(&self) -> &str {
        &self.typename
    }

    /// Canonical encoding of the identifier.
    pub fn encoded_id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.typename, self.id)
    }
}

/// Key of one cached result tree: query name plus encoded variables.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResultTreeKey {
    query_name: String,
    variables: String,
}

impl ResultTreeKey {
    /// Name of the query that produced the tree.
    pub fn query_name(&self) -> &str {
        &self.query_name
    }

    /// Canonical encoding of the variables.
    pub fn encoded_variables(&self) -> &str {
        &self.variables
    }
}

impl fmt::Display for ResultTreeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.query_name, self.variables)
    }
}

/// Builds the key for an entity of `typename` identified by `id`.
///
/// Composite identifiers are canonicalized, so `{a, b}` and `{b, a}` collide.
pub fn entity_key(typename: &str, id: &Value) -> Result<EntityKey> {
    Ok(EntityKey {
        typename: typename.to_owned(),
        id: canonical_encode(id)?,
    })
}

/// Builds the key for a query result from its name and variables.
///
/// Variables may be any serializable value; unit or `null` variables encode
/// as `null`. Non-finite floats anywhere in the variables are rejected.
pub fn result_tree_key<V>(query_name: &str, variables: &V) -> Result<ResultTreeKey>
where
    V: Serialize + ?Sized,
{
    finite::ensure_finite(variables)
        .map_err(|err| CacheError::unserializable(format!("variables: {err}")))?;
    let json = serde_json::to_value(variables)
        .map_err(|err| CacheError::unserializable(format!("variables: {err}")))?;
    Ok(ResultTreeKey {
        query_name: query_name.to_owned(),
        variables: canonical_encode(&Value::from(json))?,
    })
}

/// Encodes `value` into its canonical string form.
pub fn canonical_encode(value: &Value) -> Result<String> {
    let mut out = String::new();
    encode_into(value, &mut out)?;
    Ok(out)
}

fn encode_into(value: &Value, out: &mut String) -> Result<()> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Int(i) => out.push_str(&i.to_string()),
        Value::UInt(u) => out.push_str(&u.to_string()),
        Value::Float(f) => encode_float(*f, out)?,
        Value::String(s) => encode_str(s, out)?,
        Value::List(items) => {
            out.push('[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                encode_into(item, out)?;
            }
            out.push(']');
        }
        Value::Object(fields) => {
            // BTreeMap iteration is already sorted by field name.
            out.push('{');
            for (idx, (name, item)) in fields.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                encode_str(name, out)?;
                out.push(':');
                encode_into(item, out)?;
            }
            out.push('}');
        }
    }
    Ok(())
}

fn encode_float(f: f64, out: &mut String) -> Result<()> {
    if !f.is_finite() {
        return Err(CacheError::unserializable(format!("non-finite float {f}")));
    }
    if f.fract() == 0.0 && f.abs() < EXACT_INT_LIMIT {
        out.push_str(&(f as i64).to_string());
    } else {
        out.push_str(&f.to_string());
    }
    Ok(())
}

fn encode_str(s: &str, out: &mut String) -> Result<()> {
    let quoted =
        serde_json::to_string(s).map_err(|err| CacheError::unserializable(err.to_string()))?;
    out.push_str(&quoted);
    Ok(())
}
