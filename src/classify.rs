//! Stateless predicates that decide how a decoded value is normalized.

use crate::cache::CacheOptions;
use crate::value::{Fields, Value};

/// Shape of a single value as seen by the normalizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    /// Null, boolean, number, or string.
    Scalar,
    /// Ordered sequence.
    List,
    /// Record with at least one field.
    SelectionSet,
    /// Record with no fields.
    EmptyRecord,
}

/// Classification of a list's elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListShape {
    /// No elements (or only neutral `null`s).
    Empty,
    /// Every classified element has this shape.
    Uniform(Shape),
    /// Elements disagree; the list must be passed through untouched.
    Mixed,
}

/// Outcome of inspecting a selection set's type-name and identifier fields.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Identity<'a> {
    /// Both fields present and usable.
    Entity {
        /// Entity type name.
        typename: &'a str,
        /// Identifier value, possibly composite.
        id: &'a Value,
    },
    /// Type name present but the identifier is null or absent.
    MissingId {
        /// Entity type name.
        typename: &'a str,
    },
    /// Identifier present but the type name is null, absent, or not a string.
    MissingTypename,
    /// Neither field present: ordinary nested data.
    Plain,
}

/// True for null, booleans, numbers, and strings.
pub fn is_scalar(value: &Value) -> bool {
    matches!(
        value,
        Value::Null
            | Value::Bool(_)
            | Value::Int(_)
            | Value::UInt(_)
            | Value::Float(_)
            | Value::String(_)
    )
}

/// True for a record with at least one field.
pub fn is_selection_set(value: &Value) -> bool {
    matches!(value, Value::Object(fields) if !fields.is_empty())
}

/// True for a selection set carrying both a type name and an identifier.
pub fn is_normalizable(value: &Value, opts: &CacheOptions) -> bool {
    match value {
        Value::Object(fields) if !fields.is_empty() => {
            matches!(identity(fields, opts), Identity::Entity { .. })
        }
        _ => false,
    }
}

/// Inspects the type-name and identifier fields of a record.
pub fn identity<'a>(fields: &'a Fields, opts: &CacheOptions) -> Identity<'a> {
    let typename = fields.get(&opts.typename_field).filter(|v| !v.is_null());
    let id = fields.get(&opts.id_field).filter(|v| !v.is_null());
    match (typename, id) {
        (Some(Value::String(typename)), Some(id)) => Identity::Entity { typename, id },
        (Some(Value::String(typename)), None) => Identity::MissingId { typename },
        (_, Some(_)) => Identity::MissingTypename,
        (Some(_), None) | (None, None) => Identity::Plain,
    }
}

/// Returns the normalizer's view of `value`'s shape.
pub fn shape(value: &Value) -> Shape {
    match value {
        Value::List(_) => Shape::List,
        Value::Object(fields) if fields.is_empty() => Shape::EmptyRecord,
        Value::Object(_) => Shape::SelectionSet,
        _ => Shape::Scalar,
    }
}

/// Classifies a list by the shapes of its elements.
///
/// With `nulls_neutral`, `null` items do not count towards the classification,
/// so a nullable list of entities is not considered mixed.
pub fn list_shape(items: &[Value], nulls_neutral: bool) -> ListShape {
    let mut seen: Option<Shape> = None;
    for item in items {
        if nulls_neutral && item.is_null() {
            continue;
        }
        let current = shape(item);
        match seen {
            None => seen = Some(current),
            Some(prev) if prev == current => {}
            Some(_) => return ListShape::Mixed,
        }
    }
    match seen {
        None => ListShape::Empty,
        Some(shape) => ListShape::Uniform(shape),
    }
}
