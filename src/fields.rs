//! Declarative field fallback tables.
//!
//! Each provider names the same attribute differently across API versions
//! (`bookName` vs `name` vs `title`). A [`FieldTable`] lists the candidate
//! keys per attribute in priority order; the resolvers below pick the first
//! *truthy* candidate, so an empty string or `0` falls through to the next
//! key exactly like a chain of `a || b || c`.

use serde_json::Value;

/// Ordered candidate keys for each logical `Drama` attribute.
#[derive(Debug, Clone, Copy)]
pub struct FieldTable {
    pub id: &'static [&'static str],
    pub title: &'static [&'static str],
    pub cover: &'static [&'static str],
    pub description: &'static [&'static str],
    pub episode_count: &'static [&'static str],
}

impl FieldTable {
    pub fn id(&self, item: &Value) -> Option<String> {
        first_string(item, self.id)
    }

    pub fn title(&self, item: &Value) -> String {
        first_string(item, self.title).unwrap_or_default()
    }

    pub fn cover(&self, item: &Value) -> String {
        first_string(item, self.cover).unwrap_or_default()
    }

    pub fn description(&self, item: &Value) -> String {
        first_string(item, self.description).unwrap_or_default()
    }

    pub fn episode_count(&self, item: &Value) -> u32 {
        first_count(item, self.episode_count)
    }
}

/// Falsy values are `null`, `false`, `0`, `NaN` and `""`. Arrays and
/// objects are always truthy, even when empty.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// First truthy value among `fields`.
pub fn first_present<'a>(item: &'a Value, fields: &[&str]) -> Option<&'a Value> {
    fields
        .iter()
        .filter_map(|field| item.get(*field))
        .find(|value| is_truthy(value))
}

/// First truthy candidate rendered as a string. Numbers are accepted since
/// some endpoints send numeric ids.
pub fn first_string(item: &Value, fields: &[&str]) -> Option<String> {
    first_present(item, fields).and_then(value_to_string)
}

/// First truthy candidate as a count; accepts numbers and numeric strings.
/// Anything else resolves to `0`.
pub fn first_count(item: &Value, fields: &[&str]) -> u32 {
    first_present(item, fields).and_then(value_to_u32).unwrap_or(0)
}

/// Truthiness of a single optional key.
pub fn flag(item: &Value, field: &str) -> bool {
    item.get(field).is_some_and(is_truthy)
}

pub(crate) fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn value_to_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
