// ============================
// crates/backend-lib/src/storage/query.rs
// ============================
//! Filters, updates and find options evaluated against JSON documents.

use std::cmp::Ordering;

use chrono::DateTime;
use serde_json::{Map, Number, Value};

use super::StoreError;

/// A stored record: a JSON object keyed by `_id`.
pub type Document = Map<String, Value>;

/// Key holding a document's identifier.
pub const ID_FIELD: &str = "_id";

/// Predicate over a document. Field names may be dotted paths.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Eq(String, Value),
    Ne(String, Value),
    In(String, Vec<Value>),
    /// The field is an array holding the value.
    Contains(String, Value),
    /// Case-insensitive substring match on a string field.
    Matches(String, String),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn id(id: impl Into<String>) -> Self {
        Filter::Eq(ID_FIELD.to_string(), Value::String(id.into()))
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Ne(field.into(), value.into())
    }

    pub fn one_of<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Filter::In(field.into(), values.into_iter().map(Into::into).collect())
    }

    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Contains(field.into(), value.into())
    }

    pub fn matches(field: impl Into<String>, needle: &str) -> Self {
        Filter::Matches(field.into(), needle.to_lowercase())
    }

    pub fn any(filters: Vec<Filter>) -> Self {
        Filter::Or(filters)
    }

    /// Conjunction, flattening nested `And`s.
    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::All, f) | (f, Filter::All) => f,
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            },
            (Filter::And(mut left), f) => {
                left.push(f);
                Filter::And(left)
            },
            (f, g) => Filter::And(vec![f, g]),
        }
    }

    pub fn matches_doc(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, value) => values_equal(lookup(doc, field).unwrap_or(&Value::Null), value),
            Filter::Ne(field, value) => !values_equal(lookup(doc, field).unwrap_or(&Value::Null), value),
            Filter::In(field, values) => {
                let actual = lookup(doc, field).unwrap_or(&Value::Null);
                values.iter().any(|v| values_equal(actual, v))
            },
            Filter::Contains(field, value) => match lookup(doc, field) {
                Some(Value::Array(items)) => items.iter().any(|item| values_equal(item, value)),
                _ => false,
            },
            Filter::Matches(field, needle) => match lookup(doc, field) {
                Some(Value::String(s)) => s.to_lowercase().contains(needle.as_str()),
                _ => false,
            },
            Filter::And(filters) => filters.iter().all(|f| f.matches_doc(doc)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches_doc(doc)),
        }
    }
}

/// Resolve a dotted path inside a document.
pub fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Equality with numbers compared by value (`1 == 1.0`).
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order used for sorting. RFC 3339 strings compare as instants.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        },
        (Value::String(x), Value::String(y)) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        },
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Sorting and paging applied after filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub sort: Vec<(String, SortOrder)>,
    pub skip: u64,
    pub limit: Option<u64>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort_asc(mut self, field: impl Into<String>) -> Self {
        self.sort.push((field.into(), SortOrder::Ascending));
        self
    }

    pub fn sort_desc(mut self, field: impl Into<String>) -> Self {
        self.sort.push((field.into(), SortOrder::Descending));
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub(crate) fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for (field, order) in &self.sort {
            let left = lookup(a, field).unwrap_or(&Value::Null);
            let right = lookup(b, field).unwrap_or(&Value::Null);
            let ordering = match order {
                SortOrder::Ascending => compare_values(left, right),
                SortOrder::Descending => compare_values(right, left),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// Field-level modifications applied atomically to one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    set: Vec<(String, Value)>,
    inc: Vec<(String, i64)>,
    add_to_set: Vec<(String, Value)>,
    pull: Vec<(String, Value)>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.push((field.into(), value.into()));
        self
    }

    /// Set every key of `fields` (an object), skipping nulls.
    pub fn set_present(mut self, fields: Document) -> Self {
        for (key, value) in fields {
            if !value.is_null() {
                self.set.push((key, value));
            }
        }
        self
    }

    pub fn inc(mut self, field: impl Into<String>, by: i64) -> Self {
        self.inc.push((field.into(), by));
        self
    }

    pub fn add_to_set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add_to_set.push((field.into(), value.into()));
        self
    }

    pub fn pull(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.pull.push((field.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.inc.is_empty() && self.add_to_set.is_empty() && self.pull.is_empty()
    }

    fn touched_fields(&self) -> impl Iterator<Item = &str> {
        self.set
            .iter()
            .map(|(f, _)| f.as_str())
            .chain(self.inc.iter().map(|(f, _)| f.as_str()))
            .chain(self.add_to_set.iter().map(|(f, _)| f.as_str()))
            .chain(self.pull.iter().map(|(f, _)| f.as_str()))
    }

    pub fn apply(&self, doc: &mut Document) -> Result<(), StoreError> {
        if self.touched_fields().any(|f| f == ID_FIELD) {
            return Err(StoreError::InvalidUpdate("`_id` is immutable".to_string()));
        }

        for (field, value) in &self.set {
            *entry_mut(doc, field)? = value.clone();
        }

        for (field, by) in &self.inc {
            let slot = entry_mut(doc, field)?;
            let next = match &*slot {
                Value::Null => Value::from(*by),
                Value::Number(n) => increment(n, *by).ok_or_else(|| {
                    StoreError::InvalidUpdate(format!("`{field}` overflowed"))
                })?,
                _ => {
                    return Err(StoreError::InvalidUpdate(format!(
                        "cannot increment non-numeric field `{field}`"
                    )))
                },
            };
            *slot = next;
        }

        for (field, value) in &self.add_to_set {
            let slot = entry_mut(doc, field)?;
            if slot.is_null() {
                *slot = Value::Array(Vec::new());
            }
            match slot {
                Value::Array(items) => {
                    if !items.iter().any(|item| values_equal(item, value)) {
                        items.push(value.clone());
                    }
                },
                _ => {
                    return Err(StoreError::InvalidUpdate(format!(
                        "cannot add to non-array field `{field}`"
                    )))
                },
            }
        }

        for (field, value) in &self.pull {
            if lookup(doc, field).is_none() {
                continue;
            }
            if let Value::Array(items) = entry_mut(doc, field)? {
                items.retain(|item| !values_equal(item, value));
            }
        }

        Ok(())
    }
}

fn increment(n: &Number, by: i64) -> Option<Value> {
    if let Some(current) = n.as_i64() {
        return current.checked_add(by).map(Value::from);
    }
    if let Some(current) = n.as_u64() {
        return i64::try_from(current)
            .ok()
            .and_then(|c| c.checked_add(by))
            .map(Value::from);
    }
    n.as_f64()
        .and_then(|current| Number::from_f64(current + by as f64))
        .map(Value::Number)
}

/// Mutable slot for a dotted path, creating intermediate objects.
fn entry_mut<'a>(doc: &'a mut Document, path: &str) -> Result<&'a mut Value, StoreError> {
    let parts: Vec<&str> = path.split('.').collect();
    let (head, rest) = parts
        .split_first()
        .ok_or_else(|| StoreError::InvalidUpdate("empty field path".to_string()))?;
    let root = doc.entry(head.to_string()).or_insert(Value::Null);
    nested_slot(root, rest, path)
}

fn nested_slot<'a>(
    value: &'a mut Value,
    parts: &[&str],
    path: &str,
) -> Result<&'a mut Value, StoreError> {
    let Some((head, rest)) = parts.split_first() else {
        return Ok(value);
    };
    if value.is_null() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => {
            nested_slot(map.entry(head.to_string()).or_insert(Value::Null), rest, path)
        },
        _ => Err(StoreError::InvalidUpdate(format!(
            "`{path}` does not address an object field"
        ))),
    }
}
