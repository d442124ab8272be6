//! Model lookup and fetch contracts.
//!
//! A *model* is the query-side view of a table: given a [`FilterState`] it
//! fetches one row or a list of rows. Models are obtained by identity from a
//! [`ModelRegistry`], whose answer is an explicit [`Resolution`] rather than
//! an error so that "no such model" is never confused with a failing query.

use crate::Result;
use crate::identity::TableIdentity;
use crate::row::Row;
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Mapping of column name to value used to constrain a fetch.
///
/// A `Value::Array` entry means "column IN (...)".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    entries: BTreeMap<String, Value>,
}

impl FilterState {
    /// Create an empty filter state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a filter value, replacing any previous value for `column`.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(column.into(), value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    /// Get the value for a column.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries.get(column)
    }

    /// Check whether a column is constrained.
    pub fn contains_key(&self, column: &str) -> bool {
        self.entries.contains_key(column)
    }

    /// Check if there are no constraints.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of constrained columns.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Append values to the list stored under `column`.
    ///
    /// Existing values are kept: an existing array is extended, an existing
    /// scalar becomes the first element of the list, and a missing entry
    /// starts an empty list. The entry is always an array afterwards.
    pub fn append_all(&mut self, column: &str, values: impl IntoIterator<Item = Value>) {
        let entry = self
            .entries
            .entry(column.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !matches!(entry, Value::Array(_)) {
            let scalar = std::mem::replace(entry, Value::Null);
            *entry = Value::Array(if scalar.is_null() { Vec::new() } else { vec![scalar] });
        }
        if let Value::Array(items) = entry {
            items.extend(values);
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FilterState {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A model able to fetch rows of one table.
pub trait ModelHandle: Send + Sync {
    /// Identity of the model.
    fn identity(&self) -> &TableIdentity;

    /// Whether the model's backing table is connected and usable.
    fn is_available(&self) -> bool;

    /// Fetch a single row. `Ok(None)` means no row matched.
    fn fetch_one(&self, filter: &FilterState) -> Result<Option<Row>>;

    /// Fetch every matching row (possibly none).
    fn fetch_many(&self, filter: &FilterState) -> Result<Vec<Row>>;
}

/// Outcome of looking up a model by identity.
#[derive(Clone)]
pub enum Resolution {
    /// The model exists and is a usable model.
    Found(Arc<dyn ModelHandle>),
    /// No model is registered under the identity.
    NotFound,
    /// Something is registered but cannot act as a model.
    Unavailable(String),
}

impl Resolution {
    /// Return the handle if the model was found.
    pub fn found(self) -> Option<Arc<dyn ModelHandle>> {
        match self {
            Resolution::Found(handle) => Some(handle),
            Resolution::NotFound | Resolution::Unavailable(_) => None,
        }
    }
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Found(handle) => f
                .debug_tuple("Found")
                .field(&handle.identity().to_string())
                .finish(),
            Resolution::NotFound => write!(f, "NotFound"),
            Resolution::Unavailable(reason) => f.debug_tuple("Unavailable").field(reason).finish(),
        }
    }
}

/// Service lookup for models by identity.
pub trait ModelRegistry: Send + Sync {
    /// Resolve an identity to a model handle.
    fn resolve(&self, identity: &TableIdentity) -> Resolution;
}
