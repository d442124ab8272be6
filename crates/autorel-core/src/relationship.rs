//! Relationship metadata.
//!
//! Relationships here are inferred at runtime from the schema rather than
//! declared. A [`RelationshipGraph`] maps association names (pseudo-properties
//! of a record) to immutable [`RelationshipDescriptor`]s. Descriptors are
//! built once by the inference engine and only read afterwards.

use crate::identity::TableIdentity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The type of relationship between two tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipKind {
    /// One-to-one: a post has one author (via `author_id`).
    #[serde(rename = "one_one")]
    OneToOne,
    /// One-to-many: a user has many groups (`user_groups`).
    #[serde(rename = "one_many")]
    OneToMany,
    /// Many-to-many: posts have many categories via `posts_categories`.
    #[serde(rename = "many_many")]
    ManyToMany,
}

impl RelationshipKind {
    /// Whether resolving this kind yields a collection.
    pub const fn is_collection(self) -> bool {
        matches!(self, RelationshipKind::OneToMany | RelationshipKind::ManyToMany)
    }
}

/// Ordered correspondence of target-side column to source-side column.
///
/// For a many-to-many relationship the target side is the join (through)
/// table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyMapping {
    pairs: Vec<(String, String)>,
}

impl KeyMapping {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `target` (foreign key) to `source` (local key).
    ///
    /// A target column appears at most once; re-mapping it replaces the
    /// local key in place.
    #[must_use]
    pub fn with(mut self, target: impl Into<String>, source: impl Into<String>) -> Self {
        let target = target.into();
        let source = source.into();
        if let Some(pair) = self.pairs.iter_mut().find(|(t, _)| *t == target) {
            pair.1 = source;
        } else {
            self.pairs.push((target, source));
        }
        self
    }

    /// Identity mapping over column names (`{id: id}` for a single `id` key).
    pub fn identity<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        columns.into_iter().fold(Self::new(), |keys, column| {
            let column = column.into();
            keys.with(column.clone(), column)
        })
    }

    /// Iterate over `(target, source)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(t, s)| (t.as_str(), s.as_str()))
    }

    /// Number of key pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Check if there are no key pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// One inferred relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDescriptor {
    kind: RelationshipKind,
    model: TableIdentity,
    keys: KeyMapping,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    through: Option<TableIdentity>,
}

impl RelationshipDescriptor {
    /// A one-to-one relationship to `model`.
    pub fn one_to_one(model: TableIdentity, keys: KeyMapping) -> Self {
        Self {
            kind: RelationshipKind::OneToOne,
            model,
            keys,
            through: None,
        }
    }

    /// A one-to-many relationship to `model`.
    pub fn one_to_many(model: TableIdentity, keys: KeyMapping) -> Self {
        Self {
            kind: RelationshipKind::OneToMany,
            model,
            keys,
            through: None,
        }
    }

    /// A many-to-many relationship to `model` via the join model `through`.
    ///
    /// `keys` map join-table columns to columns of the source record.
    pub fn many_to_many(model: TableIdentity, keys: KeyMapping, through: TableIdentity) -> Self {
        Self {
            kind: RelationshipKind::ManyToMany,
            model,
            keys,
            through: Some(through),
        }
    }

    /// Many-to-many descriptor whose key mapping targets `model` directly.
    ///
    /// Resolution skips the join lookup and filters the target with the
    /// record's own values.
    pub fn many_to_many_direct(model: TableIdentity, keys: KeyMapping) -> Self {
        Self {
            kind: RelationshipKind::ManyToMany,
            model,
            keys,
            through: None,
        }
    }

    /// Kind of relationship.
    pub fn kind(&self) -> RelationshipKind {
        self.kind
    }

    /// The related (target) model.
    pub fn model(&self) -> &TableIdentity {
        &self.model
    }

    /// Target column -> source column mapping.
    pub fn keys(&self) -> &KeyMapping {
        &self.keys
    }

    /// The join model, for many-to-many relationships.
    pub fn through(&self) -> Option<&TableIdentity> {
        self.through.as_ref()
    }

    /// Whether the descriptor is usable.
    ///
    /// An incomplete descriptor (no keys, or a join model on anything but a
    /// many-to-many relationship) must be treated as "no relationship".
    pub fn is_complete(&self) -> bool {
        !self.keys.is_empty()
            && (self.through.is_none() || self.kind == RelationshipKind::ManyToMany)
    }
}

/// Mapping of association name to relationship descriptor.
///
/// Names are unique and the first registration of a name wins; see
/// [`claim`](Self::claim).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipGraph {
    associations: BTreeMap<String, RelationshipDescriptor>,
}

impl RelationshipGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `descriptor` under `name` unless the name is already taken.
    ///
    /// Returns `false` (and leaves the graph untouched) if the name was
    /// already claimed.
    pub fn claim(&mut self, name: impl Into<String>, descriptor: RelationshipDescriptor) -> bool {
        match self.associations.entry(name.into()) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(descriptor);
                true
            }
        }
    }

    /// Whether an association of this name exists (complete or not).
    pub fn contains(&self, name: &str) -> bool {
        self.associations.contains_key(name)
    }

    /// The descriptor for `name`, if it exists and is complete.
    pub fn association(&self, name: &str) -> Option<&RelationshipDescriptor> {
        self.associations
            .get(name)
            .filter(|descriptor| descriptor.is_complete())
    }

    /// Merge `other` into this graph; entries of `other` replace entries of
    /// the same name.
    pub fn merge(&mut self, other: RelationshipGraph) {
        self.associations.extend(other.associations);
    }

    /// Iterate over `(name, descriptor)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RelationshipDescriptor)> {
        self.associations.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Association names in name order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.associations.keys().map(String::as_str)
    }

    /// Number of associations.
    pub fn len(&self) -> usize {
        self.associations.len()
    }

    /// Check if there are no associations.
    pub fn is_empty(&self) -> bool {
        self.associations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authors() -> TableIdentity {
        TableIdentity::new("blog", "authors")
    }

    #[test]
    fn test_claim_first_wins() {
        let mut graph = RelationshipGraph::new();
        let first = RelationshipDescriptor::one_to_one(authors(), KeyMapping::new().with("id", "author_id"));
        let second = RelationshipDescriptor::one_to_many(
            TableIdentity::new("blog", "post_author"),
            KeyMapping::identity(["id"]),
        );
        assert!(graph.claim("author", first.clone()));
        assert!(!graph.claim("author", second));
        assert_eq!(graph.association("author"), Some(&first));
    }

    #[test]
    fn test_incomplete_descriptor_is_hidden() {
        let mut graph = RelationshipGraph::new();
        graph.claim("author", RelationshipDescriptor::one_to_one(authors(), KeyMapping::new()));
        assert!(graph.contains("author"));
        assert!(graph.association("author").is_none());
    }

    #[test]
    fn test_key_mapping_identity_and_order() {
        let keys = KeyMapping::identity(["site_id", "id"]);
        let pairs: Vec<_> = keys.iter().collect();
        assert_eq!(pairs, vec![("site_id", "site_id"), ("id", "id")]);
    }

    #[test]
    fn test_kind_serializes_with_short_names() {
        let json = serde_json::to_string(&RelationshipKind::ManyToMany).unwrap();
        assert_eq!(json, "\"many_many\"");
        assert!(RelationshipKind::OneToMany.is_collection());
        assert!(!RelationshipKind::OneToOne.is_collection());
    }

    #[test]
    fn test_merge_replaces_same_name() {
        let mut base = RelationshipGraph::new();
        base.claim("author", RelationshipDescriptor::one_to_one(authors(), KeyMapping::identity(["id"])));
        let mut top = RelationshipGraph::new();
        let replacement = RelationshipDescriptor::one_to_one(
            TableIdentity::new("blog", "people"),
            KeyMapping::new().with("id", "author_id"),
        );
        top.claim("author", replacement.clone());
        base.merge(top);
        assert_eq!(base.association("author"), Some(&replacement));
        assert_eq!(base.len(), 1);
    }
}
