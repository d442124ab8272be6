//! Active-record style access to associations.
//!
//! A [`Record`] wraps one fetched row together with the relationship graph
//! of its table. Names that are not columns of the row are looked up in the
//! graph and resolved lazily:
//!
//! - [`Record::get`] resolves any association with no filter and memoizes
//!   the result for the life of the record.
//! - [`Record::call`] is the method-shaped form. It only dispatches plural
//!   names of collection associations, takes an optional filter, and only
//!   memoizes unfiltered results.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use autorel_core::{FilterState, RelationshipDescriptor, RelationshipGraph, Row, Value, explode};

use crate::resolver::{Associated, RelationResolver};

/// Association lookup and resolution capability of a record.
pub trait AssociationAware {
    /// Whether the record has an association of this name.
    fn has_association(&self, name: &str) -> bool;

    /// The descriptor of a complete association.
    fn get_association(&self, name: &str) -> Option<&RelationshipDescriptor>;

    /// Resolve an association.
    ///
    /// Any failure (unknown name, unresolvable model, failed fetch) yields
    /// `None`.
    fn get_associated(&mut self, name: &str, filter: Option<&FilterState>) -> Option<Associated>;
}

/// Result of [`Record::get`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Attribute<'a> {
    /// A stored column value (possibly NULL).
    Column(&'a Value),
    /// A resolved association.
    Associated(&'a Associated),
}

/// Result of [`Record::call`].
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// The call named a collection association. `None` if it resolved to nothing.
    Handled(Option<Associated>),
    /// The call is not an association call; the caller handles it.
    Unhandled,
}

/// A row plus lazily resolved associations.
#[derive(Debug)]
pub struct Record {
    row: Row,
    graph: Arc<RelationshipGraph>,
    resolver: RelationResolver,
    resolved: BTreeMap<String, Associated>,
    declared_methods: HashSet<String>,
}

impl Record {
    /// Wrap a row with the relationship graph of its table.
    pub fn new(row: Row, graph: Arc<RelationshipGraph>, resolver: RelationResolver) -> Self {
        Self {
            row,
            graph,
            resolver,
            resolved: BTreeMap::new(),
            declared_methods: HashSet::new(),
        }
    }

    /// Method names declared by the surrounding record type.
    ///
    /// [`call`](Self::call) never dispatches these.
    pub fn with_declared_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declared_methods.extend(methods.into_iter().map(Into::into));
        self
    }

    /// The stored row.
    pub fn row(&self) -> &Row {
        &self.row
    }

    /// The relationship graph this record resolves against.
    pub fn graph(&self) -> &Arc<RelationshipGraph> {
        &self.graph
    }

    /// Consume the record, returning its row.
    pub fn into_row(self) -> Row {
        self.row
    }

    /// Whether an association result is memoized.
    pub fn is_resolved(&self, name: &str) -> bool {
        self.resolved.contains_key(name)
    }

    /// Attribute read.
    ///
    /// Stored columns win over associations. An association is resolved
    /// without a filter on first read and memoized; `None` means the name is
    /// neither a column nor a resolvable association.
    pub fn get(&mut self, name: &str) -> Option<Attribute<'_>> {
        if self.row.contains_column(name) {
            return self.row.get_by_name(name).map(Attribute::Column);
        }
        if !self.resolved.contains_key(name) {
            let associated = self.resolve(name, None)?;
            self.resolved.insert(name.to_string(), associated);
        }
        self.resolved.get(name).map(Attribute::Associated)
    }

    /// Method-shaped access: `record.categories(filter)`.
    ///
    /// Only plural names of one-to-many and many-to-many associations are
    /// dispatched. Names starting with the `is` word and declared methods are
    /// never dispatched.
    pub fn call(&mut self, method: &str, filter: Option<&FilterState>) -> Dispatch {
        if explode(method).first().is_some_and(|word| word == "is")
            || self.declared_methods.contains(method)
            || !self.resolver.inflector().is_plural(method)
        {
            return Dispatch::Unhandled;
        }
        let is_collection = self
            .graph
            .association(method)
            .is_some_and(|descriptor| descriptor.kind().is_collection());
        if !is_collection {
            return Dispatch::Unhandled;
        }
        Dispatch::Handled(self.get_associated(method, filter))
    }

    /// Every memoized association as a JSON object.
    pub fn associations_data(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.resolved
                .iter()
                .map(|(name, associated)| (name.clone(), associated.to_json()))
                .collect(),
        )
    }

    /// The record's columns as a JSON object, optionally including memoized
    /// associations.
    pub fn data(&self, include_associations: bool) -> serde_json::Value {
        let mut data = self.row.to_json();
        if include_associations {
            if let (serde_json::Value::Object(columns), serde_json::Value::Object(associations)) =
                (&mut data, self.associations_data())
            {
                columns.extend(associations);
            }
        }
        data
    }

    fn resolve(&self, name: &str, filter: Option<&FilterState>) -> Option<Associated> {
        let descriptor = self.graph.association(name)?;
        match self.resolver.resolve(descriptor, &self.row, filter) {
            Ok(associated) => Some(associated),
            Err(e) => {
                tracing::warn!(association = name, error = %e, "Association resolved to nothing");
                None
            }
        }
    }
}

impl AssociationAware for Record {
    fn has_association(&self, name: &str) -> bool {
        self.graph.association(name).is_some()
    }

    fn get_association(&self, name: &str) -> Option<&RelationshipDescriptor> {
        self.graph.association(name)
    }

    fn get_associated(&mut self, name: &str, filter: Option<&FilterState>) -> Option<Associated> {
        let filter = filter.filter(|state| !state.is_empty());
        if filter.is_none() {
            if let Some(cached) = self.resolved.get(name) {
                return Some(cached.clone());
            }
        }

        let associated = self.resolve(name, filter)?;
        if filter.is_none() {
            self.resolved.insert(name.to_string(), associated.clone());
        }
        Some(associated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autorel_core::{
        EnglishInflector, KeyMapping, ModelHandle, ModelRegistry, Resolution, Result, TableIdentity,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Every model returns one row per fetch echoing the filter it got.
    struct EchoModel {
        identity: TableIdentity,
        fetches: AtomicUsize,
    }

    impl ModelHandle for EchoModel {
        fn identity(&self) -> &TableIdentity {
            &self.identity
        }

        fn is_available(&self) -> bool {
            true
        }

        fn fetch_one(&self, filter: &FilterState) -> Result<Option<Row>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(Some(Row::from_pairs(
                filter.iter().map(|(k, v)| (k.to_string(), v.clone())),
            )))
        }

        fn fetch_many(&self, filter: &FilterState) -> Result<Vec<Row>> {
            Ok(self.fetch_one(filter)?.into_iter().collect())
        }
    }

    struct EchoRegistry {
        model: Arc<EchoModel>,
    }

    impl ModelRegistry for EchoRegistry {
        fn resolve(&self, identity: &TableIdentity) -> Resolution {
            if identity.name() == "missing" {
                return Resolution::NotFound;
            }
            Resolution::Found(Arc::clone(&self.model) as Arc<dyn ModelHandle>)
        }
    }

    fn blog(name: &str) -> TableIdentity {
        TableIdentity::new("blog", name)
    }

    fn graph() -> Arc<RelationshipGraph> {
        let mut graph = RelationshipGraph::new();
        graph.claim(
            "author",
            RelationshipDescriptor::one_to_one(blog("authors"), KeyMapping::new().with("id", "author_id")),
        );
        graph.claim(
            "comments",
            RelationshipDescriptor::one_to_many(blog("post_comments"), KeyMapping::new().with("post_id", "id")),
        );
        graph.claim(
            "issues",
            RelationshipDescriptor::one_to_many(blog("post_issues"), KeyMapping::new().with("post_id", "id")),
        );
        graph.claim(
            "is_drafts",
            RelationshipDescriptor::one_to_many(blog("post_drafts"), KeyMapping::new().with("post_id", "id")),
        );
        graph.claim(
            "ghosts",
            RelationshipDescriptor::one_to_many(blog("missing"), KeyMapping::new().with("post_id", "id")),
        );
        graph.claim("broken", RelationshipDescriptor::one_to_many(blog("broken"), KeyMapping::new()));
        Arc::new(graph)
    }

    fn record() -> (Record, Arc<EchoModel>) {
        let model = Arc::new(EchoModel {
            identity: blog("any"),
            fetches: AtomicUsize::new(0),
        });
        let registry = Arc::new(EchoRegistry { model: Arc::clone(&model) });
        let resolver = RelationResolver::new(registry, Arc::new(EnglishInflector::new()));
        let row = Row::from_pairs([
            ("id", Value::BigInt(1)),
            ("author_id", Value::BigInt(9)),
            ("title", Value::from("Hello")),
            ("summary", Value::Null),
        ]);
        (Record::new(row, graph(), resolver), model)
    }

    fn fetches(model: &EchoModel) -> usize {
        model.fetches.load(Ordering::SeqCst)
    }

    #[test]
    fn test_columns_win_over_associations() {
        let (mut record, model) = record();
        assert_eq!(record.get("title"), Some(Attribute::Column(&Value::from("Hello"))));
        assert_eq!(record.get("summary"), Some(Attribute::Column(&Value::Null)));
        assert_eq!(fetches(&model), 0);
    }

    #[test]
    fn test_attribute_read_resolves_once() {
        let (mut record, model) = record();
        let expected = Associated::One(Some(Row::from_pairs([("id", Value::BigInt(9))])));

        assert_eq!(record.get("author"), Some(Attribute::Associated(&expected)));
        assert!(record.is_resolved("author"));
        assert_eq!(record.get("author"), Some(Attribute::Associated(&expected)));
        assert_eq!(fetches(&model), 1);
    }

    #[test]
    fn test_unknown_names() {
        let (mut record, _) = record();
        assert_eq!(record.get("nonsense"), None);
        assert_eq!(record.get("broken"), None);
        assert!(!record.has_association("broken"));
        assert!(record.get_association("broken").is_none());
        assert!(record.has_association("comments"));
    }

    #[test]
    fn test_filtered_call_requeries_and_keeps_cache() {
        let (mut record, model) = record();
        let unfiltered = record.get_associated("comments", None).unwrap();
        assert_eq!(fetches(&model), 1);

        let filter = FilterState::new().with("published", true);
        let filtered = record.get_associated("comments", Some(&filter)).unwrap();
        assert_eq!(fetches(&model), 2);
        assert_ne!(filtered, unfiltered);

        assert_eq!(record.get("comments"), Some(Attribute::Associated(&unfiltered)));
        assert_eq!(fetches(&model), 2);
    }

    #[test]
    fn test_empty_filter_counts_as_no_filter() {
        let (mut record, model) = record();
        record.get_associated("comments", Some(&FilterState::new()));
        assert!(record.is_resolved("comments"));
        record.get_associated("comments", None);
        assert_eq!(fetches(&model), 1);
    }

    #[test]
    fn test_unresolvable_model_degrades_to_none() {
        let (mut record, _) = record();
        assert_eq!(record.get_associated("ghosts", None), None);
        assert!(!record.is_resolved("ghosts"));
        assert_eq!(record.call("ghosts", None), Dispatch::Handled(None));
    }

    #[test]
    fn test_call_dispatches_plural_collections_only() {
        let (mut record, _) = record();
        let filter = FilterState::new().with("published", true);
        assert!(matches!(
            record.call("comments", Some(&filter)),
            Dispatch::Handled(Some(Associated::Many(_)))
        ));
        assert!(!record.is_resolved("comments"));

        // One-to-one associations are attribute-only.
        assert_eq!(record.call("author", None), Dispatch::Unhandled);
        assert_eq!(record.call("authors", None), Dispatch::Unhandled);
        assert_eq!(record.call("is_drafts", None), Dispatch::Unhandled);
        assert_eq!(record.call("isConnected", None), Dispatch::Unhandled);
        assert!(matches!(record.call("issues", None), Dispatch::Handled(Some(_))));
    }

    #[test]
    fn test_declared_methods_are_not_shadowed() {
        let (record, _) = record();
        let mut record = record.with_declared_methods(["comments"]);
        assert_eq!(record.call("comments", None), Dispatch::Unhandled);
        assert!(record.get("comments").is_some());
    }

    #[test]
    fn test_data_export() {
        let (mut record, _) = record();
        assert_eq!(record.associations_data(), serde_json::json!({}));
        record.get("author");

        assert_eq!(record.associations_data(), serde_json::json!({"author": {"id": 9}}));
        let data = record.data(true);
        assert_eq!(data["title"], "Hello");
        assert_eq!(data["author"]["id"], 9);
        assert!(record.data(false).get("author").is_none());
    }
}
