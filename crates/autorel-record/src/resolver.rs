//! Relation resolution.
//!
//! Given a relationship descriptor and the values of one record, build the
//! filter state for the target model and fetch the related row or rows.
//! Many-to-many relationships with a join model take two hops: the join
//! rows are fetched first and their `<target>_id` values become an `id`
//! filter on the target.

use std::fmt;
use std::sync::Arc;

use autorel_core::{
    Error, FilterState, Inflector, KeyMapping, ModelHandle, ModelRegistry, RelationshipDescriptor,
    RelationshipKind, Resolution, Row, TableIdentity, Value,
};

/// A resolved association.
#[derive(Debug, Clone, PartialEq)]
pub enum Associated {
    /// One-to-one result; `None` if no row matched.
    One(Option<Row>),
    /// One-to-many or many-to-many result.
    Many(Vec<Row>),
}

impl Associated {
    /// The single related row, for one-to-one results.
    pub fn as_one(&self) -> Option<&Row> {
        match self {
            Associated::One(row) => row.as_ref(),
            Associated::Many(_) => None,
        }
    }

    /// The related rows, for collection results.
    pub fn as_many(&self) -> Option<&[Row]> {
        match self {
            Associated::Many(rows) => Some(rows),
            Associated::One(_) => None,
        }
    }

    /// Whether nothing was found.
    pub fn is_empty(&self) -> bool {
        match self {
            Associated::One(row) => row.is_none(),
            Associated::Many(rows) => rows.is_empty(),
        }
    }

    /// JSON rendering: an object (or null) for one row, an array otherwise.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Associated::One(Some(row)) => row.to_json(),
            Associated::One(None) => serde_json::Value::Null,
            Associated::Many(rows) => serde_json::Value::Array(rows.iter().map(Row::to_json).collect()),
        }
    }
}

/// Why an association could not be resolved.
#[derive(Debug)]
pub enum ResolveError {
    /// The descriptor has no keys or an invalid join model
    Incomplete,
    /// The key mapping produced an empty filter state
    NoKeys,
    /// No model is registered for the identity
    ModelNotFound(TableIdentity),
    /// Something is registered for the identity but cannot act as a model
    ModelUnavailable { model: TableIdentity, reason: String },
    /// A model failed while fetching
    Collaborator(Error),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Incomplete => write!(f, "Incomplete relationship descriptor"),
            ResolveError::NoKeys => write!(f, "Could not build a filter from the record's keys"),
            ResolveError::ModelNotFound(model) => write!(f, "Model not found: {}", model),
            ResolveError::ModelUnavailable { model, reason } => {
                write!(f, "Model {} unavailable: {}", model, reason)
            }
            ResolveError::Collaborator(e) => write!(f, "Fetch failed: {}", e),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::Collaborator(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Error> for ResolveError {
    fn from(err: Error) -> Self {
        ResolveError::Collaborator(err)
    }
}

/// Resolves relationship descriptors against a model registry.
#[derive(Clone)]
pub struct RelationResolver {
    registry: Arc<dyn ModelRegistry>,
    inflector: Arc<dyn Inflector>,
}

impl fmt::Debug for RelationResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationResolver").finish_non_exhaustive()
    }
}

impl RelationResolver {
    /// Create a resolver.
    pub fn new(registry: Arc<dyn ModelRegistry>, inflector: Arc<dyn Inflector>) -> Self {
        Self { registry, inflector }
    }

    /// The inflector used to name join-table columns.
    pub fn inflector(&self) -> &dyn Inflector {
        self.inflector.as_ref()
    }

    /// Resolve `descriptor` for the record `row`.
    ///
    /// `filter` is an optional caller-supplied partial filter state; it is
    /// extended, never replaced.
    #[tracing::instrument(
        level = "debug",
        skip(self, descriptor, row, filter),
        fields(model = %descriptor.model(), kind = ?descriptor.kind())
    )]
    pub fn resolve(
        &self,
        descriptor: &RelationshipDescriptor,
        row: &Row,
        filter: Option<&FilterState>,
    ) -> Result<Associated, ResolveError> {
        if !descriptor.is_complete() {
            return Err(ResolveError::Incomplete);
        }
        let mut state = filter.cloned().unwrap_or_default();

        match descriptor.kind() {
            RelationshipKind::OneToOne => {
                fill_missing(&mut state, &FilterState::new(), descriptor.keys(), row);
                if !descriptor.keys().iter().any(|(target, _)| state.contains_key(target)) {
                    return Err(ResolveError::NoKeys);
                }
                let model = self.model(descriptor.model())?;
                Ok(Associated::One(model.fetch_one(&state)?))
            }
            RelationshipKind::OneToMany => {
                if overwrite(&mut state, descriptor.keys(), row) == 0 {
                    return Err(ResolveError::NoKeys);
                }
                let model = self.model(descriptor.model())?;
                Ok(Associated::Many(model.fetch_many(&state)?))
            }
            RelationshipKind::ManyToMany => {
                let target = self.model(descriptor.model())?;
                match descriptor.through() {
                    Some(through) => self.collect_through_ids(descriptor, through, row, &mut state)?,
                    None => {
                        if overwrite(&mut state, descriptor.keys(), row) == 0 {
                            return Err(ResolveError::NoKeys);
                        }
                    }
                }
                Ok(Associated::Many(target.fetch_many(&state)?))
            }
        }
    }

    /// Fetch the join rows of a many-to-many relationship and append their
    /// target ids to `state["id"]`.
    fn collect_through_ids(
        &self,
        descriptor: &RelationshipDescriptor,
        through: &TableIdentity,
        row: &Row,
        state: &mut FilterState,
    ) -> Result<(), ResolveError> {
        let mut through_state = FilterState::new();
        fill_missing(&mut through_state, state, descriptor.keys(), row);
        if through_state.is_empty() {
            return Err(ResolveError::NoKeys);
        }

        let join_rows = self.model(through)?.fetch_many(&through_state)?;
        let column = format!("{}_id", self.inflector.singularize(descriptor.model().name()));
        let ids: Vec<Value> = join_rows
            .iter()
            .filter_map(|join_row| join_row.get_by_name(&column))
            .filter(|id| !id.is_null())
            .cloned()
            .collect();
        tracing::trace!(through = %through, column = %column, ids = ids.len(), "Collected join ids");

        state.append_all("id", ids);
        Ok(())
    }

    fn model(&self, identity: &TableIdentity) -> Result<Arc<dyn ModelHandle>, ResolveError> {
        match self.registry.resolve(identity) {
            Resolution::Found(handle) => Ok(handle),
            Resolution::NotFound => Err(ResolveError::ModelNotFound(identity.clone())),
            Resolution::Unavailable(reason) => Err(ResolveError::ModelUnavailable {
                model: identity.clone(),
                reason,
            }),
        }
    }
}

/// Copy non-null record values into `state` for keys that neither `state`
/// nor `existing` constrain yet.
fn fill_missing(state: &mut FilterState, existing: &FilterState, keys: &KeyMapping, row: &Row) {
    for (target, source) in keys.iter() {
        if state.contains_key(target) || existing.contains_key(target) {
            continue;
        }
        if let Some(value) = row.get_by_name(source).filter(|v| !v.is_null()) {
            state.insert(target, value.clone());
        }
    }
}

/// Copy record values into `state`, replacing anything already there.
///
/// Returns how many of the copied values are non-null; caller filter entries
/// never count.
fn overwrite(state: &mut FilterState, keys: &KeyMapping, row: &Row) -> usize {
    let mut usable = 0;
    for (target, source) in keys.iter() {
        if let Some(value) = row.get_by_name(source) {
            if !value.is_null() {
                usable += 1;
            }
            state.insert(target, value.clone());
        }
    }
    usable
}
