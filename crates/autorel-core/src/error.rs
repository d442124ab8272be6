//! Error types for association inference and resolution.

use std::fmt;

/// The primary error type for collaborator calls made by the association layer.
///
/// None of these errors escape the association layer's outward API: inference
/// and resolution degrade them to "no association" / "no result". They are
/// surfaced on the lower-level entry points so callers and tests can tell the
/// failure modes apart.
#[derive(Debug)]
pub enum Error {
    /// Schema catalog errors (listing tables, reading columns)
    Catalog(CatalogError),
    /// Query errors raised by a model handle while fetching rows
    Query(QueryError),
    /// Configuration errors
    Config(ConfigError),
    /// Custom error with message
    Custom(String),
}

#[derive(Debug)]
pub struct CatalogError {
    pub kind: CatalogErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogErrorKind {
    /// The named table does not exist
    TableNotFound,
}

#[derive(Debug)]
pub struct QueryError {
    pub kind: QueryErrorKind,
    /// The model the query was issued against, if known
    pub model: Option<String>,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// A filter key does not name a state/column of the model
    UnknownFilter,
    /// The backing store rejected the query
    Database,
}

#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a catalog error without an underlying source.
    pub fn catalog(kind: CatalogErrorKind, message: impl Into<String>) -> Self {
        Error::Catalog(CatalogError {
            kind,
            message: message.into(),
            source: None,
        })
    }

    /// Create a query error for the given model.
    pub fn query(kind: QueryErrorKind, model: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Query(QueryError {
            kind,
            model: Some(model.into()),
            message: message.into(),
            source: None,
        })
    }

    /// Is this a missing-table error from the catalog?
    pub fn is_table_not_found(&self) -> bool {
        matches!(self, Error::Catalog(c) if c.kind == CatalogErrorKind::TableNotFound)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Catalog(e) => write!(f, "Catalog error: {}", e.message),
            Error::Query(e) => {
                if let Some(model) = &e.model {
                    write!(f, "Query error on '{}': {}", model, e.message)
                } else {
                    write!(f, "Query error: {}", e.message)
                }
            }
            Error::Config(e) => write!(f, "Configuration error: {}", e.message),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Catalog(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Query(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Config(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<CatalogError> for Error {
    fn from(err: CatalogError) -> Self {
        Error::Catalog(err)
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        Error::Query(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

/// Result type alias for association-layer operations.
pub type Result<T> = std::result::Result<T, Error>;
