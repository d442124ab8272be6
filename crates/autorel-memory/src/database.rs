//! In-memory schema catalog and model registry.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use autorel_core::{
    CatalogErrorKind, ColumnDescriptor, Error, FilterState, ModelRegistry, Resolution, Result, Row,
    SchemaCatalog, TableIdentity, strip_table_prefix,
};

use crate::model::MemoryModel;

/// Shared record of every fetch issued through the database's models.
pub(crate) type FetchLog = Arc<Mutex<Vec<(TableIdentity, FilterState)>>>;

/// One stored table.
#[derive(Debug)]
pub(crate) struct MemoryTable {
    pub(crate) columns: Vec<ColumnDescriptor>,
    pub(crate) rows: RwLock<Vec<Row>>,
    pub(crate) available: AtomicBool,
    pub(crate) not_a_model: RwLock<Option<String>>,
}

#[derive(Debug, Default)]
struct Counters {
    list_tables: AtomicUsize,
    columns_of: AtomicUsize,
    resolve: AtomicUsize,
}

/// An in-memory database: tables, their columns and rows.
///
/// Tables are stored under their raw name, `table_prefix` included, and are
/// listed in creation order. Every table is also a model reachable through
/// [`ModelRegistry`].
///
/// ```
/// use autorel_core::{ColumnDescriptor, SchemaCatalog};
/// use autorel_memory::MemoryDatabase;
///
/// let db = MemoryDatabase::new().with_table_prefix("jos_");
/// db.create_table("blog_posts", vec![ColumnDescriptor::primary("id")]);
/// assert_eq!(db.raw_table_names(), vec!["jos_blog_posts"]);
/// assert_eq!(db.list_tables().unwrap(), vec!["blog_posts"]);
/// ```
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    table_prefix: String,
    tables: RwLock<Vec<(String, Arc<MemoryTable>)>>,
    counters: Counters,
    fetch_log: FetchLog,
}

impl MemoryDatabase {
    /// Create an empty database with no table prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the raw table-name prefix.
    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    /// The raw table-name prefix.
    pub fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    /// Create (or replace) a table. `name` is given without the raw prefix.
    pub fn create_table(&self, name: &str, columns: Vec<ColumnDescriptor>) {
        let raw = format!("{}{}", self.table_prefix, name);
        let table = Arc::new(MemoryTable {
            columns,
            rows: RwLock::new(Vec::new()),
            available: AtomicBool::new(true),
            not_a_model: RwLock::new(None),
        });

        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        if let Some(slot) = tables.iter().position(|(existing, _)| *existing == raw) {
            tables[slot].1 = table;
        } else {
            tables.push((raw, table));
        }
    }

    /// Register a table that lives outside this package's prefix, by its
    /// full raw name.
    pub fn create_raw_table(&self, raw_name: &str, columns: Vec<ColumnDescriptor>) {
        let table = Arc::new(MemoryTable {
            columns,
            rows: RwLock::new(Vec::new()),
            available: AtomicBool::new(true),
            not_a_model: RwLock::new(None),
        });
        self.tables
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push((raw_name.to_string(), table));
    }

    /// Append a row to a table.
    pub fn insert(&self, name: &str, row: Row) -> Result<()> {
        let table = self.table(name)?;
        table.rows.write().unwrap_or_else(|e| e.into_inner()).push(row);
        Ok(())
    }

    /// Make a table's model report itself (un)available.
    pub fn set_available(&self, name: &str, available: bool) -> Result<()> {
        self.table(name)?.available.store(available, Ordering::SeqCst);
        Ok(())
    }

    /// Make the registry refuse to treat a table as a model.
    pub fn mark_not_a_model(&self, name: &str, reason: impl Into<String>) -> Result<()> {
        let table = self.table(name)?;
        *table.not_a_model.write().unwrap_or_else(|e| e.into_inner()) = Some(reason.into());
        Ok(())
    }

    /// Every raw table name in creation order.
    pub fn raw_table_names(&self) -> Vec<String> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        tables.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Number of `list_tables` calls so far.
    pub fn list_tables_calls(&self) -> usize {
        self.counters.list_tables.load(Ordering::SeqCst)
    }

    /// Number of `columns_of` calls so far.
    pub fn columns_of_calls(&self) -> usize {
        self.counters.columns_of.load(Ordering::SeqCst)
    }

    /// Number of `resolve` calls so far.
    pub fn resolve_calls(&self) -> usize {
        self.counters.resolve.load(Ordering::SeqCst)
    }

    /// Every fetch issued through this database's models, in order.
    pub fn fetch_log(&self) -> Vec<(TableIdentity, FilterState)> {
        self.fetch_log.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// The filters of every fetch issued against one model.
    pub fn fetches_of(&self, identity: &TableIdentity) -> Vec<FilterState> {
        self.fetch_log()
            .into_iter()
            .filter(|(model, _)| model == identity)
            .map(|(_, filter)| filter)
            .collect()
    }

    fn table(&self, name: &str) -> Result<Arc<MemoryTable>> {
        let raw = format!("{}{}", self.table_prefix, name);
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        tables
            .iter()
            .find(|(existing, _)| *existing == raw)
            .map(|(_, table)| Arc::clone(table))
            .ok_or_else(|| Error::catalog(CatalogErrorKind::TableNotFound, format!("no such table: {raw}")))
    }
}

impl SchemaCatalog for MemoryDatabase {
    fn list_tables(&self) -> Result<Vec<String>> {
        self.counters.list_tables.fetch_add(1, Ordering::SeqCst);
        Ok(strip_table_prefix(self.raw_table_names(), &self.table_prefix))
    }

    fn columns_of(&self, table: &TableIdentity) -> Result<Vec<ColumnDescriptor>> {
        self.counters.columns_of.fetch_add(1, Ordering::SeqCst);
        Ok(self.table(&table.table_name())?.columns.clone())
    }
}

impl ModelRegistry for MemoryDatabase {
    fn resolve(&self, identity: &TableIdentity) -> Resolution {
        self.counters.resolve.fetch_add(1, Ordering::SeqCst);
        let Ok(table) = self.table(&identity.table_name()) else {
            return Resolution::NotFound;
        };
        if let Some(reason) = table
            .not_a_model
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
        {
            return Resolution::Unavailable(reason);
        }
        Resolution::Found(Arc::new(MemoryModel::new(
            identity.clone(),
            table,
            Arc::clone(&self.fetch_log),
        )))
    }
}
