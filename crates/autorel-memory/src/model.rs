//! In-memory model handle.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use autorel_core::{Error, FilterState, ModelHandle, QueryErrorKind, Result, Row, TableIdentity, Value};

use crate::database::{FetchLog, MemoryTable};

/// A model over one in-memory table.
///
/// Filters compare with [`Value::loosely_eq`]; an array filter value means
/// "any of". Filtering on a column the table doesn't have is an error.
#[derive(Debug)]
pub struct MemoryModel {
    identity: TableIdentity,
    table: Arc<MemoryTable>,
    log: FetchLog,
}

impl MemoryModel {
    pub(crate) fn new(identity: TableIdentity, table: Arc<MemoryTable>, log: FetchLog) -> Self {
        Self { identity, table, log }
    }

    fn matching(&self, filter: &FilterState) -> Result<Vec<Row>> {
        self.log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((self.identity.clone(), filter.clone()));

        if let Some((column, _)) = filter
            .iter()
            .find(|(column, _)| !self.table.columns.iter().any(|c| c.name == *column))
        {
            return Err(Error::query(
                QueryErrorKind::UnknownFilter,
                self.identity.to_string(),
                format!("unknown filter column '{column}'"),
            ));
        }

        let rows = self.table.rows.read().unwrap_or_else(|e| e.into_inner());
        Ok(rows
            .iter()
            .filter(|row| filter.iter().all(|(column, wanted)| value_matches(row.get_by_name(column), wanted)))
            .cloned()
            .collect())
    }
}

fn value_matches(actual: Option<&Value>, wanted: &Value) -> bool {
    let Some(actual) = actual else {
        return false;
    };
    match wanted {
        Value::Array(options) => options.iter().any(|option| actual.loosely_eq(option)),
        scalar => actual.loosely_eq(scalar),
    }
}

impl ModelHandle for MemoryModel {
    fn identity(&self) -> &TableIdentity {
        &self.identity
    }

    fn is_available(&self) -> bool {
        self.table.available.load(Ordering::SeqCst)
    }

    fn fetch_one(&self, filter: &FilterState) -> Result<Option<Row>> {
        Ok(self.matching(filter)?.into_iter().next())
    }

    fn fetch_many(&self, filter: &FilterState) -> Result<Vec<Row>> {
        self.matching(filter)
    }
}

#[cfg(test)]
mod tests {
    use crate::MemoryDatabase;
    use autorel_core::{ColumnDescriptor, FilterState, ModelHandle, ModelRegistry, Row, TableIdentity, Value};

    fn comments() -> MemoryDatabase {
        let db = MemoryDatabase::new();
        db.create_table(
            "blog_comments",
            vec![
                ColumnDescriptor::primary("id"),
                ColumnDescriptor::new("post_id"),
                ColumnDescriptor::new("body"),
            ],
        );
        for (id, post_id) in [(1_i64, 1_i64), (2, 1), (3, 2)] {
            db.insert(
                "blog_comments",
                Row::from_pairs([
                    ("id", Value::BigInt(id)),
                    ("post_id", Value::BigInt(post_id)),
                    ("body", Value::from(format!("comment {id}"))),
                ]),
            )
            .unwrap();
        }
        db
    }

    fn ids(rows: &[Row]) -> Vec<i64> {
        rows.iter()
            .filter_map(|row| row.get_by_name("id").and_then(Value::as_i64))
            .collect()
    }

    #[test]
    fn test_equality_filter() {
        let db = comments();
        let model = db.resolve(&TableIdentity::new("blog", "comments")).found().unwrap();
        let rows = model.fetch_many(&FilterState::new().with("post_id", 1_i64)).unwrap();
        assert_eq!(ids(&rows), vec![1, 2]);
    }

    #[test]
    fn test_in_filter_and_loose_integers() {
        let db = comments();
        let model = db.resolve(&TableIdentity::new("blog", "comments")).found().unwrap();
        let rows = model
            .fetch_many(&FilterState::new().with("id", vec![Value::Int(1), Value::from("3")]))
            .unwrap();
        assert_eq!(ids(&rows), vec![1, 3]);

        let none = model.fetch_many(&FilterState::new().with("id", Vec::<i64>::new())).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_fetch_one_takes_first_match() {
        let db = comments();
        let model = db.resolve(&TableIdentity::new("blog", "comments")).found().unwrap();
        let row = model.fetch_one(&FilterState::new().with("post_id", 1_i64)).unwrap().unwrap();
        assert_eq!(row.get_by_name("id"), Some(&Value::BigInt(1)));
        assert!(model.fetch_one(&FilterState::new().with("post_id", 9_i64)).unwrap().is_none());
    }

    #[test]
    fn test_unknown_filter_column_is_an_error() {
        let db = comments();
        let model = db.resolve(&TableIdentity::new("blog", "comments")).found().unwrap();
        let err = model.fetch_many(&FilterState::new().with("published", true)).unwrap_err();
        assert!(err.to_string().contains("published"));
    }
}
