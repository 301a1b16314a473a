//! The record contract: what a type must describe about itself to be managed
//! by a [`Repository`](crate::Repository).

use crate::row::FromRow;
use crate::value::Value;
use std::collections::HashMap;

/// Column → value snapshot of one record, taken at call time.
///
/// Insertion order is irrelevant; statements order their columns from
/// [`Record::COLUMNS`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    values: HashMap<String, Value>,
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: HashMap::with_capacity(capacity),
        }
    }

    /// Set a column value, replacing any previous value for that column.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(column.into(), value.into());
    }

    /// Builder-style [`Projection::insert`].
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Remove and return a column's value.
    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.values.remove(column)
    }

    /// Remove every entry whose column equals `column` ignoring ASCII case.
    ///
    /// Unquoted SQL identifiers are case-insensitive, so `"ID"` and `"id"` name
    /// the same column. Returns the number of removed entries.
    pub fn remove_ignore_case(&mut self, column: &str) -> usize {
        let before = self.values.len();
        self.values.retain(|k, _| !k.eq_ignore_ascii_case(column));
        before - self.values.len()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Projection {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut projection = Projection::new();
        for (k, v) in iter {
            projection.insert(k, v);
        }
        projection
    }
}

/// A type that maps onto one row of one table.
///
/// Metadata is static: a repository never materializes a record just to learn
/// its table or key column. This trait is typically derived with
/// `#[derive(Record)]`.
///
/// # Preconditions
///
/// - [`Record::PRIMARY_KEY`] is one of [`Record::COLUMNS`].
/// - [`Record::projection`] yields exactly the columns in [`Record::COLUMNS`].
///
/// Statement construction checks both and fails with
/// [`RepoError::QueryBuild`](crate::RepoError::QueryBuild) when they do not hold.
///
/// # Example
///
/// ```ignore
/// use sqlrepo::{FromRow, Record};
///
/// #[derive(Debug, FromRow, Record)]
/// #[record(table = "persons")]
/// struct Person {
///     #[record(id)]
///     id: i64,
///     name: String,
/// }
/// ```
pub trait Record: FromRow + Send + Sync {
    /// Table name.
    const TABLE: &'static str;

    /// Columns in declaration order. INSERT statements use this order.
    const COLUMNS: &'static [&'static str];

    /// Primary key column.
    const PRIMARY_KEY: &'static str;

    /// Snapshot of the record's field values keyed by column.
    fn projection(&self) -> Projection;

    /// Primary key column and this record's key value.
    fn primary_key(&self) -> (&'static str, Value) {
        let value = self
            .projection()
            .remove(Self::PRIMARY_KEY)
            .unwrap_or(Value::Null);
        (Self::PRIMARY_KEY, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepoResult;
    use crate::row::Row;

    struct Tag {
        id: i32,
        label: String,
    }

    impl FromRow for Tag {
        fn from_row(row: &Row) -> RepoResult<Self> {
            Ok(Self {
                id: row.try_get_column("id")?,
                label: row.try_get_column("label")?,
            })
        }
    }

    impl Record for Tag {
        const TABLE: &'static str = "tags";
        const COLUMNS: &'static [&'static str] = &["id", "label"];
        const PRIMARY_KEY: &'static str = "id";

        fn projection(&self) -> Projection {
            Projection::with_capacity(2)
                .set("id", self.id)
                .set("label", self.label.clone())
        }
    }

    #[test]
    fn default_primary_key_reads_projection() {
        let tag = Tag {
            id: 9,
            label: "rust".into(),
        };
        assert_eq!(tag.primary_key(), ("id", Value::Int(9)));
    }

    #[test]
    fn remove_ignore_case_drops_aliases() {
        let mut p: Projection = [("ID", Value::Int(1)), ("name", Value::from("x"))]
            .into_iter()
            .collect();
        assert_eq!(p.remove_ignore_case("id"), 1);
        assert!(!p.contains("ID"));
        assert_eq!(p.len(), 1);
    }
}
