//! Row mapping traits and utilities

use crate::error::{RepoError, RepoResult};
use crate::value::{FromValue, Value};
use std::sync::Arc;

/// A decoded result row: column names plus one [`Value`] per column.
///
/// Column names are shared between all rows of one result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    /// Build a row. `values` must line up with `columns`.
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw value of a column, matched case-insensitively.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.position(column).map(|idx| &self.values[idx])
    }

    /// Try to get a column value, returning [`RepoError::Decode`] on failure.
    ///
    /// A column missing from the result set and a value of the wrong type are
    /// both decode errors.
    pub fn try_get_column<T: FromValue>(&self, column: &str) -> RepoResult<T> {
        let value = self
            .get(column)
            .cloned()
            .ok_or_else(|| RepoError::decode(column, "column not present in result set"))?;
        T::from_value(value).map_err(|e| RepoError::decode(column, e.to_string()))
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .or_else(|| self.columns.iter().position(|c| c.eq_ignore_ascii_case(column)))
    }
}

/// Trait for converting a database row into a Rust struct.
///
/// This trait should typically be derived using `#[derive(FromRow)]`
/// from the `sqlrepo-derive` crate.
///
/// # Example
///
/// ```ignore
/// use sqlrepo::FromRow;
///
/// #[derive(FromRow)]
/// struct Person {
///     id: i64,
///     #[record(column = "full_name")]
///     name: String,
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a database row into Self
    fn from_row(row: &Row) -> RepoResult<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> RepoResult<Self> {
        Ok(row.clone())
    }
}
