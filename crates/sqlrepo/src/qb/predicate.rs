//! Equality predicates for WHERE clauses.

use crate::error::RepoResult;
use crate::ident::check_ident;
use crate::qb::param::ParamList;
use crate::value::Value;

/// `col1 = v1 AND col2 = v2 ...`
#[derive(Debug, Clone, Default)]
pub(crate) struct Predicate {
    conditions: Vec<(String, Value)>,
}

impl Predicate {
    pub(crate) fn eq(&mut self, column: &str, value: Value) {
        self.conditions.push((column.to_string(), value));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Append ` WHERE ...` to `sql` (nothing when empty).
    pub(crate) fn write(&self, sql: &mut String, params: &mut ParamList) -> RepoResult<()> {
        for (i, (column, value)) in self.conditions.iter().enumerate() {
            check_ident("column", column)?;
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            sql.push_str(column);
            if value.is_null() {
                // `= NULL` never matches; NULL needs IS NULL.
                sql.push_str(" IS NULL");
            } else {
                sql.push_str(" = ");
                params.bind(sql, value.clone());
            }
        }
        Ok(())
    }
}
