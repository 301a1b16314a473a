//! SELECT query builder.

use crate::error::RepoResult;
use crate::ident::check_ident;
use crate::qb::param::ParamList;
use crate::qb::placeholder::Placeholder;
use crate::qb::predicate::Predicate;
use crate::qb::traits::{SqlQb, Statement};
use crate::value::Value;

/// `SELECT * FROM table [WHERE col = value AND ...]`.
///
/// No ordering or limit: rows come back in whatever order the engine returns.
#[derive(Clone, Debug)]
pub struct SelectQb {
    table: String,
    placeholder: Placeholder,
    where_group: Predicate,
}

impl SelectQb {
    /// Create a new SELECT query builder.
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            placeholder: Placeholder::default(),
            where_group: Predicate::default(),
        }
    }

    /// Set the parameter syntax.
    pub fn placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Add WHERE: column = value
    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.where_group.eq(column, value.into());
        self
    }
}

impl SqlQb for SelectQb {
    fn build(&self) -> RepoResult<Statement> {
        check_ident("table", &self.table)?;

        let mut params = ParamList::new(self.placeholder);
        let mut sql = format!("SELECT * FROM {}", self.table);
        self.where_group.write(&mut sql, &mut params)?;
        Ok(Statement::new(sql, params.into_values()))
    }
}
