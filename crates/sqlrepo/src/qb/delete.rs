//! DELETE query builder.

use crate::error::{RepoError, RepoResult};
use crate::ident::check_ident;
use crate::qb::param::ParamList;
use crate::qb::placeholder::Placeholder;
use crate::qb::predicate::Predicate;
use crate::qb::traits::{SqlQb, Statement};
use crate::value::Value;

/// DELETE query builder. A WHERE condition is mandatory.
#[derive(Clone, Debug)]
pub struct DeleteQb {
    table: String,
    placeholder: Placeholder,
    where_group: Predicate,
}

impl DeleteQb {
    /// Create a new DELETE query builder.
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

impl SqlQb for DeleteQb {
    fn build(&self) -> RepoResult<Statement> {
        check_ident("table", &self.table)?;
        if self.where_group.is_empty() {
            return Err(RepoError::query_build(format!(
                "DELETE FROM {} requires a WHERE condition",
                self.table
            )));
        }

        let mut params = ParamList::new(self.placeholder);
        let mut sql = format!("DELETE FROM {}", self.table);
        self.where_group.write(&mut sql, &mut params)?;
        Ok(Statement::new(sql, params.into_values()))
    }
}
