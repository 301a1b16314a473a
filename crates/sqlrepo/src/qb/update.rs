//! UPDATE query builder.

use crate::error::{RepoError, RepoResult};
use crate::ident::check_ident;
use crate::qb::param::ParamList;
use crate::qb::placeholder::Placeholder;
use crate::qb::predicate::Predicate;
use crate::qb::traits::{SqlQb, Statement};
use crate::value::Value;

/// UPDATE query builder.
///
/// Both a SET clause and a WHERE clause are required; an UPDATE that would
/// touch every row is rejected at build time.
#[derive(Clone, Debug)]
pub struct UpdateQb {
    table: String,
    placeholder: Placeholder,
    set_fields: Vec<(String, Value)>,
    where_group: Predicate,
}

impl UpdateQb {
    /// Create a new UPDATE query builder.
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            placeholder: Placeholder::default(),
            set_fields: Vec::new(),
            where_group: Predicate::default(),
        }
    }

    /// Set the parameter syntax.
    pub fn placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Set a column value.
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.set_fields.push((column.to_string(), value.into()));
        self
    }

    /// Add WHERE: column = value
    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.where_group.eq(column, value.into());
        self
    }
}

impl SqlQb for UpdateQb {
    fn build(&self) -> RepoResult<Statement> {
        check_ident("table", &self.table)?;
        if self.set_fields.is_empty() {
            return Err(RepoError::query_build(format!(
                "UPDATE {} requires at least one SET column",
                self.table
            )));
        }
        if self.where_group.is_empty() {
            return Err(RepoError::query_build(format!(
                "UPDATE {} requires a WHERE condition",
                self.table
            )));
        }

        let mut params = ParamList::new(self.placeholder);
        let mut sql = format!("UPDATE {} SET ", self.table);
        for (i, (column, value)) in self.set_fields.iter().enumerate() {
            check_ident("column", column)?;
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(column);
            sql.push_str(" = ");
            params.bind(&mut sql, value.clone());
        }
        self.where_group.write(&mut sql, &mut params)?;

        Ok(Statement::new(sql, params.into_values()))
    }
}
