//! INSERT query builder.

use crate::error::{RepoError, RepoResult};
use crate::ident::check_ident;
use crate::qb::param::ParamList;
use crate::qb::placeholder::Placeholder;
use crate::qb::traits::{SqlQb, Statement};
use crate::value::Value;

/// INSERT query builder: one value tuple, columns in the order they are set.
#[derive(Clone, Debug)]
pub struct InsertQb {
    table: String,
    placeholder: Placeholder,
    columns: Vec<(String, Value)>,
    default_values: bool,
}

impl InsertQb {
    /// Create a new INSERT query builder.
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            placeholder: Placeholder::default(),
            columns: Vec::new(),
            default_values: false,
        }
    }

    /// Set the parameter syntax.
    pub fn placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Render `INSERT INTO <table> DEFAULT VALUES` instead of failing when
    /// no column is set.
    pub fn or_default_values(mut self) -> Self {
        self.default_values = true;
        self
    }

    /// Set a column value.
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.columns.push((column.to_string(), value.into()));
        self
    }
}

impl SqlQb for InsertQb {
    fn build(&self) -> RepoResult<Statement> {
        check_ident("table", &self.table)?;
        if self.columns.is_empty() {
            if self.default_values {
                let sql = format!("INSERT INTO {} DEFAULT VALUES", self.table);
                return Ok(Statement::new(sql, Vec::new()));
            }
            return Err(RepoError::query_build(format!(
                "INSERT INTO {} requires at least one column",
                self.table
            )));
        }

        let mut params = ParamList::new(self.placeholder);
        let mut names = String::new();
        let mut values = String::new();
        for (i, (column, value)) in self.columns.iter().enumerate() {
            check_ident("column", column)?;
            if self.columns[..i].iter().any(|(c, _)| c == column) {
                return Err(RepoError::query_build(format!(
                    "INSERT INTO {} sets column {column} twice",
                    self.table
                )));
            }
            if i > 0 {
                names.push_str(", ");
                values.push_str(", ");
            }
            names.push_str(column);
            params.bind(&mut values, value.clone());
        }

        let sql = format!("INSERT INTO {} ({names}) VALUES ({values})", self.table);
        Ok(Statement::new(sql, params.into_values()))
    }
}
