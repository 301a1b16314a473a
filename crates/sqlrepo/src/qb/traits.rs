//! Trait definitions for query builders.

use crate::error::RepoResult;
use crate::value::Value;
use std::fmt;

/// Base trait for all query builders.
pub trait SqlQb {
    /// Render statement text and its ordered arguments.
    fn build(&self) -> RepoResult<Statement>;

    /// Debug helper to get the SQL string (or the build error).
    fn to_sql(&self) -> String {
        match self.build() {
            Ok(stmt) => stmt.sql,
            Err(e) => format!("<{e}>"),
        }
    }
}

/// The result of building a query: SQL text plus positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: String, params: Vec<Value>) -> Self {
        Self { sql, params }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)?;
        if !self.params.is_empty() {
            f.write_str(" -- [")?;
            for (i, p) in self.params.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{p}")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}
