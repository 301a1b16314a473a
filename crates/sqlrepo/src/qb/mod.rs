//! Statement builders for the four CRUD verbs.
//!
//! Each builder renders SQL text plus an ordered argument list for one
//! [`Placeholder`] style. Parameter indices are computed while rendering, never
//! by rewriting finished SQL. Table and column names are validated as SQL
//! identifiers; a malformed builder fails with
//! [`RepoError::QueryBuild`](crate::RepoError::QueryBuild) instead of producing
//! SQL.
//!
//! # Usage
//!
//! ```ignore
//! use sqlrepo::qb::{self, Placeholder, SqlQb};
//!
//! let stmt = qb::update("persons")
//!     .placeholder(Placeholder::Dollar)
//!     .set("name", "foo")
//!     .eq("id", 1_i64)
//!     .build()?;
//! assert_eq!(stmt.sql, "UPDATE persons SET name = $1 WHERE id = $2");
//! ```

mod delete;
mod insert;
mod param;
mod placeholder;
mod predicate;
mod select;
mod traits;
mod update;

pub use delete::DeleteQb;
pub use insert::InsertQb;
pub use placeholder::{ParsePlaceholderError, Placeholder};
pub use select::SelectQb;
pub use traits::{SqlQb, Statement};
pub use update::UpdateQb;

/// Create a SELECT query builder for the given table.
pub fn select(table: &str) -> SelectQb {
    SelectQb::new(table)
}

/// Create an INSERT query builder for the given table.
pub fn insert(table: &str) -> InsertQb {
    InsertQb::new(table)
}

/// Create an UPDATE query builder for the given table.
pub fn update(table: &str) -> UpdateQb {
    UpdateQb::new(table)
}

/// Create a DELETE query builder for the given table.
pub fn delete(table: &str) -> DeleteQb {
    DeleteQb::new(table)
}

#[cfg(test)]
mod tests;
