//! # sqlrepo
//!
//! Generic CRUD repositories for record types that describe their own table.
//!
//! ## Features
//!
//! - **Record contract**: a type declares its table, columns and primary key
//!   via [`Record`] (usually `#[derive(FromRow, Record)]`)
//! - **One statement per call**: create / get / get_all / update / delete, each
//!   rendered as a single parameterized statement
//! - **Placeholder styles**: `?`, `$n`, `:n` and `@pn`, chosen per repository
//! - **Backend-neutral values**: parameters and rows travel as [`Value`], so the
//!   same repository code runs on Postgres and SQLite
//! - **Safe defaults**: UPDATE never writes the primary key, UPDATE and DELETE
//!   always carry a WHERE clause, table and column names are validated
//! - **Timeouts and logging**: optional statement timeout with server-side
//!   cancellation, SQL logged through `tracing`
//!
//! ## Usage
//!
//! ```ignore
//! use sqlrepo::{FromRow, Placeholder, Record, Repository, SqliteClient};
//!
//! #[derive(Debug, FromRow, Record)]
//! #[record(table = "persons")]
//! struct Person {
//!     #[record(id)]
//!     id: i64,
//!     name: String,
//! }
//!
//! let db = SqliteClient::open_in_memory()?;
//! let persons = Repository::<Person, _>::new(&db, Placeholder::Question);
//!
//! persons.create(&Person { id: 1, name: "Joe".into() }).await?;
//! persons.update(1, &Person { id: 0, name: "Joseph".into() }).await?;
//! let all = persons.get_all().await?;
//! persons.delete(1).await?;
//! ```
//!
//! ## Logging
//!
//! Every statement is logged at DEBUG under the `sqlrepo.sql` target with its
//! operation, table, SQL text and timing. Statements slower than
//! [`RepositoryConfig::slow_statement_threshold`] are logged at WARN.

pub mod client;
pub mod config;
pub mod error;
pub mod ident;
pub mod postgres;
pub mod qb;
pub mod record;
pub mod repository;
pub mod row;
pub mod value;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use client::{CancelHandle, GenericClient};
pub use config::RepositoryConfig;
pub use error::{ConstraintKind, RepoError, RepoResult};
pub use qb::{Placeholder, SqlQb, Statement};
pub use record::{Projection, Record};
pub use repository::{Operation, Repository};
pub use row::{FromRow, Row};
pub use value::{FromValue, TypeMismatch, Value};

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteClient;

#[cfg(feature = "derive")]
pub use sqlrepo_derive::{FromRow, Record};
